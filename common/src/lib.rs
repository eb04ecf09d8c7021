pub mod metrics;
pub mod tracer;

pub type BoardId = u32;
pub type Channel = u32;
pub type ChannelUuid = u32;

pub const CHANNELS_PER_BOARD: u32 = 32;

/// Combines a board geometry id and a channel number into a single identifier.
///
/// Uses the Szudzik pairing function, which is injective for every pair whose
/// result fits in a `u32`. Returns `None` when it does not, which can only
/// happen when the board or the channel exceeds `u16::MAX`.
pub const fn board_channel_uuid(board: BoardId, channel: Channel) -> Option<ChannelUuid> {
    if board >= channel {
        match board.checked_mul(board) {
            Some(square) => match square.checked_add(board) {
                Some(partial) => partial.checked_add(channel),
                None => None,
            },
            None => None,
        }
    } else {
        match channel.checked_mul(channel) {
            Some(square) => square.checked_add(board),
            None => None,
        }
    }
}
