use crate::{
    error::AnalysisError,
    parameters::{ParameterId, ParameterStore},
};
use serde::Deserialize;
use specter_common::{BoardId, CHANNELS_PER_BOARD, Channel, ChannelUuid, board_channel_uuid};
use std::collections::{HashMap, hash_map::Entry};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "lowercase")]
pub enum BoardKind {
    Adc,
    Tdc,
    Mtdc,
    Mqdc,
}

impl BoardKind {
    /// Kinds which are normally fitted as one 32 channel bank.
    pub fn is_single_bank(self) -> bool {
        matches!(self, BoardKind::Mtdc | BoardKind::Mqdc)
    }
}

/// A set of boards of the same kind, listed by geometry id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BoardBank {
    pub kind: BoardKind,
    pub boards: Vec<BoardId>,
}

impl BoardBank {
    pub fn new(kind: BoardKind, boards: Vec<BoardId>) -> Self {
        Self { kind, boards }
    }
}

/// The parameters created for one board.
#[derive(Debug)]
pub struct MappedBoard {
    kind: BoardKind,
    index: Option<usize>,
    geo: BoardId,
    parameters: Vec<ParameterId>,
    names: Vec<String>,
}

impl MappedBoard {
    pub fn kind(&self) -> BoardKind {
        self.kind
    }

    pub fn geo(&self) -> BoardId {
        self.geo
    }

    /// Short label used for grouping, e.g. `adc0` or `mtdc`.
    pub fn label(&self) -> String {
        match self.index {
            Some(index) => format!("{}{index}", self.kind),
            None => self.kind.to_string(),
        }
    }

    pub fn parameter(&self, channel: Channel) -> Option<ParameterId> {
        self.parameters.get(channel as usize).copied()
    }

    pub fn parameters(&self) -> &[ParameterId] {
        &self.parameters
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Static lookup from hardware channel identifier to parameter.
#[derive(Debug, Default)]
pub struct ChannelMap {
    map: HashMap<ChannelUuid, ParameterId>,
    boards: Vec<MappedBoard>,
}

impl ChannelMap {
    /// Creates one parameter per channel of every board in `banks`.
    #[tracing::instrument(skip_all, fields(num_banks = banks.len()))]
    pub fn build(banks: &[BoardBank], store: &mut ParameterStore) -> Result<Self, AnalysisError> {
        let mut channel_map = Self::default();
        for bank in banks {
            let single = bank.kind.is_single_bank() && bank.boards.len() == 1;
            for (index, &geo) in bank.boards.iter().enumerate() {
                let index = (!single).then_some(index);
                channel_map.add_board(bank.kind, index, geo, store)?;
            }
        }
        tracing::debug!(
            "Channel map built with {} boards, {} channels",
            channel_map.boards.len(),
            channel_map.map.len()
        );
        Ok(channel_map)
    }

    fn add_board(
        &mut self,
        kind: BoardKind,
        index: Option<usize>,
        geo: BoardId,
        store: &mut ParameterStore,
    ) -> Result<(), AnalysisError> {
        let mut parameters = Vec::with_capacity(CHANNELS_PER_BOARD as usize);
        let mut names = Vec::with_capacity(CHANNELS_PER_BOARD as usize);
        for channel in 0..CHANNELS_PER_BOARD {
            let uuid =
                board_channel_uuid(geo, channel).ok_or(AnalysisError::InvalidBoard(geo))?;
            let name = match index {
                Some(index) => format!("{kind}_{index}_{channel}"),
                None => format!("{kind}_{channel}"),
            };
            match self.map.entry(uuid) {
                Entry::Occupied(_) => {
                    return Err(AnalysisError::DuplicateChannel {
                        board: geo,
                        channel,
                        uuid,
                    });
                }
                Entry::Vacant(entry) => {
                    let id = store.create(name.clone())?;
                    entry.insert(id);
                    parameters.push(id);
                    names.push(name);
                }
            }
        }
        self.boards.push(MappedBoard {
            kind,
            index,
            geo,
            parameters,
            names,
        });
        Ok(())
    }

    pub fn resolve(&self, uuid: ChannelUuid) -> Option<ParameterId> {
        self.map.get(&uuid).copied()
    }

    pub fn parameter_for(&self, board: BoardId, channel: Channel) -> Option<ParameterId> {
        board_channel_uuid(board, channel).and_then(|uuid| self.resolve(uuid))
    }

    pub fn board(&self, geo: BoardId) -> Option<&MappedBoard> {
        self.boards.iter().find(|board| board.geo == geo)
    }

    pub fn boards(&self) -> &[MappedBoard] {
        &self.boards
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
