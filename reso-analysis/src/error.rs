use crate::{kinematics::KinematicsError, publication::PublicationError, reaction::ReactionError};
use specter_common::{BoardId, Channel, ChannelUuid};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Parameter \"{0}\" already exists")]
    DuplicateParameter(String),
    #[error("Channel {channel} of board {board} is mapped more than once (uuid {uuid})")]
    DuplicateChannel {
        board: BoardId,
        channel: Channel,
        uuid: ChannelUuid,
    },
    #[error("Board {0} is outside the range of channel identifiers")]
    InvalidBoard(BoardId),
    #[error("Board {0} is not in the channel map")]
    UnknownBoard(BoardId),
    #[error("Invalid geometry for detector \"{name}\": {reason}")]
    InvalidGeometry { name: String, reason: &'static str },
    #[error("Detector \"{0}\" is not configured")]
    UnknownDetector(String),
    #[error("Invalid calibration for detector \"{0}\": gain and offset must be finite")]
    InvalidCalibration(String),
    #[error("Invalid timing conversion factor: {0}")]
    InvalidTimeConversion(f64),
    #[error(transparent)]
    Kinematics(#[from] KinematicsError),
    #[error(transparent)]
    Publication(#[from] PublicationError),
    #[error(transparent)]
    Reaction(#[from] ReactionError),
}
