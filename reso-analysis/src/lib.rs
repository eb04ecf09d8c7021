//! Per-event analysis of the SE-RESO setup: raw digitiser hits are routed to
//! named parameters, reduced to silicon detector maxima and hit angles, and
//! combined into a decay Q-value estimate.
pub mod channel_map;
pub mod config;
pub mod decoder;
pub mod detector;
pub mod error;
pub mod event;
pub mod extraction;
pub mod geometry;
pub mod histogram;
pub mod kinematics;
pub mod parameters;
pub mod publication;
pub mod reaction;
pub mod stage;

pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use event::{Event, Hit};
pub use histogram::HistogramManager;
pub use parameters::{Parameter, ParameterId, ParameterStore, Variable};
pub use publication::SpectrumManager;
pub use reaction::ReactionInput;
pub use stage::{AnalysisStage, ResoAnalysisStage};
