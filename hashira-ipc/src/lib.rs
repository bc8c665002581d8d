pub mod command;
pub mod rule;

pub use command::{Command, Response, StateInfo, WindowInfo, WindowPhase};
pub use rule::{MatchField, WindowRule};
