pub mod cli;
pub mod config;
pub mod errors;
pub mod host;
pub mod interpreter;
pub mod types;

// Re-export main types
pub use types::*;

pub use config::{EngineConfig, Scheduling};
pub use errors::EngineError;
pub use host::{Project, StageHost};
pub use interpreter::{Engine, EngineEvent, EngineState, RunOutcome, RunReport};
