//! Engine events broadcast to the host

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::program::BlockId;

/// How a call to `Engine::run` ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunOutcome {
    /// Every start chain ran to its end
    Completed,
    /// A stop request cancelled the run
    Stopped,
    /// The program has no start block; nothing was executed
    NoStartBlock,
    /// A run was already in progress
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEvent {
    RunStarted { run_id: Uuid },
    NoStartBlock,
    UnknownOperation { block: BlockId, kind: String },
    RunFinished { run_id: Uuid, outcome: RunOutcome },
}
