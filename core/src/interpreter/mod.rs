//! # Block Program Engine
//!
//! Interprets visual block programs and animates the actors on a stage.
//!
//! ## Core Principles
//!
//! 1. **Explicit context**: all run state lives in an `ExecutionContext`, no globals
//! 2. **Cooperative suspension**: tweens and waits are the only await points
//! 3. **Registry dispatch**: operation kinds map to handlers in `stdlib`
//! 4. **Graceful degradation**: no runtime condition fails a run
//!
//! ## Lifecycle
//!
//! `Idle -> Running -> Idle`. A `run` while already running is ignored. A
//! `stop` cancels every in-flight tween and wait of the active run.

pub mod context;
pub mod events;
pub mod exec_loop;
pub mod program;
pub mod stage;
pub mod stdlib;
pub mod tween;

#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{EngineConfig, Scheduling};
use crate::types::{ActorDecl, ActorId, Background};

// Re-export commonly used items
pub use context::ExecutionContext;
pub use events::{EngineEvent, RunOutcome};
pub use exec_loop::{run_chain, FOREVER_ITERATIONS};
pub use program::{Block, BlockId, OperationKind, ParamValue, Program};
pub use stage::{Stage, StageHandle, StageObserver, StageSnapshot};
pub use stdlib::{HandlerFuture, OperationHandler, OperationRegistry};
pub use tween::Outcome;

const EVENT_CAPACITY: usize = 64;

/* ===================== Engine State ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Idle,
    Running,
}

/// Summary of one call to `Engine::run`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    pub outcome: RunOutcome,
    /// Blocks executed, container bodies counted per iteration
    pub operations: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Clears the running flag when the run ends, however it ends
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/* ===================== Engine ===================== */

pub struct Engine {
    config: EngineConfig,
    registry: Arc<OperationRegistry>,
    stage: StageHandle,
    running: AtomicBool,
    cancel: Mutex<CancellationToken>,
    events: broadcast::Sender<EngineEvent>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(config, OperationRegistry::builtin())
    }

    pub fn with_registry(config: EngineConfig, registry: OperationRegistry) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            registry: Arc::new(registry),
            stage: StageHandle::new(),
            running: AtomicBool::new(false),
            cancel: Mutex::new(CancellationToken::new()),
            events,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        if self.is_running() {
            EngineState::Running
        } else {
            EngineState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn stage(&self) -> &StageHandle {
        &self.stage
    }

    pub fn snapshot(&self) -> StageSnapshot {
        self.stage.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<StageSnapshot> {
        self.stage.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn observe(&self, observer: Arc<dyn StageObserver>) {
        self.stage.add_observer(observer);
    }

    /// Cancel the active run; no-op while idle
    pub fn stop(&self) {
        let token = self.lock_token();
        if self.is_running() {
            info!("stop requested");
            token.cancel();
        }
    }

    /// Reset the stage from `actors` and execute every start chain
    pub async fn run(
        &self,
        program: Arc<Program>,
        actors: &[ActorDecl],
        background: Option<Background>,
    ) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        // The guard and the run's token change together under the token lock,
        // so a stop never sees a running engine holding a stale token
        let armed = {
            let mut token = self.lock_token();
            RunGuard::acquire(&self.running).map(|guard| {
                *token = CancellationToken::new();
                (guard, token.clone())
            })
        };

        let Some((_guard, cancel)) = armed else {
            info!(%run_id, "run requested while running; ignoring");
            return RunReport {
                run_id,
                outcome: RunOutcome::Ignored,
                operations: 0,
                started_at,
                finished_at: Utc::now(),
            };
        };

        let ctx = ExecutionContext::new(
            self.stage.clone(),
            cancel,
            self.config.frame_interval(),
            self.events.clone(),
        );

        let span = info_span!("run", %run_id);
        let outcome = self
            .execute(run_id, program, actors, background, &ctx)
            .instrument(span)
            .await;

        RunReport {
            run_id,
            outcome,
            operations: ctx.operations(),
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn execute(
        &self,
        run_id: Uuid,
        program: Arc<Program>,
        actors: &[ActorDecl],
        background: Option<Background>,
        ctx: &ExecutionContext,
    ) -> RunOutcome {
        self.stage.reset(actors, background);

        let starts = program.start_blocks();
        if starts.is_empty() {
            warn!("program has no start block");
            ctx.emit(EngineEvent::NoStartBlock);
            return RunOutcome::NoStartBlock;
        }

        info!(
            starts = starts.len(),
            blocks = program.len(),
            actors = actors.len(),
            scheduling = ?self.config.scheduling,
            "run started"
        );
        ctx.emit(EngineEvent::RunStarted { run_id });

        let owners: Vec<Option<ActorId>> = starts.iter().map(|s| self.owner_of(s)).collect();
        let completed = match self.config.scheduling {
            Scheduling::Sequential => {
                let mut completed = true;
                for (start, owner) in starts.iter().zip(owners) {
                    let chain = ctx.for_owner(owner);
                    if run_chain(&self.registry, &program, &chain, Some(*start)).await.is_cancelled() {
                        completed = false;
                        break;
                    }
                }
                completed
            }
            Scheduling::Concurrent => self.run_concurrent(&program, owners, ctx).await,
        };

        let outcome = if completed && !ctx.is_cancelled() {
            RunOutcome::Completed
        } else {
            RunOutcome::Stopped
        };

        info!(?outcome, operations = ctx.operations(), "run finished");
        ctx.emit(EngineEvent::RunFinished { run_id, outcome });
        outcome
    }

    /// Each start chain becomes its own task; returns false if any was cancelled
    async fn run_concurrent(
        &self,
        program: &Arc<Program>,
        owners: Vec<Option<ActorId>>,
        ctx: &ExecutionContext,
    ) -> bool {
        let mut tasks = JoinSet::new();

        for (index, owner) in owners.into_iter().enumerate() {
            let registry = self.registry.clone();
            let program = program.clone();
            let chain = ctx.for_owner(owner);
            tasks.spawn(async move {
                let head = program.start_blocks().get(index).copied();
                run_chain(&registry, &program, &chain, head).await
            });
        }

        let mut completed = true;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => completed &= !outcome.is_cancelled(),
                Err(err) => {
                    warn!(error = %err, "start chain task failed");
                    completed = false;
                }
            }
        }
        completed
    }

    /// The actor named by the start block's `actor` parameter, else the first actor
    fn owner_of(&self, start: &Block) -> Option<ActorId> {
        start.text("actor").or_else(|| self.stage.first_actor_id())
    }

    fn lock_token(&self) -> MutexGuard<'_, CancellationToken> {
        self.cancel.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
