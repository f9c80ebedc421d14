//! Execution context
//!
//! Everything an operation handler may touch during a run: the stage, the
//! actor the current script drives, the stop signal and the event sink.
//! One context is created per run and forked per start chain.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::events::EngineEvent;
use super::stage::StageHandle;
use super::tween::{self, Outcome};
use crate::types::{ActorId, ActorPatch, ActorState};

#[derive(Clone)]
pub struct ExecutionContext {
    stage: StageHandle,
    owner: Option<ActorId>,
    cancel: CancellationToken,
    frame_interval: Duration,
    events: broadcast::Sender<EngineEvent>,
    operations: Arc<AtomicUsize>,
}

impl ExecutionContext {
    pub fn new(
        stage: StageHandle,
        cancel: CancellationToken,
        frame_interval: Duration,
        events: broadcast::Sender<EngineEvent>,
    ) -> Self {
        Self {
            stage,
            owner: None,
            cancel,
            frame_interval,
            events,
            operations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Same run, different target actor. The operation counter is shared.
    pub fn for_owner(&self, owner: Option<ActorId>) -> Self {
        Self {
            owner,
            ..self.clone()
        }
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn stage(&self) -> &StageHandle {
        &self.stage
    }

    /// Current state of the owning actor, if it exists
    pub fn actor(&self) -> Option<ActorState> {
        self.owner.as_deref().and_then(|id| self.stage.get(id))
    }

    /// Merge a patch into the owning actor; no-op without one
    pub fn patch(&self, patch: ActorPatch) -> bool {
        match self.owner.as_deref() {
            Some(id) => self.stage.update(id, patch),
            None => false,
        }
    }

    /// Tween the owning actor, applying `frame(progress)` on every frame
    pub async fn animate<F>(&self, duration: Duration, mut frame: F) -> Outcome
    where
        F: FnMut(f64) -> ActorPatch + Send,
    {
        tween::tween(duration, self.frame_interval, &self.cancel, |t| {
            self.patch(frame(t));
        })
        .await
    }

    pub async fn pause(&self, duration: Duration) -> Outcome {
        tween::wait(duration, &self.cancel).await
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn emit(&self, event: EngineEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    pub(crate) fn record_operation(&self) {
        self.operations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::Relaxed)
    }
}
