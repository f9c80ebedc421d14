//! Actor/stage state
//!
//! `Stage` is the plain data. `StageHandle` shares it between the engine and
//! the host and publishes a snapshot after every mutation, both to a `watch`
//! channel and to any registered `StageObserver`.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use crate::types::{ActorDecl, ActorPatch, ActorState, Background};

/* ===================== Stage ===================== */

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stage {
    background: Option<Background>,
    actors: Vec<ActorState>,
}

impl Stage {
    /// Replace the roster with fresh state for every declared actor
    pub fn reset(&mut self, actors: &[ActorDecl], background: Option<Background>) {
        self.actors = actors.iter().map(ActorState::from_decl).collect();
        self.background = background;
    }

    pub fn get(&self, id: &str) -> Option<&ActorState> {
        self.actors.iter().find(|a| a.id == id)
    }

    pub fn first(&self) -> Option<&ActorState> {
        self.actors.first()
    }

    /// Merge `patch` into the actor; unknown ids are ignored
    pub fn update(&mut self, id: &str, patch: ActorPatch) -> bool {
        match self.actors.iter_mut().find(|a| a.id == id) {
            Some(actor) => {
                actor.apply(patch);
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> StageSnapshot {
        StageSnapshot {
            background: self.background.clone(),
            actors: self.actors.clone(),
        }
    }
}

/// Render-time read model handed to the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageSnapshot {
    pub background: Option<Background>,
    pub actors: Vec<ActorState>,
}

impl StageSnapshot {
    pub fn actor(&self, id: &str) -> Option<&ActorState> {
        self.actors.iter().find(|a| a.id == id)
    }
}

/* ===================== Observation ===================== */

/// Synchronous hook invoked on every published frame
///
/// Called while the stage lock is held so frames arrive in order.
/// Implementations must not call back into the stage.
pub trait StageObserver: Send + Sync {
    fn on_frame(&self, snapshot: &StageSnapshot);
}

impl<F> StageObserver for F
where
    F: Fn(&StageSnapshot) + Send + Sync,
{
    fn on_frame(&self, snapshot: &StageSnapshot) {
        self(snapshot)
    }
}

/* ===================== Shared Handle ===================== */

struct StageShared {
    stage: Mutex<Stage>,
    publisher: watch::Sender<StageSnapshot>,
    observers: Mutex<Vec<Arc<dyn StageObserver>>>,
}

/// Cloneable handle to the stage of one engine
#[derive(Clone)]
pub struct StageHandle {
    inner: Arc<StageShared>,
}

impl Default for StageHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StageHandle {
    pub fn new() -> Self {
        let (publisher, _) = watch::channel(StageSnapshot::default());
        Self {
            inner: Arc::new(StageShared {
                stage: Mutex::new(Stage::default()),
                publisher,
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn reset(&self, actors: &[ActorDecl], background: Option<Background>) {
        let mut stage = self.lock();
        stage.reset(actors, background);
        self.publish(&stage);
    }

    pub fn get(&self, id: &str) -> Option<ActorState> {
        self.lock().get(id).cloned()
    }

    pub fn first_actor_id(&self) -> Option<String> {
        self.lock().first().map(|a| a.id.clone())
    }

    /// Apply a patch and publish the new frame; no-op for unknown actors
    pub fn update(&self, id: &str, patch: ActorPatch) -> bool {
        let mut stage = self.lock();
        let applied = stage.update(id, patch);
        if applied {
            self.publish(&stage);
        }
        applied
    }

    pub fn snapshot(&self) -> StageSnapshot {
        self.lock().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<StageSnapshot> {
        self.inner.publisher.subscribe()
    }

    pub fn add_observer(&self, observer: Arc<dyn StageObserver>) {
        self.inner
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    fn lock(&self) -> MutexGuard<'_, Stage> {
        self.inner.stage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, stage: &Stage) {
        let snapshot = stage.snapshot();
        let observers = self
            .inner
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in &observers {
            observer.on_frame(&snapshot);
        }
        self.inner.publisher.send_replace(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Position, Speech};

    fn roster() -> Vec<ActorDecl> {
        vec![
            ActorDecl::new("cat", "Cat", "cat.png"),
            ActorDecl::new("dog", "Dog", "dog.png"),
        ]
    }

    #[test]
    fn test_reset_replaces_roster_and_clears_state() {
        let mut stage = Stage::default();
        stage.reset(&roster(), None);
        stage.update("cat", ActorPatch::speech(Speech::Say("hi".into())));
        stage.update("cat", ActorPatch::position(Position::new(10.0, 10.0)));

        stage.reset(&roster()[..1], None);

        let cat = stage.get("cat").unwrap();
        assert_eq!(cat.speech, Speech::None);
        assert_eq!(cat.position, Position::default());
        assert!(stage.get("dog").is_none());
    }

    #[test]
    fn test_update_unknown_actor_is_noop() {
        let mut stage = Stage::default();
        stage.reset(&roster(), None);
        let before = stage.snapshot();

        assert!(!stage.update("ghost", ActorPatch::visible(false)));
        assert_eq!(stage.snapshot(), before);
    }

    #[test]
    fn test_handle_publishes_to_watchers_and_observers() {
        let handle = StageHandle::new();
        let rx = handle.subscribe();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        handle.add_observer(Arc::new(move |snapshot: &StageSnapshot| {
            sink.lock().unwrap().push(snapshot.actors.len());
        }));

        handle.reset(&roster(), None);
        handle.update("dog", ActorPatch::heading(90.0));
        handle.update("ghost", ActorPatch::heading(90.0));

        assert_eq!(*seen.lock().unwrap(), vec![2, 2]);
        assert_eq!(rx.borrow().actor("dog").unwrap().heading, 90.0);
        assert_eq!(handle.first_actor_id().as_deref(), Some("cat"));
    }
}
