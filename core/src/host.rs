//! Host bridge
//!
//! The boundary the UI talks to. It holds the project being edited, turns
//! the run trigger into engine runs, and exposes the stage read model.
//! One `StageHost` per host session; there is no global state.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::errors::{EngineError, Result};
use crate::interpreter::{Engine, EngineEvent, Program, RunReport, StageSnapshot};
use crate::types::{ActorDecl, Background};

/* ===================== Project ===================== */

/// Everything a run needs, as persisted by the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    pub program: Program,
    #[serde(default)]
    pub actors: Vec<ActorDecl>,
    #[serde(default)]
    pub background: Option<Background>,
}

impl Project {
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&source)
    }
}

/* ===================== Host ===================== */

#[derive(Clone, Default)]
struct Loaded {
    program: Arc<Program>,
    actors: Vec<ActorDecl>,
    background: Option<Background>,
}

pub struct StageHost {
    engine: Arc<Engine>,
    loaded: Mutex<Loaded>,
    run_flag: AtomicBool,
    stopped: AtomicBool,
}

impl StageHost {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            loaded: Mutex::new(Loaded::default()),
            run_flag: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /* ===================== Editing ===================== */

    pub fn load_project(&self, project: Project) {
        *self.lock() = Loaded {
            program: Arc::new(project.program),
            actors: project.actors,
            background: project.background,
        };
    }

    /// Replace the program; takes effect on the next run
    pub fn set_program(&self, program: Program) {
        self.lock().program = Arc::new(program);
    }

    pub fn set_actors(&self, actors: Vec<ActorDecl>) {
        self.lock().actors = actors;
    }

    pub fn set_background(&self, background: Option<Background>) {
        self.lock().background = background;
    }

    /* ===================== Running ===================== */

    /// Edge-triggered run input: only a false -> true transition starts a run
    ///
    /// The host lowers the flag again when it sees the run finish.
    pub fn set_run_flag(&self, raised: bool) -> Option<JoinHandle<RunReport>> {
        let was_raised = self.run_flag.swap(raised, Ordering::AcqRel);
        if raised && !was_raised {
            debug!("run flag raised");
            Some(self.spawn_run())
        } else {
            None
        }
    }

    /// Start a run in the background with the current project
    pub fn spawn_run(&self) -> JoinHandle<RunReport> {
        let engine = self.engine.clone();
        let loaded = self.lock().clone();
        self.stopped.store(false, Ordering::Release);
        tokio::spawn(async move {
            engine
                .run(loaded.program, &loaded.actors, loaded.background)
                .await
        })
    }

    /// Run the current project and wait for it to finish
    pub async fn run(&self) -> RunReport {
        let loaded = self.lock().clone();
        self.stopped.store(false, Ordering::Release);
        self.engine
            .run(loaded.program, &loaded.actors, loaded.background)
            .await
    }

    /// Mark the stage stopped and cancel the active run
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.run_flag.store(false, Ordering::Release);
        self.engine.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    /* ===================== Read Model ===================== */

    pub fn snapshot(&self) -> StageSnapshot {
        self.engine.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<StageSnapshot> {
        self.engine.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<EngineEvent> {
        self.engine.events()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Loaded> {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::RunOutcome;
    use std::time::Duration;

    const PROJECT: &str = r#"{
        "program": {
            "blocks": [
                {"id": "s", "operationKind": "start", "next": "m"},
                {"id": "m", "operationKind": "moveUp", "next": "t"},
                {"id": "t", "operationKind": "say", "parameters": {"message": "done"}}
            ]
        },
        "actors": [{"id": "cat", "name": "Cat", "imageRef": "cat.png"}],
        "background": {"imageRef": "sky.png", "name": "Sky"}
    }"#;

    fn host() -> StageHost {
        let host = StageHost::new(Arc::new(Engine::default()));
        host.load_project(Project::from_json(PROJECT).unwrap());
        host
    }

    #[test]
    fn test_project_parses() {
        let project = Project::from_json(PROJECT).unwrap();
        assert_eq!(project.program.len(), 3);
        assert_eq!(project.actors[0].image_ref, "cat.png");
        assert_eq!(project.background.unwrap().name, "Sky");
    }

    #[test]
    fn test_project_load_reports_missing_file() {
        let err = Project::load(Path::new("/nonexistent/project.json")).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_uses_loaded_project() {
        let host = host();

        let report = host.run().await;

        assert_eq!(report.outcome, RunOutcome::Completed);
        let snapshot = host.snapshot();
        assert_eq!(snapshot.actor("cat").unwrap().position.y, 50.0);
        assert_eq!(snapshot.background.unwrap().image_ref, "sky.png");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_flag_is_edge_triggered() {
        let host = host();

        let handle = host.set_run_flag(true).expect("rising edge starts a run");
        assert!(host.set_run_flag(true).is_none());

        let report = handle.await.unwrap();
        assert_eq!(report.outcome, RunOutcome::Completed);

        assert!(host.set_run_flag(false).is_none());
        assert!(host.set_run_flag(true).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_sets_flag_and_cancels() {
        let host = host();
        let handle = host.spawn_run();

        tokio::time::sleep(Duration::from_millis(200)).await;
        host.stop();

        assert!(host.is_stopped());
        assert_eq!(handle.await.unwrap().outcome, RunOutcome::Stopped);
        assert!(!host.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_apply_to_next_run() {
        let host = host();
        host.set_actors(vec![ActorDecl::new("dog", "Dog", "dog.png")]);
        host.set_program(Program::new(vec![]));

        let report = host.run().await;

        assert_eq!(report.outcome, RunOutcome::NoStartBlock);
        assert!(host.snapshot().actor("dog").is_some());
        assert!(host.snapshot().actor("cat").is_none());
    }
}
