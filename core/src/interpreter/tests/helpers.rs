//! Test helpers for engine tests
//!
//! Common builders for programs, rosters and engines, plus frame recording.

use crate::config::{EngineConfig, Scheduling};
use crate::interpreter::{Block, Engine, EngineEvent, Program, StageSnapshot};
use crate::types::ActorDecl;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// One actor named "cat"
pub fn cat() -> Vec<ActorDecl> {
    vec![ActorDecl::new("cat", "Cat", "cat.png")]
}

pub fn roster(ids: &[&str]) -> Vec<ActorDecl> {
    ids.iter()
        .map(|id| ActorDecl::new(*id, id.to_uppercase(), format!("{}.png", id)))
        .collect()
}

pub fn program(blocks: Vec<Block>) -> Arc<Program> {
    Arc::new(Program::new(blocks))
}

/// `start -> blocks[0] -> blocks[1] -> ...`, linking `next` in order
pub fn script(blocks: Vec<Block>) -> Arc<Program> {
    let mut linked = Vec::with_capacity(blocks.len() + 1);
    let mut start = Block::new("start", "start");
    if let Some(first) = blocks.first() {
        start = start.then(first.id.clone());
    }
    linked.push(start);

    let ids: Vec<String> = blocks.iter().map(|b| b.id.clone()).collect();
    for (i, mut block) in blocks.into_iter().enumerate() {
        if block.next.is_none() {
            if let Some(next) = ids.get(i + 1) {
                block = block.then(next.clone());
            }
        }
        linked.push(block);
    }
    program(linked)
}

pub fn engine() -> Engine {
    Engine::new(EngineConfig::default())
}

pub fn concurrent_engine() -> Engine {
    Engine::new(EngineConfig {
        scheduling: Scheduling::Concurrent,
        ..EngineConfig::default()
    })
}

/// Record every frame the engine publishes
pub fn record_frames(engine: &Engine) -> Arc<Mutex<Vec<StageSnapshot>>> {
    let frames = Arc::new(Mutex::new(Vec::new()));
    let sink = frames.clone();
    engine.observe(Arc::new(move |snapshot: &StageSnapshot| {
        sink.lock().unwrap().push(snapshot.clone());
    }));
    frames
}

pub fn drain(events: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {} to be close to {}",
        actual,
        expected
    );
}
