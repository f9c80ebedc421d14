//! Tests for repeat containers and waits

use super::super::*;
use super::helpers::{assert_close, cat, engine, program, script};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/* ===================== repeatCount ===================== */

#[tokio::test(start_paused = true)]
async fn test_repeat_count_turns() {
    // start -> repeat 4 { turnRight 15 }
    let engine = engine();
    let program = program(vec![
        Block::new("s", "start").then("r"),
        Block::new("r", "repeatCount")
            .param("times", 4)
            .child("t")
            .nest(Block::new("t", "turnRight").param("degrees", 15)),
    ]);

    let report = engine.run(program, &cat(), None).await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.operations, 6);
    assert_eq!(engine.snapshot().actor("cat").unwrap().heading, 60.0);
}

#[tokio::test(start_paused = true)]
async fn test_repeat_body_drains_before_next() {
    // repeat 2 { moveUp -> turnRight 90 } -> moveRight
    let engine = engine();
    let program = program(vec![
        Block::new("s", "start").then("r"),
        Block::new("r", "repeatCount")
            .param("times", 2)
            .child("up")
            .then("right"),
        Block::new("up", "moveUp").then("turn"),
        Block::new("turn", "turnRight").param("degrees", 90),
        Block::new("right", "moveRight"),
    ]);

    engine.run(program, &cat(), None).await;

    let actor = engine.snapshot().actor("cat").cloned().unwrap();
    assert_eq!(actor.position.y, 100.0);
    assert_eq!(actor.position.x, 50.0);
    assert_eq!(actor.heading, 180.0);
}

#[tokio::test(start_paused = true)]
async fn test_repeat_with_several_body_chains() {
    let engine = engine();
    let program = program(vec![
        Block::new("s", "start").then("r"),
        Block::new("r", "repeatCount")
            .param("times", 3)
            .child("a")
            .child("b")
            .nest(Block::new("a", "moveLeft"))
            .nest(Block::new("b", "moveDown")),
    ]);

    engine.run(program, &cat(), None).await;

    let actor = engine.snapshot().actor("cat").cloned().unwrap();
    assert_eq!(actor.position.x, -150.0);
    assert_eq!(actor.position.y, -150.0);
}

#[tokio::test(start_paused = true)]
async fn test_nested_repeats_multiply() {
    // repeat 2 { repeat 3 { turnLeft 10 } }
    let engine = engine();
    let program = program(vec![
        Block::new("s", "start").then("outer"),
        Block::new("outer", "repeatCount")
            .param("times", 2)
            .child("inner")
            .nest(
                Block::new("inner", "repeatCount")
                    .param("times", 3)
                    .child("t")
                    .nest(Block::new("t", "turnLeft").param("degrees", 10)),
            ),
    ]);

    let report = engine.run(program, &cat(), None).await;

    assert_eq!(engine.snapshot().actor("cat").unwrap().heading, -60.0);
    // start + outer + 2 * (inner + 3 turns)
    assert_eq!(report.operations, 10);
}

#[tokio::test(start_paused = true)]
async fn test_repeat_zero_skips_body_and_continues() {
    let engine = engine();
    let program = program(vec![
        Block::new("s", "start").then("r"),
        Block::new("r", "repeatCount")
            .param("times", 0)
            .child("t")
            .then("m")
            .nest(Block::new("t", "turnRight")),
        Block::new("m", "moveUp"),
    ]);

    engine.run(program, &cat(), None).await;

    let actor = engine.snapshot().actor("cat").cloned().unwrap();
    assert_eq!(actor.heading, 0.0);
    assert_eq!(actor.position.y, 50.0);
}

/* ===================== repeatForever ===================== */

#[tokio::test(start_paused = true)]
async fn test_forever_runs_body_exactly_three_times() {
    let engine = engine();
    let program = program(vec![
        Block::new("s", "start").then("f"),
        Block::new("f", "repeatForever")
            .child("step")
            .nest(Block::new("step", "moveSteps").param("steps", 1)),
    ]);
    let start = Instant::now();

    let report = engine.run(program, &cat(), None).await;

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.operations, 2 + FOREVER_ITERATIONS as usize);

    // Heading 0 moves toward negative model y, 20 units per step
    let actor = engine.snapshot().actor("cat").cloned().unwrap();
    assert_close(actor.position.x, 0.0);
    assert_close(actor.position.y, -60.0);

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(1500));
    assert!(elapsed < Duration::from_millis(1700));
}

#[tokio::test(start_paused = true)]
async fn test_forever_continues_to_next_block() {
    let engine = engine();
    let program = program(vec![
        Block::new("s", "start").then("f"),
        Block::new("f", "repeatForever")
            .child("t")
            .then("h")
            .nest(Block::new("t", "turnRight").param("degrees", 30)),
        Block::new("h", "hide"),
    ]);

    engine.run(program, &cat(), None).await;

    let actor = engine.snapshot().actor("cat").cloned().unwrap();
    assert_eq!(actor.heading, 90.0);
    assert!(!actor.visible);
}

/* ===================== wait ===================== */

#[tokio::test(start_paused = true)]
async fn test_wait_suspends_without_state_change() {
    let engine = engine();
    let start = Instant::now();

    engine
        .run(script(vec![Block::new("w", "wait").param("seconds", 2)]), &cat(), None)
        .await;

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(2));
    assert!(elapsed < Duration::from_millis(2050));

    let actor = engine.snapshot().actor("cat").cloned().unwrap();
    assert_eq!(actor, crate::types::ActorState::from_decl(&cat()[0]));
}

#[tokio::test(start_paused = true)]
async fn test_wait_defaults_to_one_second() {
    let engine = engine();
    let start = Instant::now();

    engine.run(script(vec![Block::new("w", "wait")]), &cat(), None).await;

    assert!(start.elapsed() >= Duration::from_secs(1));
    assert!(start.elapsed() < Duration::from_millis(1050));
}

#[tokio::test(start_paused = true)]
async fn test_wait_beyond_duration_range_can_be_stopped() {
    let engine = Arc::new(engine());
    let runner = {
        let engine = engine.clone();
        let program = script(vec![Block::new("w", "wait").param("seconds", 1e20)]);
        tokio::spawn(async move { engine.run(program, &cat(), None).await })
    };

    sleep(Duration::from_secs(60)).await;
    assert!(engine.is_running());
    engine.stop();

    let report = runner.await.unwrap();
    assert_eq!(report.outcome, RunOutcome::Stopped);
    assert_eq!(report.operations, 2);
}
