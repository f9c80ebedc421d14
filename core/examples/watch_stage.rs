use blockstage_core::interpreter::{Block, Program};
use blockstage_core::{ActorDecl, Engine, EngineConfig, Project, StageHost};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("Running a square walk...");

    let program = Program::new(vec![
        Block::new("go", "start").then("loop"),
        Block::new("loop", "repeatCount")
            .param("times", 4)
            .child("step")
            .then("bye")
            .nest(Block::new("step", "moveSteps").param("steps", 3).then("turn"))
            .nest(Block::new("turn", "turnRight").param("degrees", 90)),
        Block::new("bye", "say").param("message", "Done!"),
    ]);

    let host = StageHost::new(Arc::new(Engine::new(EngineConfig::default())));
    host.load_project(Project {
        program,
        actors: vec![ActorDecl::new("cat", "Cat", "cat.png")],
        background: None,
    });

    let mut frames = host.subscribe();
    let printer = tokio::spawn(async move {
        while frames.changed().await.is_ok() {
            let snapshot = frames.borrow_and_update().clone();
            if let Some(cat) = snapshot.actor("cat") {
                println!(
                    "x={:>7.2} y={:>7.2} heading={:>6.1}",
                    cat.position.x, cat.position.y, cat.heading
                );
            }
        }
    });

    let report = host.run().await;
    printer.abort();

    println!("✓ Run finished: {:?} after {} blocks", report.outcome, report.operations);
    Ok(())
}
