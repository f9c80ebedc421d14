use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{EngineConfig, Scheduling};
use crate::host::Project;
use crate::interpreter::{Engine, RunOutcome, StageSnapshot};

#[derive(Parser)]
#[command(name = "blockstage")]
#[command(about = "Blockstage - run visual block programs headlessly", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a project file and print the final stage as JSON
    Run {
        /// Project JSON: { program, actors, background }
        project: PathBuf,

        /// Run every start block as its own task
        #[arg(long)]
        concurrent: bool,

        /// Log every published frame
        #[arg(long)]
        trace: bool,

        /// Tween frame interval in milliseconds
        #[arg(long)]
        frame_ms: Option<u64>,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Run the CLI by parsing process arguments
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli).await
}

/// Run the CLI with provided arguments
pub async fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli).await
}

async fn run_cli_with_args(cli: Cli) -> Result<()> {
    dotenvy::dotenv().ok();

    let (scheduling, frame_ms) = match &cli.command {
        Commands::Run {
            concurrent,
            frame_ms,
            ..
        } => (concurrent.then_some(Scheduling::Concurrent), *frame_ms),
        Commands::Config => (None, None),
    };

    // Load config before doing anything so errors surface first
    let config = EngineConfig::builder()
        .config_path(cli.config.clone())
        .scheduling(scheduling)
        .frame_interval_ms(frame_ms)
        .build()
        .context("Failed to load configuration")?;

    init_logging(&config);

    match cli.command {
        Commands::Run { project, trace, .. } => {
            let project = Project::load(&project)
                .with_context(|| format!("Failed to load project {}", project.display()))?;
            run_project(config, project, trace).await?;
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

async fn run_project(config: EngineConfig, project: Project, trace: bool) -> Result<()> {
    let engine = Arc::new(Engine::new(config));

    if trace {
        engine.observe(Arc::new(|snapshot: &StageSnapshot| {
            for actor in &snapshot.actors {
                info!(
                    target: "blockstage::frames",
                    actor = %actor.id,
                    x = actor.position.x,
                    y = actor.position.y,
                    heading = actor.heading,
                    visible = actor.visible,
                    "frame"
                );
            }
        }));
    }

    // Ctrl-C stops the run instead of killing the process mid-frame
    let stopper = engine.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stopper.stop();
        }
    });

    let report = engine
        .run(Arc::new(project.program), &project.actors, project.background)
        .await;

    if report.outcome == RunOutcome::NoStartBlock {
        eprintln!("Warning: program has no start block; nothing ran");
    }

    let output = json!({
        "report": report,
        "stage": engine.snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn init_logging(config: &EngineConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    // A second init (tests, embedding) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
