/// Blockstage CLI
///
/// Runs block programs headlessly: loads a project file, animates it in
/// real time and prints the final stage.
use blockstage_core::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run_cli().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
