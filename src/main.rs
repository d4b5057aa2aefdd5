//! Simulator harness CLI - scenario-driven testing for device simulators
//!
//! Runs declarative scenarios and hooks against a simulator's HTTP control
//! API and writes a pass/fail report suitable for CI.

use clap::Parser;
use simharness::common::logging;
use simharness::{cli, commands::Commands};

#[derive(Parser)]
#[command(name = "simharness", about = "Scenario-driven test harness for device simulators")]
#[command(version, long_about = None)]
struct Cli {
    /// Log every HTTP call and poll to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_cli(cli.verbose);

    match cli::dispatch(cli.command).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
