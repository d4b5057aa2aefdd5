//! CLI command definitions
//!
//! Defines the clap commands for the simulator harness.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scenario and/or hooks against the simulator and write a report
    ///
    /// Sources run in a fixed order: scenario, embedded hook, Lua hook.
    /// Exit code is 0 when every step passed, 1 when any failed and 2 when
    /// no source was given.
    Run {
        /// Simulator base URL (default from config, then http://127.0.0.1:8000)
        #[arg(long)]
        base_url: Option<String>,

        /// Path to a JSON or YAML scenario
        #[arg(long, alias = "json-scenario")]
        scenario: Option<PathBuf>,

        /// Name of an embedded hook (see `simharness hooks`)
        #[arg(long)]
        hook: Option<String>,

        /// Path to a Lua hook that prints JSON results
        #[arg(long)]
        lua_hook: Option<PathBuf>,

        /// Path for the JSON report
        #[arg(long)]
        report: Option<PathBuf>,

        /// Optional human-readable report path
        #[arg(long)]
        report_text: Option<PathBuf>,

        /// Export recent diagnostic logs to this path
        #[arg(long)]
        export_logs: Option<PathBuf>,

        /// Number of diagnostic events to export
        #[arg(long)]
        log_max_events: Option<u32>,

        /// Export logs as structured JSON instead of text
        #[arg(long)]
        log_json: bool,

        /// Do not print per-step progress
        #[arg(long, short)]
        quiet: bool,
    },

    /// List the embedded hooks compiled into this binary
    Hooks,

    /// Print the simulator's PD status (connectivity check)
    Status {
        /// Simulator base URL
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Export recent diagnostic logs without running anything
    ExportLogs {
        /// Destination file
        destination: PathBuf,

        /// Simulator base URL
        #[arg(long)]
        base_url: Option<String>,

        /// Number of diagnostic events to export
        #[arg(long)]
        max_events: Option<u32>,

        /// Export as structured JSON instead of text
        #[arg(long)]
        json: bool,
    },
}
