//! CLI command handling
//!
//! Resolves flags against the config file, builds the simulator client and
//! dispatches each command. Returns the process exit code. The config file
//! is only read by commands that use it, so `hooks` and a source-less `run`
//! never fail on a broken config.

mod run;

pub use run::{execute, exit_code, RunPlan, EXIT_FAILED, EXIT_NO_SOURCE, EXIT_PASSED};

use std::time::Duration;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::hooks::HookRegistry;
use crate::simulator::{ClientOptions, SimulatorClient};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Run {
            base_url,
            scenario,
            hook,
            lua_hook,
            report,
            report_text,
            export_logs,
            log_max_events,
            log_json,
            quiet,
        } => {
            if scenario.is_none() && hook.is_none() && lua_hook.is_none() {
                eprintln!("Nothing to run: pass --scenario, --hook or --lua-hook");
                return Ok(EXIT_NO_SOURCE);
            }

            let config = Config::load()?;
            let plan = RunPlan {
                scenario,
                hook,
                lua_hook,
                report_path: report.unwrap_or_else(|| config.report.json_path.clone()),
                report_text_path: report_text.or_else(|| config.report.text_path.clone()),
                export_logs,
                log_max_events: log_max_events.unwrap_or(config.logs.max_events),
                log_json: log_json || config.logs.as_json,
                lua_interpreters: config.lua.interpreters.clone(),
                quiet,
            };
            let client = client_for(&config, base_url.as_deref())?;
            let report = execute(&plan, &client, &HookRegistry::builtin()).await?;
            Ok(exit_code(&report))
        }

        Commands::Hooks => {
            let registry = HookRegistry::builtin();
            println!("Embedded hooks:");
            for hook in registry.iter() {
                println!("  {:<12} {}", hook.name().bold(), hook.description());
            }
            Ok(EXIT_PASSED)
        }

        Commands::Status { base_url } => {
            let config = Config::load()?;
            let client = client_for(&config, base_url.as_deref())?;
            let status = client.get_pd_status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(EXIT_PASSED)
        }

        Commands::ExportLogs {
            destination,
            base_url,
            max_events,
            json,
        } => {
            let config = Config::load()?;
            let client = client_for(&config, base_url.as_deref())?;
            let path = client
                .export_logs(
                    &destination,
                    max_events.unwrap_or(config.logs.max_events),
                    json || config.logs.as_json,
                )
                .await?;
            println!("Logs exported to: {}", path.display());
            Ok(EXIT_PASSED)
        }
    }
}

/// Build a client from config, with a command-line base URL taking priority
fn client_for(config: &Config, base_url: Option<&str>) -> Result<SimulatorClient> {
    let base_url = base_url.unwrap_or(&config.simulator.base_url);
    if base_url.trim().is_empty() {
        return Err(Error::Config("simulator base_url is empty".to_string()));
    }
    SimulatorClient::with_options(base_url, client_options(config))
}

fn client_options(config: &Config) -> ClientOptions {
    let request_timeout = match config.simulator.request_timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    ClientOptions {
        connect_timeout: Duration::from_secs(config.simulator.connect_timeout_secs),
        request_timeout,
        poll_interval: config.polling.poll_interval(),
    }
}
