//! Run orchestration
//!
//! Runs the selected step sources in a fixed order (scenario, embedded hook,
//! Lua hook), concatenates their results, optionally exports diagnostic
//! logs, and writes the report. Errors from loading or invoking a whole
//! source abort the run before any report is written.

use std::path::PathBuf;

use crate::common::Result;
use crate::hooks::{HookRegistry, LuaHook};
use crate::report::{self, Report};
use crate::simulator::SimulatorClient;
use crate::testing::{load_scenario, ScenarioRunner, StepResult};

/// Every step passed
pub const EXIT_PASSED: i32 = 0;
/// At least one step failed, or a source aborted the run
pub const EXIT_FAILED: i32 = 1;
/// No step source was selected
pub const EXIT_NO_SOURCE: i32 = 2;

/// Report name when no scenario supplies one
const DEFAULT_RUN_NAME: &str = "scripted-run";

/// Everything a run needs, resolved from flags and config
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub scenario: Option<PathBuf>,
    pub hook: Option<String>,
    pub lua_hook: Option<PathBuf>,
    pub report_path: PathBuf,
    pub report_text_path: Option<PathBuf>,
    pub export_logs: Option<PathBuf>,
    pub log_max_events: u32,
    pub log_json: bool,
    pub lua_interpreters: Vec<String>,
    pub quiet: bool,
}

/// Exit code for a finished report
pub fn exit_code(report: &Report) -> i32 {
    if report.all_passed() {
        EXIT_PASSED
    } else {
        EXIT_FAILED
    }
}

/// Execute a plan and write its report
pub async fn execute(plan: &RunPlan, client: &SimulatorClient, registry: &HookRegistry) -> Result<Report> {
    let mut steps: Vec<StepResult> = Vec::new();
    let mut run_name = DEFAULT_RUN_NAME.to_string();

    if let Some(path) = &plan.scenario {
        let scenario = load_scenario(path)?;
        if let Some(name) = &scenario.name {
            run_name = name.clone();
        }
        tracing::info!(scenario = %run_name, steps = scenario.steps.len(), "running scenario");

        let results = ScenarioRunner::new(client).run(&scenario).await;
        announce(plan, "Scenario:", &run_name, scenario.description.as_deref(), &results);
        steps.extend(results);
    }

    if let Some(name) = &plan.hook {
        let results = registry.run(name, client).await?;
        announce(plan, "Hook:", name, None, &results);
        steps.extend(results);
    }

    if let Some(script) = &plan.lua_hook {
        let results = LuaHook::new(plan.lua_interpreters.clone())
            .run(script, client.base_url())
            .await?;
        announce(plan, "Lua hook:", &script.display().to_string(), None, &results);
        steps.extend(results);
    }

    let log_path = match &plan.export_logs {
        Some(destination) => Some(
            client
                .export_logs(destination, plan.log_max_events, plan.log_json)
                .await?,
        ),
        None => None,
    };

    let report = Report::build(&run_name, client.base_url(), steps, log_path.as_deref());
    report.write(&plan.report_path, plan.report_text_path.as_deref())?;

    if !plan.quiet {
        report::print_summary(&report);
    }

    Ok(report)
}

fn announce(plan: &RunPlan, label: &str, name: &str, description: Option<&str>, results: &[StepResult]) {
    let failed = results.iter().filter(|r| !r.is_pass()).count();
    tracing::info!(source = name, total = results.len(), failed, "step source finished");

    if plan.quiet {
        return;
    }
    report::print_header(label, name);
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        report::print_description(description);
    }
    for result in results {
        report::print_step(result);
    }
}
