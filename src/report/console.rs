//! Coloured console progress, separate from the report artifacts

use colored::Colorize;

use crate::testing::StepResult;

use super::Report;

/// Announce a step source before its results are listed
pub fn print_header(label: &str, name: &str) {
    println!("\n{} {}", label.blue().bold(), name.white().bold());
}

/// Dimmed description line under a header
pub fn print_description(description: &str) {
    println!("  {}", description.dimmed());
}

/// One line per step, with the failure reason when there is one
pub fn print_step(step: &StepResult) {
    if step.is_pass() {
        println!("  {} {}", "✓".green(), step.name());
        return;
    }

    let reason = step
        .details()
        .and_then(|d| d.get("error"))
        .and_then(|e| e.as_str())
        .unwrap_or("");
    if reason.is_empty() {
        println!("  {} {}", "✗".red(), step.name());
    } else {
        println!("  {} {}: {}", "✗".red(), step.name(), reason.dimmed());
    }
}

pub fn print_summary(report: &Report) {
    let summary = &report.summary;
    let counts = format!(
        "{} passed, {} failed, {} total",
        summary.passed, summary.failed, summary.total
    );

    if report.all_passed() {
        println!("\n{} {}\n", "✓".green().bold(), counts.green().bold());
    } else {
        println!("\n{} {}\n", "✗".red().bold(), counts.red().bold());
    }

    if let Some(logs) = &report.logs {
        println!("  Logs exported to: {}", logs.dimmed());
    }
}
