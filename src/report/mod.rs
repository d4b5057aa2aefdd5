//! Run report
//!
//! Folds the ordered step results of a run into a [`Report`], which is
//! written once as JSON and optionally as plain text.

mod console;

use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::paths::ensure_parent_dir;
use crate::common::Result;
use crate::testing::StepResult;

pub use console::{print_description, print_header, print_step, print_summary};

/// Pass/fail counts for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
    /// Seconds since the Unix epoch when the report was built
    pub timestamp: f64,
}

/// Terminal aggregate of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub name: String,
    pub base_url: String,
    pub summary: Summary,
    pub steps: Vec<StepResult>,
    /// Path of the exported diagnostic log, if any
    pub logs: Option<String>,
}

impl Report {
    /// Build the report; the timestamp is taken now
    pub fn build(name: &str, base_url: &str, steps: Vec<StepResult>, log_path: Option<&Path>) -> Self {
        let passed = steps.iter().filter(|s| s.is_pass()).count();
        let total = steps.len();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();

        Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            summary: Summary {
                passed,
                failed: total - passed,
                total,
                timestamp,
            },
            steps,
            logs: log_path.map(|p| p.display().to_string()),
        }
    }

    pub fn all_passed(&self) -> bool {
        self.summary.failed == 0
    }

    /// Plain-text rendering, a pure function of the report
    pub fn render_text(&self) -> String {
        let mut lines = vec![
            format!("Scenario: {}", self.name),
            format!("Base URL: {}", self.base_url),
            String::new(),
        ];

        for step in &self.steps {
            let prefix = if step.is_pass() { "PASS" } else { "FAIL" };
            lines.push(format!("[{}] {}", prefix, step.name()));
            if let Some(details) = step.details().filter(|d| has_content(d)) {
                lines.push(format!("    details: {}", inline_json(details)));
            }
        }

        lines.push(String::new());
        lines.push(format!(
            "Passed: {}  Failed: {}  Total: {}",
            self.summary.passed, self.summary.failed, self.summary.total
        ));
        if let Some(logs) = self.logs.as_deref().filter(|l| !l.is_empty()) {
            lines.push(format!("Logs exported to: {}", logs));
        }

        lines.join("\n")
    }

    /// Write the JSON report and, if asked, the text rendering
    pub fn write(&self, json_path: &Path, text_path: Option<&Path>) -> Result<()> {
        ensure_parent_dir(json_path)?;
        std::fs::write(json_path, serde_json::to_string_pretty(self)?)?;
        tracing::info!(path = %json_path.display(), "wrote JSON report");

        if let Some(text_path) = text_path {
            ensure_parent_dir(text_path)?;
            std::fs::write(text_path, self.render_text())?;
            tracing::info!(path = %text_path.display(), "wrote text report");
        }

        Ok(())
    }
}

/// Single-line JSON with a space after every `,` and `:`
fn inline_json(value: &Value) -> String {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, InlineFormatter);
    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8(buf).unwrap_or_else(|_| value.to_string()),
        Err(_) => value.to_string(),
    }
}

struct InlineFormatter;

impl serde_json::ser::Formatter for InlineFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Empty containers, empty strings, zero and false print no details line
fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
