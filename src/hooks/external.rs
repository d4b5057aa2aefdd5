//! Out-of-process Lua hooks
//!
//! The script runs under an external interpreter with the simulator base URL
//! in `SIM_BASE_URL` and must print a JSON array of
//! `{name?, status?, details?}` objects on stdout.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde_json::{json, Value};
use tokio::process::Command;

use crate::common::{Error, Result};
use crate::testing::StepResult;

/// Environment variable carrying the simulator base URL into the script
pub const BASE_URL_ENV: &str = "SIM_BASE_URL";

/// Interpreters tried when none are configured
pub const DEFAULT_INTERPRETERS: &[&str] = &["lua", "lua5.4"];

/// Runs Lua hook scripts as child processes
#[derive(Debug, Clone)]
pub struct LuaHook {
    interpreters: Vec<String>,
}

impl Default for LuaHook {
    fn default() -> Self {
        Self::new(DEFAULT_INTERPRETERS.iter().map(|s| s.to_string()).collect())
    }
}

impl LuaHook {
    /// Use the given interpreter names, tried in order
    pub fn new(interpreters: Vec<String>) -> Self {
        Self { interpreters }
    }

    /// Resolve the first interpreter found on PATH
    pub fn locate(&self) -> Result<PathBuf> {
        self.interpreters
            .iter()
            .find_map(|name| which::which(name).ok())
            .ok_or_else(|| Error::interpreter_not_found(&self.interpreters))
    }

    /// Run a script and parse its results
    ///
    /// A missing interpreter, a non-zero exit or unparsable output fails the
    /// whole hook; malformed entries only fail themselves.
    pub async fn run(&self, script: &Path, base_url: &str) -> Result<Vec<StepResult>> {
        let interpreter = self.locate()?;
        tracing::info!(
            interpreter = %interpreter.display(),
            script = %script.display(),
            "running Lua hook"
        );

        let output = Command::new(&interpreter)
            .arg(script)
            .env(BASE_URL_ENV, base_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                Error::HookProcess(format!("failed to start {}: {}", interpreter.display(), e))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(Error::HookProcess(message));
        }

        parse_output(&stdout)
    }
}

/// Parse a hook's stdout into step results
///
/// Non-object entries become failures named `lua_step_<idx>`. A top-level
/// value that is not an array yields no results.
pub fn parse_output(stdout: &str) -> Result<Vec<StepResult>> {
    let parsed: Value =
        serde_json::from_str(stdout).map_err(|e| Error::HookOutput(e.to_string()))?;

    let Value::Array(items) = parsed else {
        tracing::warn!("Lua hook output is not a JSON array, ignoring it");
        return Ok(Vec::new());
    };

    Ok(items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let fallback = format!("lua_step_{}", idx);
            match item {
                Value::Object(map) => StepResult::from_mapping(map, &fallback),
                _ => StepResult::fail(fallback, json!({ "error": "malformed Lua result" })),
            }
        })
        .collect())
}
