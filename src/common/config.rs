//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Simulator connection settings
    #[serde(default)]
    pub simulator: SimulatorConfig,

    /// MD polling settings
    #[serde(default)]
    pub polling: PollingConfig,

    /// Report output settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Diagnostic log export settings
    #[serde(default)]
    pub logs: LogExportConfig,

    /// External Lua hook settings
    #[serde(default)]
    pub lua: LuaConfig,
}

/// Simulator connection settings
#[derive(Debug, Deserialize)]
pub struct SimulatorConfig {
    /// Base URL of the simulator HTTP API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for establishing a connection
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Timeout for a whole request, 0 disables it
    #[serde(default)]
    pub request_timeout_secs: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: 0,
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}
fn default_connect_timeout() -> u64 {
    5
}

/// MD polling settings
#[derive(Debug, Deserialize)]
pub struct PollingConfig {
    /// Delay between session status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl PollingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_poll_interval() -> u64 {
    200
}

/// Report output settings
#[derive(Debug, Deserialize)]
pub struct ReportConfig {
    /// Where the JSON report is written
    #[serde(default = "default_report_path")]
    pub json_path: PathBuf,

    /// Optional plain-text report
    #[serde(default)]
    pub text_path: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            json_path: default_report_path(),
            text_path: None,
        }
    }
}

fn default_report_path() -> PathBuf {
    PathBuf::from("reports/automation_report.json")
}

/// Diagnostic log export settings
#[derive(Debug, Deserialize)]
pub struct LogExportConfig {
    /// Number of diagnostic events to request
    #[serde(default = "default_max_events")]
    pub max_events: u32,

    /// Request structured JSON instead of text
    #[serde(default)]
    pub as_json: bool,
}

impl Default for LogExportConfig {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            as_json: false,
        }
    }
}

fn default_max_events() -> u32 {
    200
}

/// External Lua hook settings
#[derive(Debug, Deserialize)]
pub struct LuaConfig {
    /// Interpreter names tried in order
    #[serde(default = "default_interpreters")]
    pub interpreters: Vec<String>,
}

impl Default for LuaConfig {
    fn default() -> Self {
        Self {
            interpreters: default_interpreters(),
        }
    }
}

fn default_interpreters() -> Vec<String> {
    vec!["lua".to_string(), "lua5.4".to_string()]
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.simulator.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.polling.poll_interval(), Duration::from_millis(200));
        assert_eq!(config.report.json_path, PathBuf::from("reports/automation_report.json"));
        assert_eq!(config.logs.max_events, 200);
        assert_eq!(config.lua.interpreters, vec!["lua", "lua5.4"]);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[simulator]
base_url = "http://10.0.0.5:9000"

[polling]
poll_interval_ms = 50
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.simulator.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.simulator.connect_timeout_secs, 5);
        assert_eq!(config.polling.poll_interval_ms, 50);
        assert!(!config.logs.as_json);
    }

    #[test]
    fn test_invalid_file_is_config_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[simulator\nbase_url = 3").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, super::super::Error::ConfigParse(_)));
    }
}
