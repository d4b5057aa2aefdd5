//! Error types for the simulator harness
//!
//! Step-level errors end up verbatim in a failed step's `details.error`,
//! so messages are kept short and self-explanatory.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the simulator harness
#[derive(Error, Debug)]
pub enum Error {
    // === Transport Errors ===
    #[error("HTTP {status} for {path}: {body}")]
    Upstream {
        status: u16,
        path: String,
        body: String,
    },

    #[error("Failed to reach simulator at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    // === Step Errors ===
    #[error("{0}")]
    Coercion(String),

    #[error("MD state {actual} did not match expected {expected}")]
    StateMismatch { expected: String, actual: String },

    #[error("Unsupported action '{0}'")]
    UnsupportedAction(String),

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Invalid step: {0}")]
    InvalidStep(String),

    // === Hook Errors ===
    #[error("Hook contract violated: {0}")]
    HookContract(String),

    #[error("Lua interpreter not found (searched: {searched}); install lua or lua5.4 to run Lua hooks")]
    InterpreterNotFound { searched: String },

    #[error("Lua hook failed: {0}")]
    HookProcess(String),

    #[error("Lua hook did not emit JSON results: {0}")]
    HookOutput(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to parse scenario '{path}': {error}")]
    ScenarioParse { path: String, error: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an upstream (non-2xx) error
    pub fn upstream(status: u16, path: &str, body: &str) -> Self {
        Self::Upstream {
            status,
            path: path.to_string(),
            body: body.to_string(),
        }
    }

    /// Create an unreachable error from any displayable transport failure
    pub fn unreachable(url: &str, reason: impl std::fmt::Display) -> Self {
        Self::Unreachable {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a state mismatch error
    pub fn state_mismatch(expected: &str, actual: &str) -> Self {
        Self::StateMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an interpreter not found error with the names that were tried
    pub fn interpreter_not_found<S: AsRef<str>>(names: &[S]) -> Self {
        Self::InterpreterNotFound {
            searched: names.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", "),
        }
    }

    /// Whether this error came from talking to the simulator
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Upstream { .. } | Error::Unreachable { .. })
    }
}
