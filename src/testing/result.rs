//! Step outcome model shared by every step source

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::common::Error;

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum StepStatus {
    Pass,
    Fail,
}

impl StepStatus {
    /// Anything other than exactly `pass` counts as a failure
    pub fn normalize(raw: &str) -> Self {
        if raw == "pass" {
            StepStatus::Pass
        } else {
            StepStatus::Fail
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Pass => "pass",
            StepStatus::Fail => "fail",
        }
    }
}

impl From<String> for StepStatus {
    fn from(raw: String) -> Self {
        Self::normalize(&raw)
    }
}

/// Result of one step, produced once by whichever step source ran it
///
/// `details` is carried opaquely into the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    name: String,
    status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl StepResult {
    pub fn new(name: impl Into<String>, status: StepStatus, details: Option<Value>) -> Self {
        Self {
            name: name.into(),
            status,
            details: details.filter(|d| !d.is_null()),
        }
    }

    pub fn pass(name: impl Into<String>, details: Value) -> Self {
        Self::new(name, StepStatus::Pass, Some(details))
    }

    pub fn fail(name: impl Into<String>, details: Value) -> Self {
        Self::new(name, StepStatus::Fail, Some(details))
    }

    /// Failed step whose details are `{"error": <message>}`
    pub fn from_error(name: impl Into<String>, error: &Error) -> Self {
        Self::fail(name, json!({ "error": error.to_string() }))
    }

    /// Build from a `{name?, status?, details?}` mapping
    ///
    /// A missing name falls back to `fallback_name`; a missing status means
    /// the step passed.
    pub fn from_mapping(map: &Map<String, Value>, fallback_name: &str) -> Self {
        let name = match map.get("name") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => fallback_name.to_string(),
        };
        let status = match map.get("status") {
            None | Some(Value::Null) => StepStatus::Pass,
            Some(Value::String(s)) => StepStatus::normalize(s),
            Some(_) => StepStatus::Fail,
        };
        Self::new(name, status, map.get("details").cloned())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    pub fn is_pass(&self) -> bool {
        self.status == StepStatus::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_status_normalization() {
        assert_eq!(StepStatus::normalize("pass"), StepStatus::Pass);
        assert_eq!(StepStatus::normalize("PASS"), StepStatus::Fail);
        assert_eq!(StepStatus::normalize("ok"), StepStatus::Fail);
        assert_eq!(StepStatus::normalize(""), StepStatus::Fail);
    }

    #[test]
    fn test_from_mapping_defaults() {
        let step = StepResult::from_mapping(&mapping(json!({})), "hook_step_3");
        assert_eq!(step.name(), "hook_step_3");
        assert!(step.is_pass());
        assert!(step.details().is_none());
    }

    #[test]
    fn test_from_mapping_keeps_fields() {
        let step = StepResult::from_mapping(
            &mapping(json!({"name": "ping", "status": "skipped", "details": [1, 2]})),
            "lua_step_0",
        );
        assert_eq!(step.name(), "ping");
        assert_eq!(step.status(), StepStatus::Fail);
        assert_eq!(step.details(), Some(&json!([1, 2])));
    }

    #[test]
    fn test_from_mapping_non_string_status_fails() {
        let step = StepResult::from_mapping(&mapping(json!({"status": true})), "x");
        assert_eq!(step.status(), StepStatus::Fail);
    }

    #[test]
    fn test_serialization_omits_missing_details() {
        let step = StepResult::new("a", StepStatus::Pass, None);
        assert_eq!(serde_json::to_value(&step).unwrap(), json!({"name": "a", "status": "pass"}));

        let step = StepResult::new("b", StepStatus::Fail, Some(Value::Null));
        assert!(step.details().is_none());
    }

    #[test]
    fn test_deserialize_normalizes_status() {
        let step: StepResult =
            serde_json::from_value(json!({"name": "x", "status": "error"})).unwrap();
        assert_eq!(step.status(), StepStatus::Fail);
    }

    #[test]
    fn test_from_error_carries_message() {
        let step = StepResult::from_error("s", &Error::UnsupportedAction("frobnicate".into()));
        assert_eq!(step.details().unwrap()["error"], "Unsupported action 'frobnicate'");
        assert!(!step.is_pass());
    }
}
