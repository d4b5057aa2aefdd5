//! Declarative scenario format
//!
//! A scenario is `{name, steps}` in JSON or YAML. Steps stay opaque JSON
//! until they run so that a malformed descriptor only fails its own step.

use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};
use std::path::Path;

use crate::common::{Error, Result};

/// Actions understood by the declarative runner
pub const SUPPORTED_ACTIONS: &[&str] = &[
    "pd_enable",
    "dataset_set",
    "dataset_clear",
    "md_request",
    "assert_dataset",
    "sleep",
];

/// A scenario loaded from a JSON or YAML file
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Scenario {
    /// Name of the scenario, defaults to the file stem
    #[serde(default)]
    pub name: Option<String>,
    /// Optional description, printed under the scenario header
    #[serde(default)]
    pub description: Option<String>,
    /// Ordered action descriptors
    #[serde(default)]
    pub steps: Vec<Value>,
}

/// A decoded action descriptor
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Action {
    /// Enable or disable periodic data for a ComId
    PdEnable {
        com_id: u32,
        #[serde(default = "default_true")]
        enabled: bool,
    },
    /// Write one dataset element from a byte list or hex string
    DatasetSet {
        data_set_id: u32,
        element: u32,
        raw: Value,
    },
    /// Clear one element, or the whole dataset when no element key is given
    DatasetClear {
        data_set_id: u32,
        #[serde(default, deserialize_with = "present_element")]
        element: Option<u32>,
    },
    /// Send an MD request and optionally wait for / check its state
    MdRequest {
        com_id: u32,
        #[serde(default)]
        wait_ms: Option<Number>,
        #[serde(default)]
        expect_state: Option<String>,
    },
    /// Fetch a dataset and optionally look for a hex sequence in it
    AssertDataset {
        data_set_id: u32,
        #[serde(default)]
        expect_hex: Option<String>,
    },
    /// Pause the scenario
    Sleep {
        #[serde(default = "default_sleep_seconds")]
        seconds: Number,
    },
}

fn default_true() -> bool {
    true
}

fn default_sleep_seconds() -> Number {
    Number::from(1)
}

/// A present `element` key must hold an index; `null` is not "absent"
fn present_element<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    u32::deserialize(deserializer).map(Some)
}

impl Action {
    /// Decode a descriptor, rejecting unknown actions before field checks
    pub fn from_descriptor(descriptor: &Value) -> Result<Self> {
        if !descriptor.is_object() {
            return Err(Error::InvalidStep("step descriptor must be an object".to_string()));
        }
        let action = match descriptor.get("action") {
            Some(Value::String(s)) => s.as_str(),
            Some(other) => return Err(Error::UnsupportedAction(other.to_string())),
            None => return Err(Error::UnsupportedAction("None".to_string())),
        };
        if !SUPPORTED_ACTIONS.contains(&action) {
            return Err(Error::UnsupportedAction(action.to_string()));
        }
        serde_json::from_value(descriptor.clone()).map_err(|e| Error::InvalidStep(e.to_string()))
    }
}

/// Display name of a descriptor, `step_<index>` when unnamed
pub fn step_name(descriptor: &Value, index: usize) -> String {
    match descriptor.get("name") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => format!("step_{}", index),
    }
}

/// Load a scenario from a `.json`, `.yaml` or `.yml` file
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );

    let parse_error = |error: String| Error::ScenarioParse {
        path: path.display().to_string(),
        error,
    };

    let mut scenario: Scenario = if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?
    } else {
        serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?
    };

    if scenario.name.as_deref().map_or(true, str::is_empty) {
        scenario.name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
    }

    Ok(scenario)
}

/// Turn a raw dataset payload into bytes
///
/// Accepts a list of integers in `0..=255` or a hex string with an optional
/// `0x` prefix.
pub fn coerce_raw(value: &Value) -> Result<Vec<u8>> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| Error::Coercion(format!("raw byte out of range: {}", item)))
            })
            .collect(),
        Value::String(s) => {
            let s = s.trim();
            let hex = s
                .strip_prefix("0x")
                .or_else(|| s.strip_prefix("0X"))
                .unwrap_or(s);
            if hex.len() % 2 != 0 {
                return Err(Error::Coercion(
                    "hex payload must have an even number of characters".to_string(),
                ));
            }
            (0..hex.len())
                .step_by(2)
                .map(|i| {
                    hex.get(i..i + 2)
                        .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                        .ok_or_else(|| Error::Coercion(format!("invalid hex payload: {}", s)))
                })
                .collect()
        }
        _ => Err(Error::Coercion(
            "raw payload must be a list of integers or a hex string".to_string(),
        )),
    }
}
