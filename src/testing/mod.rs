//! Declarative scenario execution
//!
//! Reads JSON or YAML scenarios and drives the simulator client step by
//! step, producing one [`StepResult`] per descriptor.

mod config;
mod result;
mod runner;

pub use config::{coerce_raw, load_scenario, step_name, Action, Scenario, SUPPORTED_ACTIONS};
pub use result::{StepResult, StepStatus};
pub use runner::ScenarioRunner;
