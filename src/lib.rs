//! Simulator harness - scenario-driven testing for device simulators
//!
//! This library drives a simulator's HTTP control API from declarative
//! scenarios, embedded hooks and external Lua scripts, and aggregates the
//! outcome into a report.

pub mod cli;
pub mod commands;
pub mod common;
pub mod hooks;
pub mod report;
pub mod simulator;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use report::Report;
pub use simulator::SimulatorClient;
pub use testing::StepResult;
