//! Transport to the device simulator's HTTP control API
//!
//! [`SimulatorClient`] is the single seam every step source drives: the
//! declarative runner, embedded hooks, and (indirectly, through the base URL)
//! external Lua hooks.

pub mod client;
pub mod types;

#[cfg(test)]
pub(crate) mod stub;

pub use client::{ClientOptions, SimulatorClient, DEFAULT_POLL_INTERVAL};
pub use types::{MdState, Payload};
