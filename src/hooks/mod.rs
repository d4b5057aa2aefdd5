//! Hook step sources
//!
//! Hooks drive the simulator themselves instead of going through declarative
//! steps. Embedded hooks run in-process against the [`SimulatorClient`];
//! Lua hooks run as child processes and only see the base URL.
//!
//! [`SimulatorClient`]: crate::simulator::SimulatorClient

pub mod embedded;
pub mod external;

pub use embedded::{normalize_items, BasicHook, HookItem, HookRegistry, ScenarioHook};
pub use external::{parse_output, LuaHook, BASE_URL_ENV};
