//! In-process scripted hooks
//!
//! Hooks are compiled into the binary and registered by name. Each one gets
//! the simulator client and hands back its own step results, either as
//! ready-made [`StepResult`]s or as `{name, status, details}` mappings.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::common::{Error, Result};
use crate::simulator::types::session_id_of;
use crate::simulator::SimulatorClient;
use crate::testing::StepResult;

/// One item returned by a hook
#[derive(Debug, Clone)]
pub enum HookItem {
    /// Already a step result
    Step(StepResult),
    /// A `{name?, status?, details?}` mapping; any other JSON is a contract violation
    Value(Value),
}

impl From<StepResult> for HookItem {
    fn from(step: StepResult) -> Self {
        HookItem::Step(step)
    }
}

impl From<Value> for HookItem {
    fn from(value: Value) -> Self {
        HookItem::Value(value)
    }
}

/// A scripted extension that drives the simulator directly
#[async_trait]
pub trait ScenarioHook: Send + Sync {
    /// Name used to select the hook on the command line
    fn name(&self) -> &str;

    /// One-line description for `simharness hooks`
    fn description(&self) -> &str;

    /// Run the hook against the simulator
    async fn run(&self, client: &SimulatorClient) -> Result<Vec<HookItem>>;
}

/// Named set of available hooks, in registration order
#[derive(Default)]
pub struct HookRegistry {
    hooks: Vec<Box<dyn ScenarioHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the hooks shipped with the harness
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(BasicHook));
        registry
    }

    /// Add a hook; a later hook with the same name shadows an earlier one
    pub fn register(&mut self, hook: Box<dyn ScenarioHook>) {
        self.hooks.retain(|h| h.name() != hook.name());
        self.hooks.push(hook);
    }

    pub fn get(&self, name: &str) -> Option<&dyn ScenarioHook> {
        self.hooks.iter().find(|h| h.name() == name).map(|h| h.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn ScenarioHook> + '_ {
        self.hooks.iter().map(|h| h.as_ref())
    }

    /// Run the named hook and normalize what it returns
    ///
    /// Unknown names, hook errors and malformed items all abort the hook as
    /// a whole.
    pub async fn run(&self, name: &str, client: &SimulatorClient) -> Result<Vec<StepResult>> {
        let hook = self.get(name).ok_or_else(|| {
            let available: Vec<&str> = self.iter().map(|h| h.name()).collect();
            Error::HookContract(format!(
                "no embedded hook named '{}' (available: {})",
                name,
                available.join(", ")
            ))
        })?;

        tracing::info!(hook = name, "running embedded hook");
        let items = hook.run(client).await?;
        normalize_items(items)
    }
}

/// Convert hook items into step results, `hook_step_<idx>` for unnamed ones
pub fn normalize_items(items: Vec<HookItem>) -> Result<Vec<StepResult>> {
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| match item {
            HookItem::Step(step) => Ok(step),
            HookItem::Value(Value::Object(map)) => {
                Ok(StepResult::from_mapping(&map, &format!("hook_step_{}", idx)))
            }
            HookItem::Value(other) => Err(Error::HookContract(format!(
                "hook returned an unsupported result type at index {}: {}",
                idx, other
            ))),
        })
        .collect()
}

/// Smoke hook: read PD status, then round-trip one MD request
pub struct BasicHook;

impl BasicHook {
    const MD_COM_ID: u32 = 3001;
    const MD_WAIT: Duration = Duration::from_secs(2);
}

#[async_trait]
impl ScenarioHook for BasicHook {
    fn name(&self) -> &str {
        "basic"
    }

    fn description(&self) -> &str {
        "Fetch PD status, then send an MD request on ComId 3001 and wait for it"
    }

    async fn run(&self, client: &SimulatorClient) -> Result<Vec<HookItem>> {
        let mut items = Vec::new();

        let pd_status = client.get_pd_status().await?;
        items.push(StepResult::pass("fetch pd status", pd_status).into());

        let response = client.md_request(Self::MD_COM_ID).await?;
        match session_id_of(&response) {
            Some(session_id) => {
                let status = client
                    .wait_for_md(session_id, Self::MD_WAIT, client.poll_interval())
                    .await?;
                items.push(StepResult::pass("wait for md response", status).into());
            }
            None => items.push(
                StepResult::fail("wait for md response", json!({ "error": "no session created" }))
                    .into(),
            ),
        }

        Ok(items)
    }
}
