//! Declarative step runner
//!
//! Executes scenario descriptors against the simulator client, one at a time
//! and in order. Every descriptor yields exactly one [`StepResult`]; a failing
//! descriptor is recorded and the run moves on.

use std::time::Duration;

use serde_json::{json, Number, Value};

use crate::common::{Error, Result};
use crate::simulator::types::{dataset_hex, session_id_of, state_of};
use crate::simulator::SimulatorClient;

use super::config::{coerce_raw, step_name, Action, Scenario};
use super::result::StepResult;

/// Runs declarative scenarios against one client
pub struct ScenarioRunner<'a> {
    client: &'a SimulatorClient,
    poll_interval: Duration,
}

impl<'a> ScenarioRunner<'a> {
    /// Runner polling MD sessions at the client's default interval
    pub fn new(client: &'a SimulatorClient) -> Self {
        Self {
            client,
            poll_interval: client.poll_interval(),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run every step of a scenario
    pub async fn run(&self, scenario: &Scenario) -> Vec<StepResult> {
        let mut results = Vec::with_capacity(scenario.steps.len());

        for (index, descriptor) in scenario.steps.iter().enumerate() {
            let name = step_name(descriptor, index);
            let result = match self.execute(descriptor).await {
                Ok(details) => StepResult::pass(name, details),
                Err(e) => {
                    tracing::warn!(step = %name, error = %e, transport = e.is_transport(), "step failed");
                    failed_step(name, &e)
                }
            };
            results.push(result);
        }

        results
    }

    /// Execute a single descriptor, returning the pass payload
    async fn execute(&self, descriptor: &Value) -> Result<Value> {
        let action = Action::from_descriptor(descriptor)?;
        tracing::debug!(?action, "executing step");

        match action {
            Action::PdEnable { com_id, enabled } => {
                self.client.enable_pd(com_id, enabled).await?;
                Ok(json!({ "comId": com_id, "enabled": enabled }))
            }
            Action::DatasetSet {
                data_set_id,
                element,
                raw,
            } => {
                let bytes = coerce_raw(&raw)?;
                self.client
                    .set_dataset_element(data_set_id, element, &bytes)
                    .await
            }
            Action::DatasetClear {
                data_set_id,
                element: Some(element),
            } => self.client.clear_dataset_element(data_set_id, element).await,
            Action::DatasetClear {
                data_set_id,
                element: None,
            } => self.client.clear_dataset(data_set_id).await,
            Action::MdRequest {
                com_id,
                wait_ms,
                expect_state,
            } => self.md_request(com_id, wait_ms, expect_state).await,
            Action::AssertDataset {
                data_set_id,
                expect_hex,
            } => self.assert_dataset(data_set_id, expect_hex).await,
            Action::Sleep { seconds } => {
                tokio::time::sleep(sleep_duration(&seconds)).await;
                Ok(json!({ "slept": seconds }))
            }
        }
    }

    async fn md_request(&self, com_id: u32, wait_ms: Option<Number>, expect_state: Option<String>) -> Result<Value> {
        let response = self.client.md_request(com_id).await?;

        let wait = wait_ms.as_ref().and_then(wait_duration);
        let status = match (session_id_of(&response), wait) {
            (Some(session_id), Some(timeout)) => {
                self.client
                    .wait_for_md(session_id, timeout, self.poll_interval)
                    .await?
            }
            _ => response,
        };

        if let Some(expected) = expect_state.filter(|s| !s.is_empty()) {
            if status.is_object() {
                let actual = state_of(&status).unwrap_or("None");
                if actual != expected {
                    return Err(Error::state_mismatch(&expected, actual));
                }
            }
        }

        Ok(status)
    }

    async fn assert_dataset(&self, data_set_id: u32, expect_hex: Option<String>) -> Result<Value> {
        let dataset = self.client.get_dataset(data_set_id).await?;

        if let Some(expected) = expect_hex.filter(|s| !s.is_empty()) {
            if dataset.is_object() {
                let hex = dataset_hex(&dataset).to_lowercase();
                if !hex.contains(&expected.to_lowercase()) {
                    return Err(Error::Assertion(format!(
                        "Expected hex sequence {} not found in dataset",
                        expected
                    )));
                }
            }
        }

        Ok(dataset)
    }
}

/// Failed step; state mismatches also carry both states as fields
fn failed_step(name: String, error: &Error) -> StepResult {
    match error {
        Error::StateMismatch { expected, actual } => StepResult::fail(
            name,
            json!({ "error": error.to_string(), "expected": expected, "actual": actual }),
        ),
        _ => StepResult::from_error(name, error),
    }
}

/// `waitMs` as a timeout; zero, negative or non-finite means no wait
fn wait_duration(wait_ms: &Number) -> Option<Duration> {
    let ms = wait_ms.as_f64()?;
    if ms > 0.0 {
        Duration::try_from_secs_f64(ms / 1000.0).ok()
    } else {
        None
    }
}

fn sleep_duration(seconds: &Number) -> Duration {
    let secs = seconds.as_f64().unwrap_or(1.0).max(0.0);
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::stub::{StubResponse, StubServer};
    use crate::testing::result::StepStatus;

    fn scenario(steps: Value) -> Scenario {
        Scenario {
            name: Some("test".to_string()),
            description: None,
            steps: steps.as_array().cloned().unwrap(),
        }
    }

    fn simulator_handler(req: &crate::simulator::stub::StubRequest) -> StubResponse {
        match (req.method.as_str(), req.path.as_str()) {
            ("POST", p) if p.ends_with("/enable") => StubResponse::json(json!({"ok": true})),
            ("POST", "/api/md/3001/request") => StubResponse::json(json!({"sessionId": 11})),
            ("POST", "/api/md/3002/request") => StubResponse::json(json!({"sessionId": 12})),
            ("POST", "/api/md/3003/request") => StubResponse::json(json!({"queued": true})),
            ("GET", "/api/md/session/11") => {
                StubResponse::json(json!({"sessionId": 11, "state": "REPLY_RECEIVED"}))
            }
            ("GET", "/api/md/session/12") => {
                StubResponse::json(json!({"sessionId": 12, "state": "TIMEOUT"}))
            }
            ("GET", "/api/datasets/1001") => StubResponse::json(json!({
                "dataSetId": 1001,
                "values": [{"rawHex": "00"}, {"rawHex": "ff"}, {"rawHex": "00"}]
            })),
            ("POST", p) if p.starts_with("/api/datasets/") => {
                StubResponse::json(json!({"applied": req.json()}))
            }
            ("GET", "/api/datasets/404") => StubResponse::error(404, "unknown dataset"),
            _ => StubResponse::error(500, "unexpected"),
        }
    }

    #[tokio::test]
    async fn test_one_result_per_descriptor_in_order() {
        let server = StubServer::start(simulator_handler).await;
        let client = SimulatorClient::new(&server.base_url).unwrap();

        let results = ScenarioRunner::new(&client)
            .run(&scenario(json!([
                {"name": "enable", "action": "pd_enable", "comId": 1000},
                {"action": "frobnicate"},
                {"name": "bad hex", "action": "dataset_set", "dataSetId": 1001, "element": 0, "raw": "0A1"},
                {"action": "assert_dataset", "dataSetId": 404},
                {"name": "nap", "action": "sleep", "seconds": 0}
            ])))
            .await;

        let names: Vec<&str> = results.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["enable", "step_1", "bad hex", "step_3", "nap"]);

        let statuses: Vec<StepStatus> = results.iter().map(|r| r.status()).collect();
        assert_eq!(
            statuses,
            vec![
                StepStatus::Pass,
                StepStatus::Fail,
                StepStatus::Fail,
                StepStatus::Fail,
                StepStatus::Pass
            ]
        );

        assert_eq!(results[0].details(), Some(&json!({"comId": 1000, "enabled": true})));
        assert_eq!(
            results[1].details().unwrap()["error"],
            "Unsupported action 'frobnicate'"
        );
        assert!(results[2].details().unwrap()["error"]
            .as_str()
            .unwrap()
            .contains("even number"));
        assert!(results[3].details().unwrap()["error"]
            .as_str()
            .unwrap()
            .contains("HTTP 404"));
        assert_eq!(results[4].details(), Some(&json!({"slept": 0})));
    }

    #[tokio::test]
    async fn test_dataset_set_and_clear() {
        let server = StubServer::start(simulator_handler).await;
        let client = SimulatorClient::new(&server.base_url).unwrap();

        let results = ScenarioRunner::new(&client)
            .run(&scenario(json!([
                {"action": "dataset_set", "dataSetId": 1001, "element": 2, "raw": "0x0A1B"},
                {"action": "dataset_set", "dataSetId": 1001, "element": 3, "raw": [1, 2]},
                {"action": "dataset_clear", "dataSetId": 1001, "element": 2},
                {"action": "dataset_clear", "dataSetId": 1001}
            ])))
            .await;

        assert!(results.iter().all(StepResult::is_pass));
        assert_eq!(results[0].details().unwrap()["applied"], json!({"raw": [10, 27]}));

        let paths: Vec<String> = server.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            vec![
                "/api/datasets/1001/elements/2",
                "/api/datasets/1001/elements/3",
                "/api/datasets/1001/elements/2",
                "/api/datasets/1001/clear_all"
            ]
        );
        assert_eq!(server.requests()[2].json(), json!({"clear": true}));
    }

    #[tokio::test]
    async fn test_md_request_expect_state_match() {
        let server = StubServer::start(simulator_handler).await;
        let client = SimulatorClient::new(&server.base_url).unwrap();

        let results = ScenarioRunner::new(&client)
            .with_poll_interval(Duration::from_millis(10))
            .run(&scenario(json!([
                {"action": "md_request", "comId": 3001, "waitMs": 1000, "expectState": "REPLY_RECEIVED"}
            ])))
            .await;

        assert!(results[0].is_pass());
        assert_eq!(results[0].details().unwrap()["state"], "REPLY_RECEIVED");
    }

    #[tokio::test]
    async fn test_md_request_expect_state_mismatch() {
        let server = StubServer::start(simulator_handler).await;
        let client = SimulatorClient::new(&server.base_url).unwrap();

        let results = ScenarioRunner::new(&client)
            .run(&scenario(json!([
                {"action": "md_request", "comId": 3002, "waitMs": 1000, "expectState": "REPLY_RECEIVED"}
            ])))
            .await;

        assert!(!results[0].is_pass());
        let details = results[0].details().unwrap();
        assert_eq!(details["expected"], "REPLY_RECEIVED");
        assert_eq!(details["actual"], "TIMEOUT");
        let error = details["error"].as_str().unwrap();
        assert!(error.contains("TIMEOUT") && error.contains("REPLY_RECEIVED"));
    }

    #[tokio::test]
    async fn test_md_request_without_wait_does_not_poll() {
        let server = StubServer::start(simulator_handler).await;
        let client = SimulatorClient::new(&server.base_url).unwrap();

        let results = ScenarioRunner::new(&client)
            .run(&scenario(json!([
                {"action": "md_request", "comId": 3001},
                {"action": "md_request", "comId": 3003, "waitMs": 500}
            ])))
            .await;

        assert_eq!(results[0].details(), Some(&json!({"sessionId": 11})));
        assert_eq!(results[1].details(), Some(&json!({"queued": true})));
        assert_eq!(server.count("/api/md/session/"), 0);
    }

    #[tokio::test]
    async fn test_assert_dataset_hex_containment() {
        let server = StubServer::start(simulator_handler).await;
        let client = SimulatorClient::new(&server.base_url).unwrap();

        let results = ScenarioRunner::new(&client)
            .run(&scenario(json!([
                {"action": "assert_dataset", "dataSetId": 1001, "expectHex": "FF"},
                {"action": "assert_dataset", "dataSetId": 1001, "expectHex": "ff00"},
                {"action": "assert_dataset", "dataSetId": 1001, "expectHex": "ABCD"}
            ])))
            .await;

        assert!(results[0].is_pass());
        assert_eq!(results[0].details().unwrap()["dataSetId"], 1001);
        assert!(results[1].is_pass());
        assert!(!results[2].is_pass());
        assert!(results[2].details().unwrap()["error"]
            .as_str()
            .unwrap()
            .contains("ABCD"));
    }

    #[tokio::test]
    async fn test_unreachable_simulator_fails_every_step() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = SimulatorClient::new(&format!("http://{}", addr)).unwrap();

        let results = ScenarioRunner::new(&client)
            .run(&scenario(json!([
                {"action": "pd_enable", "comId": 1},
                {"action": "md_request", "comId": 2},
                {"action": "sleep", "seconds": 0}
            ])))
            .await;

        assert_eq!(results.len(), 3);
        assert!(!results[0].is_pass());
        assert!(!results[1].is_pass());
        assert!(results[2].is_pass());
        assert!(results[0].details().unwrap()["error"]
            .as_str()
            .unwrap()
            .contains("Failed to reach simulator"));
    }

    #[tokio::test]
    async fn test_md_request_fractional_wait_polls() {
        let server = StubServer::start(simulator_handler).await;
        let client = SimulatorClient::new(&server.base_url).unwrap();

        let results = ScenarioRunner::new(&client)
            .with_poll_interval(Duration::from_millis(10))
            .run(&scenario(json!([
                {"action": "md_request", "comId": 3001, "waitMs": 500.0, "expectState": "REPLY_RECEIVED"},
                {"action": "md_request", "comId": 3001, "waitMs": -5}
            ])))
            .await;

        assert!(results[0].is_pass(), "{:?}", results[0]);
        assert_eq!(results[0].details().unwrap()["state"], "REPLY_RECEIVED");
        assert_eq!(results[1].details(), Some(&json!({"sessionId": 11})));
        assert_eq!(server.count("/api/md/session/"), 1);
    }

    #[tokio::test]
    async fn test_dataset_clear_null_element_fails_without_request() {
        let server = StubServer::start(simulator_handler).await;
        let client = SimulatorClient::new(&server.base_url).unwrap();

        let results = ScenarioRunner::new(&client)
            .run(&scenario(json!([
                {"name": "null element", "action": "dataset_clear", "dataSetId": 1001, "element": null},
                {"action": "dataset_clear", "dataSetId": 1001}
            ])))
            .await;

        assert!(!results[0].is_pass());
        assert!(results[0].details().unwrap()["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid step"));
        assert!(results[1].is_pass());
        assert_eq!(server.count("/api/datasets/1001/clear_all"), 1);
        assert_eq!(server.requests().len(), 1);
    }

    #[test]
    fn test_wait_duration() {
        assert_eq!(wait_duration(&Number::from(250)), Some(Duration::from_millis(250)));
        assert_eq!(
            wait_duration(&Number::from_f64(500.0).unwrap()),
            Some(Duration::from_millis(500))
        );
        assert_eq!(wait_duration(&Number::from(0)), None);
        assert_eq!(wait_duration(&Number::from(-10)), None);
    }

    #[test]
    fn test_sleep_duration_clamps_negative() {
        assert_eq!(sleep_duration(&Number::from(-3)), Duration::ZERO);
        assert_eq!(sleep_duration(&Number::from(2)), Duration::from_secs(2));
    }
}
