//! HTTP client for the simulator control API

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Method;
use serde_json::{json, Value};
use tokio::time::Instant;

use crate::common::paths::ensure_parent_dir;
use crate::common::{Error, Result};

use super::types::{is_terminal_status, Payload};

/// Default delay between MD status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Connection options for [`SimulatorClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Timeout for establishing a TCP connection
    pub connect_timeout: Duration,
    /// Timeout for a whole request, if any
    pub request_timeout: Option<Duration>,
    /// Poll interval used by callers that do not pick their own
    pub poll_interval: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Client for the simulator HTTP API
///
/// Holds no session state between calls; the base URL is fixed at
/// construction.
#[derive(Debug, Clone)]
pub struct SimulatorClient {
    base_url: String,
    http: reqwest::Client,
    poll_interval: Duration,
}

impl SimulatorClient {
    /// Create a client with default options
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a client with explicit connection options
    pub fn with_options(base_url: &str, options: ClientOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(options.connect_timeout)
            .user_agent(concat!("simharness/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: strip_trailing_slash(base_url).to_string(),
            http,
            poll_interval: options.poll_interval,
        })
    }

    /// Base URL without its trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Default poll interval for MD waits
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Issue a request and decode the body
    async fn request(&self, method: Method, path: &str, payload: Option<&Value>) -> Result<Payload> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%method, %url, "simulator request");

        let mut request = self.http.request(method, &url);
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::unreachable(&url, e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::unreachable(&url, e))?;

        if !status.is_success() {
            return Err(Error::upstream(
                status.as_u16(),
                path,
                &String::from_utf8_lossy(&body),
            ));
        }

        Ok(Payload::from_body(body.to_vec()))
    }

    async fn call(&self, method: Method, path: &str, payload: Option<&Value>) -> Result<Value> {
        Ok(self.request(method, path, payload).await?.into_value())
    }

    pub async fn get_pd_status(&self) -> Result<Value> {
        self.call(Method::GET, "/api/pd/status", None).await
    }

    pub async fn enable_pd(&self, com_id: u32, enabled: bool) -> Result<Value> {
        let path = format!("/api/pd/{}/enable", com_id);
        self.call(Method::POST, &path, Some(&json!({ "enabled": enabled })))
            .await
    }

    pub async fn get_dataset(&self, data_set_id: u32) -> Result<Value> {
        self.call(Method::GET, &format!("/api/datasets/{}", data_set_id), None)
            .await
    }

    pub async fn set_dataset_element(&self, data_set_id: u32, element: u32, raw: &[u8]) -> Result<Value> {
        let path = format!("/api/datasets/{}/elements/{}", data_set_id, element);
        self.call(Method::POST, &path, Some(&json!({ "raw": raw })))
            .await
    }

    pub async fn clear_dataset_element(&self, data_set_id: u32, element: u32) -> Result<Value> {
        let path = format!("/api/datasets/{}/elements/{}", data_set_id, element);
        self.call(Method::POST, &path, Some(&json!({ "clear": true })))
            .await
    }

    pub async fn clear_dataset(&self, data_set_id: u32) -> Result<Value> {
        let path = format!("/api/datasets/{}/clear_all", data_set_id);
        self.call(Method::POST, &path, None).await
    }

    /// Start an MD request; the simulator answers with `{sessionId}`
    pub async fn md_request(&self, com_id: u32) -> Result<Value> {
        self.call(Method::POST, &format!("/api/md/{}/request", com_id), None)
            .await
    }

    pub async fn md_status(&self, session_id: u64) -> Result<Value> {
        self.call(Method::GET, &format!("/api/md/session/{}", session_id), None)
            .await
    }

    /// Poll an MD session until it reaches a terminal state
    ///
    /// Returns the terminal status as soon as it is seen. Stops early and
    /// returns the payload if the simulator answers with something that is
    /// not a status object. Otherwise returns the last fetched status once
    /// `timeout` has elapsed, or `null` if nothing was fetched.
    pub async fn wait_for_md(&self, session_id: u64, timeout: Duration, poll_interval: Duration) -> Result<Value> {
        let deadline = Instant::now() + timeout;
        let mut last = Value::Null;

        while Instant::now() < deadline {
            last = self.md_status(session_id).await?;
            if !last.is_object() {
                tracing::debug!(session_id, "md status is not an object, giving up");
                break;
            }
            if is_terminal_status(&last) {
                return Ok(last);
            }
            tokio::time::sleep(poll_interval).await;
        }

        tracing::debug!(session_id, ?timeout, "md wait ended without terminal state");
        Ok(last)
    }

    /// Export recent diagnostic events to `destination`
    ///
    /// Structured payloads are re-serialized as pretty JSON, text is written
    /// as-is and binary bodies are written raw.
    pub async fn export_logs(&self, destination: &Path, max_events: u32, as_json: bool) -> Result<PathBuf> {
        let mut path = format!("/api/diag/log/export?max={}", max_events);
        if as_json {
            path.push_str("&format=json");
        }

        let payload = self.request(Method::GET, &path, None).await?;
        ensure_parent_dir(destination)?;

        match payload {
            Payload::Empty => std::fs::write(destination, "")?,
            Payload::Json(value @ (Value::Object(_) | Value::Array(_))) => {
                std::fs::write(destination, serde_json::to_string_pretty(&value)?)?
            }
            Payload::Json(Value::String(text)) | Payload::Text(text) => {
                std::fs::write(destination, text)?
            }
            Payload::Json(other) => std::fs::write(destination, other.to_string())?,
            Payload::Binary(bytes) => std::fs::write(destination, bytes)?,
        }

        tracing::info!(path = %destination.display(), "exported diagnostic logs");
        Ok(destination.to_path_buf())
    }
}

fn strip_trailing_slash(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}
