//! Simulator payload types
//!
//! The simulator mixes JSON and plain-text responses, so most calls yield a
//! loosely typed [`serde_json::Value`]. Only the pieces the harness reasons
//! about (MD session state, dataset hex cells) get typed accessors here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decoded body of a successful simulator response
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Empty body
    Empty,
    /// Body parsed as JSON
    Json(Value),
    /// UTF-8 body that is not JSON
    Text(String),
    /// Body that is not valid UTF-8
    Binary(Vec<u8>),
}

impl Payload {
    /// Classify a raw response body
    pub fn from_body(body: Vec<u8>) -> Self {
        if body.is_empty() {
            return Payload::Empty;
        }
        match String::from_utf8(body) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(value) => Payload::Json(value),
                Err(_) => Payload::Text(text),
            },
            Err(e) => Payload::Binary(e.into_bytes()),
        }
    }

    /// Collapse into a JSON value: empty becomes `null`, text becomes a string
    pub fn into_value(self) -> Value {
        match self {
            Payload::Empty => Value::Null,
            Payload::Json(value) => value,
            Payload::Text(text) => Value::String(text),
            Payload::Binary(bytes) => Value::String(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }
}

/// MD session states reported by the simulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MdState {
    Idle,
    RequestSent,
    WaitingReply,
    ReplyReceived,
    WaitingAck,
    Timeout,
    Error,
}

impl MdState {
    /// Parse the simulator's state string; unknown states yield `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IDLE" => Some(MdState::Idle),
            "REQUEST_SENT" => Some(MdState::RequestSent),
            "WAITING_REPLY" => Some(MdState::WaitingReply),
            "REPLY_RECEIVED" => Some(MdState::ReplyReceived),
            "WAITING_ACK" => Some(MdState::WaitingAck),
            "TIMEOUT" => Some(MdState::Timeout),
            "ERROR" => Some(MdState::Error),
            _ => None,
        }
    }

    /// States that end a wait on the session
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            MdState::ReplyReceived | MdState::WaitingAck | MdState::Timeout | MdState::Error
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MdState::Idle => "IDLE",
            MdState::RequestSent => "REQUEST_SENT",
            MdState::WaitingReply => "WAITING_REPLY",
            MdState::ReplyReceived => "REPLY_RECEIVED",
            MdState::WaitingAck => "WAITING_ACK",
            MdState::Timeout => "TIMEOUT",
            MdState::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for MdState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw `state` string of an MD status payload
pub fn state_of(status: &Value) -> Option<&str> {
    status.get("state").and_then(Value::as_str)
}

/// Whether a status payload is in a terminal MD state
pub fn is_terminal_status(status: &Value) -> bool {
    state_of(status)
        .and_then(MdState::parse)
        .map(MdState::is_terminal)
        .unwrap_or(false)
}

/// Session id returned by an MD request; zero means no session was created
pub fn session_id_of(response: &Value) -> Option<u64> {
    response
        .get("sessionId")
        .and_then(Value::as_u64)
        .filter(|id| *id != 0)
}

/// Concatenation of every cell's `rawHex` field in a dataset payload
pub fn dataset_hex(dataset: &Value) -> String {
    dataset
        .get("values")
        .and_then(Value::as_array)
        .map(|cells| {
            cells
                .iter()
                .filter_map(|cell| cell.get("rawHex").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default()
}
