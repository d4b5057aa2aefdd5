//! Mock device simulator for integration testing
//!
//! Serves a small, stateful imitation of the simulator HTTP API on an
//! ephemeral port and prints `listening at: <addr>` once ready.
//!
//! MD behaviour is keyed on the ComId:
//! - `4040` never creates a session (`sessionId: 0`)
//! - `5000` creates a session that ends in `TIMEOUT`
//! - anything else walks REQUEST_SENT, WAITING_REPLY, REPLY_RECEIVED

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use simharness::common::logging;

const NO_SESSION_COM_ID: u32 = 4040;
const TIMEOUT_COM_ID: u32 = 5000;

type SharedState = Arc<Mutex<MockState>>;

#[tokio::main]
async fn main() {
    logging::init_mock();

    let bind = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:0".to_string());
    let listener = match tokio::net::TcpListener::bind(&bind).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("failed to bind {}: {}", bind, e);
            std::process::exit(1);
        }
    };
    let addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            eprintln!("failed to read local address: {}", e);
            std::process::exit(1);
        }
    };

    println!("mock simulator listening at: {}", addr);
    std::io::stdout().flush().ok();

    let state = SharedState::default();
    if let Err(e) = axum::serve(listener, router(state)).await {
        eprintln!("mock simulator stopped: {}", e);
        std::process::exit(1);
    }
}

fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/pd/status", get(pd_status))
        .route("/api/pd/:com_id/enable", post(pd_enable))
        .route("/api/datasets/:id", get(dataset))
        .route("/api/datasets/:id/elements/:element", post(dataset_element))
        .route("/api/datasets/:id/clear_all", post(dataset_clear))
        .route("/api/md/:com_id/request", post(md_request))
        .route("/api/md/session/:id", get(md_session))
        .route("/api/diag/log/export", get(log_export))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), record_event))
        .with_state(state)
}

struct Session {
    com_id: u32,
    polls: u32,
}

impl Session {
    fn state(&self) -> &'static str {
        if self.com_id == TIMEOUT_COM_ID {
            return if self.polls == 0 { "WAITING_REPLY" } else { "TIMEOUT" };
        }
        match self.polls {
            0 => "REQUEST_SENT",
            1 => "WAITING_REPLY",
            _ => "REPLY_RECEIVED",
        }
    }
}

#[derive(Default)]
struct MockState {
    pd_enabled: BTreeMap<u32, bool>,
    datasets: HashMap<u32, BTreeMap<u32, Vec<u8>>>,
    sessions: HashMap<u64, Session>,
    next_session: u64,
    events: Vec<String>,
}

fn lock(state: &SharedState) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Every handled request becomes one diagnostic event
async fn record_event(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;
    tracing::info!(%method, %path, status = response.status().as_u16(), "request");
    lock(&state)
        .events
        .push(format!("{} {} -> {}", method, path, response.status().as_u16()));
    response
}

async fn not_found(request: Request) -> Response {
    (StatusCode::NOT_FOUND, format!("no route for {}", request.uri().path())).into_response()
}

async fn pd_status(State(state): State<SharedState>) -> Json<Value> {
    let telegrams: Vec<Value> = lock(&state)
        .pd_enabled
        .iter()
        .map(|(com_id, enabled)| json!({ "comId": com_id, "enabled": enabled }))
        .collect();
    Json(json!({ "telegrams": telegrams }))
}

async fn pd_enable(
    State(state): State<SharedState>,
    Path(com_id): Path<u32>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let enabled = body.get("enabled").and_then(Value::as_bool).unwrap_or(true);
    lock(&state).pd_enabled.insert(com_id, enabled);
    Json(json!({ "comId": com_id, "enabled": enabled }))
}

async fn dataset(State(state): State<SharedState>, Path(id): Path<u32>) -> Json<Value> {
    let values: Vec<Value> = lock(&state)
        .datasets
        .get(&id)
        .map(|cells| {
            cells
                .iter()
                .map(|(element, raw)| json!({ "element": element, "rawHex": hex(raw) }))
                .collect()
        })
        .unwrap_or_default();
    Json(json!({ "dataSetId": id, "values": values }))
}

async fn dataset_element(
    State(state): State<SharedState>,
    Path((id, element)): Path<(u32, u32)>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    let cells = state.datasets.entry(id).or_default();

    if body.get("clear").and_then(Value::as_bool) == Some(true) {
        cells.remove(&element);
        return Json(json!({ "ok": true })).into_response();
    }

    let Some(raw) = body.get("raw").and_then(Value::as_array) else {
        return (StatusCode::BAD_REQUEST, "expected 'raw' or 'clear'").into_response();
    };
    let bytes: Option<Vec<u8>> = raw
        .iter()
        .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
        .collect();
    match bytes {
        Some(bytes) => {
            cells.insert(element, bytes);
            Json(json!({ "ok": true })).into_response()
        }
        None => (StatusCode::BAD_REQUEST, "raw must be a list of bytes").into_response(),
    }
}

async fn dataset_clear(State(state): State<SharedState>, Path(id): Path<u32>) -> Json<Value> {
    lock(&state).datasets.remove(&id);
    Json(json!({ "ok": true }))
}

async fn md_request(State(state): State<SharedState>, Path(com_id): Path<u32>) -> Json<Value> {
    if com_id == NO_SESSION_COM_ID {
        return Json(json!({ "sessionId": 0 }));
    }
    let mut state = lock(&state);
    state.next_session += 1;
    let id = state.next_session;
    state.sessions.insert(id, Session { com_id, polls: 0 });
    Json(json!({ "sessionId": id }))
}

async fn md_session(State(state): State<SharedState>, Path(id): Path<u64>) -> Response {
    let mut state = lock(&state);
    let Some(session) = state.sessions.get_mut(&id) else {
        return (StatusCode::NOT_FOUND, format!("unknown session {}", id)).into_response();
    };
    let md_state = session.state();
    session.polls += 1;
    Json(json!({ "sessionId": id, "comId": session.com_id, "state": md_state })).into_response()
}

#[derive(Deserialize)]
struct ExportQuery {
    max: Option<usize>,
    format: Option<String>,
}

async fn log_export(State(state): State<SharedState>, Query(query): Query<ExportQuery>) -> Response {
    let state = lock(&state);
    let max = query.max.unwrap_or(200);
    let start = state.events.len().saturating_sub(max);
    let recent = &state.events[start..];

    if query.format.as_deref() == Some("json") {
        let events: Vec<Value> = recent
            .iter()
            .map(|line| json!({ "level": "INFO", "message": line }))
            .collect();
        Json(json!({ "events": events })).into_response()
    } else {
        let text: String = recent.iter().map(|line| format!("INFO {}\n", line)).collect();
        text.into_response()
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
