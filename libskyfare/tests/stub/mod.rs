//! In-process stand-in for the flight-search backend
//!
//! Serves the `/api` endpoints from in-memory JSON on `127.0.0.1:<random>`.
//! Also included by the CLI crates' tests, so it only depends on axum,
//! tokio and serde_json.

#![allow(dead_code)]

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct StubState {
    offers: Mutex<Vec<Value>>,
    search_error: Mutex<Option<String>>,
    watchers: Mutex<Vec<Value>>,
    alerts: Mutex<Vec<Value>>,
    history: Mutex<HashMap<String, Vec<Value>>>,
    requests: Mutex<Vec<String>>,
    last_body: Mutex<Option<Value>>,
    next_id: AtomicU64,
    bare_acks: AtomicBool,
}

type Shared = Arc<StubState>;
type Reply = (StatusCode, Json<Value>);

fn ok(data: Value) -> Reply {
    (StatusCode::OK, Json(json!({ "success": true, "data": data })))
}

fn fail(status: StatusCode, error: &str) -> Reply {
    (status, Json(json!({ "success": false, "error": error })))
}

/// Confirmation for pause/resume/delete/read; bare mode leaves `data` out
fn ack(state: &StubState, data: Value) -> Reply {
    if state.bare_acks.load(Ordering::SeqCst) {
        (StatusCode::OK, Json(json!({ "success": true })))
    } else {
        ok(data)
    }
}

impl StubState {
    fn record(&self, line: String, body: Option<Value>) {
        self.requests.lock().unwrap().push(line);
        if body.is_some() {
            *self.last_body.lock().unwrap() = body;
        }
    }
}

pub struct StubServer {
    pub base_url: String,
    pub state: Shared,
    handle: tokio::task::JoinHandle<()>,
}

impl StubServer {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(StubState::default());
        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
            handle,
        }
    }

    pub fn set_offers(&self, offers: Vec<Value>) {
        *self.state.offers.lock().unwrap() = offers;
    }

    pub fn fail_searches(&self, error: &str) {
        *self.state.search_error.lock().unwrap() = Some(error.to_string());
    }

    /// Add a watcher owned by `user`; returns its id
    pub fn seed_watcher(&self, user: &str, mut watcher: Value) -> String {
        let id = watcher["id"].as_str().map(str::to_string).unwrap_or_else(|| {
            format!("w{}", self.state.next_id.fetch_add(1, Ordering::SeqCst) + 1)
        });
        watcher["id"] = json!(id);
        watcher["user_identifier"] = json!(user);
        self.state.watchers.lock().unwrap().push(watcher);
        id
    }

    /// Confirm mutations with `{"success": true}` and nothing else
    pub fn bare_acks(&self) {
        self.state.bare_acks.store(true, Ordering::SeqCst);
    }

    pub fn seed_alert(&self, alert: Value) {
        self.state.alerts.lock().unwrap().push(alert);
    }

    pub fn seed_history(&self, watcher_id: &str, entries: Vec<Value>) {
        self.state
            .history
            .lock()
            .unwrap()
            .insert(watcher_id.to_string(), entries);
    }

    /// `"METHOD /path"` for every request received, in order
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn last_body(&self) -> Option<Value> {
        self.state.last_body.lock().unwrap().clone()
    }

    pub fn watchers(&self) -> Vec<Value> {
        self.state.watchers.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<Value> {
        self.state.alerts.lock().unwrap().clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn offer(price: f64, airline: &str, code: &str) -> Value {
    json!({
        "price": price,
        "currency": "MXN",
        "departure_at": "2026-11-15T08:30:00",
        "arrival_at": "2026-11-16T06:10:00",
        "duration": "PT14H40M",
        "stops": 1,
        "airline": airline,
        "airline_code": code,
        "segments": [
            { "origin": "MEX", "destination": "MAD", "carrier_code": code, "flight_number": "100" },
            { "origin": "MAD", "destination": "VIE", "carrier_code": code, "flight_number": "200" }
        ]
    })
}

pub fn watcher(origin: &str, destination: &str, target: f64, active: bool, last: Option<f64>) -> Value {
    let checked_at = last.map(|_| "2026-10-16T09:00:00Z");
    json!({
        "origin": origin,
        "destination": destination,
        "travel_date": "2026-12-01",
        "target_price": target,
        "currency": "MXN",
        "is_active": active,
        "created_at": "2026-10-01T10:00:00Z",
        "last_checked_at": checked_at,
        "last_price": last
    })
}

pub fn alert(id: &str, watcher_id: &str, route: &str, new_price: f64, is_read: bool) -> Value {
    json!({
        "id": id,
        "watcher_id": watcher_id,
        "route": route,
        "old_price": new_price + 1500.0,
        "new_price": new_price,
        "is_read": is_read,
        "triggered_at": "2026-10-16T08:00:00Z"
    })
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/flights/search", post(search_handler))
        .route("/api/flights/cheapest", post(cheapest_handler))
        .route("/api/watchers", get(list_watchers_handler).post(create_watcher_handler))
        .route("/api/watchers/{id}", delete(delete_watcher_handler))
        .route("/api/watchers/{id}/pause", post(pause_handler))
        .route("/api/watchers/{id}/resume", post(resume_handler))
        .route("/api/watchers/{id}/history", get(history_handler))
        .route("/api/alerts", get(list_alerts_handler))
        .route("/api/alerts/{id}/read", post(read_alert_handler))
        .with_state(state)
}

async fn search_handler(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    state.record("POST /flights/search".to_string(), Some(body));
    if let Some(error) = state.search_error.lock().unwrap().clone() {
        return fail(StatusCode::BAD_GATEWAY, &error);
    }
    ok(Value::Array(state.offers.lock().unwrap().clone()))
}

async fn cheapest_handler(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    state.record("POST /flights/cheapest".to_string(), Some(body));
    if let Some(error) = state.search_error.lock().unwrap().clone() {
        return fail(StatusCode::BAD_GATEWAY, &error);
    }
    match state.offers.lock().unwrap().first() {
        Some(offer) => ok(offer.clone()),
        None => fail(StatusCode::NOT_FOUND, "No flights found"),
    }
}

async fn list_watchers_handler(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    state.record("GET /watchers".to_string(), None);
    let Some(user) = params.get("user_identifier") else {
        return fail(StatusCode::BAD_REQUEST, "user_identifier is required");
    };
    let mine: Vec<Value> = state
        .watchers
        .lock()
        .unwrap()
        .iter()
        .filter(|w| w["user_identifier"] == json!(user))
        .cloned()
        .collect();
    ok(Value::Array(mine))
}

async fn create_watcher_handler(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    state.record("POST /watchers".to_string(), Some(body.clone()));
    if body["target_price"].as_f64().unwrap_or(0.0) <= 0.0 {
        return fail(StatusCode::UNPROCESSABLE_ENTITY, "target_price must be positive");
    }

    let id = format!("w{}", state.next_id.fetch_add(1, Ordering::SeqCst) + 1);
    let watcher = json!({
        "id": id,
        "user_identifier": body["user_identifier"],
        "origin": body["origin"],
        "destination": body["destination"],
        "travel_date": body["travel_date"],
        "target_price": body["target_price"],
        "currency": body["currency"],
        "is_active": true,
        "created_at": "2026-10-16T12:00:00Z",
        "last_checked_at": null,
        "last_price": null
    });
    state.watchers.lock().unwrap().push(watcher.clone());
    ok(watcher)
}

fn set_active(state: &StubState, id: &str, active: bool) -> Reply {
    let mut watchers = state.watchers.lock().unwrap();
    match watchers.iter_mut().find(|w| w["id"] == json!(id)) {
        Some(w) => {
            w["is_active"] = json!(active);
            ack(state, json!({ "id": id, "is_active": active }))
        }
        None => fail(StatusCode::NOT_FOUND, "Watcher not found"),
    }
}

async fn pause_handler(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    state.record(format!("POST /watchers/{}/pause", id), None);
    set_active(&state, &id, false)
}

async fn resume_handler(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    state.record(format!("POST /watchers/{}/resume", id), None);
    set_active(&state, &id, true)
}

async fn delete_watcher_handler(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    state.record(format!("DELETE /watchers/{}", id), None);
    let mut watchers = state.watchers.lock().unwrap();
    let before = watchers.len();
    watchers.retain(|w| w["id"] != json!(id));
    if watchers.len() == before {
        return fail(StatusCode::NOT_FOUND, "Watcher not found");
    }
    if state.bare_acks.load(Ordering::SeqCst) {
        return (StatusCode::OK, Json(json!({ "success": true, "data": null })));
    }
    ok(json!({ "id": id }))
}

async fn history_handler(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    state.record(format!("GET /watchers/{}/history", id), None);
    match state.history.lock().unwrap().get(&id) {
        Some(entries) => ok(Value::Array(entries.clone())),
        None => fail(StatusCode::NOT_FOUND, "Watcher not found"),
    }
}

async fn list_alerts_handler(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    state.record("GET /alerts".to_string(), None);
    let unread_only = params.get("unread_only").map(String::as_str) == Some("true");
    let alerts = state.alerts.lock().unwrap();
    let unread_count = alerts.iter().filter(|a| a["is_read"] == json!(false)).count();
    let listed: Vec<Value> = alerts
        .iter()
        .filter(|a| !unread_only || a["is_read"] == json!(false))
        .cloned()
        .collect();

    (
        StatusCode::OK,
        Json(json!({ "success": true, "data": listed, "unread_count": unread_count })),
    )
}

async fn read_alert_handler(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    state.record(format!("POST /alerts/{}/read", id), None);
    let mut alerts = state.alerts.lock().unwrap();
    match alerts.iter_mut().find(|a| a["id"] == json!(id)) {
        Some(a) => {
            a["is_read"] = json!(true);
            ack(&state, json!({ "id": id }))
        }
        None => fail(StatusCode::NOT_FOUND, "Alert not found"),
    }
}
