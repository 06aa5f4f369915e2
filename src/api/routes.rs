//! API route definitions.
//!
//! The observable state surface is read-only; all mutation goes through
//! the operator-control POST endpoints, which map 1:1 onto the sentinel's
//! operator methods.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/state", get(sentinel_state))
        .route("/history", get(probe_history))
        .route("/logs", get(logs))
        .route("/sentinel/start", post(start))
        .route("/sentinel/stop", post(stop))
        .route("/chaos/inject", post(inject_chaos))
        .route("/chaos/clear", post(clear_chaos))
}

async fn health() -> Json<Value> {
    Json(json!({
        "data": {
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION")
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

async fn sentinel_state(State(app): State<AppState>) -> Json<Value> {
    let snapshot = app.sentinel.snapshot().await;
    Json(json!({
        "data": snapshot,
        "meta": { "timestamp": chrono::Utc::now().to_rfc3339() }
    }))
}

async fn probe_history(State(app): State<AppState>) -> Json<Value> {
    let readings = app.sentinel.history().await;
    let total = readings.len();
    Json(json!({ "data": readings, "meta": { "total": total } }))
}

async fn logs(State(app): State<AppState>) -> Json<Value> {
    let entries = app.sentinel.logs().await;
    let total = entries.len();
    Json(json!({ "data": entries, "meta": { "total": total } }))
}

async fn start(State(app): State<AppState>) -> Json<Value> {
    let started = app.sentinel.start().await;
    let snapshot = app.sentinel.snapshot().await;
    Json(json!({ "data": { "started": started, "state": snapshot.state } }))
}

async fn stop(State(app): State<AppState>) -> Json<Value> {
    let stopped = app.sentinel.stop().await;
    let snapshot = app.sentinel.snapshot().await;
    Json(json!({ "data": { "stopped": stopped, "state": snapshot.state } }))
}

async fn inject_chaos(State(app): State<AppState>) -> Json<Value> {
    let injected = app.sentinel.inject_chaos().await;
    Json(json!({ "data": { "injected": injected } }))
}

async fn clear_chaos(State(app): State<AppState>) -> Json<Value> {
    let cleared = app.sentinel.clear_chaos().await;
    Json(json!({ "data": { "cleared": cleared } }))
}
