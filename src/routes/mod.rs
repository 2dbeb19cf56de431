//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The relay exposes one websocket endpoint plus two small HTTP probes for
//! operators. Static assets and any other paths belong to whatever sits in
//! front of the relay and are not routed here.

pub mod ws;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Path at which peers request the websocket upgrade.
pub const WS_PATH: &str = "/ws";

pub fn app(state: AppState) -> Router {
    Router::new()
        .route(WS_PATH, get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .route("/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
struct Stats {
    connections: usize,
}

async fn stats(State(state): State<AppState>) -> Json<Stats> {
    Json(Stats { connections: state.registry.len() })
}
