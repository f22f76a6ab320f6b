//! Operational HTTP endpoints.
//!
//! - `GET /healthz`     : liveness
//! - `POST /v1/flush`   : manual flush, body is the line-format output
//! - `POST /v1/observe` : JSON ingest for producers outside the process

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use meterline_core::error::MeterlineError;

use crate::app_state::AppState;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObserveKind {
    Counter,
    Gauge,
    Timing,
    Histogram,
}

/// Ingest body. Gauges are set, counters added, timings and histograms
/// observed.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Observation {
    pub kind: ObserveKind,
    pub name: String,
    #[serde(default)]
    pub labels: Vec<String>,
    pub value: f64,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn flush(State(state): State<AppState>) -> Response {
    let mut body = Vec::new();
    match state.aggregator().write_to(&mut body) {
        Ok(_) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e),
    }
}

pub async fn observe(State(state): State<AppState>, Json(obs): Json<Observation>) -> Response {
    match state.record(&obs) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e),
    }
}

fn error_response(status: StatusCode, e: &MeterlineError) -> Response {
    tracing::debug!(code = e.code().as_str(), error = %e, "ops request failed");
    (
        status,
        Json(json!({ "code": e.code().as_str(), "msg": e.to_string() })),
    )
        .into_response()
}
