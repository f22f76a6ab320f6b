//! Axum router wiring for the ops surface.

use axum::{
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/v1/flush", post(ops::flush))
        .route("/v1/observe", post(ops::observe))
        .with_state(state)
}
