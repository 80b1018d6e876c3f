//! # ves-api — HTTP Surface of the VeriStamp Evidence Stack
//!
//! Axum front door for the stores and the anchoring coordinator: intake of
//! certification requests, manual anchor runs, custody and batch queries,
//! and evidence package downloads.
//!
//! ## Routes
//!
//! | Prefix                 | Module               | Domain                           |
//! |------------------------|----------------------|----------------------------------|
//! | `/api/v1/evidence/*`   | [`routes::evidence`] | Certification, custody, export   |
//! | `/api/v1/batches/*`    | [`routes::batches`]  | Anchoring runs and batch queries |
//! | `/metrics`             | [`middleware::metrics`] | Request counters              |
//!
//! ## Layer order
//!
//! ```text
//! TraceLayer → metrics middleware → bearer auth → handler
//! ```
//!
//! The OpenAPI 3.1 document comes out of utoipa derives and is served at
//! `/openapi.json` with no credentials needed.

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::BearerToken;
use crate::middleware::metrics::{metrics_handler, ApiMetrics};
use crate::state::AppState;

/// Build the application router.
///
/// Health probes (`/health/*`) and the OpenAPI document mount outside the
/// auth layer; everything under `/api` and `/metrics` requires the token.
pub fn app(state: AppState) -> Router {
    let token = BearerToken::new(state.config.api_token.clone());
    let metrics = ApiMetrics::new();

    let api = Router::new()
        .merge(routes::evidence::router())
        .merge(routes::batches::router())
        .route("/metrics", get(metrics_handler))
        .layer(from_fn(auth::require_bearer))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(token))
        .layer(axum::Extension(metrics))
        .with_state(state.clone());

    let public = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .merge(openapi::router().with_state(state));

    Router::new().merge(public).merge(api)
}

/// GET /health/liveness — 200 whenever the process is up.
async fn liveness() -> &'static str {
    "ok"
}

/// GET /health/readiness — 200 once the app can take traffic.
async fn readiness() -> &'static str {
    "ready"
}
