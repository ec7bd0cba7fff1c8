//! HTTP router setup.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware per route group
//!
//! # Route Groups
//! - Probes (`/healthz`, `/livez`, `/readyz`): access log only
//! - Business (`/`, `/info`, `/run`, fallback): access log + header propagation
//! - Metrics (`/metrics`): scrape timeout only

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{AppInfo, HttpConfig};
use crate::http::handlers;
use crate::http::middleware::{access_log, propagate_headers};
use crate::lifecycle::ReadinessGate;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: ReadinessGate,
    pub info: Arc<AppInfo>,
    pub metrics: PrometheusHandle,
    pub http: HttpConfig,
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let probes = Router::new()
        .route("/healthz", get(handlers::health))
        .route("/livez", get(handlers::health))
        .route("/readyz", get(handlers::ready))
        .layer(middleware::from_fn(access_log));

    // First stage is outermost.
    let chain = ServiceBuilder::new()
        .layer(middleware::from_fn(access_log))
        .layer(middleware::from_fn_with_state(
            state.info.exec_env,
            propagate_headers,
        ));

    let business = Router::new()
        .route("/", get(handlers::info))
        .route("/info", get(handlers::info))
        .route("/run", get(handlers::run))
        .fallback(handlers::info)
        .layer(chain);

    let scrape = Router::new()
        .route("/metrics", get(handlers::metrics))
        .layer(TimeoutLayer::new(state.http.scrape_timeout()));

    Router::new()
        .merge(probes)
        .merge(business)
        .merge(scrape)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
