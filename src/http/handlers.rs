//! Endpoint handlers.
//!
//! Probes answer with empty bodies; only `/info` and `/run` carry content.

use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use rand::Rng;

use crate::http::server::AppState;
use crate::observability::metrics;

/// Body returned by `/run`.
pub const RUN_MESSAGE: &str = "有需求请联络管理员";

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Liveness probe (`/healthz`, `/livez`).
pub async fn health() -> StatusCode {
    tracing::debug!("health probe");
    StatusCode::OK
}

/// Readiness probe: 200 once the gate is open, 500 otherwise.
pub async fn ready(State(state): State<AppState>) -> StatusCode {
    tracing::debug!("readiness probe");
    if state.gate.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Prometheus exposition.
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.metrics.render(),
    )
}

/// Service snapshot (`/info`, and every unmatched path).
pub async fn info(State(state): State<AppState>) -> String {
    let delay = random_delay(state.http.info_max_delay());
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    metrics::record_sleep(delay);
    state.info.render()
}

/// Illustrative action: status first, then body, each written once.
pub async fn run() -> impl IntoResponse {
    tracing::debug!("run called");
    (StatusCode::NON_AUTHORITATIVE_INFORMATION, RUN_MESSAGE)
}

fn random_delay(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    rand::thread_rng().gen_range(Duration::ZERO..max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_stays_below_bound() {
        let max = Duration::from_millis(20);
        for _ in 0..100 {
            assert!(random_delay(max) < max);
        }
        assert_eq!(random_delay(Duration::ZERO), Duration::ZERO);
    }
}
