//! Metrics collection and exposition.
//!
//! # Metrics
//! - `httpserver_sleep_duration_seconds` (histogram): `/info` injected delay
//! - `worker_requests_total` (counter): handled requests by route, status
//! - `worker_request_duration_seconds` (histogram): latency by route
//! - `app_request_duration_seconds` (summary): latency quantiles
//! - `worker_current_time` (gauge): unix time the recorder was installed
//! - `service_ready` (gauge): 1=ready, 0=not ready
//! - `service_info` (gauge): one series per host/component
//!
//! # Design Decisions
//! - One global recorder per process, installed on first use
//! - Histograms only where buckets are configured; the rest render as summaries

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

pub const SLEEP_DURATION: &str = "httpserver_sleep_duration_seconds";
pub const REQUESTS_TOTAL: &str = "worker_requests_total";
pub const REQUEST_DURATION: &str = "worker_request_duration_seconds";
pub const APP_REQUEST_DURATION: &str = "app_request_duration_seconds";
pub const CURRENT_TIME: &str = "worker_current_time";
pub const SERVICE_READY: &str = "service_ready";
pub const SERVICE_INFO: &str = "service_info";

const SLEEP_BUCKETS: &[f64] = &[0.5, 1.0, 1.5, 2.0, 2.5];
const REQUEST_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
const QUANTILES: &[f64] = &[0.5, 0.9, 0.99];

static HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Install the Prometheus recorder, or return the one already installed.
pub fn install(hostname: &str) -> Result<PrometheusHandle, BuildError> {
    let mut slot = HANDLE.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(handle) = slot.as_ref() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .set_quantiles(QUANTILES)?
        .set_buckets_for_metric(Matcher::Full(SLEEP_DURATION.to_string()), SLEEP_BUCKETS)?
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), REQUEST_BUCKETS)?
        .install_recorder()?;

    describe();
    seed(hostname);

    tracing::debug!("Prometheus recorder installed");
    *slot = Some(handle.clone());
    Ok(handle)
}

fn describe() {
    describe_histogram!(SLEEP_DURATION, "Delay injected into /info requests, in seconds.");
    describe_counter!(REQUESTS_TOTAL, "The total number of handled HTTP requests.");
    describe_histogram!(REQUEST_DURATION, "A histogram of the HTTP request durations in seconds.");
    describe_histogram!(APP_REQUEST_DURATION, "A summary of the HTTP request durations in seconds.");
    describe_gauge!(CURRENT_TIME, "Unix time at which the worker started.");
    describe_gauge!(SERVICE_READY, "Whether the readiness gate is open (1) or closed (0).");
    describe_gauge!(SERVICE_INFO, "Static information about the running worker.");
}

fn seed(hostname: &str) {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    gauge!(CURRENT_TIME).set(now);
    gauge!(SERVICE_READY).set(0.0);
    for service in ["log", "trace"] {
        gauge!(SERVICE_INFO, "worker" => hostname.to_string(), "service" => service).set(1.0);
    }
}

/// Record the delay `/info` slept before answering.
pub fn record_sleep(delay: Duration) {
    histogram!(SLEEP_DURATION).record(delay.as_secs_f64());
}

/// Record a finished request under its route template.
pub fn record_request(route: &str, status: u16, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    counter!(REQUESTS_TOTAL, "path" => route.to_string(), "status" => status.to_string())
        .increment(1);
    histogram!(REQUEST_DURATION, "path" => route.to_string()).record(secs);
    histogram!(APP_REQUEST_DURATION).record(secs);
}

/// Mirror the readiness gate into a gauge.
pub fn record_ready(ready: bool) {
    gauge!(SERVICE_READY).set(if ready { 1.0 } else { 0.0 });
}
