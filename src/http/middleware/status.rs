//! Status capture and access logging.
//!
//! One access line per exchange: client IP, first recorded status, path.
//! The line is written from a drop guard so a request whose future is
//! dropped mid-flight (client went away) is still logged.
//!
//! Metrics are labelled by the matched route, never the raw path: every
//! unmatched path shares the [`FALLBACK_ROUTE`] label.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, MatchedPath},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::observability::metrics;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Metric label for requests no route matched.
pub const FALLBACK_ROUTE: &str = "fallback";

/// Remembers the first status code recorded for a response.
///
/// Later records are ignored, mirroring HTTP where only the first status
/// line reaches the wire.
#[derive(Debug, Clone, Default)]
pub struct StatusRecorder {
    // 0 means nothing recorded yet.
    status: Arc<AtomicU16>,
}

impl StatusRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `status`. Returns false when a status was already recorded.
    pub fn record(&self, status: StatusCode) -> bool {
        self.status
            .compare_exchange(0, status.as_u16(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn recorded(&self) -> Option<StatusCode> {
        match self.status.load(Ordering::Acquire) {
            0 => None,
            code => StatusCode::from_u16(code).ok(),
        }
    }

    /// The recorded status, or 200 when the handler never set one.
    pub fn status(&self) -> StatusCode {
        self.recorded().unwrap_or(StatusCode::OK)
    }
}

/// Client address for logging: the first `X-Forwarded-For` hop when
/// present, otherwise the peer socket address.
pub fn client_ip(request: &Request<Body>) -> String {
    let forwarded = request
        .headers()
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Metric label for the exchange: the route template that matched.
fn route_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| FALLBACK_ROUTE.to_string())
}

struct AccessLogGuard {
    recorder: StatusRecorder,
    client_ip: String,
    path: String,
    route: String,
    started: Instant,
    completed: bool,
}

impl Drop for AccessLogGuard {
    fn drop(&mut self) {
        let status = self.recorder.status();
        let elapsed = self.started.elapsed();
        tracing::info!(
            client_ip = %self.client_ip,
            status = status.as_u16(),
            path = %self.path,
            elapsed_ms = elapsed.as_millis() as u64,
            aborted = !self.completed,
            "request completed"
        );
        metrics::record_request(&self.route, status.as_u16(), elapsed);
    }
}

/// Middleware: install a [`StatusRecorder`] for the exchange, run the rest
/// of the chain, record the status and log the access line.
pub async fn access_log(mut request: Request<Body>, next: Next) -> Response {
    let recorder = StatusRecorder::new();
    let mut guard = AccessLogGuard {
        recorder: recorder.clone(),
        client_ip: client_ip(&request),
        path: request.uri().path().to_string(),
        route: route_label(&request),
        started: Instant::now(),
        completed: false,
    };
    request.extensions_mut().insert(recorder.clone());

    let response = next.run(request).await;

    recorder.record(response.status());
    guard.completed = true;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Extension, Router};
    use std::io;
    use std::sync::Mutex;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    /// Log sink shared with a scoped `fmt` subscriber.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn install(&self) -> tracing::subscriber::DefaultGuard {
            let sink = self.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(tracing::Level::INFO)
                .with_ansi(false)
                .with_writer(move || sink.clone())
                .finish();
            tracing::subscriber::set_default(subscriber)
        }

        fn lines(&self) -> Vec<String> {
            String::from_utf8_lossy(&self.0.lock().unwrap())
                .lines()
                .filter(|line| line.contains("request completed"))
                .map(str::to_string)
                .collect()
        }
    }

    #[test]
    fn first_status_wins() {
        let recorder = StatusRecorder::new();
        assert_eq!(recorder.recorded(), None);
        assert_eq!(recorder.status(), StatusCode::OK);

        assert!(recorder.record(StatusCode::NON_AUTHORITATIVE_INFORMATION));
        assert!(!recorder.record(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!recorder.record(StatusCode::OK));

        assert_eq!(recorder.status(), StatusCode::NON_AUTHORITATIVE_INFORMATION);
    }

    #[test]
    fn clones_share_the_record() {
        let recorder = StatusRecorder::new();
        let handle = recorder.clone();
        handle.record(StatusCode::NOT_FOUND);
        assert_eq!(recorder.recorded(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn forwarded_for_beats_socket_address() {
        let mut request = Request::builder()
            .uri("/info")
            .header(X_FORWARDED_FOR, "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo("127.0.0.1:4000".parse::<SocketAddr>().unwrap()));
        assert_eq!(client_ip(&request), "203.0.113.7");

        request.headers_mut().remove(X_FORWARDED_FOR);
        assert_eq!(client_ip(&request), "127.0.0.1");
    }

    #[test]
    fn unknown_client_without_connect_info() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(client_ip(&request), "-");
    }

    #[tokio::test]
    async fn handler_write_is_the_one_kept() {
        // The handler records 203 itself and then returns 500; the first write stays.
        let captured: Arc<std::sync::Mutex<Option<StatusRecorder>>> = Arc::default();
        let slot = captured.clone();
        let app = Router::new()
            .route(
                "/",
                get(|Extension(recorder): Extension<StatusRecorder>| async move {
                    recorder.record(StatusCode::NON_AUTHORITATIVE_INFORMATION);
                    StatusCode::INTERNAL_SERVER_ERROR
                }),
            )
            .layer(axum::middleware::from_fn(move |req: Request<Body>, next: Next| {
                let slot = slot.clone();
                async move {
                    *slot.lock().unwrap() = req.extensions().get::<StatusRecorder>().cloned();
                    next.run(req).await
                }
            }))
            .layer(axum::middleware::from_fn(access_log));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let recorder = captured.lock().unwrap().clone().unwrap();
        assert_eq!(recorder.status(), StatusCode::NON_AUTHORITATIVE_INFORMATION);
    }

    #[tokio::test]
    async fn access_line_names_client_status_and_path() {
        let captured = Captured::default();
        let _guard = captured.install();

        let app = Router::new()
            .route("/run", get(|| async { StatusCode::NON_AUTHORITATIVE_INFORMATION }))
            .layer(axum::middleware::from_fn(access_log));
        app.oneshot(
            Request::builder()
                .uri("/run")
                .header(X_FORWARDED_FOR, "198.51.100.20")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

        let lines = captured.lines();
        assert_eq!(lines.len(), 1, "{lines:?}");
        let line = &lines[0];
        assert!(line.contains("client_ip=198.51.100.20"), "{line}");
        assert!(line.contains("status=203"), "{line}");
        assert!(line.contains("path=/run"), "{line}");
        assert!(line.contains("aborted=false"), "{line}");
    }

    #[tokio::test]
    async fn dropped_request_is_still_logged() {
        let captured = Captured::default();
        let _guard = captured.install();

        let entered = Arc::new(Notify::new());
        let app = Router::new()
            .route(
                "/slow",
                get({
                    let entered = entered.clone();
                    move |Extension(recorder): Extension<StatusRecorder>| async move {
                        recorder.record(StatusCode::NON_AUTHORITATIVE_INFORMATION);
                        entered.notify_one();
                        std::future::pending::<StatusCode>().await
                    }
                }),
            )
            .layer(axum::middleware::from_fn(access_log));

        let request = Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let exchange = tokio::spawn(app.oneshot(request));
        entered.notified().await;
        assert!(captured.lines().is_empty());

        exchange.abort();
        assert!(exchange.await.unwrap_err().is_cancelled());

        let lines = captured.lines();
        assert_eq!(lines.len(), 1, "{lines:?}");
        let line = &lines[0];
        assert!(line.contains("status=203"), "{line}");
        assert!(line.contains("path=/slow"), "{line}");
        assert!(line.contains("aborted=true"), "{line}");
    }

    #[tokio::test]
    async fn unmatched_paths_share_one_series() {
        let handle = metrics::install("status-test").unwrap();
        let app = Router::new()
            .route("/info", get(|| async { "info" }))
            .fallback(|| async { "fallback" })
            .layer(axum::middleware::from_fn(access_log));

        for i in 0..50 {
            let request = Request::builder()
                .uri(format!("/scan/{i}"))
                .body(Body::empty())
                .unwrap();
            app.clone().oneshot(request).await.unwrap();
        }
        let request = Request::builder().uri("/info").body(Body::empty()).unwrap();
        app.oneshot(request).await.unwrap();

        let text = handle.render();
        assert!(!text.contains("/scan/"));
        assert!(text.contains(&format!("path=\"{FALLBACK_ROUTE}\"")));
        assert!(text.contains("path=\"/info\""));
    }
}
