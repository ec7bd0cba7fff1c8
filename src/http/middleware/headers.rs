//! Request header propagation.
//!
//! # Responsibilities
//! - Echo every inbound header (first value only) onto the response
//! - Stamp the `VERSION` header
//!
//! # Design Decisions
//! - Headers the handler set itself win over echoed ones
//! - Framing and hop-by-hop headers are never echoed; copying them would
//!   describe the request body, not the response

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

use crate::config::environment::{self, ExecEnv, DEFAULT_VERSION};

pub const VERSION_HEADER: HeaderName = HeaderName::from_static("version");

static NOT_ECHOED: [HeaderName; 8] = [
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::CONNECTION,
    header::UPGRADE,
    header::TE,
    header::TRAILER,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
];

/// Collect the headers to echo: one entry per name, holding its first value.
pub fn echoed_headers(inbound: &HeaderMap, exec_env: ExecEnv) -> HeaderMap {
    let mut echoed = HeaderMap::with_capacity(inbound.keys_len());
    for name in inbound.keys() {
        if NOT_ECHOED.contains(name) {
            continue;
        }
        if let Some(value) = inbound.get(name) {
            if exec_env.is_localhost() {
                tracing::debug!(header = %name, value = ?value, "Echoing request header");
            }
            echoed.insert(name.clone(), value.clone());
        }
    }
    echoed
}

/// The `VERSION` header value for this request.
pub fn version_value() -> HeaderValue {
    HeaderValue::from_str(&environment::version())
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_VERSION))
}

/// Middleware: propagate request headers and `VERSION` to the response.
pub async fn propagate_headers(
    State(exec_env): State<ExecEnv>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut pending = echoed_headers(request.headers(), exec_env);
    pending.insert(VERSION_HEADER, version_value());

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    for (name, value) in pending {
        // `name` is always Some: `pending` holds one value per name.
        if let Some(name) = name {
            if !headers.contains_key(&name) {
                headers.insert(name, value);
            }
        }
    }
    response
}
