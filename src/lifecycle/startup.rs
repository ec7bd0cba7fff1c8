//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listener before anything is served
//! - Report the effective configuration
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Readiness is not tied to binding; see `readiness.rs`

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::{ExecEnv, ServiceConfig};
use crate::lifecycle::LifecycleError;

/// Bind the TCP listener for the configured address.
pub async fn bind(config: &ServiceConfig) -> Result<TcpListener, LifecycleError> {
    let address = config.listener.bind_address.clone();
    let addr: SocketAddr = address.parse().map_err(|e| LifecycleError::Bind {
        address: address.clone(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
    })?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| LifecycleError::Bind { address, source })?;

    if let Ok(local) = listener.local_addr() {
        tracing::info!(address = %local, "Listener bound");
    }
    Ok(listener)
}

/// Log the settings the process is about to run with.
pub fn announce(config: &ServiceConfig, exec_env: ExecEnv) {
    if exec_env.is_production() {
        tracing::info!("Running in the production environment");
    } else {
        tracing::info!(environment = %exec_env, "Running outside the production environment");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        warmup_ms = config.lifecycle.warmup_ms,
        teardown_ms = config.lifecycle.teardown_ms,
        grace_period_ms = config.lifecycle.grace_period_ms,
        "Configuration loaded"
    );
}
