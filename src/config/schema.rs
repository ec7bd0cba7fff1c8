//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the probe server.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Startup and shutdown timings.
    pub lifecycle: LifecycleConfig,

    /// Endpoint behaviour.
    pub http: HttpConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Lifecycle timings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Warm-up before the readiness gate opens.
    pub warmup_ms: u64,

    /// Teardown performed by the readiness finalizer.
    pub teardown_ms: u64,

    /// How long in-flight requests may take to finish once draining starts.
    pub grace_period_ms: u64,
}

impl LifecycleConfig {
    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    pub fn teardown(&self) -> Duration {
        Duration::from_millis(self.teardown_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            warmup_ms: 10_000,
            teardown_ms: 2_000,
            grace_period_ms: 3_000,
        }
    }
}

/// Endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    /// Upper bound (exclusive) of the random delay injected by `/info`.
    /// Zero disables the delay.
    pub info_max_delay_ms: u64,

    /// Maximum time a `/metrics` scrape may take.
    pub scrape_timeout_ms: u64,
}

impl HttpConfig {
    pub fn info_max_delay(&self) -> Duration {
        Duration::from_millis(self.info_max_delay_ms)
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_millis(self.scrape_timeout_ms)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            info_max_delay_ms: 2_000,
            scrape_timeout_ms: 5_000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON in production, pretty everywhere else.
    #[default]
    Auto,
    Json,
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "debug".to_string(),
            log_format: LogFormat::Auto,
        }
    }
}
