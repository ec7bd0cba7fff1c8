//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, address parses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use tracing::Level;

use crate::config::schema::ServiceConfig;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("observability.log_level `{0}` is not a log level")]
    LogLevel(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    // Warm-up and teardown may be zero; a zero grace period would make every drain fatal.
    if config.lifecycle.grace_period_ms == 0 {
        errors.push(ValidationError::ZeroDuration("lifecycle.grace_period_ms"));
    }
    if config.http.scrape_timeout_ms == 0 {
        errors.push(ValidationError::ZeroDuration("http.scrape_timeout_ms"));
    }

    if config.observability.log_level.parse::<Level>().is_err() {
        errors.push(ValidationError::LogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
