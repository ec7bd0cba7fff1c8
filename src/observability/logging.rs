//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Provide the fatal level that `tracing` lacks
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log level configurable via config and `RUST_LOG`

use serde_json::{Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{ExecEnv, LogFormat, ObservabilityConfig};

/// Structured fields attached to a fatal log line.
pub type Fields = Map<String, Value>;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init(config: &ObservabilityConfig, exec_env: ExecEnv) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("probe_server={},tower_http=info", config.log_level).into()
    });

    let json = match config.log_format {
        LogFormat::Json => true,
        LogFormat::Pretty => false,
        LogFormat::Auto => exec_env.is_production(),
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Log an unrecoverable error and terminate the process with status 1.
pub fn fatal(message: &str, fields: Option<&Fields>) -> ! {
    match fields {
        Some(fields) => {
            let fields = render(fields);
            tracing::error!(fatal = true, fields = %fields, "{message}")
        }
        None => tracing::error!(fatal = true, "{message}"),
    }
    std::process::exit(1)
}

/// Render a field map as a single JSON object.
fn render(fields: &Fields) -> String {
    Value::Object(fields.clone()).to_string()
}

/// Build a field map from `(name, value)` pairs.
pub fn fields<I, K, V>(pairs: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
