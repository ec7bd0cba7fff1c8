//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// File name looked up in the home directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = ".probe-server.toml";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the home directory")]
    NoHomeDir,

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("environment variable {key}=`{value}` is not a valid number")]
    Env { key: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve, read, merge and validate the service configuration.
///
/// An explicit path must exist. Without one, `$HOME/.probe-server.toml` is
/// read when present and defaults are used otherwise. Environment overrides
/// are applied last.
pub fn load(explicit: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match explicit {
        Some(path) => read_file(path)?,
        None => {
            let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
            let path = home.join(DEFAULT_CONFIG_FILE);
            if path.is_file() {
                read_file(&path)?
            } else {
                ServiceConfig::default()
            }
        }
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn read_file(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}

/// Overlay `PROBE_*` environment variables onto a loaded configuration.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(addr) = lookup("PROBE_BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }
    if let Some(level) = lookup("PROBE_LOG_LEVEL") {
        config.observability.log_level = level;
    }

    let millis: [(&'static str, &mut u64); 4] = [
        ("PROBE_WARMUP_MS", &mut config.lifecycle.warmup_ms),
        ("PROBE_TEARDOWN_MS", &mut config.lifecycle.teardown_ms),
        ("PROBE_GRACE_PERIOD_MS", &mut config.lifecycle.grace_period_ms),
        ("PROBE_INFO_MAX_DELAY_MS", &mut config.http.info_max_delay_ms),
    ];
    for (key, slot) in millis {
        if let Some(value) = lookup(key) {
            *slot = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Env { key, value })?;
        }
    }

    Ok(())
}
