//! Process-wide execution environment and build information.
//!
//! Everything here is captured once at startup and read-only afterwards.

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

/// Environment variable naming the execution mode.
pub const ENV_KEY: &str = "HWENV";

/// Environment variable overriding the `VERSION` response header.
pub const VERSION_KEY: &str = "VERSION";

/// Compiled-in version, used when `VERSION` is not set.
pub const DEFAULT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Where the process believes it is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecEnv {
    Production,
    Development,
    Localhost,
    Unset,
}

impl ExecEnv {
    /// Read the mode from `HWENV`.
    pub fn from_env() -> Self {
        Self::parse(std::env::var(ENV_KEY).ok().as_deref())
    }

    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("Production") => ExecEnv::Production,
            Some("Develop") => ExecEnv::Development,
            Some("Localhost") => ExecEnv::Localhost,
            _ => ExecEnv::Unset,
        }
    }

    pub fn is_production(self) -> bool {
        self == ExecEnv::Production
    }

    pub fn is_localhost(self) -> bool {
        self == ExecEnv::Localhost
    }

    /// The tag as it appears in `HWENV`; empty when unset.
    pub fn as_str(self) -> &'static str {
        match self {
            ExecEnv::Production => "Production",
            ExecEnv::Development => "Develop",
            ExecEnv::Localhost => "Localhost",
            ExecEnv::Unset => "",
        }
    }
}

impl fmt::Display for ExecEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the `VERSION` header value: the environment override, else the
/// compiled default. Read on every call.
pub fn version() -> String {
    match std::env::var(VERSION_KEY) {
        Ok(v) if !v.is_empty() => v,
        _ => DEFAULT_VERSION.to_string(),
    }
}

/// Snapshot of process-wide facts served by `/info`.
#[derive(Debug, Clone)]
pub struct AppInfo {
    pub build_info: String,
    pub hostname: String,
    pub exec_env: ExecEnv,
    pub started_at: DateTime<Local>,
    started: Instant,
}

impl AppInfo {
    /// Capture the snapshot for this process.
    pub fn capture(exec_env: ExecEnv) -> Self {
        Self {
            build_info: format!("{}:{}", env!("CARGO_PKG_NAME"), DEFAULT_VERSION),
            hostname: resolve_hostname(),
            exec_env,
            started_at: Local::now(),
            started: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Human-readable multi-line report.
    pub fn render(&self) -> String {
        format!(
            "{}\nHostname:\t{}\nEnvironment:\t{}\nStart time:\t{}\nRunning time:\t{:?}\n",
            self.build_info,
            self.hostname,
            self.exec_env,
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            self.uptime(),
        )
    }
}

fn resolve_hostname() -> String {
    if let Ok(name) = std::env::var("HOSTNAME") {
        if !name.trim().is_empty() {
            return name.trim().to_string();
        }
    }
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_modes() {
        assert_eq!(ExecEnv::parse(Some("Production")), ExecEnv::Production);
        assert_eq!(ExecEnv::parse(Some("Develop")), ExecEnv::Development);
        assert_eq!(ExecEnv::parse(Some("Localhost")), ExecEnv::Localhost);
        assert_eq!(ExecEnv::parse(Some("production")), ExecEnv::Unset);
        assert_eq!(ExecEnv::parse(None), ExecEnv::Unset);
    }

    #[test]
    fn info_report_has_every_line() {
        let info = AppInfo::capture(ExecEnv::Development);
        let text = info.render();

        assert!(text.starts_with("probe-server:"));
        assert!(text.contains(&format!("Hostname:\t{}\n", info.hostname)));
        assert!(text.contains("Environment:\tDevelop\n"));
        assert!(text.contains("Start time:\t"));
        assert!(text.contains("Running time:\t"));
    }
}
