//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (PROBE_* environment overrides)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!
//! environment.rs:
//!     HWENV → ExecEnv, read once
//!     hostname / start time → AppInfo, captured once
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod environment;
pub mod loader;
pub mod schema;
pub mod validation;

pub use environment::{AppInfo, ExecEnv};
pub use loader::ConfigError;
pub use schema::{
    HttpConfig, LifecycleConfig, ListenerConfig, LogFormat, ObservabilityConfig, ServiceConfig,
};
