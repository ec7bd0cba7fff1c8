//! Orchestrator-friendly HTTP probe service library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use http::{build_router, AppState};
pub use lifecycle::{LifecycleController, LifecycleError, ReadinessGate, SignalAdapter};
