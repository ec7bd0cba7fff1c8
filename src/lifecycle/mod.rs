//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Bind listener
//!
//! Controller (controller.rs):
//!     Starting → Serving → Draining → Stopped
//!
//! Shutdown (shutdown.rs):
//!     Token cancelled → Stop accepting → Drain connections (bounded) → Finalize
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Cancel token (once)
//! ```
//!
//! # Design Decisions
//! - Readiness decoupled from listener binding: the gate opens after warm-up
//! - Ordered shutdown: withdraw readiness, stop accept, drain, finalize
//! - Shutdown has timeout: exceeding it is a fatal error, not a clean exit

use std::time::Duration;

use thiserror::Error;

pub mod controller;
pub mod readiness;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use controller::{LifecycleController, LifecycleState};
pub use readiness::{ReadinessGate, ReadinessState};
pub use signals::SignalAdapter;

/// Unrecoverable startup and shutdown failures.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("failed to install signal handlers: {0}")]
    Signal(std::io::Error),

    #[error("server failed: {0}")]
    Serve(std::io::Error),

    /// In-flight requests outlived the grace period. Their connections are
    /// only closed when the process exits.
    #[error("server not gracefully shut down: in-flight requests still running after {0:?}")]
    DrainTimeout(Duration),

    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
