//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (accepted by the lifecycle controller)
//!     → server.rs (Axum router, route groups)
//!     → middleware/ (access log + status capture, header propagation)
//!     → handlers.rs (probes, metrics, info, run)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod server;

pub use server::{build_router, AppState};
