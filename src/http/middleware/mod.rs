//! Request/response middleware chain.
//!
//! # Order
//! ```text
//! request  → status::access_log → headers::propagate_headers → handler
//! response ← status::access_log ← headers::propagate_headers ← handler
//! ```
//! The access line is written last, after headers have been settled.

pub mod headers;
pub mod status;

pub use headers::{propagate_headers, VERSION_HEADER};
pub use status::{access_log, client_ip, StatusRecorder};
