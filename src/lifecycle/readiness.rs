//! Readiness gate.
//!
//! # States
//! ```text
//! Pending ──warm-up done──▶ Ready ──withdraw/finalize──▶ Withdrawn
//!    └──────────────withdraw/finalize────────────────────────┘
//! ```
//!
//! # Design Decisions
//! - Single atomic word; handlers only ever load it
//! - Pending → Ready is a compare-and-swap, so a late warm-up can never
//!   reopen a gate that shutdown already withdrew
//! - Withdrawn is terminal for the lifetime of the process

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::observability::metrics;

/// Readiness of the service's dependencies.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    Pending = 0,
    Ready = 1,
    Withdrawn = 2,
}

impl From<u8> for ReadinessState {
    fn from(val: u8) -> Self {
        match val {
            1 => ReadinessState::Ready,
            2 => ReadinessState::Withdrawn,
            _ => ReadinessState::Pending,
        }
    }
}

/// Shared, cheaply cloneable readiness flag.
#[derive(Debug, Clone, Default)]
pub struct ReadinessGate {
    state: Arc<AtomicU8>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ReadinessState {
        ReadinessState::from(self.state.load(Ordering::Acquire))
    }

    /// Non-blocking check used by the readiness probe.
    pub fn is_ready(&self) -> bool {
        self.state() == ReadinessState::Ready
    }

    /// Start warming up in the background.
    ///
    /// After `warmup` the gate opens unless it was withdrawn or `shutdown`
    /// fired in the meantime.
    pub fn begin_init(&self, warmup: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let gate = self.clone();
        tokio::spawn(async move {
            tracing::info!(warmup_ms = warmup.as_millis() as u64, "Readiness warm-up started");
            tokio::select! {
                _ = tokio::time::sleep(warmup) => {
                    if gate.open() {
                        tracing::info!("Readiness warm-up complete, service is ready");
                    } else {
                        tracing::info!("Readiness warm-up finished after shutdown began, staying not ready");
                    }
                }
                _ = shutdown.cancelled() => {
                    tracing::info!("Readiness warm-up abandoned, shutdown requested");
                }
            }
        })
    }

    /// Pending → Ready. Returns false when the gate is not pending.
    fn open(&self) -> bool {
        let opened = self
            .state
            .compare_exchange(
                ReadinessState::Pending as u8,
                ReadinessState::Ready as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if opened {
            metrics::record_ready(true);
        }
        opened
    }

    /// Close the gate for good. Idempotent.
    pub fn withdraw(&self) {
        let previous = self
            .state
            .swap(ReadinessState::Withdrawn as u8, Ordering::AcqRel);
        if previous != ReadinessState::Withdrawn as u8 {
            metrics::record_ready(false);
            tracing::info!(previous = ?ReadinessState::from(previous), "Readiness withdrawn");
        }
    }

    /// Post-drain cleanup: withdraw, then spend `teardown` releasing
    /// dependencies.
    pub async fn finalize(&self, teardown: Duration) {
        tracing::info!(teardown_ms = teardown.as_millis() as u64, "Readiness teardown started");
        self.withdraw();
        tokio::time::sleep(teardown).await;
        tracing::info!("Readiness teardown complete");
    }
}
