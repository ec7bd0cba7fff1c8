//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT; Ctrl+C off Unix)
//! - Translate the first signal into cancellation of the shared token
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Repeated signals are logged and ignored; cancellation happens once
//! - Registration failure is a startup error, not a runtime one

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Bridges process signals to a [`CancellationToken`].
#[derive(Debug)]
pub struct SignalAdapter {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl SignalAdapter {
    /// Subscribe to termination signals and spawn the relay task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn install(token: CancellationToken) -> std::io::Result<Self> {
        let relay = token.clone();

        #[cfg(unix)]
        let task = {
            let mut sigterm = signal(SignalKind::terminate())?;
            let mut sigint = signal(SignalKind::interrupt())?;
            tokio::spawn(async move {
                loop {
                    let name = tokio::select! {
                        Some(()) = sigterm.recv() => "SIGTERM",
                        Some(()) = sigint.recv() => "SIGINT",
                        else => break,
                    };
                    relay_signal(&relay, name);
                }
            })
        };

        #[cfg(not(unix))]
        let task = tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                relay_signal(&relay, "Ctrl+C");
            }
        });

        Ok(Self { token, task })
    }

    /// Trigger cancellation as if a signal had arrived. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The token cancelled by this adapter.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait until cancellation has been triggered.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

impl Drop for SignalAdapter {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn relay_signal(token: &CancellationToken, name: &str) {
    if token.is_cancelled() {
        tracing::warn!(signal = name, "Shutdown already in progress, ignoring signal");
    } else {
        tracing::info!(signal = name, "Received termination signal");
        token.cancel();
    }
}
