//! Service lifecycle controller.
//!
//! # State Transitions
//! ```text
//! Starting → Serving:  listener bound, warm-up launched, accept loop running
//! Serving  → Draining: shutdown token cancelled (and nothing else)
//! Draining → Stopped:  accept loop drained within the grace period,
//!                      readiness finalizer completed
//! ```
//!
//! A drain that overruns the grace period, or an accept loop that dies on
//! its own, ends `run` with an error instead of reaching `Stopped`.

use std::fmt;
use std::future::IntoFuture;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::LifecycleConfig;
use crate::lifecycle::readiness::ReadinessGate;
use crate::lifecycle::shutdown::drain;
use crate::lifecycle::LifecycleError;

/// Phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Starting,
    Serving,
    Draining,
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Starting => "starting",
            LifecycleState::Serving => "serving",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Drives one listener from bind to exit. Single use: `run` consumes it.
pub struct LifecycleController {
    config: LifecycleConfig,
    gate: ReadinessGate,
    state_tx: watch::Sender<LifecycleState>,
}

impl LifecycleController {
    pub fn new(config: LifecycleConfig) -> Self {
        let (state_tx, _) = watch::channel(LifecycleState::Starting);
        Self {
            config,
            gate: ReadinessGate::new(),
            state_tx,
        }
    }

    /// The readiness gate handlers should read.
    pub fn gate(&self) -> ReadinessGate {
        self.gate.clone()
    }

    /// Observe state transitions; `Stopped` is the completion signal.
    pub fn state(&self) -> watch::Receiver<LifecycleState> {
        self.state_tx.subscribe()
    }

    fn transition(&self, next: LifecycleState) {
        let previous = self.state_tx.send_replace(next);
        tracing::info!(from = %previous, to = %next, "Lifecycle transition");
    }

    /// Serve `app` on `listener` until `shutdown` is cancelled, then drain,
    /// finalize and return.
    ///
    /// A [`LifecycleError::DrainTimeout`] leaves stuck connections open; the
    /// caller is expected to exit the process.
    pub async fn run(
        self,
        listener: TcpListener,
        app: Router,
        shutdown: CancellationToken,
    ) -> Result<(), LifecycleError> {
        let address = listener.local_addr().map_err(LifecycleError::Serve)?;

        let init = self.gate.begin_init(self.config.warmup(), shutdown.clone());

        let service = app.into_make_service_with_connect_info::<SocketAddr>();
        let mut server = tokio::spawn(
            axum::serve(listener, service)
                .with_graceful_shutdown(shutdown.clone().cancelled_owned())
                .into_future(),
        );

        self.transition(LifecycleState::Serving);
        tracing::info!(address = %address, "Accepting connections, watching for shutdown");

        // Checked in order so a server that stopped because of the token is
        // still treated as a shutdown, not a crash.
        let exited_early = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            result = &mut server => Some(result),
        };

        if let Some(result) = exited_early {
            init.abort();
            self.gate.withdraw();
            return Err(match result {
                Ok(Ok(())) => LifecycleError::Serve(std::io::Error::other(
                    "accept loop exited before shutdown was requested",
                )),
                Ok(Err(e)) => LifecycleError::Serve(e),
                Err(e) => LifecycleError::Join(e),
            });
        }

        self.transition(LifecycleState::Draining);
        self.gate.withdraw();
        tracing::info!(
            grace_period_ms = self.config.grace_period_ms,
            "Stopped accepting new connections, draining in-flight requests"
        );

        drain(&mut server, self.config.grace_period()).await?;
        tracing::info!("In-flight requests finished");

        if let Err(e) = init.await {
            tracing::warn!(error = %e, "Readiness warm-up task failed");
        }
        self.gate.finalize(self.config.teardown()).await;

        self.transition(LifecycleState::Stopped);
        tracing::info!("Service fully stopped");
        Ok(())
    }
}
