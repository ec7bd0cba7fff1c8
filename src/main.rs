//! Probe server
//!
//! A minimal HTTP service meant to run under a container orchestrator.
//!
//! # Architecture Overview
//!
//! ```text
//!     SIGINT/SIGTERM ──▶ SignalAdapter ──▶ CancellationToken
//!                                              │
//!                                              ▼
//!     ┌──────────────────────── LifecycleController ────────────────────────┐
//!     │ Starting ──▶ Serving ──▶ Draining (bounded) ──▶ Stopped              │
//!     │                │                                  ▲                  │
//!     │                ├── ReadinessGate warm-up          └── finalizer      │
//!     │                ▼                                                     │
//!     │   accept loop ─▶ access log ─▶ header propagation ─▶ handlers       │
//!     └──────────────────────────────────────────────────────────────────────┘
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use probe_server::config::{self, AppInfo, ExecEnv, ObservabilityConfig};
use probe_server::lifecycle::{startup, LifecycleController, LifecycleError, SignalAdapter};
use probe_server::observability::logging::{self, fields};
use probe_server::observability::metrics;
use probe_server::{build_router, AppState};

const LONG_ABOUT: &str = "\
HTTP service for container orchestrators.

Endpoints (default port 8000):
  - Liveness probe  : /healthz, /livez
  - Readiness probe : /readyz
  - Metrics         : /metrics
  - Service info    : /info, /
  - Action          : /run

Start the service with: probe-server serve";

#[derive(Parser)]
#[command(name = "probe-server", version)]
#[command(about = "HTTP service with liveness, readiness and metrics endpoints")]
#[command(long_about = LONG_ABOUT)]
struct Cli {
    /// Config file (default is $HOME/.probe-server.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service until SIGINT/SIGTERM
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let Some(Commands::Serve) = cli.command else {
        Cli::command().print_long_help()?;
        return Ok(());
    };

    let exec_env = ExecEnv::from_env();

    let config = match config::loader::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init(&ObservabilityConfig::default(), exec_env);
            logging::fatal(
                "Failed to load configuration",
                Some(&fields([("error", e.to_string())])),
            );
        }
    };

    logging::init(&config.observability, exec_env);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "probe-server starting");
    if let Some(path) = &cli.config {
        tracing::info!(path = %path.display(), "Using config file");
    }
    startup::announce(&config, exec_env);

    let info = Arc::new(AppInfo::capture(exec_env));
    let metrics = match metrics::install(&info.hostname) {
        Ok(handle) => handle,
        Err(e) => logging::fatal(
            "Failed to install metrics recorder",
            Some(&fields([("error", e.to_string())])),
        ),
    };

    let signals = match SignalAdapter::install(CancellationToken::new()) {
        Ok(signals) => signals,
        Err(e) => logging::fatal(
            "Failed to subscribe to termination signals",
            Some(&fields([("error", LifecycleError::Signal(e).to_string())])),
        ),
    };

    let listener = match startup::bind(&config).await {
        Ok(listener) => listener,
        Err(e) => logging::fatal(
            "Failed to start listener",
            Some(&fields([("error", e.to_string())])),
        ),
    };

    let controller = LifecycleController::new(config.lifecycle.clone());
    let app = build_router(AppState {
        gate: controller.gate(),
        info,
        metrics,
        http: config.http.clone(),
    });

    if let Err(e) = controller.run(listener, app, signals.token()).await {
        logging::fatal(
            "Server not gracefully shut down",
            Some(&fields([("error", e.to_string())])),
        );
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
