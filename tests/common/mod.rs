//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use probe_server::config::{AppInfo, ExecEnv, ServiceConfig};
use probe_server::lifecycle::{LifecycleController, LifecycleState, ReadinessGate};
use probe_server::observability::metrics;
use probe_server::{build_router, AppState, LifecycleError};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A service running on an ephemeral port.
pub struct RunningService {
    pub addr: SocketAddr,
    pub token: CancellationToken,
    pub gate: ReadinessGate,
    pub states: watch::Receiver<LifecycleState>,
    pub task: JoinHandle<Result<(), LifecycleError>>,
}

impl RunningService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait until the controller has reached `state` or moved past it.
    pub async fn wait_for(&mut self, state: LifecycleState) {
        tokio::time::timeout(
            Duration::from_secs(10),
            self.states.wait_for(|s| *s >= state),
        )
        .await
        .expect("timed out waiting for lifecycle state")
        .expect("controller dropped");
    }
}

/// Config with short timings suitable for tests.
pub fn fast_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.lifecycle.warmup_ms = 300;
    config.lifecycle.teardown_ms = 50;
    config.lifecycle.grace_period_ms = 3_000;
    config.http.info_max_delay_ms = 0;
    config
}

/// Bind, build and start the full service.
pub async fn start_service(config: ServiceConfig) -> RunningService {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let info = Arc::new(AppInfo::capture(ExecEnv::Unset));
    let controller = LifecycleController::new(config.lifecycle.clone());
    let gate = controller.gate();
    let mut states = controller.state();
    let app = build_router(AppState {
        gate: controller.gate(),
        metrics: metrics::install(&info.hostname).unwrap(),
        info,
        http: config.http.clone(),
    });

    let token = CancellationToken::new();
    let task = tokio::spawn(controller.run(listener, app, token.clone()));

    tokio::time::timeout(
        Duration::from_secs(5),
        states.wait_for(|s| *s == LifecycleState::Serving),
    )
    .await
    .expect("service did not start serving")
    .unwrap();

    RunningService {
        addr,
        token,
        gate,
        states,
        task,
    }
}

/// Client that never reuses connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
