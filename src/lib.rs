pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod infra;
pub mod state;
pub mod timer;

use std::sync::Arc;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::EngineConfig;
use crate::domain::ports::{DataStore, NotificationPlatform};
use crate::engine::Engine;
use crate::state::bootstrap_state;

pub fn init_logging() -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("./logs", "agenda-engine.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("info,agenda_engine=debug"));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_target(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()));

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized. Writing JSON logs to ./logs/");
    guard
}

/// Wires the service graph onto the host's store and notification platform
/// and starts change dispatch. The caller still drives `bootup()` so it can
/// decide when the startup side effects (permission prompt, generation) run.
pub fn start_engine(
    store: Arc<dyn DataStore>,
    platform: Arc<dyn NotificationPlatform>,
) -> Engine {
    let state = Arc::new(bootstrap_state(EngineConfig::from_env(), store, platform));
    let engine = Engine::new(state);
    engine.start();
    engine
}
