use std::sync::Arc;

use shoplist_backends::{build_backend, BackendInitError, SharedBackend};
use shoplist_core::config::{AppConfig, ConfigError, LoadOptions};
use shoplist_skill::{IntentRouter, SessionStore};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub backend: SharedBackend,
    pub router: Arc<IntentRouter<SharedBackend>>,
    pub sessions: Arc<SessionStore>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("list backend initialization failed: {0}")]
    Backend(#[from] BackendInitError),
}

#[cfg_attr(not(test), allow(dead_code))]
pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        backend = config.backend.kind.as_str(),
        "starting application bootstrap"
    );

    let backend = build_backend(&config).await?;
    let router = Arc::new(IntentRouter::new(backend.clone(), config.backend.timeout()));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        backend_timeout_secs = config.backend.timeout_secs,
        "skill router ready"
    );

    Ok(Application { config, backend, router, sessions: Arc::new(SessionStore::default()) })
}
