pub mod connection;
pub mod home_assistant;
pub mod memory;
pub mod migrations;
pub mod todo;

use std::sync::Arc;

use reqwest::Client;
use shoplist_core::config::{AppConfig, BackendKind};
use shoplist_core::ListBackend;
use thiserror::Error;
use tracing::info;

pub use connection::{connect_with_settings, DbPool};
pub use home_assistant::HomeAssistantBackend;
pub use memory::InMemoryListBackend;
pub use todo::SqlTodoListBackend;

pub type SharedBackend = Arc<dyn ListBackend>;

#[derive(Debug, Error)]
pub enum BackendInitError {
    #[error("to-do store connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("to-do store migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("http client construction failed: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("backend `{backend}` is missing required setting `{setting}`")]
    MissingSetting { backend: &'static str, setting: &'static str },
}

/// Builds the backend selected by `backend.kind`.
pub async fn build_backend(config: &AppConfig) -> Result<SharedBackend, BackendInitError> {
    let backend: SharedBackend = match config.backend.kind {
        BackendKind::TodoList => {
            let pool = connect_with_settings(
                &config.todo.database_url,
                config.todo.max_connections,
                config.backend.timeout_secs,
            )
            .await
            .map_err(BackendInitError::DatabaseConnect)?;
            migrations::run_pending(&pool).await.map_err(BackendInitError::Migration)?;
            Arc::new(SqlTodoListBackend::new(pool))
        }
        BackendKind::HomeAssistant => {
            let base_url = config.home_assistant.base_url.clone().ok_or(
                BackendInitError::MissingSetting {
                    backend: "home_assistant",
                    setting: "home_assistant.base_url",
                },
            )?;
            let token = config.home_assistant.token.clone().ok_or(
                BackendInitError::MissingSetting {
                    backend: "home_assistant",
                    setting: "home_assistant.token",
                },
            )?;
            let client = Client::builder()
                .timeout(config.backend.timeout())
                .build()
                .map_err(BackendInitError::HttpClient)?;
            Arc::new(HomeAssistantBackend::new(client, base_url, token))
        }
        BackendKind::Memory => Arc::new(InMemoryListBackend::default()),
    };

    info!(
        event_name = "system.backend.selected",
        correlation_id = "bootstrap",
        backend = backend.name(),
        "list backend initialized"
    );

    Ok(backend)
}
