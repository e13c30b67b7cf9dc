use chrono::{SecondsFormat, Utc};
use shoplist_core::{BackendError, Item, ListBackend};
use sqlx::Row;
use uuid::Uuid;

use crate::DbPool;

/// To-do list store kept in a single SQLite table.
pub struct SqlTodoListBackend {
    pool: DbPool,
}

impl SqlTodoListBackend {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn database_error(error: sqlx::Error) -> BackendError {
    BackendError::Unavailable(format!("to-do store: {error}"))
}

#[async_trait::async_trait]
impl ListBackend for SqlTodoListBackend {
    fn name(&self) -> &'static str {
        "to_do_list"
    }

    async fn create(&self, name: &str) -> Result<(), BackendError> {
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        sqlx::query("INSERT INTO list_item (id, name, created_at) VALUES (?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(name)
            .bind(created_at)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Item>, BackendError> {
        let rows = sqlx::query("SELECT name FROM list_item ORDER BY created_at DESC, rowid DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?;

        rows.iter()
            .map(|row| {
                row.try_get::<String, _>("name")
                    .map(Item::new)
                    .map_err(|e| BackendError::Decode(e.to_string()))
            })
            .collect()
    }

    async fn clear(&self) -> Result<(), BackendError> {
        sqlx::query("DELETE FROM list_item").execute(&self.pool).await.map_err(database_error)?;
        Ok(())
    }
}
