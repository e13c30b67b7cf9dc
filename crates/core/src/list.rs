use std::sync::Arc;

use async_trait::async_trait;

use crate::{domain::item::Item, errors::BackendError};

/// The capability every list backend offers to the skill.
///
/// `list` returns items newest first.
#[async_trait]
pub trait ListBackend: Send + Sync {
    fn name(&self) -> &'static str;
    async fn create(&self, name: &str) -> Result<(), BackendError>;
    async fn list(&self) -> Result<Vec<Item>, BackendError>;
    async fn clear(&self) -> Result<(), BackendError>;
}

#[async_trait]
impl<T> ListBackend for Arc<T>
where
    T: ListBackend + ?Sized,
{
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn create(&self, name: &str) -> Result<(), BackendError> {
        (**self).create(name).await
    }

    async fn list(&self) -> Result<Vec<Item>, BackendError> {
        (**self).list().await
    }

    async fn clear(&self) -> Result<(), BackendError> {
        (**self).clear().await
    }
}
