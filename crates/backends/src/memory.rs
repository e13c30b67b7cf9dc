use shoplist_core::{BackendError, Item, ListBackend};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryListBackend {
    items: RwLock<Vec<Item>>,
}

impl InMemoryListBackend {
    pub fn with_items<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut items: Vec<Item> = names.into_iter().map(Item::new).collect();
        items.reverse();
        Self { items: RwLock::new(items) }
    }
}

#[async_trait::async_trait]
impl ListBackend for InMemoryListBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, name: &str) -> Result<(), BackendError> {
        let mut items = self.items.write().await;
        items.insert(0, Item::new(name));
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Item>, BackendError> {
        let items = self.items.read().await;
        Ok(items.clone())
    }

    async fn clear(&self) -> Result<(), BackendError> {
        let mut items = self.items.write().await;
        items.clear();
        Ok(())
    }
}
