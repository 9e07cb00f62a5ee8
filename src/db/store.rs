use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::error::AppResult;

/// Injected key-value persistence
///
/// Values are read at mount and written on user action. Last write wins; there is no expiry
/// and no versioning.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set(&self, key: &str, value: String) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Process-local store, used when no Redis URL is configured and in tests
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
