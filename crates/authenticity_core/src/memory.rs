//! crates/authenticity_core/src/memory.rs
//!
//! A process-local `KeyValueStore`. Nothing survives a restart.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::ports::{KeyValueStore, PortResult};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds the given entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_exactly_what_was_written() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("user").await.unwrap(), None);

        store.set("user", "{\"id\":\"1\"}").await.unwrap();
        assert_eq!(
            store.get("user").await.unwrap().as_deref(),
            Some("{\"id\":\"1\"}")
        );

        store.remove("user").await.unwrap();
        store.remove("user").await.unwrap();
        assert_eq!(store.get("user").await.unwrap(), None);
    }
}
