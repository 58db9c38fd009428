/// Key-value store
///
/// Every piece of persistent state lives under a logical key as a JSON
/// document. Backends only move strings; `Store` adds typed JSON access and
/// change notification on top.

pub mod keys;
pub mod memory;
pub mod sqlite;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

use crate::error::AppResult;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Storage backend trait
///
/// Writes are last-write-wins per key. There is no multi-key atomicity.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Read the raw value stored under `key`
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Replace the value stored under `key`
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Remove `key`; removing a missing key is not an error
    async fn remove(&self, key: &str) -> AppResult<()>;

    /// All keys starting with `prefix`, sorted
    async fn keys_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>>;
}

/// Kind of change published to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEventKind {
    Set,
    Removed,
}

/// A change to one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub key: String,
    pub kind: StoreEventKind,
}

/// Typed store service shared by every component
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn KvBackend>,
    events: broadcast::Sender<StoreEvent>,
}

impl Store {
    /// Wrap a backend
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        let (events, _) = broadcast::channel(256);
        Self { backend, events }
    }

    /// Store backed by process memory
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.backend.get(key).await
    }

    pub async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.backend.set(key, value).await?;
        self.publish(key, StoreEventKind::Set);
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> AppResult<()> {
        self.backend.remove(key).await?;
        self.publish(key, StoreEventKind::Removed);
        Ok(())
    }

    pub async fn keys_with_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        self.backend.keys_with_prefix(prefix).await
    }

    /// Decode the JSON document under `key`
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        match self.backend.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encode `value` as JSON under `key`
    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> AppResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw).await
    }

    /// Receive every subsequent change
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn publish(&self, key: &str, kind: StoreEventKind) {
        // No subscribers is fine
        let _ = self.events.send(StoreEvent {
            key: key.to_string(),
            kind,
        });
    }
}
