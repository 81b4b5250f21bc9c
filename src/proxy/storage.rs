//! Cache storage abstraction
//!
//! Mirrors the browser's cache storage: a set of named stores, each a
//! key-value map of request key to response. Stores are addressed by
//! their cache namespace name.

use crate::error::{PrecacheError, PrecacheResult};
use crate::proxy::request::Response;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Browser-managed cache storage
///
/// Writes are last-write-wins; concurrent puts for the same key need no
/// coordination because entries are snapshots of idempotent GET responses.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a store, creating it if absent
    async fn open(&self, namespace: &str) -> PrecacheResult<()>;

    /// Names of all existing stores, in creation order
    async fn keys(&self) -> PrecacheResult<Vec<String>>;

    /// Delete a store. Returns whether it existed
    async fn delete(&self, namespace: &str) -> PrecacheResult<bool>;

    /// Exact lookup in one store
    async fn get(&self, namespace: &str, key: &str) -> PrecacheResult<Option<Response>>;

    /// Store one entry, creating the store if needed
    async fn put(&self, namespace: &str, key: &str, response: Response) -> PrecacheResult<()>;

    /// Store all entries at once; either every entry lands or none does
    async fn put_batch(
        &self,
        namespace: &str,
        entries: Vec<(String, Response)>,
    ) -> PrecacheResult<()>;

    /// Lookup across all stores, oldest store first
    async fn match_any(&self, key: &str) -> PrecacheResult<Option<Response>>;

    /// Number of entries in a store (0 if absent)
    async fn entry_count(&self, namespace: &str) -> PrecacheResult<usize>;
}

/// In-process cache storage
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    stores: RwLock<Vec<(String, HashMap<String, Response>)>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

fn store_mut<'a>(
    stores: &'a mut Vec<(String, HashMap<String, Response>)>,
    namespace: &str,
) -> &'a mut HashMap<String, Response> {
    let index = match stores.iter().position(|(name, _)| name == namespace) {
        Some(index) => index,
        None => {
            stores.push((namespace.to_string(), HashMap::new()));
            stores.len() - 1
        }
    };
    &mut stores[index].1
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, namespace: &str) -> PrecacheResult<()> {
        if namespace.is_empty() {
            return Err(PrecacheError::CacheStorage(
                "cache namespace must not be empty".to_string(),
            ));
        }
        let mut stores = self.stores.write().await;
        store_mut(&mut stores, namespace);
        Ok(())
    }

    async fn keys(&self) -> PrecacheResult<Vec<String>> {
        let stores = self.stores.read().await;
        Ok(stores.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn delete(&self, namespace: &str) -> PrecacheResult<bool> {
        let mut stores = self.stores.write().await;
        let before = stores.len();
        stores.retain(|(name, _)| name != namespace);
        Ok(stores.len() != before)
    }

    async fn get(&self, namespace: &str, key: &str) -> PrecacheResult<Option<Response>> {
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .find(|(name, _)| name == namespace)
            .and_then(|(_, entries)| entries.get(key).cloned()))
    }

    async fn put(&self, namespace: &str, key: &str, response: Response) -> PrecacheResult<()> {
        let mut stores = self.stores.write().await;
        store_mut(&mut stores, namespace).insert(key.to_string(), response);
        Ok(())
    }

    async fn put_batch(
        &self,
        namespace: &str,
        entries: Vec<(String, Response)>,
    ) -> PrecacheResult<()> {
        // one write lock for the whole batch
        let mut stores = self.stores.write().await;
        store_mut(&mut stores, namespace).extend(entries);
        Ok(())
    }

    async fn match_any(&self, key: &str) -> PrecacheResult<Option<Response>> {
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .find_map(|(_, entries)| entries.get(key).cloned()))
    }

    async fn entry_count(&self, namespace: &str) -> PrecacheResult<usize> {
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .find(|(name, _)| name == namespace)
            .map_or(0, |(_, entries)| entries.len()))
    }
}
