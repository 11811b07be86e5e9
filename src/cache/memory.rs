//! In-memory cache storage
//!
//! Buckets live for as long as the storage value does. Used by tests and by
//! hosts that do not need persistence.

use crate::cache::{ensure_cacheable, Cache, CacheStorage, EntryInfo, StoredResponse};
use crate::error::SootResult;
use crate::http::{Request, Response};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

type Entries = Arc<RwLock<HashMap<String, StoredResponse>>>;

/// A bucket held in memory
pub struct MemoryCache {
    entries: Entries,
}

#[async_trait]
impl Cache for MemoryCache {
    async fn match_request(&self, request: &Request) -> SootResult<Option<Response>> {
        if !request.is_get() {
            return Ok(None);
        }
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        Ok(entries
            .get(&request.cache_key())
            .map(StoredResponse::to_response))
    }

    async fn put(&self, request: &Request, response: Response) -> SootResult<()> {
        ensure_cacheable(request)?;
        let key = request.cache_key();
        let stored = StoredResponse::capture(key.clone(), response);
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, stored);
        Ok(())
    }

    async fn delete(&self, request: &Request) -> SootResult<bool> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        Ok(entries.remove(&request.cache_key()).is_some())
    }

    async fn entries(&self) -> SootResult<Vec<EntryInfo>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut infos: Vec<EntryInfo> = entries.values().map(StoredResponse::info).collect();
        infos.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(infos)
    }
}

/// Cache storage held in memory
#[derive(Default)]
pub struct MemoryCacheStorage {
    buckets: RwLock<BTreeMap<String, Entries>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> SootResult<Arc<dyn Cache>> {
        let mut buckets = self.buckets.write().unwrap_or_else(|e| e.into_inner());
        let entries = buckets.entry(name.to_string()).or_default().clone();
        Ok(Arc::new(MemoryCache { entries }))
    }

    async fn has(&self, name: &str) -> SootResult<bool> {
        let buckets = self.buckets.read().unwrap_or_else(|e| e.into_inner());
        Ok(buckets.contains_key(name))
    }

    async fn delete(&self, name: &str) -> SootResult<bool> {
        let mut buckets = self.buckets.write().unwrap_or_else(|e| e.into_inner());
        Ok(buckets.remove(name).is_some())
    }

    async fn keys(&self) -> SootResult<Vec<String>> {
        let buckets = self.buckets.read().unwrap_or_else(|e| e.into_inner());
        Ok(buckets.keys().cloned().collect())
    }
}
