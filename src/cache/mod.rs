//! Cache storage for worker buckets
//!
//! A bucket is a named store of request -> response pairs. Bucket names carry
//! the worker version, so each version writes its own generation and stale
//! generations can be dropped wholesale on activation.
//!
//! # Matching rules
//!
//! | Request method | `put` | `match_request` |
//! |----------------|-------|-----------------|
//! | GET | stored under the URL without fragment | looked up by the same key |
//! | anything else | rejected | always a miss |
//!
//! Writes to the same key are last-write-wins; each write is atomic.

pub mod disk;
pub mod memory;

pub use disk::DiskCacheStorage;
pub use memory::MemoryCacheStorage;

use crate::error::{SootError, SootResult};
use crate::http::{Headers, Request, Response};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Format bytes as human-readable size (e.g., "1.5 MB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Summary of one stored entry (for listings)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    /// Cache key (URL without fragment)
    pub url: String,
    /// Stored response status
    pub status: u16,
    /// Body size in bytes
    pub size_bytes: u64,
    /// When the entry was written
    pub stored_at: DateTime<Utc>,
}

/// Response snapshot as held by a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    pub url: String,
    pub status: u16,
    pub headers: Headers,
    pub stored_at: DateTime<Utc>,
    #[serde(skip)]
    pub body: Vec<u8>,
}

impl StoredResponse {
    /// Snapshot a response for the given key, taking ownership of its body
    pub fn capture(key: String, response: Response) -> Self {
        let (status, headers, body) = response.into_parts();
        Self {
            url: key,
            status,
            headers,
            stored_at: Utc::now(),
            body,
        }
    }

    /// Materialize a fresh response from the snapshot
    pub fn to_response(&self) -> Response {
        Response::new(self.status, self.headers.clone(), self.body.clone())
    }

    pub fn info(&self) -> EntryInfo {
        EntryInfo {
            url: self.url.clone(),
            status: self.status,
            size_bytes: self.body.len() as u64,
            stored_at: self.stored_at,
        }
    }
}

/// Reject requests the cache cannot store
pub(crate) fn ensure_cacheable(request: &Request) -> SootResult<()> {
    if request.is_get() {
        Ok(())
    } else {
        Err(SootError::CacheRejected {
            url: request.url().to_string(),
            reason: format!("method {} is not cacheable", request.method()),
        })
    }
}

/// One named bucket
#[async_trait]
pub trait Cache: Send + Sync {
    /// Look up a stored response for the request
    async fn match_request(&self, request: &Request) -> SootResult<Option<Response>>;

    /// Store a response for the request, replacing any previous entry
    async fn put(&self, request: &Request, response: Response) -> SootResult<()>;

    /// Remove the entry for the request, returning whether one existed
    async fn delete(&self, request: &Request) -> SootResult<bool>;

    /// Summaries of every stored entry
    async fn entries(&self) -> SootResult<Vec<EntryInfo>>;
}

/// The set of named buckets for one origin
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a bucket, creating it if needed
    async fn open(&self, name: &str) -> SootResult<Arc<dyn Cache>>;

    /// Whether a bucket with this name exists
    async fn has(&self, name: &str) -> SootResult<bool>;

    /// Delete a bucket and all its entries, returning whether it existed
    async fn delete(&self, name: &str) -> SootResult<bool>;

    /// Names of all existing buckets
    async fn keys(&self) -> SootResult<Vec<String>>;
}
