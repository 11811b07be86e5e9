//! Persistent cache storage on the local filesystem
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/<hex(bucket name)>/<sha256(cache key)>.entry
//! ```
//!
//! Each entry file is one line of compact JSON metadata, a newline, then the
//! raw body bytes. Entries are written to a temporary file in the bucket
//! directory and renamed into place, so a reader sees either the old or the
//! new entry, never a torn one.

use crate::cache::{ensure_cacheable, Cache, CacheStorage, EntryInfo, StoredResponse};
use crate::error::{SootError, SootResult};
use crate::http::{Request, Response};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, warn};

const ENTRY_EXTENSION: &str = "entry";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Hash a cache key into its entry file stem
fn entry_stem(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Split an entry file into metadata and body
fn decode_entry(path: &Path, bytes: Vec<u8>) -> SootResult<StoredResponse> {
    let newline = bytes
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| SootError::CacheEntryCorrupt {
            path: path.to_path_buf(),
            reason: "missing metadata line".to_string(),
        })?;

    let mut stored: StoredResponse =
        serde_json::from_slice(&bytes[..newline]).map_err(|e| SootError::CacheEntryCorrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    stored.body = bytes[newline + 1..].to_vec();
    Ok(stored)
}

fn encode_entry(stored: &StoredResponse) -> SootResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec(stored)?;
    bytes.push(b'\n');
    bytes.extend_from_slice(&stored.body);
    Ok(bytes)
}

/// A bucket stored as a directory of entry files
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    fn entry_path(&self, request: &Request) -> PathBuf {
        self.dir
            .join(format!("{}.{}", entry_stem(&request.cache_key()), ENTRY_EXTENSION))
    }

    async fn read_entry(path: &Path) -> SootResult<Option<StoredResponse>> {
        match fs::read(path).await {
            Ok(bytes) => decode_entry(path, bytes).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SootError::io(
                format!("reading cache entry {}", path.display()),
                e,
            )),
        }
    }
}

#[async_trait]
impl Cache for DiskCache {
    async fn match_request(&self, request: &Request) -> SootResult<Option<Response>> {
        if !request.is_get() {
            return Ok(None);
        }
        let stored = Self::read_entry(&self.entry_path(request)).await?;
        Ok(stored.map(|s| s.to_response()))
    }

    async fn put(&self, request: &Request, response: Response) -> SootResult<()> {
        ensure_cacheable(request)?;

        // The bucket may have been deleted since it was opened
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            SootError::io(format!("creating bucket directory {}", self.dir.display()), e)
        })?;

        let stored = StoredResponse::capture(request.cache_key(), response);
        let bytes = encode_entry(&stored)?;
        let path = self.entry_path(request);
        let temp = self.dir.join(format!(
            ".tmp-{}-{}",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        fs::write(&temp, bytes)
            .await
            .map_err(|e| SootError::io(format!("writing cache entry {}", temp.display()), e))?;
        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(SootError::io(
                format!("committing cache entry {}", path.display()),
                e,
            ));
        }

        debug!("Stored {} in {}", stored.url, self.dir.display());
        Ok(())
    }

    async fn delete(&self, request: &Request) -> SootResult<bool> {
        let path = self.entry_path(request);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SootError::io(
                format!("deleting cache entry {}", path.display()),
                e,
            )),
        }
    }

    async fn entries(&self) -> SootResult<Vec<EntryInfo>> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }

        let mut infos = vec![];
        let mut dir = fs::read_dir(&self.dir)
            .await
            .map_err(|e| SootError::io("reading bucket directory", e))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| SootError::io("reading bucket entry", e))?
        {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) {
                continue;
            }
            match Self::read_entry(&path).await {
                Ok(Some(stored)) => infos.push(stored.info()),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable cache entry: {}", e),
            }
        }

        infos.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(infos)
    }
}

/// Cache storage rooted at a directory
pub struct DiskCacheStorage {
    root: PathBuf,
}

impl DiskCacheStorage {
    /// Create storage rooted at `root` (created lazily on first write)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, name: &str) -> PathBuf {
        self.root.join(hex::encode(name.as_bytes()))
    }
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    async fn open(&self, name: &str) -> SootResult<Arc<dyn Cache>> {
        let dir = self.bucket_dir(name);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| SootError::io(format!("opening bucket {}", name), e))?;
        Ok(Arc::new(DiskCache { dir }))
    }

    async fn has(&self, name: &str) -> SootResult<bool> {
        Ok(self.bucket_dir(name).is_dir())
    }

    async fn delete(&self, name: &str) -> SootResult<bool> {
        let dir = self.bucket_dir(name);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SootError::io(format!("deleting bucket {}", name), e)),
        }
    }

    async fn keys(&self) -> SootResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(vec![]);
        }

        let mut names = vec![];
        let mut dir = fs::read_dir(&self.root)
            .await
            .map_err(|e| SootError::io("reading cache storage directory", e))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| SootError::io("reading cache storage entry", e))?
        {
            let file_name = entry.file_name();
            let decoded = file_name
                .to_str()
                .and_then(|s| hex::decode(s).ok())
                .and_then(|bytes| String::from_utf8(bytes).ok());
            match decoded {
                Some(name) if entry.path().is_dir() => names.push(name),
                _ => debug!("Ignoring foreign entry {:?} in cache storage", file_name),
            }
        }

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Headers;
    use tempfile::TempDir;

    fn request(path: &str) -> Request {
        Request::parse(&format!("http://localhost:4000{}", path)).unwrap()
    }

    #[tokio::test]
    async fn entries_survive_reopen() {
        let temp = TempDir::new().unwrap();

        {
            let storage = DiskCacheStorage::new(temp.path());
            let cache = storage.open("soot-silicon-v1").await.unwrap();
            let mut headers = Headers::new();
            headers.insert("Content-Type", "text/css");
            cache
                .put(&request("/assets/css/main.css"), Response::new(200, headers, b"body{}\n".to_vec()))
                .await
                .unwrap();
        }

        let storage = DiskCacheStorage::new(temp.path());
        let cache = storage.open("soot-silicon-v1").await.unwrap();
        let hit = cache
            .match_request(&request("/assets/css/main.css"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(hit.status(), 200);
        assert_eq!(hit.headers().get("content-type"), Some("text/css"));
        assert_eq!(hit.body(), b"body{}\n");
    }

    #[tokio::test]
    async fn keys_decode_bucket_names() {
        let temp = TempDir::new().unwrap();
        let storage = DiskCacheStorage::new(temp.path());

        storage.open("soot-silicon-v1").await.unwrap();
        storage.open("soot-silicon-v0").await.unwrap();
        std::fs::write(temp.path().join("stray.txt"), "x").unwrap();

        assert_eq!(
            storage.keys().await.unwrap(),
            vec!["soot-silicon-v0", "soot-silicon-v1"]
        );
    }

    #[tokio::test]
    async fn keys_empty_when_root_missing() {
        let temp = TempDir::new().unwrap();
        let storage = DiskCacheStorage::new(temp.path().join("missing"));
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_bucket_removes_directory() {
        let temp = TempDir::new().unwrap();
        let storage = DiskCacheStorage::new(temp.path());
        let cache = storage.open("v1").await.unwrap();
        cache.put(&request("/"), Response::ok("root")).await.unwrap();

        assert!(storage.delete("v1").await.unwrap());
        assert!(!storage.has("v1").await.unwrap());
        assert!(!storage.delete("v1").await.unwrap());
    }

    #[tokio::test]
    async fn put_after_bucket_delete_recreates_it() {
        let temp = TempDir::new().unwrap();
        let storage = DiskCacheStorage::new(temp.path());
        let cache = storage.open("v1").await.unwrap();

        storage.delete("v1").await.unwrap();
        cache.put(&request("/a.css"), Response::ok("a")).await.unwrap();

        assert!(storage.has("v1").await.unwrap());
    }

    #[tokio::test]
    async fn entries_lists_stored_urls() {
        let temp = TempDir::new().unwrap();
        let storage = DiskCacheStorage::new(temp.path());
        let cache = storage.open("v1").await.unwrap();

        cache.put(&request("/b"), Response::ok("bb")).await.unwrap();
        cache.put(&request("/a"), Response::ok("a")).await.unwrap();
        assert!(cache.delete(&request("/b")).await.unwrap());
        assert!(!cache.delete(&request("/b")).await.unwrap());

        let entries = cache.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "http://localhost:4000/a");
        assert_eq!(entries[0].size_bytes, 1);
    }

    #[test]
    fn corrupt_entry_is_reported() {
        let err = decode_entry(Path::new("x.entry"), b"no newline".to_vec()).unwrap_err();
        assert!(matches!(err, SootError::CacheEntryCorrupt { .. }));

        let err = decode_entry(Path::new("x.entry"), b"{bad json\nbody".to_vec()).unwrap_err();
        assert!(matches!(err, SootError::CacheEntryCorrupt { .. }));
    }
}
