//! Scripted network, failing storage and fixture workers for unit tests

use super::{CacheWorker, LocalHost, WorkerSettings};
use crate::cache::{Cache, CacheStorage, EntryInfo, MemoryCacheStorage};
use crate::config::Config;
use crate::error::{SootError, SootResult};
use crate::http::{Headers, Request, Response};
use crate::network::Network;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use url::Url;

pub(crate) const ORIGIN: &str = "http://localhost:4000";

/// Absolute URL for a path on the test origin
pub(crate) fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

enum Route {
    Respond(u16, Vec<u8>),
    Fail,
}

/// Network whose answers are set up by the test
///
/// Unknown URLs answer 404. `hold` parks every fetch until `release`.
#[derive(Default)]
pub(crate) struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl ScriptedNetwork {
    pub(crate) fn respond(&self, url: &Url, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Route::Respond(status, body.as_bytes().to_vec()));
    }

    pub(crate) fn fail(&self, url: &Url) {
        self.routes.lock().unwrap().insert(url.to_string(), Route::Fail);
    }

    /// Answer 200 for every asset the worker precaches
    pub(crate) fn serve_precache(&self, worker: &CacheWorker) {
        for asset in &worker.settings().precache {
            self.respond(asset, 200, &format!("{} body", asset.path()));
        }
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn hold(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self, url: &Url) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| *c == url.as_str())
            .count()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> SootResult<Response> {
        let key = request.url().to_string();
        self.calls.lock().unwrap().push(key.clone());

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(SootError::network(key, "offline"));
        }

        match self.routes.lock().unwrap().get(&key) {
            Some(Route::Respond(status, body)) => {
                Ok(Response::new(*status, Headers::new(), body.clone()))
            }
            Some(Route::Fail) => Err(SootError::network(key, "connection refused")),
            None => Ok(Response::new(404, Headers::new(), b"not found".to_vec())),
        }
    }
}

pub(crate) struct Fixture {
    pub(crate) worker: CacheWorker,
    pub(crate) storage: Arc<MemoryCacheStorage>,
    pub(crate) network: Arc<ScriptedNetwork>,
    pub(crate) host: Arc<LocalHost>,
}

fn build(config: &Config) -> Fixture {
    let storage = Arc::new(MemoryCacheStorage::new());
    let network = Arc::new(ScriptedNetwork::default());
    let host = Arc::new(LocalHost::new());
    let settings = WorkerSettings::from_config(config).unwrap();
    let worker = CacheWorker::new(settings, storage.clone(), network.clone(), host.clone());
    Fixture {
        worker,
        storage,
        network,
        host,
    }
}

/// Worker with the default configuration on the test origin
pub(crate) fn fixture() -> Fixture {
    let mut config = Config::default();
    config.worker.origin = ORIGIN.to_string();
    build(&config)
}

/// Worker with a custom precache list
pub(crate) fn fixture_with(precache: &[&str]) -> Fixture {
    let mut config = Config::default();
    config.worker.origin = ORIGIN.to_string();
    config.worker.precache = precache.iter().map(|p| p.to_string()).collect();
    build(&config)
}

/// Worker for another cache generation sharing `storage`
pub(crate) fn version_on(
    storage: Arc<MemoryCacheStorage>,
    network: Arc<ScriptedNetwork>,
    host: Arc<LocalHost>,
    cache_name: &str,
) -> CacheWorker {
    let mut config = Config::default();
    config.worker.origin = ORIGIN.to_string();
    config.worker.cache_name = cache_name.to_string();
    config.worker.precache = vec!["/".to_string(), "/offline.html".to_string()];
    let settings = WorkerSettings::from_config(&config).unwrap();
    CacheWorker::new(settings, storage, network, host)
}

/// Storage whose deletes, opens or lookups can be made to fail
#[derive(Default)]
pub(crate) struct FlakyStorage {
    inner: MemoryCacheStorage,
    undeletable: Mutex<HashSet<String>>,
    unopenable: AtomicBool,
    unreadable: AtomicBool,
}

impl FlakyStorage {
    pub(crate) fn refuse_delete(&self, name: &str) {
        self.undeletable.lock().unwrap().insert(name.to_string());
    }

    /// Every `open` fails from now on
    pub(crate) fn break_open(&self) {
        self.unopenable.store(true, Ordering::SeqCst);
    }

    /// Opened caches fail every lookup from now on; writes still land
    pub(crate) fn break_reads(&self) {
        self.unreadable.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    async fn open(&self, name: &str) -> SootResult<Arc<dyn Cache>> {
        if self.unopenable.load(Ordering::SeqCst) {
            return Err(SootError::io(
                format!("opening cache {}", name),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied"),
            ));
        }
        let cache = self.inner.open(name).await?;
        if self.unreadable.load(Ordering::SeqCst) {
            return Ok(Arc::new(UnreadableCache {
                name: name.to_string(),
                inner: cache,
            }));
        }
        Ok(cache)
    }

    async fn has(&self, name: &str) -> SootResult<bool> {
        self.inner.has(name).await
    }

    async fn delete(&self, name: &str) -> SootResult<bool> {
        if self.undeletable.lock().unwrap().contains(name) {
            return Err(SootError::io(
                format!("deleting cache {}", name),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied"),
            ));
        }
        self.inner.delete(name).await
    }

    async fn keys(&self) -> SootResult<Vec<String>> {
        self.inner.keys().await
    }
}

struct UnreadableCache {
    name: String,
    inner: Arc<dyn Cache>,
}

#[async_trait]
impl Cache for UnreadableCache {
    async fn match_request(&self, request: &Request) -> SootResult<Option<Response>> {
        Err(SootError::CacheEntryCorrupt {
            path: PathBuf::from(&self.name).join(request.cache_key()),
            reason: "truncated metadata line".to_string(),
        })
    }

    async fn put(&self, request: &Request, response: Response) -> SootResult<()> {
        self.inner.put(request, response).await
    }

    async fn delete(&self, request: &Request) -> SootResult<bool> {
        self.inner.delete(request).await
    }

    async fn entries(&self) -> SootResult<Vec<EntryInfo>> {
        self.inner.entries().await
    }
}

pub(crate) struct FlakyFixture {
    pub(crate) worker: CacheWorker,
    pub(crate) storage: Arc<FlakyStorage>,
    pub(crate) network: Arc<ScriptedNetwork>,
    pub(crate) host: Arc<LocalHost>,
}

/// Worker with the default configuration on top of `FlakyStorage`
pub(crate) fn flaky_fixture() -> FlakyFixture {
    let mut config = Config::default();
    config.worker.origin = ORIGIN.to_string();
    let storage = Arc::new(FlakyStorage::default());
    let network = Arc::new(ScriptedNetwork::default());
    let host = Arc::new(LocalHost::new());
    let settings = WorkerSettings::from_config(&config).unwrap();
    let worker = CacheWorker::new(settings, storage.clone(), network.clone(), host.clone());
    FlakyFixture {
        worker,
        storage,
        network,
        host,
    }
}
