//! Worker wiring shared by the commands

use crate::cache::DiskCacheStorage;
use crate::config::Config;
use crate::error::SootResult;
use crate::network::HttpNetwork;
use crate::worker::{CacheWorker, LocalHost, Registration, WorkerSettings};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const CACHES_DIR: &str = "caches";
const REGISTRATION_FILE: &str = "registration.json";

/// The configured worker version wired to on-disk storage and HTTP
pub struct WorkerContext {
    pub worker: CacheWorker,
    pub storage: Arc<DiskCacheStorage>,
    pub network: Arc<HttpNetwork>,
    pub host: Arc<LocalHost>,
    registration_path: PathBuf,
}

impl WorkerContext {
    /// Build the worker for `config` with state under `state_dir`
    pub fn open(config: &Config, state_dir: &Path) -> SootResult<Self> {
        let settings = WorkerSettings::from_config(config)?;
        let storage = Arc::new(DiskCacheStorage::new(state_dir.join(CACHES_DIR)));
        let network = Arc::new(HttpNetwork::new(&config.network));
        let host = Arc::new(LocalHost::new());

        debug!(
            "Worker {} for {} with state in {}",
            settings.cache_name,
            settings.origin_url,
            state_dir.display()
        );

        let worker = CacheWorker::new(settings, storage.clone(), network.clone(), host.clone());
        Ok(Self {
            worker,
            storage,
            network,
            host,
            registration_path: state_dir.join(REGISTRATION_FILE),
        })
    }

    pub fn registration_path(&self) -> &Path {
        &self.registration_path
    }

    pub async fn registration(&self) -> SootResult<Registration> {
        Registration::load(&self.registration_path).await
    }

    pub async fn save_registration(&self, registration: &Registration) -> SootResult<()> {
        registration.save(&self.registration_path).await
    }

    /// Load the registration, failing unless the configured version is active
    pub async fn controlled(&self) -> SootResult<Registration> {
        let registration = self.registration().await?;
        registration.require_controller(&self.worker)?;
        Ok(registration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SootError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn fresh_state_has_no_controller() {
        let temp = TempDir::new().unwrap();
        let ctx = WorkerContext::open(&Config::default(), temp.path()).unwrap();

        assert!(ctx.registration().await.unwrap().active.is_none());
        assert!(matches!(ctx.controlled().await, Err(SootError::NoActiveWorker)));
        assert_eq!(ctx.registration_path(), temp.path().join("registration.json"));
        assert_eq!(ctx.storage.root(), temp.path().join("caches"));
    }

    #[test]
    fn invalid_origin_is_rejected() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.worker.origin = "not a url".to_string();
        assert!(WorkerContext::open(&config, temp.path()).is_err());
    }
}
