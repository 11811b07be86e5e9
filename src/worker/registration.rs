//! Registration state: which worker version is waiting and which is active
//!
//! The registration is host state, not worker state, so it is persisted next
//! to the cache buckets and survives process restarts. It drives each version
//! through `Installing -> Waiting -> Activating -> Active`; a version that
//! fails to install, or is replaced, ends up `Redundant`.

use super::{CacheWorker, LocalHost};
use crate::error::{SootError, SootResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::{debug, error, info};
use url::Url;

/// Lifecycle state of one worker version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Installing,
    Waiting,
    Activating,
    Active,
    Redundant,
}

impl WorkerState {
    /// Whether a worker in this state handles fetches
    pub fn controls_clients(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installing => write!(f, "installing"),
            Self::Waiting => write!(f, "waiting"),
            Self::Activating => write!(f, "activating"),
            Self::Active => write!(f, "active"),
            Self::Redundant => write!(f, "redundant"),
        }
    }
}

/// One registered worker version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Cache generation the version owns
    pub cache_name: String,

    /// Current lifecycle state
    pub state: WorkerState,

    /// When install completed
    pub installed_at: DateTime<Utc>,

    /// When activation completed
    pub activated_at: Option<DateTime<Utc>>,
}

/// Registration for one origin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Origin the registration belongs to
    pub scope: Option<Url>,

    /// Version serving clients
    pub active: Option<VersionRecord>,

    /// Installed version waiting to take over
    pub waiting: Option<VersionRecord>,
}

impl Registration {
    /// Load registration from file, or an empty one if it does not exist
    pub async fn load(path: &Path) -> SootResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            SootError::io(format!("reading registration {}", path.display()), e)
        })?;

        Ok(serde_json::from_str(&content)?)
    }

    /// Save registration to file
    pub async fn save(&self, path: &Path) -> SootResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SootError::io("creating state directory", e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await.map_err(|e| {
            SootError::io(format!("writing registration {}", path.display()), e)
        })?;

        Ok(())
    }

    /// The version handling fetches, if any
    pub fn controller(&self) -> Option<&VersionRecord> {
        self.active
            .as_ref()
            .filter(|record| record.state.controls_clients())
    }

    /// Install a worker version
    ///
    /// On failure the version is discarded and the active version, if any,
    /// stays in charge. On success it waits, and is activated straight away
    /// when it asked to skip waiting or nothing else is active.
    pub async fn install(
        &mut self,
        worker: &CacheWorker,
        host: &LocalHost,
        on_fetched: &(dyn Fn(&Url) + Send + Sync),
        allow_activate: bool,
    ) -> SootResult<WorkerState> {
        let cache_name = worker.cache_name().to_string();
        debug!("{}: {}", cache_name, WorkerState::Installing);
        self.scope = Some(worker.settings().origin_url.clone());

        if let Err(e) = worker.install_with_progress(on_fetched).await {
            error!("{} became {}: {}", cache_name, WorkerState::Redundant, e);
            return Err(e);
        }

        self.waiting = Some(VersionRecord {
            cache_name,
            state: WorkerState::Waiting,
            installed_at: Utc::now(),
            activated_at: None,
        });

        let skip_waiting = host.take_skip_waiting();
        if allow_activate && (skip_waiting || self.controller().is_none()) {
            self.activate(worker).await?;
            return Ok(WorkerState::Active);
        }

        Ok(WorkerState::Waiting)
    }

    /// Promote the waiting version if a skip-waiting request is pending
    pub async fn apply_skip_waiting(
        &mut self,
        worker: &CacheWorker,
        host: &LocalHost,
    ) -> SootResult<bool> {
        if !host.take_skip_waiting() || self.waiting.is_none() {
            return Ok(false);
        }
        self.activate(worker).await?;
        Ok(true)
    }

    /// Activate the waiting version
    pub async fn activate(&mut self, worker: &CacheWorker) -> SootResult<Vec<String>> {
        let mut record = self.waiting.take().ok_or(SootError::NothingWaiting)?;

        if record.cache_name != worker.cache_name() {
            let registered = record.cache_name.clone();
            self.waiting = Some(record);
            return Err(SootError::VersionMismatch {
                registered,
                configured: worker.cache_name().to_string(),
            });
        }

        record.state = WorkerState::Activating;
        debug!("{}: {}", record.cache_name, record.state);

        let deleted = match worker.activate().await {
            Ok(deleted) => deleted,
            Err(e) => {
                self.waiting = Some(VersionRecord {
                    state: WorkerState::Waiting,
                    ..record
                });
                return Err(e);
            }
        };

        if let Some(previous) = self.active.take() {
            if previous.cache_name != record.cache_name {
                info!("{} became {}", previous.cache_name, WorkerState::Redundant);
            }
        }

        record.state = WorkerState::Active;
        record.activated_at = Some(Utc::now());
        info!("{} is {}", record.cache_name, record.state);
        self.active = Some(record);

        Ok(deleted)
    }

    /// The active version, checked against the configured worker
    pub fn require_controller(&self, worker: &CacheWorker) -> SootResult<&VersionRecord> {
        let active = self.controller().ok_or(SootError::NoActiveWorker)?;
        if active.cache_name != worker.cache_name() {
            return Err(SootError::VersionMismatch {
                registered: active.cache_name.clone(),
                configured: worker.cache_name().to_string(),
            });
        }
        Ok(active)
    }
}
