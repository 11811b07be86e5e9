//! Offline cache worker
//!
//! One `CacheWorker` value is one worker version. Its settings are resolved
//! once at construction and never change; the only state that outlives a
//! handler call is what it writes to cache storage.
//!
//! Events reach the worker through [`CacheWorker::dispatch`], which routes
//! each event kind to exactly one handler:
//!
//! | Event | Handler |
//! |-------|---------|
//! | install | precache the asset list, then request skip-waiting |
//! | activate | delete stale generations, then claim clients |
//! | fetch | origin filter, network-first navigation, stale-while-revalidate |
//! | message | `SKIP_WAITING` / `CLEAR_CACHE` |
//! | sync, push, notificationclick | thin handlers that never fail |

mod fetch;
pub mod host;
mod lifecycle;
mod lifetime;
mod messages;
pub mod registration;

#[cfg(test)]
pub(crate) mod test_support;

pub use fetch::{FetchOutcome, FetchResponse, ResponseSource};
pub use host::{LocalHost, Notification, NotificationAction, NotificationData, ServiceHost};
pub use lifetime::Lifetime;
pub use messages::{Command, CONTACT_FORM_SYNC_TAG};
pub use registration::{Registration, VersionRecord, WorkerState};

use crate::cache::CacheStorage;
use crate::config::schema::{Config, NotificationConfig};
use crate::error::{SootError, SootResult};
use crate::http::Request;
use crate::network::Network;
use std::sync::Arc;
use url::{Origin, Url};

/// Worker configuration resolved against the origin
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Current cache generation
    pub cache_name: String,
    /// Origin the worker belongs to
    pub origin: Origin,
    /// Origin as a base URL for resolving paths
    pub origin_url: Url,
    /// Offline fallback document
    pub offline_url: Url,
    /// Root document, the last-resort fallback
    pub root_url: Url,
    /// External hosts intercepted in addition to the origin
    pub allowed_hosts: Vec<String>,
    /// Assets stored on install, in order
    pub precache: Vec<Url>,
    /// Push notification presentation
    pub notifications: NotificationConfig,
}

impl WorkerSettings {
    /// Resolve worker settings from configuration
    pub fn from_config(config: &Config) -> SootResult<Self> {
        let worker = &config.worker;

        let origin_url = Url::parse(&worker.origin).map_err(|e| SootError::InvalidUrl {
            url: worker.origin.clone(),
            reason: e.to_string(),
        })?;
        let origin = origin_url.origin();
        if !origin.is_tuple() {
            return Err(SootError::InvalidUrl {
                url: worker.origin.clone(),
                reason: "origin must be an http(s) URL".to_string(),
            });
        }

        let resolve = |path: &str| {
            origin_url.join(path).map_err(|e| SootError::InvalidUrl {
                url: path.to_string(),
                reason: e.to_string(),
            })
        };

        let precache = worker
            .precache
            .iter()
            .map(|path| resolve(path))
            .collect::<SootResult<Vec<_>>>()?;

        Ok(Self {
            cache_name: worker.cache_name.clone(),
            offline_url: resolve(&worker.offline_url)?,
            root_url: resolve("/")?,
            origin,
            allowed_hosts: worker
                .allowed_hosts
                .iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
            precache,
            notifications: config.notifications.clone(),
            origin_url,
        })
    }

    /// Resolve a path or absolute URL against the origin
    pub fn resolve(&self, path: &str) -> SootResult<Url> {
        self.origin_url.join(path).map_err(|e| SootError::InvalidUrl {
            url: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Whether requests to this URL are handled by the worker
    pub fn intercepts(&self, url: &Url) -> bool {
        if url.origin() == self.origin {
            return true;
        }
        url.host_str()
            .is_some_and(|host| self.allowed_hosts.iter().any(|allowed| allowed == host))
    }
}

/// Events delivered by the host runtime
#[derive(Debug)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    /// Control message payload as posted by a page
    Message(serde_json::Value),
    Sync { tag: String },
    Push { data: Option<String> },
    NotificationClick { action: Option<String> },
}

/// Result of handling an event
#[derive(Debug)]
pub enum EventOutcome {
    Installed,
    Activated { deleted: Vec<String> },
    Fetched(FetchOutcome),
    Handled,
}

/// A worker version bound to its storage, network and host
#[derive(Clone)]
pub struct CacheWorker {
    settings: Arc<WorkerSettings>,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    host: Arc<dyn ServiceHost>,
}

impl CacheWorker {
    pub fn new(
        settings: WorkerSettings,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        host: Arc<dyn ServiceHost>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            storage,
            network,
            host,
        }
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    /// Name of the generation this version owns
    pub fn cache_name(&self) -> &str {
        &self.settings.cache_name
    }

    /// Route an event to its handler
    pub async fn dispatch(&self, event: Event) -> SootResult<EventOutcome> {
        match event {
            Event::Install => self.install().await.map(|()| EventOutcome::Installed),
            Event::Activate => self
                .activate()
                .await
                .map(|deleted| EventOutcome::Activated { deleted }),
            Event::Fetch(request) => self.handle_fetch(request).await.map(EventOutcome::Fetched),
            Event::Message(payload) => self
                .handle_message(&payload)
                .await
                .map(|()| EventOutcome::Handled),
            Event::Sync { tag } => {
                self.handle_sync(&tag).await;
                Ok(EventOutcome::Handled)
            }
            Event::Push { data } => {
                self.handle_push(data.as_deref()).await;
                Ok(EventOutcome::Handled)
            }
            Event::NotificationClick { action } => {
                self.handle_notification_click(action.as_deref()).await;
                Ok(EventOutcome::Handled)
            }
        }
    }
}
