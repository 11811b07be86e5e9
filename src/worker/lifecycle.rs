//! Install and activate handlers

use super::CacheWorker;
use crate::cache::Cache;
use crate::error::{SootError, SootResult};
use crate::http::{Request, Response};
use crate::network::Network;
use futures_util::future::{join_all, try_join_all};
use tracing::{debug, error, info, warn};
use url::Url;

/// Fetch every asset, then store them all
///
/// Nothing is written unless every fetch succeeds with a 2xx status, so a
/// failed precache never leaves a half-filled generation behind.
pub(crate) async fn precache(
    cache: &dyn Cache,
    network: &dyn Network,
    assets: &[Url],
    on_fetched: &(dyn Fn(&Url) + Send + Sync),
) -> SootResult<usize> {
    let fetches = assets.iter().map(|url| async move {
        let request = Request::get(url.clone());
        let response = network
            .fetch(&request)
            .await
            .map_err(|e| SootError::Precache {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(SootError::Precache {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        on_fetched(url);
        Ok::<(Request, Response), SootError>((request, response))
    });

    let fetched = try_join_all(fetches).await?;
    let count = fetched.len();

    for (request, response) in fetched {
        cache.put(&request, response).await?;
    }

    Ok(count)
}

impl CacheWorker {
    /// Handle the install event
    pub async fn install(&self) -> SootResult<()> {
        self.install_with_progress(&|_| {}).await
    }

    /// Handle the install event, reporting each fetched asset
    pub async fn install_with_progress(
        &self,
        on_fetched: &(dyn Fn(&Url) + Send + Sync),
    ) -> SootResult<()> {
        info!("Installing {}", self.settings.cache_name);

        let cache = self.storage.open(&self.settings.cache_name).await?;

        debug!("Precaching {} assets", self.settings.precache.len());
        match precache(
            cache.as_ref(),
            self.network.as_ref(),
            &self.settings.precache,
            on_fetched,
        )
        .await
        {
            Ok(count) => info!("Precached {} assets", count),
            Err(e) => {
                error!("Precache failed: {}", e);
                return Err(e);
            }
        }

        self.host.skip_waiting().await?;
        info!("Installed {}", self.settings.cache_name);
        Ok(())
    }

    /// Handle the activate event, returning the generations deleted
    pub async fn activate(&self) -> SootResult<Vec<String>> {
        info!("Activating {}", self.settings.cache_name);

        let names = match self.storage.keys().await {
            Ok(names) => names,
            Err(e) => {
                warn!("Could not list cache generations: {}", e);
                vec![]
            }
        };

        let stale: Vec<String> = names
            .into_iter()
            .filter(|name| *name != self.settings.cache_name)
            .collect();

        let deletions = stale.iter().map(|name| async move {
            let result = self.storage.delete(name).await;
            (name, result)
        });

        let mut deleted = vec![];
        for (name, result) in join_all(deletions).await {
            match result {
                Ok(_) => {
                    info!("Deleted old cache: {}", name);
                    deleted.push(name.clone());
                }
                Err(e) => warn!("Failed to delete old cache {}: {}", name, e),
            }
        }

        self.host.claim_clients().await?;
        info!("Activated {}", self.settings.cache_name);
        Ok(deleted)
    }
}
