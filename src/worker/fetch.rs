//! Fetch interception policy
//!
//! 1. Requests outside the origin and the allow-listed hosts pass through.
//! 2. Navigations go to the network first and fall back to the offline
//!    document, then to the cached root document.
//! 3. Everything else is stale-while-revalidate: a cached copy answers at
//!    once while the network refreshes the entry for next time.

use super::{CacheWorker, Lifetime};
use crate::error::{SootError, SootResult};
use crate::http::{Request, Response};
use serde::Serialize;
use std::fmt;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use url::Url;

/// Where a response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSource {
    Network,
    Cache,
    OfflineFallback,
    RootFallback,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Cache => write!(f, "cache"),
            Self::OfflineFallback => write!(f, "offline fallback"),
            Self::RootFallback => write!(f, "root fallback"),
        }
    }
}

/// A response produced by the worker plus any work still attached to it
#[derive(Debug)]
pub struct FetchResponse {
    response: Response,
    source: ResponseSource,
    lifetime: Lifetime,
}

impl FetchResponse {
    fn new(response: Response, source: ResponseSource, lifetime: Lifetime) -> Self {
        Self {
            response,
            source,
            lifetime,
        }
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn source(&self) -> ResponseSource {
        self.source
    }

    pub fn into_parts(self) -> (Response, ResponseSource, Lifetime) {
        (self.response, self.source, self.lifetime)
    }

    /// Wait for background work, then hand back the response
    pub async fn settle(self) -> (Response, ResponseSource) {
        self.lifetime.settle().await;
        (self.response, self.source)
    }
}

/// How the worker handled a fetch
#[derive(Debug)]
pub enum FetchOutcome {
    /// Not intercepted; the host performs the request untouched
    Passthrough,
    Respond(FetchResponse),
}

impl FetchOutcome {
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough)
    }

    pub fn into_response(self) -> Option<FetchResponse> {
        match self {
            Self::Passthrough => None,
            Self::Respond(served) => Some(served),
        }
    }
}

impl CacheWorker {
    /// Handle a fetch event
    pub async fn handle_fetch(&self, request: Request) -> SootResult<FetchOutcome> {
        if !self.settings.intercepts(request.url()) {
            debug!("Passing through {}", request.url());
            return Ok(FetchOutcome::Passthrough);
        }

        let served = if request.is_navigation() {
            self.network_first(request).await?
        } else {
            self.stale_while_revalidate(request).await?
        };
        Ok(FetchOutcome::Respond(served))
    }

    async fn network_first(&self, request: Request) -> SootResult<FetchResponse> {
        match self.network.fetch(&request).await {
            Ok(response) => Ok(FetchResponse::new(
                response,
                ResponseSource::Network,
                Lifetime::new(),
            )),
            Err(err) => {
                warn!("Navigation to {} failed: {}", request.url(), err);
                match self.offline_fallback().await {
                    Some((response, source)) => {
                        Ok(FetchResponse::new(response, source, Lifetime::new()))
                    }
                    None => Err(err),
                }
            }
        }
    }

    async fn stale_while_revalidate(&self, request: Request) -> SootResult<FetchResponse> {
        let mut lifetime = Lifetime::new();
        let (network_tx, network_rx) = oneshot::channel::<SootResult<Response>>();

        // The refresh starts before the lookup and outlives the response
        let storage = self.storage.clone();
        let network = self.network.clone();
        let cache_name = self.settings.cache_name.clone();
        let revalidate = request.clone();
        lifetime.wait_until(async move {
            match network.fetch(&revalidate).await {
                Ok(response) if response.status() == 200 => {
                    let copy = response.duplicate();
                    let _ = network_tx.send(Ok(response));
                    let written = match storage.open(&cache_name).await {
                        Ok(cache) => cache.put(&revalidate, copy).await,
                        Err(e) => Err(e),
                    };
                    match written {
                        Ok(()) => debug!("Refreshed {}", revalidate.url()),
                        Err(e) => warn!("Failed to refresh {}: {}", revalidate.url(), e),
                    }
                }
                other => {
                    let _ = network_tx.send(other);
                }
            }
        });

        if let Some(cached) = self.lookup(&request).await {
            debug!("Serving {} from cache", request.url());
            return Ok(FetchResponse::new(cached, ResponseSource::Cache, lifetime));
        }

        let fetched = network_rx
            .await
            .map_err(|_| SootError::Internal("revalidation ended without a result".to_string()))?;

        match fetched {
            Ok(response) => Ok(FetchResponse::new(response, ResponseSource::Network, lifetime)),
            Err(err) => {
                if request.accepts_html() {
                    if let Some((response, source)) = self.offline_fallback().await {
                        return Ok(FetchResponse::new(response, source, lifetime));
                    }
                }
                Err(err)
            }
        }
    }

    /// Offline document, then the root document, from the current generation
    async fn offline_fallback(&self) -> Option<(Response, ResponseSource)> {
        if let Some(response) = self.lookup_url(&self.settings.offline_url).await {
            return Some((response, ResponseSource::OfflineFallback));
        }
        if let Some(response) = self.lookup_url(&self.settings.root_url).await {
            return Some((response, ResponseSource::RootFallback));
        }
        warn!("No offline fallback available");
        None
    }

    async fn lookup_url(&self, url: &Url) -> Option<Response> {
        self.lookup(&Request::get(url.clone())).await
    }

    /// Look up a request in the current generation; read errors count as a miss
    async fn lookup(&self, request: &Request) -> Option<Response> {
        let cache = match self.storage.open(&self.settings.cache_name).await {
            Ok(cache) => cache,
            Err(e) => {
                warn!("Cache unavailable: {}", e);
                return None;
            }
        };

        match cache.match_request(request).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Cache lookup for {} failed: {}", request.url(), e);
                None
            }
        }
    }
}
