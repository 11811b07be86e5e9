//! Network access for the worker
//!
//! The worker only ever sees the `Network` trait. `HttpNetwork` performs real
//! requests with ureq on the blocking thread pool; tests script their own
//! implementation.
//!
//! A fetch only fails when no response could be obtained at all (DNS,
//! connection refused, timeout). HTTP error statuses are ordinary responses.

use crate::config::schema::NetworkConfig;
use crate::error::{SootError, SootResult};
use crate::http::{Headers, Request, Response};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Abstract network interface
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform the request and return whatever response the server gives
    async fn fetch(&self, request: &Request) -> SootResult<Response>;
}

/// Network backed by a ureq agent
#[derive(Clone)]
pub struct HttpNetwork {
    agent: ureq::Agent,
    user_agent: String,
}

impl HttpNetwork {
    /// Create a network client from configuration
    pub fn new(config: &NetworkConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();

        Self {
            agent,
            user_agent: config.user_agent.clone(),
        }
    }

    fn fetch_blocking(
        agent: &ureq::Agent,
        user_agent: &str,
        request: &Request,
    ) -> SootResult<Response> {
        let url = request.url().as_str();

        let mut builder = ureq::http::Request::builder()
            .method(request.method())
            .uri(url)
            .header("user-agent", user_agent);
        for (name, value) in request.headers().iter() {
            builder = builder.header(name, value);
        }
        let outgoing = builder
            .body(())
            .map_err(|e| SootError::network(url, e.to_string()))?;

        let mut incoming = agent
            .run(outgoing)
            .map_err(|e| SootError::network(url, e.to_string()))?;

        let status = incoming.status().as_u16();
        let headers: Headers = incoming
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // read_to_vec alone stops at ureq's 10 MB default
        let body = incoming
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| SootError::network(url, format!("reading body: {}", e)))?;

        Ok(Response::new(status, headers, body))
    }
}

impl Default for HttpNetwork {
    fn default() -> Self {
        Self::new(&NetworkConfig::default())
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> SootResult<Response> {
        debug!("{} {}", request.method(), request.url());

        let agent = self.agent.clone();
        let user_agent = self.user_agent.clone();
        let owned = request.clone();

        tokio::task::spawn_blocking(move || Self::fetch_blocking(&agent, &user_agent, &owned))
            .await
            .map_err(|e| SootError::Internal(format!("fetch task failed: {}", e)))?
    }
}
