//! Lifetime extension for event handlers
//!
//! A handler may answer its event before all of its work is done (the
//! revalidation write after a cache hit, for instance). That work is handed to
//! a `Lifetime`, and the host must `settle` it before it tears the worker
//! down. Dropping an unsettled lifetime aborts whatever is still pending, the
//! same way a terminated worker loses in-flight work.

use std::future::Future;
use tokio::task::JoinSet;
use tracing::warn;

#[derive(Debug, Default)]
pub struct Lifetime {
    pending: JoinSet<()>,
}

impl Lifetime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the worker alive until `work` completes
    pub fn wait_until<F>(&mut self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.pending.spawn(work);
    }

    /// Number of extensions that have not been collected yet
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Wait for every extension to finish
    pub async fn settle(mut self) {
        while let Some(result) = self.pending.join_next().await {
            if let Err(e) = result {
                warn!("Extended work did not complete: {}", e);
            }
        }
    }
}
