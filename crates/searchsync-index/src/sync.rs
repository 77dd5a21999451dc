//! Retrying submission of document sets to the search engine.
//!
//! A submit either lands every batch or fails as a unit once the retry
//! budget is spent. With no engine configured the client is a silent no-op.
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use searchsync_core::config::SearchSettings;
use searchsync_core::traits::IndexEngine;
use searchsync_core::types::{DocumentRecord, IndexBatch, SyncTask};
use searchsync_core::{DocumentBatcher, Error, Result};

use crate::EngineHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts in total, the first one included.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_settings(settings: &SearchSettings) -> Self {
        Self { max_attempts: settings.retry_limit.max(1), base_delay: settings.retry_base_delay() }
    }

    /// Pause after the `failures`-th failed attempt: `base_delay * (1 + failures)`.
    pub fn backoff(&self, failures: u32) -> Duration {
        self.base_delay * (1 + failures)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, base_delay: Duration::from_millis(5000) }
    }
}

#[derive(Clone)]
pub struct IndexSyncClient {
    engine: Option<Arc<dyn IndexEngine>>,
    policy: RetryPolicy,
    batch_size: usize,
}

impl IndexSyncClient {
    pub fn new(engine: Option<Arc<dyn IndexEngine>>, policy: RetryPolicy) -> Self {
        Self { engine, policy, batch_size: DocumentBatcher::DEFAULT_BATCH_SIZE }
    }

    pub fn disabled() -> Self {
        Self::new(None, RetryPolicy::default())
    }

    pub fn from_settings(settings: &SearchSettings) -> Result<Self> {
        let engine = EngineHandle::from_settings(settings)?.map(|handle| handle.index_engine());
        Ok(Self::new(engine, RetryPolicy::from_settings(settings)).with_batch_size(settings.batch_size))
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.engine.is_some()
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Submit with the configured batch size.
    pub async fn submit_default(&self, index: &str, documents: &[DocumentRecord]) -> Result<Vec<SyncTask>> {
        self.submit(index, documents, self.batch_size).await
    }

    pub async fn submit(&self, index: &str, documents: &[DocumentRecord], batch_size: usize) -> Result<Vec<SyncTask>> {
        let Some(engine) = &self.engine else {
            debug!(index, documents = documents.len(), "search engine not configured, skipping sync");
            return Ok(Vec::new());
        };

        let batcher = DocumentBatcher::new(batch_size)?;
        let batches: Vec<IndexBatch<'_>> = batcher.batches(documents).collect();
        if batches.is_empty() {
            return Ok(Vec::new());
        }

        let mut failures = 0u32;
        loop {
            match engine.submit_batches(index, &batches).await {
                Ok(tasks) => {
                    info!(index, batches = batches.len(), documents = documents.len(), attempts = failures + 1, "documents accepted");
                    return Ok(tasks);
                }
                Err(err) => {
                    failures += 1;
                    if failures >= self.policy.max_attempts {
                        error!(index, attempts = failures, error = %err, "giving up updating documents");
                        return Err(Error::IndexSyncFailure { index: index.to_string(), attempts: failures, source: err });
                    }
                    let delay = self.policy.backoff(failures);
                    warn!(
                        index,
                        attempt = failures,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "error updating documents, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl std::fmt::Debug for IndexSyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexSyncClient")
            .field("enabled", &self.is_enabled())
            .field("policy", &self.policy)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}
