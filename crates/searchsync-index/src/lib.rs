//! searchsync-index
//!
//! Write path of the search pipeline: [`IndexSyncClient`] pushes document sets
//! to whichever engine the configuration selects, retrying transient failures.
use std::sync::Arc;

use searchsync_core::config::SearchSettings;
use searchsync_core::traits::{IndexEngine, PageSource};
use searchsync_core::{Error, Result};
use searchsync_text::TantivyEngine;

pub mod meili;
pub mod sync;

pub use meili::MeiliEngine;
pub use sync::{IndexSyncClient, RetryPolicy};

/// Process-wide engine connection, created once from configuration.
#[derive(Clone)]
pub enum EngineHandle {
    Meili(Arc<MeiliEngine>),
    Local(Arc<TantivyEngine>),
}

impl EngineHandle {
    /// Live engine when host and key are set, local index when a directory
    /// is set, otherwise `None` (no-op mode).
    pub fn from_settings(settings: &SearchSettings) -> Result<Option<Self>> {
        if let Some(connection) = settings.connection() {
            let engine = MeiliEngine::new(&connection).map_err(|e| Error::InvalidConfig(e.to_string()))?;
            tracing::info!(host = engine.host(), "using meilisearch engine");
            return Ok(Some(Self::Meili(Arc::new(engine))));
        }
        if let Some(dir) = settings.local_index_path() {
            let engine = TantivyEngine::open(&dir).map_err(|e| Error::InvalidConfig(e.to_string()))?;
            tracing::info!(dir = %dir.display(), "using local tantivy engine");
            return Ok(Some(Self::Local(Arc::new(engine))));
        }
        Ok(None)
    }

    pub fn index_engine(&self) -> Arc<dyn IndexEngine> {
        match self {
            Self::Meili(engine) => engine.clone(),
            Self::Local(engine) => engine.clone(),
        }
    }

    pub fn page_source(&self) -> Arc<dyn PageSource> {
        match self {
            Self::Meili(engine) => engine.clone(),
            Self::Local(engine) => engine.clone(),
        }
    }
}
