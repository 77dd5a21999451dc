use async_trait::async_trait;

use crate::error::{EngineError, FetchError};
use crate::types::{IndexBatch, Page, SearchQuery, SyncTask};

/// Write side of a search engine: accepts batches of documents into a named index.
#[async_trait]
pub trait IndexEngine: Send + Sync {
    /// Submit every batch, returning one acknowledgement per batch in order.
    async fn submit_batches(&self, index: &str, batches: &[IndexBatch<'_>]) -> Result<Vec<SyncTask>, EngineError>;
}

/// Read side of a search engine: serves a query one page at a time.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// `page` is zero-based.
    async fn fetch_page(&self, query: &SearchQuery, page: usize) -> Result<Page, FetchError>;
}

#[async_trait]
impl<T: PageSource + ?Sized> PageSource for std::sync::Arc<T> {
    async fn fetch_page(&self, query: &SearchQuery, page: usize) -> Result<Page, FetchError> {
        (**self).fetch_page(query, page).await
    }
}
