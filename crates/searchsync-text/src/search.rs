use async_trait::async_trait;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{AllQuery, Query, QueryParser};
use tantivy::schema::Value as _;
use tantivy::TantivyDocument;

use searchsync_core::traits::PageSource;
use searchsync_core::types::{Page, SearchHit, SearchQuery};
use searchsync_core::{EngineError, FetchError};

use crate::index::{local_err, LocalIndex, TantivyEngine};

impl LocalIndex {
	pub(crate) fn page(&self, query: &SearchQuery, page: usize) -> Result<Page, EngineError> {
		if query.page_size == 0 {
			return Err(EngineError::Local("page size must be positive".to_string()));
		}
		let searcher = self.reader.searcher();
		let parsed: Box<dyn Query> = if query.text.trim().is_empty() {
			Box::new(AllQuery)
		} else {
			QueryParser::for_index(&self.index, vec![self.text_field]).parse_query(&query.text).map_err(local_err)?
		};
		let offset = page * query.page_size;
		let collector = (TopDocs::with_limit(query.page_size).and_offset(offset), Count);
		let (top_docs, total) = searcher.search(&parsed, &collector).map_err(local_err)?;

		let mut hits = Vec::with_capacity(top_docs.len());
		for (_score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr).map_err(local_err)?;
			let source = doc
				.get_first(self.source_field)
				.and_then(|v| v.as_str())
				.ok_or_else(|| EngineError::Decode("stored document has no source".to_string()))?;
			let hit: SearchHit = serde_json::from_str(source).map_err(|e| EngineError::Decode(e.to_string()))?;
			hits.push(hit);
		}
		Ok(Page { hits, is_last_page: offset + query.page_size >= total })
	}
}

#[async_trait]
impl PageSource for TantivyEngine {
	async fn fetch_page(&self, query: &SearchQuery, page: usize) -> Result<Page, FetchError> {
		match self.local_index(&query.index, false)? {
			Some(local) => {
				let query = query.clone();
				let found = tokio::task::spawn_blocking(move || local.page(&query, page)).await.map_err(local_err)??;
				Ok(found)
			}
			// an index nothing was ever synced into has no hits
			None => Ok(Page { hits: Vec::new(), is_last_page: true }),
		}
	}
}
