//! Meilisearch over HTTP: the live engine used when host and key are configured.
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use searchsync_core::config::EngineConnection;
use searchsync_core::traits::{IndexEngine, PageSource};
use searchsync_core::types::{IndexBatch, Page, SearchHit, SearchQuery, SyncTask};
use searchsync_core::{EngineError, FetchError};

pub struct MeiliEngine {
    client: Client,
    host: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    q: &'a str,
    page: usize,
    hits_per_page: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<&'a [String]>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    hits: Vec<SearchHit>,
    page: usize,
    total_pages: usize,
}

impl MeiliEngine {
    pub fn new(connection: &EngineConnection) -> Result<Self, EngineError> {
        let client = Client::builder().build().map_err(|e| EngineError::Transport(e.to_string()))?;
        Ok(Self { client, host: connection.host.trim_end_matches('/').to_string(), api_key: connection.api_key.clone() })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.host, path)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, EngineError> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EngineError::Status { status: status.as_u16(), message });
        }
        response.json::<T>().await.map_err(|e| EngineError::Decode(e.to_string()))
    }
}

#[async_trait]
impl IndexEngine for MeiliEngine {
    async fn submit_batches(&self, index: &str, batches: &[IndexBatch<'_>]) -> Result<Vec<SyncTask>, EngineError> {
        let url = self.url(&format!("indexes/{}/documents", index));
        let mut tasks = Vec::with_capacity(batches.len());
        for batch in batches {
            let request = self.client.put(&url).json(batch.documents());
            tasks.push(self.send_json::<SyncTask>(request).await?);
        }
        Ok(tasks)
    }
}

#[async_trait]
impl PageSource for MeiliEngine {
    async fn fetch_page(&self, query: &SearchQuery, page: usize) -> Result<Page, FetchError> {
        let body = SearchRequest {
            q: &query.text,
            // one-based on the wire
            page: page + 1,
            hits_per_page: query.page_size,
            sort: (!query.sort.is_empty()).then_some(query.sort.as_slice()),
        };
        let request = self.client.post(self.url(&format!("indexes/{}/search", query.index))).json(&body);
        let response: SearchResponse = self.send_json(request).await?;
        Ok(Page { is_last_page: response.page >= response.total_pages, hits: response.hits })
    }
}
