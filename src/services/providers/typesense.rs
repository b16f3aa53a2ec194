/// Typesense search provider
///
/// Talks to the hosted product index over the documents search endpoint:
/// `GET /collections/{collection}/documents/search`. Authenticates with a
/// search-only key sent in the `X-TYPESENSE-API-KEY` header.
use crate::{
    error::{AppError, AppResult},
    services::providers::{SearchBackend, SearchRequest},
};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const API_KEY_HEADER: &str = "X-TYPESENSE-API-KEY";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    document: Value,
}

#[derive(Clone)]
pub struct TypesenseBackend {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    collection: String,
}

impl TypesenseBackend {
    /// Creates a provider whose connections give up after `connect_timeout`
    pub fn new(
        api_url: String,
        api_key: String,
        collection: String,
        connect_timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url,
            collection,
        })
    }

    fn search_url(&self) -> String {
        format!(
            "{}/collections/{}/documents/search",
            self.api_url.trim_end_matches('/'),
            self.collection
        )
    }

    fn query_params(request: &SearchRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", request.q.clone()),
            ("query_by", request.query_by.clone()),
            ("per_page", request.per_page.to_string()),
        ];
        if let Some(filter_by) = &request.filter_by {
            params.push(("filter_by", filter_by.clone()));
        }
        params
    }
}

#[async_trait::async_trait]
impl SearchBackend for TypesenseBackend {
    async fn search(&self, request: &SearchRequest) -> AppResult<Vec<Value>> {
        let response = self
            .http_client
            .get(self.search_url())
            .header(API_KEY_HEADER, &self.api_key)
            .query(&Self::query_params(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Typesense returned status {}: {}",
                status, body
            )));
        }

        let results: SearchResponse = response.json().await?;

        tracing::debug!(
            q = %request.q,
            hits = results.hits.len(),
            provider = "typesense",
            "Search completed"
        );

        Ok(results.hits.into_iter().map(|hit| hit.document).collect())
    }

    fn name(&self) -> &'static str {
        "typesense"
    }
}
