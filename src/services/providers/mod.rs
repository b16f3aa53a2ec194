/// External collaborators of the simulator
///
/// The search index and the recommendation backend each sit behind a trait so
/// the pipeline can be driven against doubles. Production implementations talk
/// HTTP through `reqwest`.
use serde_json::Value;

use crate::{
    error::AppResult,
    models::{RecommendationQuery, RecommendationResponse},
};

pub mod recommender;
pub mod typesense;

pub use recommender::HttpRecommender;
pub use typesense::TypesenseBackend;

/// Fields a free-text query is matched against
pub const QUERY_BY: &str = "name,sku";

/// Parameters of one search call against the product collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub q: String,
    pub query_by: String,
    pub per_page: usize,
    pub filter_by: Option<String>,
}

impl SearchRequest {
    /// Free-text search over name and SKU
    pub fn text(query: &str, per_page: usize) -> Self {
        Self {
            q: query.to_string(),
            query_by: QUERY_BY.to_string(),
            per_page,
            filter_by: None,
        }
    }

    /// Match-all query restricted by a filter expression
    pub fn filtered(filter_by: String, per_page: usize) -> Self {
        Self {
            q: "*".to_string(),
            query_by: QUERY_BY.to_string(),
            per_page,
            filter_by: Some(filter_by),
        }
    }
}

/// Trait for product search backends
///
/// Implementations return the raw documents of each hit; normalization into
/// product records happens in the gateway.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> AppResult<Vec<Value>>;

    /// Backend name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Trait for recommendation backends
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationBackend: Send + Sync {
    /// Returns recommendations for the given context SKUs, in ranked order
    async fn recommend(&self, query: &RecommendationQuery) -> AppResult<RecommendationResponse>;

    fn name(&self) -> &'static str;
}
