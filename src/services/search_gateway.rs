use std::sync::Arc;

use crate::{
    models::{ParsedDocument, ProductRecord},
    services::providers::{SearchBackend, SearchRequest},
};

/// Product lookups against the search index
///
/// Failures never reach callers: a failed search is logged and reported as an
/// empty result, so the UI shows "no results" rather than an error.
#[derive(Clone)]
pub struct SearchGateway {
    backend: Arc<dyn SearchBackend>,
}

impl SearchGateway {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// Free-text search over product name and SKU
    pub async fn search_by_text(&self, query: &str, limit: usize) -> Vec<ProductRecord> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        let request = SearchRequest::text(query, limit);
        match self.backend.search(&request).await {
            Ok(documents) => {
                let records = normalize(documents);
                tracing::info!(
                    query = %query,
                    results = records.len(),
                    provider = self.backend.name(),
                    "Product search completed"
                );
                records
            }
            Err(e) => {
                tracing::error!(error = %e, query = %query, "Product search failed");
                Vec::new()
            }
        }
    }

    /// Exact-match lookup of products by SKU
    ///
    /// Records come back in whatever order the index returns them.
    pub async fn fetch_by_skus(&self, skus: &[String]) -> Vec<ProductRecord> {
        if skus.is_empty() {
            return Vec::new();
        }

        let request = SearchRequest::filtered(sku_filter(skus), skus.len());
        match self.backend.search(&request).await {
            Ok(documents) => {
                let records = normalize(documents);
                tracing::info!(
                    requested = skus.len(),
                    found = records.len(),
                    provider = self.backend.name(),
                    "Products fetched by SKU"
                );
                records
            }
            Err(e) => {
                tracing::error!(error = %e, skus = ?skus, "Product fetch by SKUs failed");
                Vec::new()
            }
        }
    }
}

/// Builds `sku:=[`a`,`b`]`; backticks inside values are stripped
pub fn sku_filter(skus: &[String]) -> String {
    let values: Vec<String> = skus
        .iter()
        .map(|sku| format!("`{}`", sku.replace('`', "")))
        .collect();
    format!("sku:=[{}]", values.join(","))
}

fn normalize(documents: Vec<serde_json::Value>) -> Vec<ProductRecord> {
    documents
        .into_iter()
        .filter_map(|document| match ParsedDocument::parse(document) {
            ParsedDocument::Valid(record) => Some(record),
            ParsedDocument::Malformed { reason, document } => {
                tracing::warn!(reason = %reason, document = %document, "Skipping malformed search document");
                None
            }
        })
        .collect()
}
