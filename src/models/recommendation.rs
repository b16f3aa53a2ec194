use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ProductRecord;

/// Request body sent to the recommendation backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationQuery {
    pub skus: Vec<String>,
    pub top_k: usize,
}

/// One entry of the backend's recommendation list
///
/// The backend may answer with bare SKUs or with enriched objects.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RecommendedItem {
    Sku(String),
    Scored {
        sku: String,
        #[serde(default)]
        score: Option<f64>,
    },
}

impl RecommendedItem {
    pub fn sku(&self) -> &str {
        match self {
            RecommendedItem::Sku(sku) => sku,
            RecommendedItem::Scored { sku, .. } => sku,
        }
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            RecommendedItem::Sku(_) => None,
            RecommendedItem::Scored { score, .. } => *score,
        }
    }
}

/// Raw response from `POST /recommend`
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationResponse {
    #[serde(default)]
    pub input: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<RecommendedItem>,
}

impl RecommendationResponse {
    /// Recommended SKUs in backend order
    pub fn skus(&self) -> Vec<String> {
        self.recommendations
            .iter()
            .map(|item| item.sku().to_string())
            .collect()
    }
}

/// Displayable state of the recommendation panel
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecommendationState {
    /// No context products carry a SKU
    #[default]
    Idle,
    Loading,
    Failed { message: String },
    /// The backend returned no recommendations
    Empty,
    Ready {
        input_skus: Vec<String>,
        products: Vec<ProductRecord>,
        fetched_at: DateTime<Utc>,
    },
}
