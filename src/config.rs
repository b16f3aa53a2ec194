use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Typesense base URL
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Typesense search-only API key
    pub search_api_key: String,

    /// Collection holding the product documents
    #[serde(default = "default_search_collection")]
    pub search_collection: String,

    /// Connection-establishment timeout for the search service, in seconds
    #[serde(default = "default_search_connect_timeout_secs")]
    pub search_connect_timeout_secs: u64,

    /// Page size for search-as-you-type queries
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Recommendation backend base URL
    #[serde(default = "default_recommender_url")]
    pub recommender_url: String,

    /// Number of recommendations requested per refresh
    #[serde(default = "default_recommend_top_k")]
    pub recommend_top_k: usize,

    /// Quiet interval before a typed query is dispatched, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_search_url() -> String {
    "https://search.seeedstudio.com".to_string()
}

fn default_search_collection() -> String {
    "bazaar4_retailer-products".to_string()
}

fn default_search_connect_timeout_secs() -> u64 {
    10
}

fn default_search_limit() -> usize {
    20
}

fn default_recommender_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_recommend_top_k() -> usize {
    5
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?
            .validated()
    }

    /// Rejects page sizes the search and recommendation services cannot serve
    pub fn validated(self) -> anyhow::Result<Self> {
        if self.search_limit == 0 {
            anyhow::bail!("SEARCH_LIMIT must be at least 1");
        }
        if self.recommend_top_k == 0 {
            anyhow::bail!("RECOMMEND_TOP_K must be at least 1");
        }
        Ok(self)
    }

    pub fn search_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.search_connect_timeout_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
