use std::{sync::Arc, time::Duration};

use tokio::sync::RwLock;

use crate::{
    config::Config,
    services::{
        providers::{RecommendationBackend, SearchBackend},
        QueryController, RecommendationFetcher, SearchGateway, SelectionSet,
    },
};

/// Tunables of the search and recommendation pipeline
#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub debounce: Duration,
    pub search_limit: usize,
    pub top_k: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            search_limit: 20,
            top_k: 5,
        }
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            debounce: config.debounce(),
            search_limit: config.search_limit,
            top_k: config.recommend_top_k,
        }
    }
}

/// Shared application state
///
/// One simulator session: the context being built, the search box driving it
/// and the recommendations derived from it.
#[derive(Clone)]
pub struct AppState {
    pub gateway: SearchGateway,
    pub selection: Arc<RwLock<SelectionSet>>,
    pub query: QueryController,
    pub recommendations: RecommendationFetcher,
    pub settings: PipelineSettings,
}

impl AppState {
    /// Wires the pipeline around the given backends
    ///
    /// Must be called inside a Tokio runtime: the recommendation fetcher starts
    /// listening to context changes immediately.
    pub fn new(
        search: Arc<dyn SearchBackend>,
        recommender: Arc<dyn RecommendationBackend>,
        settings: PipelineSettings,
    ) -> Self {
        let gateway = SearchGateway::new(search);
        let selection = SelectionSet::new();
        let query = QueryController::new(gateway.clone(), settings.debounce, settings.search_limit);
        let recommendations = RecommendationFetcher::new(recommender, gateway.clone(), settings.top_k);
        let _listener = recommendations.spawn_listener(selection.subscribe());

        Self {
            gateway,
            selection: Arc::new(RwLock::new(selection)),
            query,
            recommendations,
            settings,
        }
    }
}
