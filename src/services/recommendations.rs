use chrono::Utc;
use std::{collections::HashMap, sync::Arc};
use tokio::{
    sync::{watch, RwLock},
    task::JoinHandle,
};

use crate::{
    models::{ProductRecord, RecommendationQuery, RecommendationState},
    services::{providers::RecommendationBackend, search_gateway::SearchGateway},
};

struct FetcherState {
    current: RecommendationState,
    /// Tag of the most recently started refresh
    generation: u64,
}

/// Generates recommendations for the current context
///
/// Calls the recommendation backend with the context SKUs, then hydrates the
/// recommended SKUs through the search index, keeping the backend's ranking.
/// Refreshes are tagged: only the latest one may write the visible state, but
/// superseded refreshes are left to finish.
#[derive(Clone)]
pub struct RecommendationFetcher {
    backend: Arc<dyn RecommendationBackend>,
    gateway: SearchGateway,
    top_k: usize,
    state: Arc<RwLock<FetcherState>>,
}

impl RecommendationFetcher {
    pub fn new(
        backend: Arc<dyn RecommendationBackend>,
        gateway: SearchGateway,
        top_k: usize,
    ) -> Self {
        Self {
            backend,
            gateway,
            top_k,
            state: Arc::new(RwLock::new(FetcherState {
                current: RecommendationState::Idle,
                generation: 0,
            })),
        }
    }

    pub async fn state(&self) -> RecommendationState {
        self.state.read().await.current.clone()
    }

    /// Recomputes recommendations for `skus` and waits for the result
    pub async fn refresh(&self, skus: Vec<String>) {
        if let Some(generation) = self.begin(&skus).await {
            self.complete(generation, skus).await;
        }
    }

    /// Refreshes on every change of the selection's input SKUs
    ///
    /// Each change starts a new refresh without waiting for earlier ones.
    pub fn spawn_listener(&self, mut changes: watch::Receiver<Vec<String>>) -> JoinHandle<()> {
        let fetcher = self.clone();
        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let skus = changes.borrow_and_update().clone();
                if let Some(generation) = fetcher.begin(&skus).await {
                    let fetcher = fetcher.clone();
                    tokio::spawn(async move { fetcher.complete(generation, skus).await });
                }
            }
            tracing::debug!("Selection closed, recommendation listener stopped");
        })
    }

    /// Claims a new generation and shows the transitional state
    ///
    /// Returns `None` when there is nothing to fetch.
    async fn begin(&self, skus: &[String]) -> Option<u64> {
        let mut state = self.state.write().await;
        state.generation += 1;
        if skus.is_empty() {
            state.current = RecommendationState::Idle;
            return None;
        }
        state.current = RecommendationState::Loading;
        Some(state.generation)
    }

    async fn complete(&self, generation: u64, skus: Vec<String>) {
        let outcome = self.fetch(skus).await;

        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::debug!(
                generation,
                latest = state.generation,
                "Discarding superseded recommendations"
            );
            return;
        }
        state.current = outcome;
    }

    async fn fetch(&self, skus: Vec<String>) -> RecommendationState {
        let query = RecommendationQuery {
            skus,
            top_k: self.top_k,
        };

        let response = match self.backend.recommend(&query).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    skus = ?query.skus,
                    provider = self.backend.name(),
                    "Failed to fetch recommendations"
                );
                return RecommendationState::Failed {
                    message: e.to_string(),
                };
            }
        };

        let recommended = response.skus();
        if recommended.is_empty() {
            return RecommendationState::Empty;
        }

        for item in response.recommendations.iter().filter(|i| i.score().is_some()) {
            tracing::trace!(sku = item.sku(), score = item.score(), "Recommendation score");
        }

        let hydrated = self.gateway.fetch_by_skus(&recommended).await;
        let products = order_by_skus(&recommended, hydrated);

        if products.len() < recommended.len() {
            tracing::debug!(
                recommended = recommended.len(),
                hydrated = products.len(),
                "Some recommended SKUs were not found in the index"
            );
        }

        RecommendationState::Ready {
            input_skus: query.skus,
            products,
            fetched_at: Utc::now(),
        }
    }
}

/// Arranges `records` in the order of `skus`
///
/// SKUs with no matching record are dropped without disturbing the others.
pub fn order_by_skus(skus: &[String], records: Vec<ProductRecord>) -> Vec<ProductRecord> {
    let mut by_sku: HashMap<String, ProductRecord> = HashMap::with_capacity(records.len());
    for record in records {
        if let Some(sku) = record.usable_sku().map(str::to_string) {
            by_sku.entry(sku).or_insert(record);
        }
    }

    skus.iter()
        .filter_map(|sku| by_sku.get(sku).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AppResult};
    use crate::models::{RecommendationResponse, RecommendedItem};
    use crate::services::providers::{MockRecommendationBackend, MockSearchBackend};
    use crate::services::selection::SelectionSet;
    use serde_json::json;
    use std::time::Duration;

    fn skus(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn response(recommended: &[&str]) -> RecommendationResponse {
        RecommendationResponse {
            input: vec![],
            recommendations: recommended
                .iter()
                .map(|s| RecommendedItem::Sku(s.to_string()))
                .collect(),
        }
    }

    fn index_returning(documents: Vec<serde_json::Value>) -> SearchGateway {
        let mut backend = MockSearchBackend::new();
        backend.expect_name().return_const("mock");
        backend
            .expect_search()
            .returning(move |_| Ok(documents.clone()));
        SearchGateway::new(Arc::new(backend))
    }

    fn recommender(recommended: &'static [&'static str]) -> MockRecommendationBackend {
        let mut backend = MockRecommendationBackend::new();
        backend.expect_name().return_const("mock");
        backend
            .expect_recommend()
            .returning(move |_| Ok(response(recommended)));
        backend
    }

    fn product_skus(state: &RecommendationState) -> Vec<String> {
        match state {
            RecommendationState::Ready { products, .. } => products
                .iter()
                .map(|p| p.sku.clone().unwrap_or_default())
                .collect(),
            other => panic!("expected ready state, got {:?}", other),
        }
    }

    #[test]
    fn test_order_by_skus_follows_backend_order() {
        let records = vec![
            ProductRecord::new("1").with_sku("A"),
            ProductRecord::new("3").with_sku("C"),
            ProductRecord::new("2").with_sku("B"),
        ];

        let ordered = order_by_skus(&skus(&["B", "A", "C"]), records);
        let ids: Vec<_> = ordered.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
    }

    #[test]
    fn test_order_by_skus_drops_unhydrated() {
        let records = vec![
            ProductRecord::new("1").with_sku("A"),
            ProductRecord::new("3").with_sku("C"),
        ];

        let ordered = order_by_skus(&skus(&["C", "MISSING", "A"]), records);
        let ids: Vec<_> = ordered.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
    }

    #[tokio::test]
    async fn test_empty_context_is_idle_without_backend_call() {
        let mut backend = MockRecommendationBackend::new();
        backend.expect_recommend().never();

        let fetcher = RecommendationFetcher::new(Arc::new(backend), index_returning(vec![]), 5);
        fetcher.refresh(vec![]).await;

        assert_eq!(fetcher.state().await, RecommendationState::Idle);
    }

    #[tokio::test]
    async fn test_refresh_hydrates_in_backend_order() {
        let mut backend = MockRecommendationBackend::new();
        backend.expect_name().return_const("mock");
        backend
            .expect_recommend()
            .withf(|q| q.skus == vec!["X".to_string(), "Y".to_string()] && q.top_k == 5)
            .times(1)
            .returning(|_| Ok(response(&["B", "A", "C"])));

        let gateway = index_returning(vec![
            json!({ "id": "1", "sku": "A" }),
            json!({ "id": "3", "sku": "C" }),
            json!({ "id": "2", "sku": "B" }),
        ]);

        let fetcher = RecommendationFetcher::new(Arc::new(backend), gateway, 5);
        fetcher.refresh(skus(&["X", "Y"])).await;

        let state = fetcher.state().await;
        assert_eq!(product_skus(&state), vec!["B", "A", "C"]);
        match state {
            RecommendationState::Ready { input_skus, .. } => assert_eq!(input_skus, vec!["X", "Y"]),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_unhydrated_skus_are_omitted() {
        let gateway = index_returning(vec![
            json!({ "id": "3", "sku": "C" }),
            json!({ "id": "1", "sku": "A" }),
        ]);

        let fetcher = RecommendationFetcher::new(Arc::new(recommender(&["B", "A", "C"])), gateway, 5);
        fetcher.refresh(skus(&["X"])).await;

        assert_eq!(product_skus(&fetcher.state().await), vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_empty_recommendations_skip_hydration() {
        let mut search = MockSearchBackend::new();
        search.expect_search().never();
        let gateway = SearchGateway::new(Arc::new(search));

        let fetcher = RecommendationFetcher::new(Arc::new(recommender(&[])), gateway, 5);
        fetcher.refresh(skus(&["X"])).await;

        assert_eq!(fetcher.state().await, RecommendationState::Empty);
    }

    #[tokio::test]
    async fn test_backend_failure_sets_error_and_clears_previous() {
        let mut backend = MockRecommendationBackend::new();
        backend.expect_name().return_const("mock");
        let mut calls = 0;
        backend.expect_recommend().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(response(&["A"]))
            } else {
                Err(AppError::ExternalApi("Backend error: 503".to_string()))
            }
        });

        let gateway = index_returning(vec![json!({ "id": "1", "sku": "A" })]);
        let fetcher = RecommendationFetcher::new(Arc::new(backend), gateway, 5);

        fetcher.refresh(skus(&["X"])).await;
        assert_eq!(product_skus(&fetcher.state().await), vec!["A"]);

        fetcher.refresh(skus(&["X", "Y"])).await;
        assert_eq!(
            fetcher.state().await,
            RecommendationState::Failed {
                message: "Backend error: 503".to_string()
            }
        );

        fetcher.refresh(vec![]).await;
        assert_eq!(fetcher.state().await, RecommendationState::Idle);
    }

    #[tokio::test]
    async fn test_search_outage_yields_ready_with_no_products() {
        let mut search = MockSearchBackend::new();
        search.expect_name().return_const("mock");
        search
            .expect_search()
            .returning(|_| Err(AppError::ExternalApi("down".to_string())));

        let fetcher = RecommendationFetcher::new(
            Arc::new(recommender(&["A", "B"])),
            SearchGateway::new(Arc::new(search)),
            5,
        );
        fetcher.refresh(skus(&["X"])).await;

        assert!(product_skus(&fetcher.state().await).is_empty());
    }

    /// Answers with the context's last SKU after a delay keyed by context size
    struct DelayedRecommender;

    #[async_trait::async_trait]
    impl RecommendationBackend for DelayedRecommender {
        async fn recommend(&self, query: &RecommendationQuery) -> AppResult<RecommendationResponse> {
            let delay = if query.skus.len() == 1 { 1000 } else { 10 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            let last = query.skus.last().cloned().unwrap_or_default();
            Ok(RecommendationResponse {
                input: query.skus.clone(),
                recommendations: vec![RecommendedItem::Sku(format!("rec-{}", last))],
            })
        }

        fn name(&self) -> &'static str {
            "delayed"
        }
    }

    fn echo_index() -> SearchGateway {
        let mut backend = MockSearchBackend::new();
        backend.expect_name().return_const("mock");
        backend.expect_search().returning(|req| {
            let filter = req.filter_by.clone().unwrap_or_default();
            let sku = filter
                .trim_start_matches("sku:=[`")
                .trim_end_matches("`]")
                .to_string();
            Ok(vec![json!({ "id": sku, "sku": sku })])
        });
        SearchGateway::new(Arc::new(backend))
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_refresh_never_overwrites_latest() {
        let fetcher = RecommendationFetcher::new(Arc::new(DelayedRecommender), echo_index(), 5);

        let first = fetcher.begin(&skus(&["A"])).await.unwrap();
        let second = fetcher.begin(&skus(&["A", "B"])).await.unwrap();

        let slow = tokio::spawn({
            let fetcher = fetcher.clone();
            async move { fetcher.complete(first, skus(&["A"])).await }
        });
        fetcher.complete(second, skus(&["A", "B"])).await;
        assert_eq!(product_skus(&fetcher.state().await), vec!["rec-B"]);

        slow.await.unwrap();
        assert_eq!(product_skus(&fetcher.state().await), vec!["rec-B"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listener_follows_selection_changes() {
        let fetcher = RecommendationFetcher::new(Arc::new(DelayedRecommender), echo_index(), 5);
        let mut selection = SelectionSet::new();
        let _listener = fetcher.spawn_listener(selection.subscribe());

        selection.add(ProductRecord::new("1").with_sku("A"));
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(fetcher.state().await, RecommendationState::Loading);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(product_skus(&fetcher.state().await), vec!["rec-A"]);

        selection.clear();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(fetcher.state().await, RecommendationState::Idle);
    }
}
