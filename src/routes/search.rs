use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::ProductRecord,
    routes::AppState,
    services::{QueryPhase, QuerySnapshot, SelectionSet},
};

const MAX_SEARCH_LIMIT: usize = 250;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct QueryInput {
    pub query: String,
}

/// A search hit, flagged when it is already part of the context
#[derive(Debug, Serialize)]
pub struct Candidate {
    #[serde(flatten)]
    pub product: ProductRecord,
    pub display_name: String,
    pub added: bool,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub query: String,
    pub phase: QueryPhase,
    pub visible: bool,
    pub results: Vec<Candidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn mark_candidates(products: Vec<ProductRecord>, selection: &SelectionSet) -> Vec<Candidate> {
    products
        .into_iter()
        .map(|product| Candidate {
            added: selection.contains(product.sku.as_deref().unwrap_or("")),
            display_name: product.display_name().to_string(),
            product,
        })
        .collect()
}

async fn render(state: &AppState, snapshot: QuerySnapshot) -> QueryResponse {
    let message = snapshot.empty_message();
    let selection = state.selection.read().await;
    QueryResponse {
        results: mark_candidates(snapshot.results, &selection),
        query: snapshot.query,
        phase: snapshot.phase,
        visible: snapshot.visible,
        message,
    }
}

/// One-shot product search, bypassing the debounced input
pub async fn search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<Vec<Candidate>>> {
    let limit = params.limit.unwrap_or(state.settings.search_limit);
    if limit == 0 || limit > MAX_SEARCH_LIMIT {
        return Err(AppError::InvalidInput(format!(
            "limit must be between 1 and {}",
            MAX_SEARCH_LIMIT
        )));
    }

    tracing::info!(request_id = %request_id, query = %params.q, limit, "Processing search request");

    let products = state.gateway.search_by_text(&params.q, limit).await;
    let selection = state.selection.read().await;
    Ok(Json(mark_candidates(products, &selection)))
}

/// Current state of the search box
pub async fn snapshot(State(state): State<AppState>) -> Json<QueryResponse> {
    let snapshot = state.query.snapshot().await;
    Json(render(&state, snapshot).await)
}

/// Feeds a keystroke's worth of input to the debounced search
pub async fn input(
    State(state): State<AppState>,
    Json(body): Json<QueryInput>,
) -> Json<QueryResponse> {
    state.query.input(body.query).await;
    let snapshot = state.query.snapshot().await;
    Json(render(&state, snapshot).await)
}

pub async fn dismiss(State(state): State<AppState>) -> Json<QueryResponse> {
    state.query.dismiss().await;
    let snapshot = state.query.snapshot().await;
    Json(render(&state, snapshot).await)
}

pub async fn show(State(state): State<AppState>) -> Json<QueryResponse> {
    state.query.show().await;
    let snapshot = state.query.snapshot().await;
    Json(render(&state, snapshot).await)
}
