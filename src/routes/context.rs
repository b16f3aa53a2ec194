use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::ProductRecord,
    routes::AppState,
    services::SelectionSet,
};

#[derive(Debug, Serialize)]
pub struct ContextResponse {
    pub products: Vec<ProductRecord>,
    pub input_skus: Vec<String>,
}

impl From<&SelectionSet> for ContextResponse {
    fn from(selection: &SelectionSet) -> Self {
        Self {
            products: selection.products().to_vec(),
            input_skus: selection.input_identifiers(),
        }
    }
}

/// Products currently in the simulated context
pub async fn list(State(state): State<AppState>) -> Json<ContextResponse> {
    let selection = state.selection.read().await;
    Json(ContextResponse::from(&*selection))
}

/// Adds a product to the context and resets the search box
pub async fn add(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(product): Json<ProductRecord>,
) -> AppResult<(StatusCode, Json<ContextResponse>)> {
    if product.id.trim().is_empty() {
        return Err(AppError::InvalidInput("product id cannot be empty".to_string()));
    }

    let (added, response) = {
        let mut selection = state.selection.write().await;
        let sku = product.sku.clone();
        let added = selection.add(product);
        tracing::info!(
            request_id = %request_id,
            sku = ?sku,
            added,
            context_size = selection.len(),
            "Context product submitted"
        );
        (added, ContextResponse::from(&*selection))
    };

    state.query.clear().await;
    state.query.dismiss().await;

    let status = if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(response)))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(sku): Path<String>,
) -> AppResult<StatusCode> {
    let mut selection = state.selection.write().await;
    if !selection.remove(&sku) {
        return Err(AppError::NotFound(format!("No context product with SKU {}", sku)));
    }

    tracing::info!(
        request_id = %request_id,
        sku = %sku,
        context_size = selection.len(),
        "Context product removed"
    );
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> StatusCode {
    state.selection.write().await.clear();
    tracing::info!(request_id = %request_id, "Context cleared");
    StatusCode::NO_CONTENT
}
