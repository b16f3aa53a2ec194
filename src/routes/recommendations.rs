use axum::{extract::State, Json};

use crate::{models::RecommendationState, routes::AppState};

/// Handler for the recommendations panel
pub async fn current(State(state): State<AppState>) -> Json<RecommendationState> {
    Json(state.recommendations.state().await)
}
