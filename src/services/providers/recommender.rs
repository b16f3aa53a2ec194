/// HTTP recommendation backend
///
/// Single synchronous endpoint: `POST {base}/recommend` with
/// `{ "skus": [...], "top_k": n }`. Any non-2xx status is a failure.
use crate::{
    error::{AppError, AppResult},
    models::{RecommendationQuery, RecommendationResponse},
    services::providers::RecommendationBackend,
};
use reqwest::Client as HttpClient;

#[derive(Clone)]
pub struct HttpRecommender {
    http_client: HttpClient,
    api_url: String,
}

impl HttpRecommender {
    pub fn new(api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
        }
    }

    fn recommend_url(&self) -> String {
        format!("{}/recommend", self.api_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl RecommendationBackend for HttpRecommender {
    async fn recommend(&self, query: &RecommendationQuery) -> AppResult<RecommendationResponse> {
        let response = self
            .http_client
            .post(self.recommend_url())
            .json(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                body = %body,
                provider = "http_recommender",
                "Recommendation backend rejected request"
            );
            return Err(AppError::ExternalApi(format!(
                "Backend error: {}",
                status.as_u16()
            )));
        }

        let recommendations: RecommendationResponse = response.json().await?;

        tracing::info!(
            input = query.skus.len(),
            results = recommendations.recommendations.len(),
            provider = "http_recommender",
            "Recommendations fetched"
        );

        Ok(recommendations)
    }

    fn name(&self) -> &'static str {
        "http_recommender"
    }
}
