//! Axum route handlers for the Recommendation API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::recommendation::models::{RecommendBody, Recommendation, RecommendationRequest};
use crate::state::AppState;

/// POST /api/recommend
///
/// Validates the form input and returns a learning plan tagged with `_source`.
/// Provider failures never surface here; the worst case is the mock plan.
pub async fn handle_recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendBody>, JsonRejection>,
) -> Result<Json<Recommendation>, AppError> {
    let Json(body) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let request = RecommendationRequest::try_from(body)?;

    let span = info_span!("recommend", request_id = %Uuid::new_v4());
    let recommendation = async {
        info!(
            "Recommending for goal '{}' ({} skill(s), {})",
            request.goal,
            request.skills.len(),
            request.experience_level
        );
        state.recommender.recommend(&request).await
    }
    .instrument(span)
    .await;

    Ok(Json(recommendation))
}

/// Fallback for every non-POST method on the recommend route.
pub async fn handle_method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
