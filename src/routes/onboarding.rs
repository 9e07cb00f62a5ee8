use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::OnboardingData,
    routes::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingResponse {
    #[serde(flatten)]
    pub data: OnboardingData,
    pub completed_at: Option<DateTime<Utc>>,
}

pub async fn get_onboarding(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<OnboardingResponse>> {
    let data = state.onboarding.load().await?;
    let completed_at = state.onboarding.completed_at().await?;

    Ok(Json(OnboardingResponse { data, completed_at }))
}

/// Saves the wizard answers; duplicate ids and anything over a step's cap are dropped
pub async fn save_onboarding(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(data): Json<OnboardingData>,
) -> AppResult<Json<OnboardingResponse>> {
    let unknown = data.unknown_vibes();
    if !unknown.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "Unknown vibes: {}",
            unknown.join(", ")
        )));
    }

    let data = data.normalized();
    state.onboarding.save(&data).await?;

    tracing::info!(request_id = %request_id, "Onboarding progress saved");

    let completed_at = state.onboarding.completed_at().await?;
    Ok(Json(OnboardingResponse { data, completed_at }))
}

/// Marks onboarding finished; 400 while any step is unanswered
pub async fn complete_onboarding(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<OnboardingResponse>> {
    let data = state.onboarding.load().await?;
    let completed_at = state.onboarding.complete(&data).await?;

    tracing::info!(request_id = %request_id, "Onboarding completion recorded");

    Ok(Json(OnboardingResponse {
        data,
        completed_at: Some(completed_at),
    }))
}
