use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    picker::PickerOptions,
    services::{onboarding::OnboardingRepository, providers::MovieLookup},
};

pub mod movies;
pub mod onboarding;

/// Shared application state
pub struct AppState {
    pub movie_provider: Arc<dyn MovieLookup>,
    pub onboarding: OnboardingRepository,
    pub image_url: String,
    /// Search tuning shared with the picker (minimum query length, result cap)
    pub picker: PickerOptions,
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies/search", get(movies::search))
        .route("/movies/:id", get(movies::get_movie))
        .route("/vibes", get(movies::list_vibes))
        .route(
            "/onboarding",
            get(onboarding::get_onboarding).put(onboarding::save_onboarding),
        )
        .route("/onboarding/complete", post(onboarding::complete_onboarding))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
