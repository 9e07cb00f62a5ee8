use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Movie, MovieId, Vibe, DEFAULT_POSTER_SIZE, VIBE_OPTIONS},
    routes::AppState,
    services::movie_search,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// A missing query is treated as empty and returns no results
    #[serde(default)]
    q: String,
    /// Comma-separated ids already selected by the caller
    #[serde(default)]
    exclude: Option<String>,
}

/// Movie as rendered by the picker: raw record plus display fields
#[derive(Debug, Serialize)]
pub struct MovieResponse {
    #[serde(flatten)]
    pub movie: Movie,
    pub year_label: String,
    pub poster_url: Option<String>,
}

impl MovieResponse {
    fn new(movie: Movie, image_url: &str) -> Self {
        Self {
            year_label: movie.display_year().to_string(),
            poster_url: movie.poster_url(image_url, DEFAULT_POSTER_SIZE),
            movie,
        }
    }
}

fn parse_exclude(raw: Option<&str>) -> AppResult<Vec<MovieId>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<MovieId>()
                .map_err(|_| AppError::InvalidInput(format!("Invalid movie id: {}", part)))
        })
        .collect()
}

/// Handler for movie search endpoint
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<MovieResponse>>> {
    let exclude = parse_exclude(params.exclude.as_deref())?;

    let movies = movie_search::search_movies(
        state.movie_provider.clone(),
        &params.q,
        &exclude,
        state.picker.min_query_chars,
        state.picker.max_results,
    )
    .await?;

    tracing::info!(
        request_id = %request_id,
        query = %params.q,
        excluded = exclude.len(),
        results = movies.len(),
        "Movie search served"
    );

    Ok(Json(
        movies
            .into_iter()
            .map(|movie| MovieResponse::new(movie, &state.image_url))
            .collect(),
    ))
}

/// Handler for single movie lookup
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<MovieId>,
) -> AppResult<Json<MovieResponse>> {
    let movie = state
        .movie_provider
        .fetch_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", id)))?;

    Ok(Json(MovieResponse::new(movie, &state.image_url)))
}

/// Preset vibes for the onboarding vibes step
pub async fn list_vibes() -> Json<Vec<Vibe>> {
    Json(VIBE_OPTIONS.to_vec())
}
