use crate::{
    error::AppResult,
    models::{Movie, MovieId},
    services::providers::MovieLookup,
};
use std::sync::Arc;

/// Whether `query` is long enough to be sent to the provider
pub fn is_searchable(query: &str, min_query_chars: usize) -> bool {
    query.trim().chars().count() >= min_query_chars
}

/// Drops candidates whose id is in `exclude` and keeps the first `limit`, in provider order
pub fn filter_candidates(candidates: Vec<Movie>, exclude: &[MovieId], limit: usize) -> Vec<Movie> {
    candidates
        .into_iter()
        .filter(|movie| !exclude.contains(&movie.id))
        .take(limit)
        .collect()
}

/// Service function for movie search
///
/// Short queries short-circuit to an empty list without touching the provider.
pub async fn search_movies(
    provider: Arc<dyn MovieLookup>,
    query: &str,
    exclude: &[MovieId],
    min_query_chars: usize,
    limit: usize,
) -> AppResult<Vec<Movie>> {
    if !is_searchable(query, min_query_chars) {
        return Ok(Vec::new());
    }

    let candidates = provider.search_by_text(query).await?;
    Ok(filter_candidates(candidates, exclude, limit))
}
