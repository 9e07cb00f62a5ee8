/// Movie metadata provider abstraction
///
/// The picker and the HTTP surface only talk to [`MovieLookup`], so the TMDB client can be
/// swapped for a fake in tests or for another metadata source later.
use crate::{
    error::AppResult,
    models::{Movie, MovieId},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for movie metadata providers
///
/// Both calls are idempotent and side-effect free, so callers may discard a response that
/// arrives too late instead of cancelling the request.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieLookup: Send + Sync {
    /// Free-text search. Returns candidates in provider relevance order.
    async fn search_by_text(&self, query: &str) -> AppResult<Vec<Movie>>;

    /// Fetch one movie. `Ok(None)` when the provider does not know the id.
    async fn fetch_by_id(&self, id: MovieId) -> AppResult<Option<Movie>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
