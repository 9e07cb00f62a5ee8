/// TMDB (The Movie Database) v3 provider
///
/// API Flow:
/// 1. Search: /search/movie?query=... → paginated list, first page only
/// 2. Details: /movie/{id} → single movie, 404 when unknown
use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieId, TmdbMovie, TmdbPage, TmdbStatus},
    services::providers::MovieLookup,
};
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde::de::DeserializeOwned;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Turns a response into `T`, mapping failures onto the provider error taxonomy
    pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(AppError::Provider(describe_failure(status, &body)));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, response = %body, "Failed to deserialize TMDB response");
            AppError::Provider(format!("Failed to parse TMDB response: {}", e))
        })
    }
}

/// Builds an error message from TMDB's `status_message` when present
pub(crate) fn describe_failure(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<TmdbStatus>(body)
        .ok()
        .and_then(|s| s.status_message)
        .unwrap_or_else(|| body.to_string());

    format!("TMDB API returned status {}: {}", status, detail)
}

#[async_trait::async_trait]
impl MovieLookup for TmdbProvider {
    async fn search_by_text(&self, query: &str) -> AppResult<Vec<Movie>> {
        let response = self
            .http_client
            .get(self.endpoint("/search/movie"))
            .query(&[("api_key", self.api_key.as_str()), ("query", query)])
            .send()
            .await?;

        let page: TmdbPage = Self::read_json(response).await?;
        let movies: Vec<Movie> = page.results.into_iter().map(Movie::from).collect();

        tracing::info!(
            query = %query,
            results = movies.len(),
            provider = self.name(),
            "Movie search completed"
        );

        Ok(movies)
    }

    async fn fetch_by_id(&self, id: MovieId) -> AppResult<Option<Movie>> {
        let response = self
            .http_client
            .get(self.endpoint(&format!("/movie/{}", id)))
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(movie_id = id, provider = self.name(), "Movie not found");
            return Ok(None);
        }

        let movie: TmdbMovie = Self::read_json(response).await?;
        tracing::debug!(movie_id = id, provider = self.name(), "Movie fetched");

        Ok(Some(movie.into()))
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
