use serde::{Deserialize, Serialize};

/// Provider-assigned movie identifier (TMDB numeric id)
pub type MovieId = u64;

/// Poster size used by the picker dropdown and selection grid
pub const DEFAULT_POSTER_SIZE: &str = "w200";

/// A movie record as shown in search results and the selection grid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub release_year: Option<String>,
    pub poster_path: Option<String>,
}

impl Movie {
    /// Year label for display, `TBA` when the provider has no release date
    pub fn display_year(&self) -> &str {
        self.release_year.as_deref().unwrap_or("TBA")
    }

    /// Full poster URL for the given image base and size
    pub fn poster_url(&self, image_base: &str, size: &str) -> Option<String> {
        self.poster_path
            .as_deref()
            .map(|path| format!("{}/{}{}", image_base.trim_end_matches('/'), size, path))
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Raw movie object from TMDB `/search/movie` and `/movie/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

impl From<TmdbMovie> for Movie {
    fn from(movie: TmdbMovie) -> Self {
        // TMDB sends "" for unreleased titles
        let release_year = movie
            .release_date
            .as_deref()
            .and_then(|date| date.split('-').next())
            .filter(|year| !year.is_empty())
            .map(str::to_string);

        Movie {
            id: movie.id,
            title: movie.title,
            release_year,
            poster_path: movie.poster_path,
        }
    }
}

/// One page of a paginated TMDB listing
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage {
    #[serde(default)]
    pub page: u32,
    pub results: Vec<TmdbMovie>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

/// Error body TMDB returns alongside non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbStatus {
    #[serde(default)]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub status_message: Option<String>,
}
