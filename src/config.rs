use serde::Deserialize;
use std::time::Duration;

use crate::picker::PickerOptions;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB v3 API key
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// TMDB image CDN base URL, used to build poster links
    #[serde(default = "default_tmdb_image_url")]
    pub tmdb_image_url: String,

    /// Redis connection URL. Onboarding state lives in memory when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Quiet period before a typed query is searched
    #[serde(default = "default_picker_debounce_ms")]
    pub picker_debounce_ms: u64,

    /// Maximum number of search results shown in the dropdown
    #[serde(default = "default_picker_max_results")]
    pub picker_max_results: usize,

    /// Shortest trimmed query that triggers a search
    #[serde(default = "default_picker_min_query_chars")]
    pub picker_min_query_chars: usize,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_picker_debounce_ms() -> u64 {
    300
}

fn default_picker_max_results() -> usize {
    8
}

fn default_picker_min_query_chars() -> usize {
    2
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Picker tuning; callers set the selection cap per picker
    pub fn picker_options(&self) -> PickerOptions {
        PickerOptions {
            max_results: self.picker_max_results,
            min_query_chars: self.picker_min_query_chars,
            debounce: Duration::from_millis(self.picker_debounce_ms),
            ..PickerOptions::default()
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
