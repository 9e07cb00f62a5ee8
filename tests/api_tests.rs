use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;

use movierec::{
    db::MemoryStore,
    error::{AppError, AppResult},
    models::{Movie, MovieId},
    picker::PickerOptions,
    routes::{create_router, AppState},
    services::{onboarding::OnboardingRepository, providers::MovieLookup},
};

/// In-memory catalogue standing in for TMDB
struct Catalogue {
    movies: Vec<Movie>,
    searches: AtomicUsize,
    fail_searches: bool,
}

impl Catalogue {
    fn new(count: MovieId) -> Self {
        Self {
            movies: (1..=count)
                .map(|id| Movie {
                    id,
                    title: format!("Star Movie {}", id),
                    release_year: Some("1977".to_string()),
                    poster_path: Some(format!("/{}.jpg", id)),
                })
                .collect(),
            searches: AtomicUsize::new(0),
            fail_searches: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail_searches: true,
            ..Self::new(0)
        }
    }
}

#[async_trait::async_trait]
impl MovieLookup for Catalogue {
    async fn search_by_text(&self, query: &str) -> AppResult<Vec<Movie>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.fail_searches {
            return Err(AppError::Provider("TMDB API returned status 503".to_string()));
        }
        let needle = query.trim().to_lowercase();
        Ok(self
            .movies
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn fetch_by_id(&self, id: MovieId) -> AppResult<Option<Movie>> {
        Ok(self.movies.iter().find(|m| m.id == id).cloned())
    }

    fn name(&self) -> &'static str {
        "catalogue"
    }
}

fn create_test_server(catalogue: Arc<Catalogue>) -> TestServer {
    let state = Arc::new(AppState {
        movie_provider: catalogue,
        onboarding: OnboardingRepository::new(Arc::new(MemoryStore::new())),
        image_url: "https://image.tmdb.org/t/p".to_string(),
        picker: PickerOptions::default(),
    });
    TestServer::new(create_router(state)).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(Arc::new(Catalogue::new(0)));
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let server = create_test_server(Arc::new(Catalogue::new(0)));
    let response = server.get("/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_search_excludes_and_truncates() {
    let server = create_test_server(Arc::new(Catalogue::new(12)));

    let response = server
        .get("/api/v1/movies/search")
        .add_query_param("q", "star")
        .add_query_param("exclude", "1,3")
        .await;

    response.assert_status_ok();
    let movies: Vec<serde_json::Value> = response.json();
    let ids: Vec<u64> = movies.iter().map(|m| m["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![2, 4, 5, 6, 7, 8, 9, 10]);
    assert_eq!(movies[0]["poster_url"], "https://image.tmdb.org/t/p/w200/2.jpg");
}

#[tokio::test]
async fn test_short_search_skips_provider() {
    let catalogue = Arc::new(Catalogue::new(3));
    let server = create_test_server(catalogue.clone());

    let response = server
        .get("/api/v1/movies/search")
        .add_query_param("q", " s ")
        .await;

    response.assert_status_ok();
    let movies: Vec<serde_json::Value> = response.json();
    assert!(movies.is_empty());
    assert_eq!(catalogue.searches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_search_without_query_is_empty() {
    let catalogue = Arc::new(Catalogue::new(3));
    let server = create_test_server(catalogue.clone());

    let response = server.get("/api/v1/movies/search").await;

    response.assert_status_ok();
    response.assert_json(&json!([]));
    assert_eq!(catalogue.searches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_error_bodies_are_json() {
    let server = create_test_server(Arc::new(Catalogue::new(3)));

    let response = server
        .get("/api/v1/movies/search")
        .add_query_param("q", "star")
        .add_query_param("exclude", "one")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "Invalid movie id: one" }));
}

#[tokio::test]
async fn test_search_provider_failure_is_bad_gateway() {
    let server = create_test_server(Arc::new(Catalogue::failing()));

    let response = server
        .get("/api/v1/movies/search")
        .add_query_param("q", "star")
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_bad_exclude_is_rejected() {
    let server = create_test_server(Arc::new(Catalogue::new(3)));

    let response = server
        .get("/api/v1/movies/search")
        .add_query_param("q", "star")
        .add_query_param("exclude", "one")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_movie() {
    let server = create_test_server(Arc::new(Catalogue::new(3)));

    let response = server.get("/api/v1/movies/2").await;
    response.assert_status_ok();
    let movie: serde_json::Value = response.json();
    assert_eq!(movie["title"], "Star Movie 2");
    assert_eq!(movie["year_label"], "1977");

    server
        .get("/api/v1/movies/99")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_vibes() {
    let server = create_test_server(Arc::new(Catalogue::new(0)));

    let vibes: Vec<serde_json::Value> = server.get("/api/v1/vibes").await.json();
    assert_eq!(vibes.len(), 12);
    assert_eq!(vibes[0]["id"], "mind-bending");
}

#[tokio::test]
async fn test_onboarding_round_trip() {
    let server = create_test_server(Arc::new(Catalogue::new(0)));

    let empty: serde_json::Value = server.get("/api/v1/onboarding").await.json();
    assert_eq!(empty["recentMovies"], json!([]));
    assert_eq!(empty["completedAt"], serde_json::Value::Null);

    let response = server
        .put("/api/v1/onboarding")
        .json(&json!({
            "recentMovies": [603, 603, 27205],
            "favoriteMovies": [],
            "selectedVibes": ["witty"],
            "customVibeText": ""
        }))
        .await;
    response.assert_status_ok();

    let saved: serde_json::Value = server.get("/api/v1/onboarding").await.json();
    assert_eq!(saved["recentMovies"], json!([603, 27205]));
    assert_eq!(saved["selectedVibes"], json!(["witty"]));
}

#[tokio::test]
async fn test_onboarding_rejects_unknown_vibe() {
    let server = create_test_server(Arc::new(Catalogue::new(0)));

    let response = server
        .put("/api/v1/onboarding")
        .json(&json!({ "selectedVibes": ["spooky"] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_onboarding_completion_requires_every_step() {
    let server = create_test_server(Arc::new(Catalogue::new(0)));

    server
        .put("/api/v1/onboarding")
        .json(&json!({ "recentMovies": [603] }))
        .await
        .assert_status_ok();

    server
        .post("/api/v1/onboarding/complete")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .put("/api/v1/onboarding")
        .json(&json!({
            "recentMovies": [603],
            "favoriteMovies": [27205],
            "customVibeText": "heist movies with a twist"
        }))
        .await
        .assert_status_ok();

    let response = server.post("/api/v1/onboarding/complete").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["completedAt"].is_string());

    let stored: serde_json::Value = server.get("/api/v1/onboarding").await.json();
    assert_eq!(stored["completedAt"], body["completedAt"]);
}
