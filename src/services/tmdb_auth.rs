use reqwest::{Client as HttpClient, Url};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{Movie, TmdbPage},
    services::providers::TmdbProvider,
};

const AUTHENTICATE_URL: &str = "https://www.themoviedb.org/authenticate";

/// TMDB account attached to a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbAccount {
    pub id: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// One page of an account movie list (rated, favorites, watchlist)
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AccountMovies {
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u32,
    pub movies: Vec<Movie>,
}

impl From<TmdbPage> for AccountMovies {
    fn from(page: TmdbPage) -> Self {
        Self {
            page: page.page,
            total_pages: page.total_pages,
            total_results: page.total_results,
            movies: page.results.into_iter().map(Movie::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountList {
    Rated,
    Favorite,
    Watchlist,
}

impl AccountList {
    fn path_segment(self) -> &'static str {
        match self {
            AccountList::Rated => "rated",
            AccountList::Favorite => "favorite",
            AccountList::Watchlist => "watchlist",
        }
    }
}

#[derive(Deserialize)]
struct RequestTokenResponse {
    request_token: String,
}

#[derive(Deserialize)]
struct SessionResponse {
    session_id: String,
}

/// Client for TMDB's three-step user authentication and account lists
///
/// 1. `create_request_token` asks TMDB for a short-lived token
/// 2. the user approves it at `authorization_url`
/// 3. `create_session` exchanges the approved token for a session id
#[derive(Clone)]
pub struct TmdbAuth {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbAuth {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn create_request_token(&self) -> AppResult<String> {
        let response = self
            .http_client
            .get(format!("{}/authentication/token/new", self.api_url))
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let token: RequestTokenResponse = TmdbProvider::read_json(response)
            .await
            .map_err(|e| step_failed("create request token", e))?;

        Ok(token.request_token)
    }

    /// URL the user visits to approve `request_token`
    pub fn authorization_url(request_token: &str, redirect_url: &str) -> AppResult<String> {
        let url = Url::parse_with_params(
            &format!("{}/{}", AUTHENTICATE_URL, request_token),
            &[("redirect_to", redirect_url)],
        )
        .map_err(|e| AppError::InvalidInput(format!("Invalid request token: {}", e)))?;

        Ok(url.to_string())
    }

    pub async fn create_session(&self, request_token: &str) -> AppResult<String> {
        let response = self
            .http_client
            .post(format!("{}/authentication/session/new", self.api_url))
            .query(&[("api_key", self.api_key.as_str())])
            .json(&serde_json::json!({ "request_token": request_token }))
            .send()
            .await?;

        let session: SessionResponse = TmdbProvider::read_json(response)
            .await
            .map_err(|e| step_failed("create session", e))?;

        tracing::info!("TMDB session created");
        Ok(session.session_id)
    }

    pub async fn account_details(&self, session_id: &str) -> AppResult<TmdbAccount> {
        let response = self
            .http_client
            .get(format!("{}/account", self.api_url))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("session_id", session_id),
            ])
            .send()
            .await?;

        TmdbProvider::read_json(response)
            .await
            .map_err(|e| step_failed("get account details", e))
    }

    pub async fn account_movies(
        &self,
        list: AccountList,
        account_id: u64,
        session_id: &str,
    ) -> AppResult<AccountMovies> {
        let response = self
            .http_client
            .get(format!(
                "{}/account/{}/{}/movies",
                self.api_url,
                account_id,
                list.path_segment()
            ))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("session_id", session_id),
            ])
            .send()
            .await?;

        let page: TmdbPage = TmdbProvider::read_json(response)
            .await
            .map_err(|e| step_failed(&format!("get {} movies", list.path_segment()), e))?;

        Ok(page.into())
    }

    pub async fn rated_movies(&self, account_id: u64, session_id: &str) -> AppResult<AccountMovies> {
        self.account_movies(AccountList::Rated, account_id, session_id)
            .await
    }

    pub async fn favorite_movies(
        &self,
        account_id: u64,
        session_id: &str,
    ) -> AppResult<AccountMovies> {
        self.account_movies(AccountList::Favorite, account_id, session_id)
            .await
    }

    pub async fn watchlist(&self, account_id: u64, session_id: &str) -> AppResult<AccountMovies> {
        self.account_movies(AccountList::Watchlist, account_id, session_id)
            .await
    }
}

/// Prefixes provider failures with the step that failed; transport errors pass through
fn step_failed(step: &str, error: AppError) -> AppError {
    match error {
        AppError::Provider(msg) => AppError::Provider(format!("Failed to {}: {}", step, msg)),
        other => other,
    }
}
