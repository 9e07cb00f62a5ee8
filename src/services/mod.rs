pub mod movie_search;
pub mod onboarding;
pub mod providers;
pub mod tmdb_auth;
