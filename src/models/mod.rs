mod movie;
mod onboarding;

pub use movie::{Movie, MovieId, TmdbMovie, TmdbPage, TmdbStatus, DEFAULT_POSTER_SIZE};
pub use onboarding::{
    OnboardingData, Vibe, MAX_FAVORITE_MOVIES, MAX_RECENT_MOVIES, VIBE_OPTIONS,
};
