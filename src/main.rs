use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use movierec::{
    config::Config,
    db::{create_redis_client, KeyValueStore, MemoryStore, RedisStore},
    routes::{create_router, AppState},
    services::{onboarding::OnboardingRepository, providers::TmdbProvider},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("movierec=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn KeyValueStore> = match &config.redis_url {
        Some(url) => {
            let client = create_redis_client(url)?;
            Arc::new(RedisStore::connect(client).await?)
        }
        None => {
            tracing::warn!("REDIS_URL not set, onboarding state will not survive restarts");
            Arc::new(MemoryStore::new())
        }
    };

    let state = Arc::new(AppState {
        movie_provider: Arc::new(TmdbProvider::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
        )),
        onboarding: OnboardingRepository::new(store.clone()),
        image_url: config.tmdb_image_url.clone(),
        picker: config.picker_options(),
    });

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(
        addr = %config.bind_addr(),
        store = store.name(),
        "Server running"
    );
    axum::serve(listener, app).await?;

    Ok(())
}
