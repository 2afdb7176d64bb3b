use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tailor_api::cache::{CacheStore, MemoryCacheStore, PgCacheStore};
use tailor_api::config::Config;
use tailor_api::db::create_pool;
use tailor_api::llm_client::{GeminiClient, GenerationProvider};
use tailor_api::proxy::EdgeProxy;
use tailor_api::routes::build_router;
use tailor_api::state::AppState;
use tailor_api::tools::{PageFetcher, SpeechClient};
use tailor_api::usage::{MemoryUsageStore, PgUsageStore, UsageStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("tailor_api={},tower_http=info", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Cache table and usage rows live in Postgres when configured
    let (cache, usage): (Arc<dyn CacheStore>, Arc<dyn UsageStore>) = match &config.database_url {
        Some(url) => {
            let db = create_pool(url).await?;
            info!("PostgreSQL pool initialized");
            (
                Arc::new(PgCacheStore::new(db.clone())),
                Arc::new(PgUsageStore::new(db)),
            )
        }
        None => {
            warn!("DATABASE_URL not set; cache and usage are kept in memory");
            (
                Arc::new(MemoryCacheStore::new()),
                Arc::new(MemoryUsageStore::new()),
            )
        }
    };

    let http = reqwest::Client::new();

    let provider: Arc<dyn GenerationProvider> = Arc::new(GeminiClient::new(
        http.clone(),
        config.gemini_api_base.clone(),
        config.gemini_api_key.clone(),
    ));
    if !provider.is_configured() {
        warn!("GEMINI_API_KEY not set; generation requests will fail with 400");
    }
    info!("Edge proxy initialized (default model: {})", config.default_model);

    let proxy = EdgeProxy::new(
        provider,
        cache,
        config.default_model.clone(),
        config.cache_default_ttl_secs,
    );

    let speech = SpeechClient::new(
        http.clone(),
        config.elevenlabs_api_base.clone(),
        config.elevenlabs_api_key.clone(),
        config.elevenlabs_voice_id.clone(),
    );

    let state = AppState {
        config: config.clone(),
        proxy: Arc::new(proxy),
        usage,
        speech,
        fetcher: PageFetcher::new(http),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
