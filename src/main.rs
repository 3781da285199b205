use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storymatch_api::{
    config::{Config, StorageBackend},
    db::{self, redis::CacheWriterHandle},
    routes::{create_router, AppState},
    services::{
        Clock, ContentCatalog, EngineSettings, EventLog, PersonalizationEngine, ProfileStore,
        SystemClock,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storymatch_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(backend = ?config.storage_backend, "Starting storymatch-api");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (catalog, events, store, cache_writer) = build_adapters(&config).await?;

    let engine = Arc::new(PersonalizationEngine::new(
        catalog,
        events,
        store,
        clock,
        EngineSettings::from(&config),
    ));
    let app = create_router(Arc::new(AppState::new(engine)));

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %config.bind_address(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    Ok(())
}

type Adapters = (
    Arc<dyn ContentCatalog>,
    Arc<dyn EventLog>,
    Arc<dyn ProfileStore>,
    Option<CacheWriterHandle>,
);

async fn build_adapters(config: &Config) -> anyhow::Result<Adapters> {
    match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; nothing survives a restart");
            Ok((
                Arc::new(db::InMemoryCatalog::new()),
                Arc::new(db::InMemoryEventLog::new()),
                Arc::new(db::InMemoryProfileStore::new()),
                None,
            ))
        }
        StorageBackend::Postgres => {
            let pool = db::create_pool(&config.database_url).await?;
            db::run_migrations(&pool).await?;

            let redis_client = db::create_redis_client(&config.redis_url)?;
            let (cache, cache_writer) = db::Cache::new(redis_client).await;

            let catalog = db::CachedCatalog::new(
                Arc::new(db::PgCatalog::new(pool.clone())),
                cache,
                config.catalog_cache_ttl_secs,
                config.trending_cache_ttl_secs,
            );

            Ok((
                Arc::new(catalog),
                Arc::new(db::PgEventLog::new(pool.clone())),
                Arc::new(db::PgProfileStore::new(pool)),
                Some(cache_writer),
            ))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
