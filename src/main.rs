//! Userdesk - Application Entry Point

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use userdesk::{
    cache::{MemoryPathCache, PathCache, RedisPathCache},
    config::Config,
    create_router,
    db::{self, repositories::UserRepository},
    error,
    services::UserService,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Fail fast on bad configuration, before anything else starts
    let config = Config::from_env()?;

    init_tracing(&config);
    error::enable_stack_capture(config.environment.is_production());

    tracing::info!(environment = ?config.environment, "Starting userdesk server...");

    let db_pool = db::connection::create_pool(&config.database).await?;

    tracing::info!("Running database migrations...");
    db::run_migrations(&db_pool).await?;

    let cache = connect_cache(&config).await?;

    let users = UserService::new(
        Arc::new(UserRepository::new(db_pool)),
        cache,
        config.auth.password_policy,
    );
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let state = AppState::new(users, config);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.rust_log));

    let registry = tracing_subscriber::registry().with(filter);

    if config.environment.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Redis when configured, otherwise a cache local to this process
async fn connect_cache(config: &Config) -> anyhow::Result<Arc<dyn PathCache>> {
    let Some(url) = config.redis.url.as_deref() else {
        tracing::info!("REDIS_URL not set, caching in memory");
        return Ok(Arc::new(MemoryPathCache::new()));
    };

    tracing::info!("Connecting to Redis...");
    let client = redis::Client::open(url)?;
    let conn = redis::aio::ConnectionManager::new(client).await?;

    Ok(Arc::new(RedisPathCache::new(conn)))
}
