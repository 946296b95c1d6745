use std::net::SocketAddr;
use std::sync::Arc;

use skillnet_backend::{
    config::{get_config, init_config},
    database::pool::{create_pool, run_migrations},
    routes,
    store::{MemoryStore, PgStore, Store},
    utils::{crypto::Argon2Hasher, token::TokenIssuer},
    AppState,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    init_config()?;
    let config = get_config()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(config, url).await?;
            run_migrations(&pool).await?;
            info!("Connected to Postgres and applied migrations");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set; using the in-memory store, data will not persist");
            Arc::new(MemoryStore::new())
        }
    };

    let app_state = AppState::new(
        store,
        Arc::new(Argon2Hasher),
        TokenIssuer::new(&config.jwt_secret, config.jwt_ttl_days),
    );

    let app = routes::router(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
