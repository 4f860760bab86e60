//! Wallet server binary.

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use wallet_server::{create_router, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wallet_server=debug,tower_http=info")),
        )
        .init();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;

    db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    let app = create_router(pool)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    tracing::info!(addr = %bind_addr, "Wallet server listening");

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
