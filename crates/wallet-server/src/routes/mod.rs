//! API routes for the wallet server.

pub mod payment_methods;
pub mod wallets;

use axum::Router;
use sqlx::PgPool;

/// Creates the main API router with all routes mounted.
pub fn create_router(pool: PgPool) -> Router {
    Router::new().nest("/api/v1", api_v1_routes(pool))
}

/// Creates the v1 API routes.
fn api_v1_routes(pool: PgPool) -> Router {
    Router::new()
        .nest("/wallets", wallets::router(pool.clone()))
        .nest("/merchants", wallets::merchant_router(pool.clone()))
        .nest("/payment-methods", payment_methods::router(pool))
}
