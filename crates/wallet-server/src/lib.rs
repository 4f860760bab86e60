//! Wallet Server - Merchant wallet ledger API
//!
//! This crate provides the REST API server for the marketplace's merchant
//! wallet subsystem: per-merchant balances, an append-only transaction
//! ledger, atomic transfers, and payout method management.

pub mod db;
pub mod error;
pub mod ledger;
pub mod models;
pub mod payment_methods;
pub mod routes;

pub use error::AppError;
pub use routes::create_router;
