//! Error types for the wallet server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bigdecimal::BigDecimal;
use serde_json::json;

/// Application error type.
///
/// Ledger precondition failures get their own variants so callers can map
/// each kind to a distinct response; every one of them aborts the enclosing
/// database transaction before it surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Insufficient funds. Current balance: {balance}, Transaction amount: {amount}, Would result in: {resulting_balance}")]
    InsufficientFunds {
        /// Balance at the time the transaction was attempted.
        balance: BigDecimal,
        /// The attempted (signed) transaction amount.
        amount: BigDecimal,
        /// The balance the transaction would have produced.
        resulting_balance: BigDecimal,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::InvalidState(msg) => (StatusCode::CONFLICT, msg).into_response(),
            AppError::InsufficientFunds {
                balance,
                amount,
                resulting_balance,
            } => {
                let body = Json(json!({
                    "error": "Insufficient funds",
                    "balance": balance.to_string(),
                    "amount": amount.to_string(),
                    "resultingBalance": resulting_balance.to_string(),
                }));
                (StatusCode::UNPROCESSABLE_ENTITY, body).into_response()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_insufficient_funds_message_carries_diagnostics() {
        let err = AppError::InsufficientFunds {
            balance: BigDecimal::from_str("1000.00").unwrap(),
            amount: BigDecimal::from_str("-2000.00").unwrap(),
            resulting_balance: BigDecimal::from_str("-1000.00").unwrap(),
        };

        let msg = err.to_string();
        assert!(msg.contains("1000.00"));
        assert!(msg.contains("-2000.00"));
        assert!(msg.contains("-1000.00"));
    }

    #[test]
    fn test_invalid_state_message() {
        let err = AppError::InvalidState("Wallet is already suspended".to_string());
        assert_eq!(err.to_string(), "Invalid state: Wallet is already suspended");
    }
}
