//! Wallet endpoints: creation, balance, transactions, transfers and
//! administrative suspend/reactivate operations.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;
use crate::ledger;
use crate::models::{
    NewWalletTransaction, TransactionStatus, TransactionType, Wallet, WalletStatus,
    WalletTransaction,
};
use crate::routes::payment_methods;

/// Default page size for transaction history.
const DEFAULT_HISTORY_LIMIT: i64 = 100;

/// Creates the wallets router.
pub fn router(pool: PgPool) -> Router {
    Router::new()
        .route("/", post(create_wallet))
        .route("/transfer", post(transfer_funds))
        .route("/{wallet_id}", get(get_wallet))
        .route("/{wallet_id}/balance", get(get_balance))
        .route(
            "/{wallet_id}/transactions",
            get(get_transactions).post(process_transaction),
        )
        .route("/{wallet_id}/suspend", post(suspend_wallet))
        .route("/{wallet_id}/reactivate", post(reactivate_wallet))
        .route(
            "/{wallet_id}/payment-methods",
            get(payment_methods::list_wallet_payment_methods),
        )
        .route(
            "/{wallet_id}/payment-methods/default",
            get(payment_methods::get_default_payment_method),
        )
        .with_state(pool)
}

/// Creates the merchant-scoped router (wallet lookup by owner).
pub fn merchant_router(pool: PgPool) -> Router {
    Router::new()
        .route("/{merchant_id}/wallet", get(get_merchant_wallet))
        .with_state(pool)
}

/// Request body for creating (or fetching) a merchant's wallet.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWalletRequest {
    /// The owning merchant. One wallet per merchant.
    pub merchant_id: Uuid,
}

/// Wallet representation returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    pub wallet_id: Uuid,
    pub merchant_id: Uuid,
    /// Balance as a string for precision.
    pub balance: String,
    pub status: WalletStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Wallet> for WalletResponse {
    fn from(wallet: Wallet) -> Self {
        Self {
            wallet_id: wallet.id,
            merchant_id: wallet.merchant_id,
            balance: wallet.balance.to_string(),
            status: wallet.status,
            created_at: wallet.created_at,
            updated_at: wallet.updated_at,
        }
    }
}

/// Ledger entry representation returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub transaction_id: Uuid,
    pub wallet_id: Uuid,
    /// Signed amount as a string for precision.
    pub amount: String,
    pub transaction_type: TransactionType,
    pub transaction_status: TransactionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_order_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<WalletTransaction> for TransactionResponse {
    fn from(txn: WalletTransaction) -> Self {
        Self {
            transaction_id: txn.id,
            wallet_id: txn.wallet_id,
            amount: txn.amount.to_string(),
            transaction_type: txn.transaction_type,
            transaction_status: txn.transaction_status,
            description: txn.description,
            reference_id: txn.reference_id,
            related_order_id: txn.related_order_id,
            processed_by: txn.processed_by,
            created_at: txn.created_at,
        }
    }
}

/// POST /api/v1/wallets
///
/// Creates a wallet for a merchant. Idempotent: if the merchant already has
/// one, the existing wallet is returned.
async fn create_wallet(
    State(pool): State<PgPool>,
    Json(request): Json<CreateWalletRequest>,
) -> Result<Json<WalletResponse>, AppError> {
    let wallet = ledger::create_wallet(&pool, request.merchant_id).await?;
    Ok(Json(wallet.into()))
}

/// GET /api/v1/wallets/{wallet_id}
async fn get_wallet(
    State(pool): State<PgPool>,
    Path(wallet_id): Path<Uuid>,
) -> Result<Json<WalletResponse>, AppError> {
    let wallet = ledger::get_wallet(&pool, wallet_id).await?;
    Ok(Json(wallet.into()))
}

/// GET /api/v1/merchants/{merchant_id}/wallet
async fn get_merchant_wallet(
    State(pool): State<PgPool>,
    Path(merchant_id): Path<Uuid>,
) -> Result<Json<WalletResponse>, AppError> {
    let wallet = ledger::get_merchant_wallet(&pool, merchant_id).await?;
    Ok(Json(wallet.into()))
}

/// Response for the balance endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub wallet_id: Uuid,
    pub balance: String,
    pub status: WalletStatus,
    pub last_updated: DateTime<Utc>,
}

/// GET /api/v1/wallets/{wallet_id}/balance
async fn get_balance(
    State(pool): State<PgPool>,
    Path(wallet_id): Path<Uuid>,
) -> Result<Json<BalanceResponse>, AppError> {
    let wallet = ledger::get_wallet(&pool, wallet_id).await?;
    Ok(Json(BalanceResponse {
        wallet_id: wallet.id,
        balance: wallet.balance.to_string(),
        status: wallet.status,
        last_updated: wallet.updated_at,
    }))
}

/// Request body for processing a wallet transaction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessTransactionRequest {
    /// Signed amount: positive = credit, negative = debit.
    pub amount: String,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub related_order_id: Option<Uuid>,
    /// Opaque id of the acting merchant or admin.
    #[serde(default)]
    pub processed_by: Option<Uuid>,
}

/// Parses a decimal amount from its string form.
fn parse_amount(raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw)
        .map_err(|e| AppError::BadRequest(format!("Invalid amount format: {}", e)))
}

/// Validates that an amount's sign matches its transaction type.
///
/// The ledger itself only enforces non-negativity of the resulting balance;
/// sign-to-type correspondence is a request-validation policy applied here.
fn validate_amount_for_type(
    amount: &BigDecimal,
    transaction_type: TransactionType,
) -> Result<(), AppError> {
    let zero = BigDecimal::from(0);
    match transaction_type {
        TransactionType::Deposit
        | TransactionType::Refund
        | TransactionType::TransferIn
        | TransactionType::Commission => {
            if amount <= &zero {
                return Err(AppError::BadRequest(format!(
                    "Amount must be positive for {} transactions",
                    transaction_type.as_str()
                )));
            }
        }
        TransactionType::Withdrawal
        | TransactionType::Penalty
        | TransactionType::TransferOut => {
            if amount >= &zero {
                return Err(AppError::BadRequest(format!(
                    "Amount must be negative for {} transactions",
                    transaction_type.as_str()
                )));
            }
        }
        TransactionType::Adjustment => {}
    }
    Ok(())
}

/// POST /api/v1/wallets/{wallet_id}/transactions
///
/// Processes a transaction against a wallet. The wallet must be active and
/// the resulting balance non-negative.
async fn process_transaction(
    State(pool): State<PgPool>,
    Path(wallet_id): Path<Uuid>,
    Json(request): Json<ProcessTransactionRequest>,
) -> Result<Json<TransactionResponse>, AppError> {
    let amount = parse_amount(&request.amount)?;
    validate_amount_for_type(&amount, request.transaction_type)?;

    let mut new_txn = NewWalletTransaction::new(wallet_id, amount, request.transaction_type);
    new_txn.description = request.description;
    new_txn.reference_id = request.reference_id;
    new_txn.related_order_id = request.related_order_id;
    new_txn.processed_by = request.processed_by;

    let txn = ledger::process_transaction(&pool, new_txn).await?;
    Ok(Json(txn.into()))
}

/// Query parameters for transaction history.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Filter by transaction type.
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// Filter by settlement status.
    pub status: Option<TransactionStatus>,
    /// Maximum number of entries to return.
    pub limit: Option<i64>,
}

/// GET /api/v1/wallets/{wallet_id}/transactions?type=&status=&limit=
///
/// Returns the wallet's ledger entries, newest first.
async fn get_transactions(
    State(pool): State<PgPool>,
    Path(wallet_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    if limit <= 0 {
        return Err(AppError::BadRequest(
            "limit must be a positive integer".to_string(),
        ));
    }

    let entries = ledger::get_transaction_history(
        &pool,
        wallet_id,
        query.transaction_type,
        query.status,
        limit,
    )
    .await?;

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// Request body for transferring funds between wallets.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from_wallet_id: Uuid,
    pub to_wallet_id: Uuid,
    /// Positive amount to move from source to destination.
    pub amount: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub processed_by: Option<Uuid>,
}

/// Response for a completed transfer: the debit leg and the credit leg.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub debit: TransactionResponse,
    pub credit: TransactionResponse,
}

/// POST /api/v1/wallets/transfer
///
/// Moves funds between two wallets atomically: either both ledger entries
/// persist and both balances move, or nothing changes.
async fn transfer_funds(
    State(pool): State<PgPool>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, AppError> {
    let amount = parse_amount(&request.amount)?;

    let (debit, credit) = ledger::transfer_funds(
        &pool,
        request.from_wallet_id,
        request.to_wallet_id,
        amount,
        request.description,
        request.reference_id,
        request.processed_by,
    )
    .await?;

    Ok(Json(TransferResponse {
        debit: debit.into(),
        credit: credit.into(),
    }))
}

/// Request body for the suspend/reactivate admin operations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeRequest {
    /// Why the wallet is being suspended/reactivated; recorded in the ledger.
    pub reason: String,
    /// Opaque id of the acting administrator.
    #[serde(default)]
    pub processed_by: Option<Uuid>,
}

/// POST /api/v1/wallets/{wallet_id}/suspend
async fn suspend_wallet(
    State(pool): State<PgPool>,
    Path(wallet_id): Path<Uuid>,
    Json(request): Json<StatusChangeRequest>,
) -> Result<Json<WalletResponse>, AppError> {
    let wallet =
        ledger::suspend_wallet(&pool, wallet_id, &request.reason, request.processed_by).await?;
    Ok(Json(wallet.into()))
}

/// POST /api/v1/wallets/{wallet_id}/reactivate
async fn reactivate_wallet(
    State(pool): State<PgPool>,
    Path(wallet_id): Path<Uuid>,
    Json(request): Json<StatusChangeRequest>,
) -> Result<Json<WalletResponse>, AppError> {
    let wallet =
        ledger::reactivate_wallet(&pool, wallet_id, &request.reason, request.processed_by).await?;
    Ok(Json(wallet.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== Request Deserialization Tests =====

    #[test]
    fn test_process_transaction_request_deserialization() {
        let json = r#"{
            "amount": "500.00",
            "transactionType": "deposit",
            "description": "Card settlement",
            "referenceId": "stlmt_1234"
        }"#;

        let request: ProcessTransactionRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.amount, "500.00");
        assert_eq!(request.transaction_type, TransactionType::Deposit);
        assert_eq!(request.description, Some("Card settlement".to_string()));
        assert_eq!(request.reference_id, Some("stlmt_1234".to_string()));
        assert_eq!(request.related_order_id, None);
        assert_eq!(request.processed_by, None);
    }

    #[test]
    fn test_transfer_request_deserialization() {
        let from = Uuid::new_v4();
        let to = Uuid::new_v4();
        let json = format!(
            r#"{{"fromWalletId": "{}", "toWalletId": "{}", "amount": "300.00"}}"#,
            from, to
        );

        let request: TransferRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request.from_wallet_id, from);
        assert_eq!(request.to_wallet_id, to);
        assert_eq!(request.amount, "300.00");
        assert_eq!(request.description, None);
    }

    #[test]
    fn test_status_change_request_deserialization() {
        let json = r#"{"reason": "Chargeback investigation"}"#;
        let request: StatusChangeRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.reason, "Chargeback investigation");
        assert_eq!(request.processed_by, None);
    }

    // ===== Response Serialization Tests =====

    #[test]
    fn test_wallet_response_serialization() {
        let wallet = Wallet {
            id: Uuid::new_v4(),
            merchant_id: Uuid::new_v4(),
            balance: BigDecimal::from_str("1500.00").unwrap(),
            status: WalletStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let response: WalletResponse = wallet.into();
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"walletId\":"));
        assert!(json.contains("\"merchantId\":"));
        assert!(json.contains("\"balance\":\"1500.00\""));
        assert!(json.contains("\"status\":\"active\""));
    }

    #[test]
    fn test_transaction_response_omits_empty_metadata() {
        let txn = WalletTransaction {
            id: Uuid::new_v4(),
            wallet_id: Uuid::new_v4(),
            amount: BigDecimal::from_str("-200.00").unwrap(),
            transaction_type: TransactionType::Withdrawal,
            transaction_status: TransactionStatus::Completed,
            description: None,
            reference_id: None,
            related_order_id: None,
            processed_by: None,
            created_at: Utc::now(),
        };

        let response: TransactionResponse = txn.into();
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"amount\":\"-200.00\""));
        assert!(json.contains("\"transactionType\":\"withdrawal\""));
        assert!(json.contains("\"transactionStatus\":\"completed\""));
        assert!(!json.contains("\"description\""));
        assert!(!json.contains("\"referenceId\""));
    }

    // ===== Validation Tests =====

    #[test]
    fn test_parse_amount_valid() {
        assert_eq!(
            parse_amount("1000.50").unwrap(),
            BigDecimal::from_str("1000.50").unwrap()
        );
        assert_eq!(
            parse_amount("-250.00").unwrap(),
            BigDecimal::from_str("-250.00").unwrap()
        );
    }

    #[test]
    fn test_parse_amount_invalid() {
        let result = parse_amount("not-a-number");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Invalid amount format"));
    }

    #[test]
    fn test_credit_types_require_positive_amounts() {
        let negative = BigDecimal::from_str("-100.00").unwrap();
        let positive = BigDecimal::from_str("100.00").unwrap();
        let zero = BigDecimal::from(0);

        for t in [
            TransactionType::Deposit,
            TransactionType::Refund,
            TransactionType::TransferIn,
            TransactionType::Commission,
        ] {
            assert!(validate_amount_for_type(&positive, t).is_ok());
            assert!(validate_amount_for_type(&negative, t).is_err());
            assert!(validate_amount_for_type(&zero, t).is_err());
        }
    }

    #[test]
    fn test_debit_types_require_negative_amounts() {
        let negative = BigDecimal::from_str("-100.00").unwrap();
        let positive = BigDecimal::from_str("100.00").unwrap();
        let zero = BigDecimal::from(0);

        for t in [
            TransactionType::Withdrawal,
            TransactionType::Penalty,
            TransactionType::TransferOut,
        ] {
            assert!(validate_amount_for_type(&negative, t).is_ok());
            assert!(validate_amount_for_type(&positive, t).is_err());
            assert!(validate_amount_for_type(&zero, t).is_err());
        }
    }

    #[test]
    fn test_adjustment_amount_is_unconstrained() {
        let negative = BigDecimal::from_str("-100.00").unwrap();
        let positive = BigDecimal::from_str("100.00").unwrap();
        let zero = BigDecimal::from(0);

        assert!(validate_amount_for_type(&negative, TransactionType::Adjustment).is_ok());
        assert!(validate_amount_for_type(&positive, TransactionType::Adjustment).is_ok());
        assert!(validate_amount_for_type(&zero, TransactionType::Adjustment).is_ok());
    }

    #[test]
    fn test_history_query_type_rename() {
        let query: HistoryQuery =
            serde_json::from_str(r#"{"type": "transfer_in", "limit": 10}"#).unwrap();
        assert_eq!(query.transaction_type, Some(TransactionType::TransferIn));
        assert_eq!(query.status, None);
        assert_eq!(query.limit, Some(10));
    }
}
