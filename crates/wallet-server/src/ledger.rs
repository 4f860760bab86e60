//! Wallet ledger operations.
//!
//! Every balance mutation goes through [`apply_transaction`]: it locks the
//! wallet row for the duration of the enclosing database transaction, checks
//! the status and non-negativity invariants, appends a `completed` ledger
//! entry and writes the new balance back. Composed operations (transfers,
//! suspensions) run inside a single transaction so either every row persists
//! or none does.
//!
//! Concurrency control is delegated entirely to Postgres row locking:
//! operations on the same wallet serialize on `SELECT ... FOR UPDATE`,
//! operations on different wallets run in parallel. Transfers lock the
//! source wallet first, then the destination; opposite-direction transfers
//! between the same pair can deadlock, which Postgres resolves by aborting
//! one side. The ledger never retries on behalf of the caller.

use bigdecimal::BigDecimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    NewWalletTransaction, TransactionStatus, TransactionType, Wallet, WalletStatus,
    WalletTransaction,
};

/// Creates a wallet for a merchant, or returns the existing one.
///
/// Idempotent: a merchant has at most one wallet, so repeated calls return
/// the same row. New wallets start at balance 0 with status `active`.
pub async fn create_wallet(pool: &PgPool, merchant_id: Uuid) -> Result<Wallet, AppError> {
    let inserted: Option<Wallet> = sqlx::query_as(
        r#"
        INSERT INTO merchant_wallets (merchant_id)
        VALUES ($1)
        ON CONFLICT (merchant_id) DO NOTHING
        RETURNING id, merchant_id, balance, status, created_at, updated_at
        "#,
    )
    .bind(merchant_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to create wallet: {}", e)))?;

    match inserted {
        Some(wallet) => {
            tracing::info!(wallet_id = %wallet.id, merchant_id = %merchant_id, "Wallet created");
            Ok(wallet)
        }
        None => get_merchant_wallet(pool, merchant_id).await,
    }
}

/// Fetches a wallet by id.
pub async fn get_wallet(pool: &PgPool, wallet_id: Uuid) -> Result<Wallet, AppError> {
    sqlx::query_as(
        r#"
        SELECT id, merchant_id, balance, status, created_at, updated_at
        FROM merchant_wallets
        WHERE id = $1
        "#,
    )
    .bind(wallet_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to load wallet: {}", e)))?
    .ok_or_else(|| AppError::NotFound(format!("Wallet not found: {}", wallet_id)))
}

/// Fetches the current balance of a wallet.
pub async fn get_wallet_balance(pool: &PgPool, wallet_id: Uuid) -> Result<BigDecimal, AppError> {
    let wallet = get_wallet(pool, wallet_id).await?;
    Ok(wallet.balance)
}

/// Fetches a wallet by its owning merchant.
pub async fn get_merchant_wallet(pool: &PgPool, merchant_id: Uuid) -> Result<Wallet, AppError> {
    sqlx::query_as(
        r#"
        SELECT id, merchant_id, balance, status, created_at, updated_at
        FROM merchant_wallets
        WHERE merchant_id = $1
        "#,
    )
    .bind(merchant_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to load wallet: {}", e)))?
    .ok_or_else(|| AppError::NotFound(format!("Wallet not found for merchant: {}", merchant_id)))
}

/// Processes a single wallet transaction as one atomic unit.
///
/// Fails with `NotFound` if the wallet does not exist, `InvalidState` if it
/// is not active, and `InsufficientFunds` if the resulting balance would be
/// negative. On failure nothing is written.
pub async fn process_transaction(
    pool: &PgPool,
    new_txn: NewWalletTransaction,
) -> Result<WalletTransaction, AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

    let txn = apply_transaction(&mut tx, &new_txn).await?;

    tx.commit()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

    tracing::debug!(
        wallet_id = %txn.wallet_id,
        transaction_id = %txn.id,
        transaction_type = txn.transaction_type.as_str(),
        amount = %txn.amount,
        "Wallet transaction processed"
    );

    Ok(txn)
}

/// Transfers funds between two wallets atomically.
///
/// Expressed as a debit (`transfer_out`) on the source followed by a credit
/// (`transfer_in`) on the destination inside one database transaction, so
/// the per-wallet invariant checks are reused and the two legs can never be
/// observed half-applied. Returns (debit, credit).
pub async fn transfer_funds(
    pool: &PgPool,
    from_wallet_id: Uuid,
    to_wallet_id: Uuid,
    amount: BigDecimal,
    description: Option<String>,
    reference_id: Option<String>,
    processed_by: Option<Uuid>,
) -> Result<(WalletTransaction, WalletTransaction), AppError> {
    if amount <= BigDecimal::from(0) {
        return Err(AppError::BadRequest(
            "Transfer amount must be positive".to_string(),
        ));
    }
    if from_wallet_id == to_wallet_id {
        return Err(AppError::BadRequest(
            "Cannot transfer to the same wallet".to_string(),
        ));
    }

    let note = description.unwrap_or_default();

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

    // Source wallet is locked first and held until commit.
    let mut debit = NewWalletTransaction::new(
        from_wallet_id,
        -amount.clone(),
        TransactionType::TransferOut,
    )
    .with_description(format!("Transfer to wallet {}: {}", to_wallet_id, note));
    debit.reference_id = reference_id.clone();
    debit.processed_by = processed_by;
    let debit_txn = apply_transaction(&mut tx, &debit).await?;

    let mut credit =
        NewWalletTransaction::new(to_wallet_id, amount.clone(), TransactionType::TransferIn)
            .with_description(format!("Transfer from wallet {}: {}", from_wallet_id, note));
    credit.reference_id = reference_id;
    credit.processed_by = processed_by;
    let credit_txn = apply_transaction(&mut tx, &credit).await?;

    tx.commit()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

    tracing::info!(
        from_wallet_id = %from_wallet_id,
        to_wallet_id = %to_wallet_id,
        amount = %amount,
        "Funds transferred"
    );

    Ok((debit_txn, credit_txn))
}

/// Returns a wallet's ledger entries, newest first.
///
/// `transaction_type` and `status` are optional equality filters; `limit`
/// bounds the result size.
pub async fn get_transaction_history(
    pool: &PgPool,
    wallet_id: Uuid,
    transaction_type: Option<TransactionType>,
    status: Option<TransactionStatus>,
    limit: i64,
) -> Result<Vec<WalletTransaction>, AppError> {
    sqlx::query_as(
        r#"
        SELECT id, wallet_id, amount, transaction_type, transaction_status,
               description, reference_id, related_order_id, processed_by, created_at
        FROM wallet_transactions
        WHERE wallet_id = $1
          AND ($2::transaction_type IS NULL OR transaction_type = $2)
          AND ($3::transaction_status IS NULL OR transaction_status = $3)
        ORDER BY created_at DESC
        LIMIT $4
        "#,
    )
    .bind(wallet_id)
    .bind(transaction_type)
    .bind(status)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to query transactions: {}", e)))
}

/// Suspends a wallet, recording the reason as a zero-amount adjustment entry.
pub async fn suspend_wallet(
    pool: &PgPool,
    wallet_id: Uuid,
    reason: &str,
    processed_by: Option<Uuid>,
) -> Result<Wallet, AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

    let wallet = lock_wallet(&mut tx, wallet_id).await?;

    if wallet.is_suspended() {
        return Err(AppError::InvalidState(
            "Wallet is already suspended".to_string(),
        ));
    }

    let audit = NewWalletTransaction::adjustment(
        wallet_id,
        format!("Wallet suspended: {}", reason),
        processed_by,
    );
    insert_transaction(&mut tx, &audit).await?;

    let updated = update_wallet_status(&mut tx, wallet_id, WalletStatus::Suspended).await?;

    tx.commit()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

    tracing::warn!(wallet_id = %wallet_id, reason = %reason, "Wallet suspended");

    Ok(updated)
}

/// Reactivates a suspended or frozen wallet.
///
/// Closed wallets are terminal and cannot be reactivated.
pub async fn reactivate_wallet(
    pool: &PgPool,
    wallet_id: Uuid,
    reason: &str,
    processed_by: Option<Uuid>,
) -> Result<Wallet, AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

    let wallet = lock_wallet(&mut tx, wallet_id).await?;

    if wallet.is_active() {
        return Err(AppError::InvalidState(
            "Wallet is already active".to_string(),
        ));
    }
    if !wallet.is_reactivatable() {
        return Err(AppError::InvalidState(format!(
            "Cannot reactivate wallet with status: {}",
            wallet.status.as_str()
        )));
    }

    let audit = NewWalletTransaction::adjustment(
        wallet_id,
        format!("Wallet reactivated: {}", reason),
        processed_by,
    );
    insert_transaction(&mut tx, &audit).await?;

    let updated = update_wallet_status(&mut tx, wallet_id, WalletStatus::Active).await?;

    tx.commit()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

    tracing::info!(wallet_id = %wallet_id, reason = %reason, "Wallet reactivated");

    Ok(updated)
}

/// Applies one ledger entry inside an open database transaction.
///
/// Acquires the wallet's row lock, validates the status and non-negativity
/// invariants, appends the entry as `completed` and writes the new balance.
/// This is the only code path that mutates `balance`.
pub(crate) async fn apply_transaction(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    new_txn: &NewWalletTransaction,
) -> Result<WalletTransaction, AppError> {
    let wallet = lock_wallet(tx, new_txn.wallet_id).await?;

    if !wallet.is_active() {
        return Err(AppError::InvalidState(format!(
            "Wallet is not active. Current status: {}",
            wallet.status.as_str()
        )));
    }

    let new_balance = wallet.resulting_balance(&new_txn.amount);
    if new_balance < BigDecimal::from(0) {
        return Err(AppError::InsufficientFunds {
            balance: wallet.balance,
            amount: new_txn.amount.clone(),
            resulting_balance: new_balance,
        });
    }

    let txn = insert_transaction(tx, new_txn).await?;

    sqlx::query("UPDATE merchant_wallets SET balance = $2, updated_at = NOW() WHERE id = $1")
        .bind(new_txn.wallet_id)
        .bind(&new_balance)
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update balance: {}", e)))?;

    Ok(txn)
}

/// Loads a wallet under an exclusive row lock held until the enclosing
/// transaction commits or aborts.
async fn lock_wallet(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    wallet_id: Uuid,
) -> Result<Wallet, AppError> {
    sqlx::query_as(
        r#"
        SELECT id, merchant_id, balance, status, created_at, updated_at
        FROM merchant_wallets
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(wallet_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to lock wallet: {}", e)))?
    .ok_or_else(|| AppError::NotFound(format!("Wallet not found: {}", wallet_id)))
}

/// Inserts a ledger entry with status `completed`.
async fn insert_transaction(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    new_txn: &NewWalletTransaction,
) -> Result<WalletTransaction, AppError> {
    sqlx::query_as(
        r#"
        INSERT INTO wallet_transactions
            (wallet_id, amount, transaction_type, transaction_status,
             description, reference_id, related_order_id, processed_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, wallet_id, amount, transaction_type, transaction_status,
                  description, reference_id, related_order_id, processed_by, created_at
        "#,
    )
    .bind(new_txn.wallet_id)
    .bind(&new_txn.amount)
    .bind(new_txn.transaction_type)
    .bind(TransactionStatus::Completed)
    .bind(&new_txn.description)
    .bind(&new_txn.reference_id)
    .bind(new_txn.related_order_id)
    .bind(new_txn.processed_by)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to insert ledger entry: {}", e)))
}

/// Writes a wallet's status and returns the updated row.
async fn update_wallet_status(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    wallet_id: Uuid,
    status: WalletStatus,
) -> Result<Wallet, AppError> {
    sqlx::query_as(
        r#"
        UPDATE merchant_wallets
        SET status = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING id, merchant_id, balance, status, created_at, updated_at
        "#,
    )
    .bind(wallet_id)
    .bind(status)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to update wallet status: {}", e)))
}
