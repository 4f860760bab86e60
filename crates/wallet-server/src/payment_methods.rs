//! Payment method registry.
//!
//! Manages the payout channels attached to a wallet. The single-default
//! invariant (at most one `is_default = true` per wallet) is maintained by
//! clearing the sibling flags and setting the new one inside a single
//! database transaction.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewPaymentMethod, PaymentMethod, PaymentMethodStatus};

/// Registers a new payment method against a wallet.
///
/// If the new method is flagged as default, the wallet's previous default is
/// cleared in the same transaction.
pub async fn add_payment_method(
    pool: &PgPool,
    new_method: NewPaymentMethod,
) -> Result<PaymentMethod, AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

    let wallet_exists: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM merchant_wallets WHERE id = $1")
            .bind(new_method.wallet_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to load wallet: {}", e)))?;

    if wallet_exists.is_none() {
        return Err(AppError::NotFound(format!(
            "Wallet not found: {}",
            new_method.wallet_id
        )));
    }

    if new_method.is_default {
        clear_wallet_defaults(&mut tx, new_method.wallet_id, None).await?;
    }

    let method: PaymentMethod = sqlx::query_as(
        r#"
        INSERT INTO payment_methods
            (wallet_id, method_type, details, display_name, status, is_default)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, wallet_id, method_type, details, display_name, status,
                  is_verified, verified_at, is_default, created_at, updated_at
        "#,
    )
    .bind(new_method.wallet_id)
    .bind(new_method.method_type)
    .bind(&new_method.details)
    .bind(&new_method.display_name)
    .bind(PaymentMethodStatus::Active)
    .bind(new_method.is_default)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to insert payment method: {}", e)))?;

    tx.commit()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

    tracing::info!(
        payment_method_id = %method.id,
        wallet_id = %method.wallet_id,
        method_type = method.method_type.as_str(),
        is_default = method.is_default,
        "Payment method added"
    );

    Ok(method)
}

/// Returns a wallet's payment methods: defaults first, then grouped by type,
/// then by creation time.
pub async fn get_wallet_payment_methods(
    pool: &PgPool,
    wallet_id: Uuid,
) -> Result<Vec<PaymentMethod>, AppError> {
    sqlx::query_as(
        r#"
        SELECT id, wallet_id, method_type, details, display_name, status,
               is_verified, verified_at, is_default, created_at, updated_at
        FROM payment_methods
        WHERE wallet_id = $1
        ORDER BY is_default DESC, method_type, created_at
        "#,
    )
    .bind(wallet_id)
    .fetch_all(pool)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to query payment methods: {}", e)))
}

/// Returns the wallet's active default payment method, if any.
pub async fn get_default_payment_method(
    pool: &PgPool,
    wallet_id: Uuid,
) -> Result<Option<PaymentMethod>, AppError> {
    sqlx::query_as(
        r#"
        SELECT id, wallet_id, method_type, details, display_name, status,
               is_verified, verified_at, is_default, created_at, updated_at
        FROM payment_methods
        WHERE wallet_id = $1 AND is_default = TRUE AND status = 'active'
        "#,
    )
    .bind(wallet_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to query default payment method: {}", e)))
}

/// Makes a payment method the default for its wallet.
///
/// Clears the flag on every sibling method in the same transaction.
pub async fn set_default_payment_method(
    pool: &PgPool,
    payment_method_id: Uuid,
) -> Result<PaymentMethod, AppError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

    let method: PaymentMethod = sqlx::query_as(
        r#"
        SELECT id, wallet_id, method_type, details, display_name, status,
               is_verified, verified_at, is_default, created_at, updated_at
        FROM payment_methods
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(payment_method_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to load payment method: {}", e)))?
    .ok_or_else(|| {
        AppError::NotFound(format!("Payment method not found: {}", payment_method_id))
    })?;

    clear_wallet_defaults(&mut tx, method.wallet_id, Some(payment_method_id)).await?;

    let updated: PaymentMethod = sqlx::query_as(
        r#"
        UPDATE payment_methods
        SET is_default = TRUE, updated_at = NOW()
        WHERE id = $1
        RETURNING id, wallet_id, method_type, details, display_name, status,
                  is_verified, verified_at, is_default, created_at, updated_at
        "#,
    )
    .bind(payment_method_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to set default payment method: {}", e)))?;

    tx.commit()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

    Ok(updated)
}

/// Deactivates a payment method and drops its default flag.
pub async fn deactivate_payment_method(
    pool: &PgPool,
    payment_method_id: Uuid,
) -> Result<PaymentMethod, AppError> {
    let updated: Option<PaymentMethod> = sqlx::query_as(
        r#"
        UPDATE payment_methods
        SET status = 'inactive', is_default = FALSE, updated_at = NOW()
        WHERE id = $1
        RETURNING id, wallet_id, method_type, details, display_name, status,
                  is_verified, verified_at, is_default, created_at, updated_at
        "#,
    )
    .bind(payment_method_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to deactivate payment method: {}", e)))?;

    updated.ok_or_else(|| {
        AppError::NotFound(format!("Payment method not found: {}", payment_method_id))
    })
}

/// Marks a payment method as verified (admin operation).
pub async fn verify_payment_method(
    pool: &PgPool,
    payment_method_id: Uuid,
) -> Result<PaymentMethod, AppError> {
    let updated: Option<PaymentMethod> = sqlx::query_as(
        r#"
        UPDATE payment_methods
        SET is_verified = TRUE, verified_at = NOW(), updated_at = NOW()
        WHERE id = $1
        RETURNING id, wallet_id, method_type, details, display_name, status,
                  is_verified, verified_at, is_default, created_at, updated_at
        "#,
    )
    .bind(payment_method_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to verify payment method: {}", e)))?;

    updated.ok_or_else(|| {
        AppError::NotFound(format!("Payment method not found: {}", payment_method_id))
    })
}

/// Clears `is_default` on a wallet's methods, optionally sparing one.
async fn clear_wallet_defaults(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    wallet_id: Uuid,
    except: Option<Uuid>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE payment_methods
        SET is_default = FALSE, updated_at = NOW()
        WHERE wallet_id = $1 AND is_default = TRUE
          AND ($2::uuid IS NULL OR id <> $2)
        "#,
    )
    .bind(wallet_id)
    .bind(except)
    .execute(&mut **tx)
    .await
    .map_err(|e| AppError::Internal(format!("Failed to clear default payment methods: {}", e)))?;

    Ok(())
}
