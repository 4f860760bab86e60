//! Payment method endpoints.
//!
//! Stored credential blobs are masked before they leave the API: account,
//! card and phone numbers are reduced to their trailing digits. Masking is a
//! presentation concern only; rows keep the full tokenized details.

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewPaymentMethod, PaymentMethod, PaymentMethodStatus, PaymentMethodType};
use crate::payment_methods as registry;

/// Creates the payment methods router.
pub fn router(pool: PgPool) -> Router {
    Router::new()
        .route("/", post(add_payment_method))
        .route("/{payment_method_id}/set-default", post(set_default))
        .route("/{payment_method_id}/deactivate", post(deactivate))
        .route("/{payment_method_id}/verify", post(verify))
        .with_state(pool)
}

/// Request body for registering a payment method.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPaymentMethodRequest {
    pub wallet_id: Uuid,
    pub method_type: PaymentMethodType,
    /// Tokenized credential blob; required fields depend on the type.
    pub details: JsonValue,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Payment method representation returned by the API, with masked details.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodResponse {
    pub payment_method_id: Uuid,
    pub wallet_id: Uuid,
    pub method_type: PaymentMethodType,
    /// Credential blob with sensitive fields partially redacted.
    pub masked_details: JsonValue,
    pub display_name: String,
    pub status: PaymentMethodStatus,
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PaymentMethod> for PaymentMethodResponse {
    fn from(method: PaymentMethod) -> Self {
        Self {
            payment_method_id: method.id,
            wallet_id: method.wallet_id,
            method_type: method.method_type,
            masked_details: mask_payment_details(&method.details),
            display_name: method.display_name,
            status: method.status,
            is_verified: method.is_verified,
            verified_at: method.verified_at,
            is_default: method.is_default,
            created_at: method.created_at,
            updated_at: method.updated_at,
        }
    }
}

/// Fields each method type must carry in its `details` blob.
fn required_detail_fields(method_type: PaymentMethodType) -> &'static [&'static str] {
    match method_type {
        PaymentMethodType::BankAccount => {
            &["bank_name", "account_number", "account_holder_name"]
        }
        PaymentMethodType::Gcash | PaymentMethodType::Paymaya => &["phone_number"],
        PaymentMethodType::Paypal => &["email"],
        // Card details must arrive tokenized, never as raw PANs.
        PaymentMethodType::CreditCard | PaymentMethodType::DebitCard => &["card_token"],
        PaymentMethodType::EWallet | PaymentMethodType::Crypto => &[],
    }
}

/// Validates the `details` blob for a method type.
fn validate_payment_details(
    method_type: PaymentMethodType,
    details: &JsonValue,
) -> Result<(), AppError> {
    let obj = details.as_object().ok_or_else(|| {
        AppError::BadRequest("details must be a JSON object".to_string())
    })?;

    let missing: Vec<&str> = required_detail_fields(method_type)
        .iter()
        .copied()
        .filter(|field| {
            obj.get(*field)
                .and_then(|v| v.as_str())
                .map(|s| s.is_empty())
                .unwrap_or(true)
        })
        .collect();

    if !missing.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Missing required fields for {}: {}",
            method_type.as_str(),
            missing.join(", ")
        )));
    }

    Ok(())
}

/// Replaces all but the last four characters with `*`.
fn mask_trailing(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return value.to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}

/// Keeps a phone number's first two and last four digits.
fn mask_phone(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return value.to_string();
    }
    let head: String = chars[..2.min(chars.len())].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len().saturating_sub(6)), tail)
}

/// Returns a copy of the credential blob with sensitive fields redacted.
fn mask_payment_details(details: &JsonValue) -> JsonValue {
    let mut masked = details.clone();
    if let Some(obj) = masked.as_object_mut() {
        for field in ["account_number", "card_number"] {
            if let Some(value) = obj.get(field).and_then(|v| v.as_str()).map(str::to_owned) {
                obj.insert(field.to_string(), JsonValue::String(mask_trailing(&value)));
            }
        }
        if let Some(value) = obj
            .get("phone_number")
            .and_then(|v| v.as_str())
            .map(str::to_owned)
        {
            obj.insert(
                "phone_number".to_string(),
                JsonValue::String(mask_phone(&value)),
            );
        }
    }
    masked
}

/// POST /api/v1/payment-methods
///
/// Registers a payment method against a wallet. If flagged as default, the
/// wallet's previous default is cleared atomically.
async fn add_payment_method(
    State(pool): State<PgPool>,
    Json(request): Json<AddPaymentMethodRequest>,
) -> Result<Json<PaymentMethodResponse>, AppError> {
    validate_payment_details(request.method_type, &request.details)?;

    let mut new_method =
        NewPaymentMethod::new(request.wallet_id, request.method_type, request.details);
    new_method.display_name = request.display_name.unwrap_or_default();
    new_method.is_default = request.is_default;

    let method = registry::add_payment_method(&pool, new_method).await?;
    Ok(Json(method.into()))
}

/// GET /api/v1/wallets/{wallet_id}/payment-methods
///
/// Lists a wallet's payment methods: defaults first, then grouped by type.
pub async fn list_wallet_payment_methods(
    State(pool): State<PgPool>,
    Path(wallet_id): Path<Uuid>,
) -> Result<Json<Vec<PaymentMethodResponse>>, AppError> {
    let methods = registry::get_wallet_payment_methods(&pool, wallet_id).await?;
    Ok(Json(methods.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/wallets/{wallet_id}/payment-methods/default
///
/// Returns the wallet's active default payment method, or null.
pub async fn get_default_payment_method(
    State(pool): State<PgPool>,
    Path(wallet_id): Path<Uuid>,
) -> Result<Json<Option<PaymentMethodResponse>>, AppError> {
    let method = registry::get_default_payment_method(&pool, wallet_id).await?;
    Ok(Json(method.map(Into::into)))
}

/// POST /api/v1/payment-methods/{payment_method_id}/set-default
async fn set_default(
    State(pool): State<PgPool>,
    Path(payment_method_id): Path<Uuid>,
) -> Result<Json<PaymentMethodResponse>, AppError> {
    let method = registry::set_default_payment_method(&pool, payment_method_id).await?;
    Ok(Json(method.into()))
}

/// POST /api/v1/payment-methods/{payment_method_id}/deactivate
async fn deactivate(
    State(pool): State<PgPool>,
    Path(payment_method_id): Path<Uuid>,
) -> Result<Json<PaymentMethodResponse>, AppError> {
    let method = registry::deactivate_payment_method(&pool, payment_method_id).await?;
    Ok(Json(method.into()))
}

/// POST /api/v1/payment-methods/{payment_method_id}/verify
///
/// Marks a payment method as verified (admin operation).
async fn verify(
    State(pool): State<PgPool>,
    Path(payment_method_id): Path<Uuid>,
) -> Result<Json<PaymentMethodResponse>, AppError> {
    let method = registry::verify_payment_method(&pool, payment_method_id).await?;
    Ok(Json(method.into()))
}
