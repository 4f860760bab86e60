//! Payment method model: payout channels registered against a wallet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Supported payout channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "payment_method_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    BankAccount,
    CreditCard,
    DebitCard,
    EWallet,
    Gcash,
    Paymaya,
    Paypal,
    Crypto,
}

impl PaymentMethodType {
    /// Wire/database name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodType::BankAccount => "bank_account",
            PaymentMethodType::CreditCard => "credit_card",
            PaymentMethodType::DebitCard => "debit_card",
            PaymentMethodType::EWallet => "e_wallet",
            PaymentMethodType::Gcash => "gcash",
            PaymentMethodType::Paymaya => "paymaya",
            PaymentMethodType::Paypal => "paypal",
            PaymentMethodType::Crypto => "crypto",
        }
    }
}

/// Lifecycle status of a payment method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "payment_method_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethodStatus {
    Active,
    Inactive,
    Expired,
    Blocked,
}

/// A payout/funding channel attached to a wallet.
///
/// `details` holds tokenized payment credentials whose shape depends on the
/// method type. Invariant: at most one method per wallet has
/// `is_default = true`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentMethod {
    /// Unique identifier for this payment method.
    pub id: Uuid,
    /// The wallet this method belongs to.
    pub wallet_id: Uuid,
    /// Payout channel type.
    pub method_type: PaymentMethodType,
    /// Tokenized/structured payment credentials (JSONB).
    pub details: JsonValue,
    /// Human-readable label, e.g. "BDO ****1234".
    pub display_name: String,
    /// Current lifecycle status.
    pub status: PaymentMethodStatus,
    /// Whether the channel has been verified by an administrator.
    pub is_verified: bool,
    /// When verification happened (null if unverified).
    pub verified_at: Option<DateTime<Utc>>,
    /// Whether this is the wallet's preferred payout channel.
    pub is_default: bool,
    /// When this method was registered.
    pub created_at: DateTime<Utc>,
    /// When this method was last updated.
    pub updated_at: DateTime<Utc>,
}

impl PaymentMethod {
    /// Check if the method is usable for payouts.
    pub fn is_active(&self) -> bool {
        self.status == PaymentMethodStatus::Active
    }
}

/// Data required to register a new payment method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPaymentMethod {
    pub wallet_id: Uuid,
    pub method_type: PaymentMethodType,
    pub details: JsonValue,
    pub display_name: String,
    pub is_default: bool,
}

impl NewPaymentMethod {
    /// Register a new method with the given credentials.
    pub fn new(wallet_id: Uuid, method_type: PaymentMethodType, details: JsonValue) -> Self {
        Self {
            wallet_id,
            method_type,
            details,
            display_name: String::new(),
            is_default: false,
        }
    }

    /// Attach a display label.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Mark the method as the wallet's default payout channel.
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_type_serialization() {
        assert_eq!(
            serde_json::to_string(&PaymentMethodType::BankAccount).unwrap(),
            "\"bank_account\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethodType::EWallet).unwrap(),
            "\"e_wallet\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethodType::Gcash).unwrap(),
            "\"gcash\""
        );
    }

    #[test]
    fn test_method_type_deserialization() {
        assert_eq!(
            serde_json::from_str::<PaymentMethodType>("\"paypal\"").unwrap(),
            PaymentMethodType::Paypal
        );
        assert_eq!(
            serde_json::from_str::<PaymentMethodType>("\"credit_card\"").unwrap(),
            PaymentMethodType::CreditCard
        );
    }

    #[test]
    fn test_method_status_serialization() {
        assert_eq!(
            serde_json::to_string(&PaymentMethodStatus::Inactive).unwrap(),
            "\"inactive\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethodStatus::Blocked).unwrap(),
            "\"blocked\""
        );
    }

    #[test]
    fn test_new_payment_method_builder() {
        let wallet_id = Uuid::new_v4();
        let details = json!({"bank_name": "BDO", "account_number": "001234567890"});

        let method = NewPaymentMethod::new(
            wallet_id,
            PaymentMethodType::BankAccount,
            details.clone(),
        )
        .with_display_name("BDO ****7890")
        .as_default();

        assert_eq!(method.wallet_id, wallet_id);
        assert_eq!(method.method_type, PaymentMethodType::BankAccount);
        assert_eq!(method.details, details);
        assert_eq!(method.display_name, "BDO ****7890");
        assert!(method.is_default);
    }

    #[test]
    fn test_is_active_helper() {
        let method = PaymentMethod {
            id: Uuid::new_v4(),
            wallet_id: Uuid::new_v4(),
            method_type: PaymentMethodType::Gcash,
            details: json!({"phone_number": "09171234567"}),
            display_name: String::new(),
            status: PaymentMethodStatus::Active,
            is_verified: false,
            verified_at: None,
            is_default: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(method.is_active());

        let inactive = PaymentMethod {
            status: PaymentMethodStatus::Inactive,
            ..method
        };
        assert!(!inactive.is_active());
    }
}
