//! Merchant wallet model for tracking per-merchant balances.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Lifecycle states of a merchant wallet.
///
/// Only `active` wallets accept balance-mutating transactions. Wallets are
/// never physically deleted; `closed` is the terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "wallet_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WalletStatus {
    /// Wallet accepts transactions.
    Active,
    /// Temporarily blocked by an administrator; can be reactivated.
    Suspended,
    /// Blocked pending review; can be reactivated.
    Frozen,
    /// Permanently closed; cannot be reactivated.
    Closed,
}

impl WalletStatus {
    /// Wire/database name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletStatus::Active => "active",
            WalletStatus::Suspended => "suspended",
            WalletStatus::Frozen => "frozen",
            WalletStatus::Closed => "closed",
        }
    }
}

/// Represents a merchant's wallet with its authoritative balance.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Wallet {
    /// Unique identifier for this wallet.
    pub id: Uuid,
    /// The owning merchant (one wallet per merchant).
    pub merchant_id: Uuid,
    /// Current balance. Invariant: never negative.
    pub balance: BigDecimal,
    /// Current lifecycle status.
    pub status: WalletStatus,
    /// When this wallet was created.
    pub created_at: DateTime<Utc>,
    /// When this wallet was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Check if the wallet currently accepts transactions.
    pub fn is_active(&self) -> bool {
        self.status == WalletStatus::Active
    }

    /// Check if the wallet is suspended.
    pub fn is_suspended(&self) -> bool {
        self.status == WalletStatus::Suspended
    }

    /// Check if the wallet can be brought back to `active`.
    /// Closed wallets are terminal.
    pub fn is_reactivatable(&self) -> bool {
        matches!(self.status, WalletStatus::Suspended | WalletStatus::Frozen)
    }

    /// The balance this wallet would hold after applying a signed amount.
    pub fn resulting_balance(&self, amount: &BigDecimal) -> BigDecimal {
        &self.balance + amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn wallet_with_status(status: WalletStatus) -> Wallet {
        Wallet {
            id: Uuid::new_v4(),
            merchant_id: Uuid::new_v4(),
            balance: BigDecimal::from_str("1000.00").unwrap(),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_wallet_status_serialization() {
        assert_eq!(
            serde_json::to_string(&WalletStatus::Active).unwrap(),
            "\"active\""
        );
        assert_eq!(
            serde_json::to_string(&WalletStatus::Suspended).unwrap(),
            "\"suspended\""
        );
        assert_eq!(
            serde_json::to_string(&WalletStatus::Frozen).unwrap(),
            "\"frozen\""
        );
        assert_eq!(
            serde_json::to_string(&WalletStatus::Closed).unwrap(),
            "\"closed\""
        );
    }

    #[test]
    fn test_wallet_status_deserialization() {
        assert_eq!(
            serde_json::from_str::<WalletStatus>("\"active\"").unwrap(),
            WalletStatus::Active
        );
        assert_eq!(
            serde_json::from_str::<WalletStatus>("\"frozen\"").unwrap(),
            WalletStatus::Frozen
        );
    }

    #[test]
    fn test_status_helpers() {
        assert!(wallet_with_status(WalletStatus::Active).is_active());
        assert!(!wallet_with_status(WalletStatus::Active).is_suspended());

        let suspended = wallet_with_status(WalletStatus::Suspended);
        assert!(suspended.is_suspended());
        assert!(suspended.is_reactivatable());

        assert!(wallet_with_status(WalletStatus::Frozen).is_reactivatable());
        assert!(!wallet_with_status(WalletStatus::Closed).is_reactivatable());
        assert!(!wallet_with_status(WalletStatus::Active).is_reactivatable());
    }

    #[test]
    fn test_resulting_balance() {
        let wallet = wallet_with_status(WalletStatus::Active);

        let credit = BigDecimal::from_str("500.00").unwrap();
        assert_eq!(
            wallet.resulting_balance(&credit),
            BigDecimal::from_str("1500.00").unwrap()
        );

        let debit = BigDecimal::from_str("-2000.00").unwrap();
        assert_eq!(
            wallet.resulting_balance(&debit),
            BigDecimal::from_str("-1000.00").unwrap()
        );
    }
}
