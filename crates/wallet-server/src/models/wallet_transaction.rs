//! Wallet transaction model: the append-only ledger of balance changes.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Classification of a ledger entry.
///
/// The sign convention is the caller's responsibility: debit types carry
/// negative amounts, credit types positive ones. `adjustment` entries may be
/// zero (administrative annotations such as suspensions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Funds entering the wallet from outside the marketplace.
    Deposit,
    /// Funds paid out of the wallet.
    Withdrawal,
    /// Funds returned to the wallet after a reversed sale.
    Refund,
    /// Marketplace commission credited to the wallet.
    Commission,
    /// Administrative penalty debited from the wallet.
    Penalty,
    /// Incoming side of a wallet-to-wallet transfer.
    TransferIn,
    /// Outgoing side of a wallet-to-wallet transfer.
    TransferOut,
    /// Administrative balance adjustment or zero-amount audit entry.
    Adjustment,
}

impl TransactionType {
    /// Wire/database name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Refund => "refund",
            TransactionType::Commission => "commission",
            TransactionType::Penalty => "penalty",
            TransactionType::TransferIn => "transfer_in",
            TransactionType::TransferOut => "transfer_out",
            TransactionType::Adjustment => "adjustment",
        }
    }
}

/// Settlement status of a ledger entry.
///
/// Entries are currently written as `completed` at insert time; the full
/// enumeration is kept for a future asynchronous settlement stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "transaction_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Reversed,
}

/// An immutable ledger entry for one balance-affecting event.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WalletTransaction {
    /// Unique identifier for this ledger entry.
    pub id: Uuid,
    /// The wallet this entry belongs to.
    pub wallet_id: Uuid,
    /// Signed amount: positive = credit, negative = debit.
    pub amount: BigDecimal,
    /// Classification of the entry.
    pub transaction_type: TransactionType,
    /// Settlement status.
    pub transaction_status: TransactionStatus,
    /// Free-text description.
    pub description: Option<String>,
    /// External reference id, if any.
    pub reference_id: Option<String>,
    /// Linked order id, if applicable.
    pub related_order_id: Option<Uuid>,
    /// Opaque id of the actor who initiated/processed the entry.
    pub processed_by: Option<Uuid>,
    /// When this entry was written (immutable).
    pub created_at: DateTime<Utc>,
}

impl WalletTransaction {
    /// True if the entry increased the balance.
    pub fn is_credit(&self) -> bool {
        self.amount > BigDecimal::from(0)
    }

    /// True if the entry decreased the balance.
    pub fn is_debit(&self) -> bool {
        self.amount < BigDecimal::from(0)
    }
}

/// Data required to create a new ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWalletTransaction {
    pub wallet_id: Uuid,
    pub amount: BigDecimal,
    pub transaction_type: TransactionType,
    pub description: Option<String>,
    pub reference_id: Option<String>,
    pub related_order_id: Option<Uuid>,
    pub processed_by: Option<Uuid>,
}

impl NewWalletTransaction {
    /// Create a new entry with the given amount and type.
    pub fn new(wallet_id: Uuid, amount: BigDecimal, transaction_type: TransactionType) -> Self {
        Self {
            wallet_id,
            amount,
            transaction_type,
            description: None,
            reference_id: None,
            related_order_id: None,
            processed_by: None,
        }
    }

    /// Create a zero-amount administrative adjustment entry.
    pub fn adjustment(
        wallet_id: Uuid,
        description: String,
        processed_by: Option<Uuid>,
    ) -> Self {
        Self {
            wallet_id,
            amount: BigDecimal::from(0),
            transaction_type: TransactionType::Adjustment,
            description: Some(description),
            reference_id: None,
            related_order_id: None,
            processed_by,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach an external reference id.
    pub fn with_reference(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    /// Link the entry to an order.
    pub fn with_related_order(mut self, related_order_id: Uuid) -> Self {
        self.related_order_id = Some(related_order_id);
        self
    }

    /// Record the actor who processed the entry.
    pub fn with_processor(mut self, processed_by: Uuid) -> Self {
        self.processed_by = Some(processed_by);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_transaction_type_serialization() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Deposit).unwrap(),
            "\"deposit\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionType::TransferIn).unwrap(),
            "\"transfer_in\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionType::TransferOut).unwrap(),
            "\"transfer_out\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionType::Adjustment).unwrap(),
            "\"adjustment\""
        );
    }

    #[test]
    fn test_transaction_type_deserialization() {
        assert_eq!(
            serde_json::from_str::<TransactionType>("\"withdrawal\"").unwrap(),
            TransactionType::Withdrawal
        );
        assert_eq!(
            serde_json::from_str::<TransactionType>("\"transfer_in\"").unwrap(),
            TransactionType::TransferIn
        );
    }

    #[test]
    fn test_transaction_type_as_str_round_trip() {
        let types = [
            TransactionType::Deposit,
            TransactionType::Withdrawal,
            TransactionType::Refund,
            TransactionType::Commission,
            TransactionType::Penalty,
            TransactionType::TransferIn,
            TransactionType::TransferOut,
            TransactionType::Adjustment,
        ];
        for t in types {
            let json = format!("\"{}\"", t.as_str());
            assert_eq!(serde_json::from_str::<TransactionType>(&json).unwrap(), t);
        }
    }

    #[test]
    fn test_transaction_status_serialization() {
        assert_eq!(
            serde_json::to_string(&TransactionStatus::Completed).unwrap(),
            "\"completed\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionStatus::Reversed).unwrap(),
            "\"reversed\""
        );
    }

    #[test]
    fn test_new_transaction_builder() {
        let wallet_id = Uuid::new_v4();
        let order_id = Uuid::new_v4();
        let admin_id = Uuid::new_v4();
        let amount = BigDecimal::from_str("500.00").unwrap();

        let entry = NewWalletTransaction::new(wallet_id, amount.clone(), TransactionType::Deposit)
            .with_description("Card settlement")
            .with_reference("stlmt_1234")
            .with_related_order(order_id)
            .with_processor(admin_id);

        assert_eq!(entry.wallet_id, wallet_id);
        assert_eq!(entry.amount, amount);
        assert_eq!(entry.transaction_type, TransactionType::Deposit);
        assert_eq!(entry.description, Some("Card settlement".to_string()));
        assert_eq!(entry.reference_id, Some("stlmt_1234".to_string()));
        assert_eq!(entry.related_order_id, Some(order_id));
        assert_eq!(entry.processed_by, Some(admin_id));
    }

    #[test]
    fn test_adjustment_entry_is_zero_amount() {
        let wallet_id = Uuid::new_v4();
        let entry = NewWalletTransaction::adjustment(
            wallet_id,
            "Wallet suspended: fraud review".to_string(),
            None,
        );

        assert_eq!(entry.amount, BigDecimal::from(0));
        assert_eq!(entry.transaction_type, TransactionType::Adjustment);
        assert_eq!(
            entry.description,
            Some("Wallet suspended: fraud review".to_string())
        );
    }

    #[test]
    fn test_credit_debit_helpers() {
        let base = WalletTransaction {
            id: Uuid::new_v4(),
            wallet_id: Uuid::new_v4(),
            amount: BigDecimal::from_str("250.00").unwrap(),
            transaction_type: TransactionType::Deposit,
            transaction_status: TransactionStatus::Completed,
            description: None,
            reference_id: None,
            related_order_id: None,
            processed_by: None,
            created_at: Utc::now(),
        };

        assert!(base.is_credit());
        assert!(!base.is_debit());

        let debit = WalletTransaction {
            amount: BigDecimal::from_str("-250.00").unwrap(),
            transaction_type: TransactionType::Withdrawal,
            ..base.clone()
        };
        assert!(debit.is_debit());
        assert!(!debit.is_credit());

        let adjustment = WalletTransaction {
            amount: BigDecimal::from(0),
            transaction_type: TransactionType::Adjustment,
            ..base
        };
        assert!(!adjustment.is_credit());
        assert!(!adjustment.is_debit());
    }
}
