//! Database models for the wallet server.

pub mod payment_method;
pub mod wallet;
pub mod wallet_transaction;

pub use payment_method::{NewPaymentMethod, PaymentMethod, PaymentMethodStatus, PaymentMethodType};
pub use wallet::{Wallet, WalletStatus};
pub use wallet_transaction::{
    NewWalletTransaction, TransactionStatus, TransactionType, WalletTransaction,
};
