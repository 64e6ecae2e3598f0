//! Data models and configuration.

pub mod config;
pub mod transaction;

pub use config::StatementConfig;
pub use transaction::{TransactionCandidate, TransactionKind, TransactionRecord, UNCATEGORIZED};
