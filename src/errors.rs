//! Unified error types and result handling.

use crate::money::Money;
use thiserror::Error;

/// All failure modes surfaced by the crate.
///
/// Validation errors (`InvalidAmount`, `IndexConflict`, `ParseMoney`) are
/// rejected before any mutation. Business-rule rejections (`InsufficientFunds`,
/// `BucketLocked`) leave no partial state. `TransactionFailed` means the
/// storage layer aborted a multi-row commit and the whole operation rolled
/// back; callers retry the operation from scratch, never reapply pieces of it.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid amount: {amount}")]
    InvalidAmount { amount: Money },

    #[error("result would be negative: {available} available, {requested} requested")]
    NegativeResult { available: Money, requested: Money },

    #[error("cannot parse money value from {input:?}")]
    ParseMoney { input: String },

    #[error("bucket {id} not found")]
    BucketNotFound { id: i64 },

    #[error("no money bucket exists for owner {user_id}")]
    MoneyBucketNotFound { user_id: String },

    #[error("owner {user_id} not found")]
    OwnerNotFound { user_id: String },

    #[error("insufficient funds: {available} available, {requested} requested")]
    InsufficientFunds { available: Money, requested: Money },

    #[error("bucket {id} is locked")]
    BucketLocked { id: i64 },

    #[error("priority index conflict at index {index}")]
    IndexConflict { index: i32 },

    #[error("{entity} {id} is immutable")]
    ImmutableRecord { entity: &'static str, id: i64 },

    #[error("transaction failed: {source}")]
    TransactionFailed { source: sea_orm::DbErr },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
