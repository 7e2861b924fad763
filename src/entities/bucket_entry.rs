//! Bucket ledger entry entity - one balance change on a bucket.
//!
//! Append-only. `balance_after = balance_before + amount` always holds, and
//! replaying a bucket's entries in creation order from zero reconstructs its
//! current balance exactly. `bucket_id` is a plain column, not a foreign key:
//! entries outlive their bucket and a dangling reference reads as "bucket
//! deleted", never as data loss.

use crate::money::Money;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The kind of balance change a bucket ledger entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    #[sea_orm(string_value = "deposit")]
    Deposit,
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    #[sea_orm(string_value = "transfer")]
    Transfer,
    /// Inflow from the owner's money bucket.
    #[sea_orm(string_value = "redistribution")]
    Redistribution,
}

/// Bucket ledger entry database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bucket_ledger_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Signed delta applied to the bucket balance
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub amount: Money,
    /// Balance immediately before this entry
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub balance_before: Money,
    /// Balance immediately after; always `balance_before + amount`
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub balance_after: Money,
    /// True iff this entry transitioned the bucket from not-full to full
    pub was_filled: bool,
    /// What kind of movement produced this entry
    pub transaction_type: TransactionType,
    /// The bucket this entry belongs to (may be deleted)
    pub bucket_id: i64,
    /// Originating deposit event, when the entry came from a deposit fan-out
    pub deposit_event_id: Option<i64>,
    /// Opaque owner identifier
    pub user_id: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
