//! Money bucket ledger entry entity - one balance change on the overflow
//! account. Append-only, same before/after contract as bucket entries.

use crate::money::Money;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The kind of balance change a money bucket ledger entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
#[serde(rename_all = "snake_case")]
pub enum MoneyBucketTransactionType {
    /// Overflow from a deposit fan-out.
    #[sea_orm(string_value = "deposit")]
    Deposit,
    /// Funds moved out into a bucket.
    #[sea_orm(string_value = "redistribution_out")]
    RedistributionOut,
}

/// Money bucket ledger entry database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "money_bucket_ledger_entries")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Signed delta applied to the money bucket balance
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub amount: Money,
    /// Balance immediately before this entry
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub balance_before: Money,
    /// Balance immediately after; always `balance_before + amount`
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub balance_after: Money,
    /// What kind of movement produced this entry
    pub transaction_type: MoneyBucketTransactionType,
    /// The money bucket this entry belongs to
    pub money_bucket_id: i64,
    /// Originating deposit event, when the entry came from a deposit fan-out
    pub deposit_event_id: Option<i64>,
    /// Receiving bucket, populated only for redistributions out
    pub target_bucket_id: Option<i64>,
    /// Opaque owner identifier
    pub user_id: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
