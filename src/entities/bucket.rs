//! Bucket entity - one named envelope with a fill target and priority.
//!
//! Each bucket carries a filter rule (how much of an incoming deposit it
//! claims), an optional minimum-hold rule (how much of its own balance must
//! survive outgoing transfers), a lock flag, and the derived `is_full` flag.
//! `is_full` is recomputed whenever `current_value` or `target_value` changes;
//! it is never written independently.

use crate::money::Money;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How a bucket claims its share of an incoming deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum FilterMethod {
    /// Claim a fixed amount per deposit.
    #[sea_orm(string_value = "flat_value")]
    FlatValue,
    /// Claim a percentage of the deposit amount.
    #[sea_orm(string_value = "percentage")]
    Percentage,
}

/// How a bucket's minimum hold is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum HoldType {
    #[sea_orm(string_value = "flat_value")]
    FlatValue,
    /// Percentage of the bucket's balance at the time of the draw.
    #[sea_orm(string_value = "percentage")]
    Percentage,
}

/// Bucket database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "buckets")]
pub struct Model {
    /// Unique identifier for the bucket
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable name of the bucket (e.g., "Rent", "Vacation")
    pub name: String,
    /// Fill goal; deposits stop claiming once the balance reaches it
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub target_value: Money,
    /// Current balance
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub current_value: Money,
    /// Allocation order: lower indexes claim deposit funds first,
    /// ties broken by creation order
    pub priority_index: i32,
    /// Rule for how much of an incoming deposit this bucket claims
    pub filter_method: FilterMethod,
    /// Flat amount or percentage, per `filter_method`
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub filter_value: Decimal,
    /// Whether a portion of the balance is protected from draw-down
    pub has_minimum_hold: bool,
    /// Set when `has_minimum_hold` is true
    pub hold_type: Option<HoldType>,
    /// Flat amount or percentage, per `hold_type`
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub hold_value: Option<Decimal>,
    /// Locked buckets receive no deposit claims, redistributions, or
    /// incoming transfers
    pub is_locked: bool,
    /// Derived: `current_value >= target_value`
    pub is_full: bool,
    /// Opaque owner identifier from the identity collaborator
    pub user_id: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

// Ledger entries reference buckets by plain id so history survives bucket
// deletion; no relations are declared at the schema level.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The `is_full` invariant, in one place.
    #[must_use]
    pub fn compute_is_full(current_value: Money, target_value: Money) -> bool {
        current_value >= target_value
    }

    /// Remaining capacity before the bucket reaches its target, floored at
    /// zero for overfilled buckets.
    #[must_use]
    pub fn room(&self) -> Money {
        self.target_value.saturating_sub(self.current_value)
    }
}
