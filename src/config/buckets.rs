//! Initial bucket configuration loading from config.toml
//!
//! Lets a deployment describe an owner's starting bucket set declaratively.
//! The buckets defined in config.toml are created for an owner on first run
//! (along with their money bucket); owners who already have a bucket with a
//! configured name keep theirs.
//!
//! Money and rate values are TOML strings ("500.00"), parsed exactly.

use crate::{
    core::{bucket, bucket::NewBucket, money_bucket},
    entities::{FilterMethod, HoldType, bucket as bucket_entity},
    errors::{Error, Result},
    money::Money,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct SeedConfig {
    /// List of bucket configurations to seed
    pub buckets: Vec<BucketSeed>,
}

/// Configuration for a single bucket
#[derive(Debug, Deserialize, Clone)]
pub struct BucketSeed {
    /// Name of the bucket
    pub name: String,
    /// Fill goal
    pub target_value: Money,
    /// Allocation order; must be unique within the file
    pub priority_index: i32,
    /// `flat_value` or `percentage`
    pub filter_method: FilterMethod,
    /// Flat amount or percentage, per `filter_method`
    pub filter_value: Decimal,
    /// Optional minimum-hold rule
    #[serde(default)]
    pub has_minimum_hold: bool,
    pub hold_type: Option<HoldType>,
    pub hold_value: Option<Decimal>,
    /// Whether the bucket starts locked
    #[serde(default)]
    pub is_locked: bool,
}

/// Loads bucket seed configuration from a TOML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Loads bucket seed configuration from the default location (./config.toml).
pub fn load_default_config() -> Result<SeedConfig> {
    load_config("config.toml")
}

fn parse_config(contents: &str) -> Result<SeedConfig> {
    let config: SeedConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    let mut indexes = HashSet::new();
    for seed in &config.buckets {
        if !indexes.insert(seed.priority_index) {
            return Err(Error::IndexConflict {
                index: seed.priority_index,
            });
        }
    }

    Ok(config)
}

/// Seeds an owner's starting state: their money bucket plus every configured
/// bucket whose name they do not already have. Safe to run repeatedly.
pub async fn seed_initial_buckets(
    db: &DatabaseConnection,
    user_id: &str,
    config: &SeedConfig,
) -> Result<Vec<bucket_entity::Model>> {
    money_bucket::get_or_create(db, user_id).await?;

    let existing: HashSet<String> = bucket::find_by_user_id(db, user_id)
        .await?
        .into_iter()
        .map(|b| b.name)
        .collect();

    let mut created = Vec::new();
    for seed in &config.buckets {
        if existing.contains(&seed.name) {
            continue;
        }
        created.push(
            bucket::create(
                db,
                NewBucket {
                    user_id: user_id.to_string(),
                    name: seed.name.clone(),
                    target_value: seed.target_value,
                    current_value: None,
                    priority_index: seed.priority_index,
                    filter_method: seed.filter_method,
                    filter_value: seed.filter_value,
                    has_minimum_hold: seed.has_minimum_hold,
                    hold_type: seed.hold_type,
                    hold_value: seed.hold_value,
                    is_locked: seed.is_locked,
                },
            )
            .await?,
        );
    }

    if !created.is_empty() {
        info!(user_id, count = created.len(), "seeded initial buckets");
    }

    Ok(created)
}
