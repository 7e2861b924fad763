/// Initial bucket configuration loading from config.toml
pub mod buckets;

/// Database configuration and connection management
pub mod database;
