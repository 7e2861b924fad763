//! `Bucketflow` - ledger-consistent bucket allocation
//!
//! This crate is the allocation and ledger core of an envelope-style money
//! distribution system: deposits fan out across prioritized buckets under
//! per-bucket filter rules, unclaimed funds accumulate in a per-owner money
//! bucket, and every balance change is recorded in an append-only ledger.
//! Multi-row operations (deposit fan-out, redistribution, transfer, priority
//! reorder) are atomic and serialized per owner.

// Deny what is almost always a bug; warn on what should be fixed gradually.
#![deny(
    unsafe_code,
    unsafe_op_in_unsafe_fn,
    unreachable_code,
    unreachable_patterns,
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,

    // Correctness - money code does not get to panic or guess
    clippy::dbg_macro,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,

    // Style consistency
    clippy::enum_glob_use,
    clippy::semicolon_if_nothing_returned,
    clippy::wildcard_imports,

    future_incompatible,
    rust_2018_idioms,
)]
#![allow(
    clippy::module_name_repetitions,  // Common pattern in Rust
    clippy::missing_errors_doc,        // Will add gradually
    clippy::missing_panics_doc,        // Will add gradually
)]

/// Configuration management for the database and initial bucket seeding
pub mod config;
/// Core business logic - allocation, ledger, repository, and reorder operations
pub mod core;
/// SeaORM entity definitions for database tables
pub mod entities;
/// Unified error types and result handling
pub mod errors;
/// Fixed-precision money representation
pub mod money;
/// Pagination options and result shapes shared by list queries
pub mod pagination;

#[cfg(test)]
pub mod test_utils;
