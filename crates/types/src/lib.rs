// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented
    )
)]

//! # Bastion Types
//!
//! This crate is the foundational library for the Bastion engine, containing the
//! data model for validators, actors, roles, governance proposals and transactions,
//! together with the unified error taxonomy and configuration objects.
//!
//! ## Architectural Role
//!
//! As the base crate, `bastion-types` performs no I/O and is a dependency of every
//! other crate in the workspace. Every record that is persisted to consensus state is
//! defined here so that all nodes agree on a single canonical encoding.

/// A top-level, crate-wide `Result` type alias with a default error type.
pub type Result<T, E = crate::error::TransactionError> = std::result::Result<T, E>;

/// Application-level data structures: actors, validators, proposals, transactions.
pub mod app;
/// The canonical, deterministic binary codec for consensus-critical state.
pub mod codec;
/// Engine configuration and genesis structures.
pub mod config;
/// A unified set of all error types used across the engine.
pub mod error;
/// Constants and builders for well-known state keys.
pub mod keys;
