// Path: crates/test_utils/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # Bastion Test Utilities
//!
//! Deterministic fixtures, result assertions and [`chain::TestChain`], an in-memory
//! harness that drives a [`bastion_execution::BlockExecutor`] block by block.

pub mod assertions;
pub mod chain;
pub mod fixtures;
pub mod randomness;

pub use chain::TestChain;
