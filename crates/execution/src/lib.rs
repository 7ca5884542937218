// Path: crates/execution/src/lib.rs
//! # Bastion Execution Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free, and well-documented code. Panics are disallowed in non-test
//! code to promote robust error handling.
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
//! # Bastion Execution
//!
//! The host-facing block executor: genesis, begin-block signing facts, transaction
//! admission and delivery, and end-block governance.

pub mod app;

pub use crate::app::{BlockExecutor, TxOutcome};
