// Path: crates/tx/src/lib.rs
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

//! # Bastion Transaction Admission
//!
//! The ordered ante pipeline run before any message of a transaction executes, and the
//! state-backed collaborators it consumes by default.

/// The `AnteHandler` and its three stages.
pub mod ante;
/// The default poor-network signal.
pub mod health;
/// State-backed token rates and the pending-execution ledger.
pub mod registry;

pub use ante::{AnteHandler, ExecutionFeeRegistration, PoorNetworkGate, ValidateFeeRange};
pub use health::ValidatorCountHealth;
pub use registry::{PendingExecution, PendingExecutionLedger, StateTokenRates};
