// Path: crates/api/src/lib.rs

//! # Bastion API Crate Lints
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
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! # Bastion API
//!
//! Core traits and interfaces for the Bastion engine. This crate defines the
//! stable contract between the keepers, the admission pipeline and the host.

/// Re-exports all core error types from the central `bastion-types` crate.
pub mod error;
/// Defines traits for components that hook into the block processing lifecycle.
pub mod lifecycle;
/// Traits for services and the external collaborators the engine consumes.
pub mod services;
/// Core traits for state access, the copy-on-write overlay and the in-memory store.
pub mod state;
/// Transaction context and the admission stage contract.
pub mod transaction;

/// A curated set of the most commonly used traits and types.
pub mod prelude {
    pub use crate::error::{
        ChainError, ErrorClass, ErrorCode, FeeError, GovernanceError, PermissionError,
        PropertyError, StateError, TransactionError, ValidatorError,
    };
    pub use crate::lifecycle::{OnBeginBlock, OnEndBlock};
    pub use crate::services::{
        BlockchainService, ExternalMessageHandler, FeeProcessor, NetworkHealth,
        TokenRateRegistry,
    };
    pub use crate::state::{MemoryStore, StateAccess, StateAccessExt, StateOverlay};
    pub use crate::transaction::context::TxContext;
    pub use crate::transaction::decorator::AnteStage;
}
