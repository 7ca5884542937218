// Path: crates/api/src/error/mod.rs
// Re-export all core error types from the central types crate.
pub use bastion_types::error::{
    ChainError, ConfigError, ErrorClass, ErrorCode, FeeError, GovernanceError, PermissionError,
    PropertyError, StateError, TransactionError, ValidatorError,
};
pub use bastion_types::Result;
