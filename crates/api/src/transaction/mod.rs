// Path: crates/api/src/transaction/mod.rs
//! Transaction context and the admission stage contract.

/// The stable context passed to admission stages and message handlers.
pub mod context;
/// The `AnteStage` trait for pre-execution admission checks.
pub mod decorator;
