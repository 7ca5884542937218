// Path: crates/telemetry/src/lib.rs
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

//! # Bastion Telemetry
//!
//! Structured logging initialization and abstract metrics sinks, decoupling the
//! keepers' instrumentation from the Prometheus backend.

/// The initialization routine for global structured logging.
pub mod init;
/// The concrete implementation of metrics sinks using the `prometheus` crate.
pub mod prometheus;
/// Abstract traits (`*MetricsSink`) that define the contract for metrics reporting.
pub mod sinks;
/// A simple RAII timer for measuring the duration of a block hook.
pub mod time;

// Re-export the public helper functions for easy access to the global sinks.
pub use sinks::{
    admission_metrics, block_metrics, error_metrics, governance_metrics, reputation_metrics,
};
