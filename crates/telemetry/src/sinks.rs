// Path: crates/telemetry/src/sinks.rs
//! Defines abstract traits for metrics reporting, decoupling the keepers from the backend.

use once_cell::sync::OnceCell;

// --- Static Sink Access ---

/// A no-op sink for use in tests or when telemetry is disabled.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

/// The global `MetricsSink`, set once by a backend's `install`.
pub static SINK: OnceCell<&'static dyn MetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// The configured reputation sink, or a no-op sink.
pub fn reputation_metrics() -> &'static dyn ReputationMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// The configured admission sink, or a no-op sink.
pub fn admission_metrics() -> &'static dyn AdmissionMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// The configured governance sink, or a no-op sink.
pub fn governance_metrics() -> &'static dyn GovernanceMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// The configured block-hook sink, or a no-op sink.
pub fn block_metrics() -> &'static dyn BlockMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// The configured error sink, or a no-op sink.
pub fn error_metrics() -> &'static dyn ErrorMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

// --- Trait Definitions ---

/// Validator signing and lifecycle metrics.
pub trait ReputationMetricsSink: Send + Sync + std::fmt::Debug {
    /// Counts one missed block.
    fn inc_missed_blocks(&self);
    /// Counts a lifecycle transition, labeled e.g. `"inactivate"`, `"pause"`.
    fn inc_lifecycle_transition(&self, transition: &'static str);
    /// Records a validator's current rank.
    fn set_validator_rank(&self, moniker: &str, rank: i64);
    /// Records the number of active validators.
    fn set_active_validators(&self, count: u64);
}
impl ReputationMetricsSink for NopSink {
    fn inc_missed_blocks(&self) {}
    fn inc_lifecycle_transition(&self, _transition: &'static str) {}
    fn set_validator_rank(&self, _moniker: &str, _rank: i64) {}
    fn set_active_validators(&self, _count: u64) {}
}

/// Fee admission metrics.
pub trait AdmissionMetricsSink: Send + Sync + std::fmt::Debug {
    /// Counts an admitted transaction.
    fn inc_admitted(&self);
    /// Counts a rejection by `stage` with a stable error `code`.
    fn inc_rejected(&self, stage: &'static str, code: &'static str);
    /// Counts a pending execution registration for `msg_type`.
    fn inc_execution_registered(&self, msg_type: &str);
}
impl AdmissionMetricsSink for NopSink {
    fn inc_admitted(&self) {}
    fn inc_rejected(&self, _stage: &'static str, _code: &'static str) {}
    fn inc_execution_registered(&self, _msg_type: &str) {}
}

/// Governance metrics.
pub trait GovernanceMetricsSink: Send + Sync + std::fmt::Debug {
    /// Counts a submitted proposal of `kind`.
    fn inc_proposals_submitted(&self, kind: &'static str);
    /// Counts a proposal reaching a terminal `result`.
    fn inc_proposals_finalized(&self, result: &'static str);
    /// Counts an enactment attempt, labeled by `kind` and outcome.
    fn inc_enactments(&self, kind: &'static str, ok: bool);
}
impl GovernanceMetricsSink for NopSink {
    fn inc_proposals_submitted(&self, _kind: &'static str) {}
    fn inc_proposals_finalized(&self, _result: &'static str) {}
    fn inc_enactments(&self, _kind: &'static str, _ok: bool) {}
}

/// Block hook latency metrics.
pub trait BlockMetricsSink: Send + Sync + std::fmt::Debug {
    /// Observes the duration of a block hook (`"begin_block"`, `"end_block"`).
    fn observe_hook_duration(&self, hook: &'static str, duration_secs: f64);
}
impl BlockMetricsSink for NopSink {
    fn observe_hook_duration(&self, _hook: &'static str, _duration_secs: f64) {}
}

/// A sink for recording structured error metrics.
pub trait ErrorMetricsSink: Send + Sync + std::fmt::Debug {
    /// Increments a counter for a specific error, categorized by its kind and code.
    fn inc_error(&self, kind: &'static str, code: &'static str);
}
impl ErrorMetricsSink for NopSink {
    fn inc_error(&self, _kind: &'static str, _code: &'static str) {}
}

/// A unified sink that implements all domain-specific traits, providing a single
/// point of implementation for metrics backends like Prometheus.
pub trait MetricsSink:
    ReputationMetricsSink
    + AdmissionMetricsSink
    + GovernanceMetricsSink
    + BlockMetricsSink
    + ErrorMetricsSink
{
}

impl<T> MetricsSink for T where
    T: ReputationMetricsSink
        + AdmissionMetricsSink
        + GovernanceMetricsSink
        + BlockMetricsSink
        + ErrorMetricsSink
{
}
