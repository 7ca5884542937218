// Path: crates/telemetry/src/prometheus.rs
//! A concrete implementation of the metrics sinks using the Prometheus crate.

use crate::sinks::*;
use once_cell::sync::OnceCell;
use prometheus::{
    exponential_buckets, register_int_counter, register_int_counter_vec, register_int_gauge,
    register_int_gauge_vec, register_histogram_vec, Encoder, HistogramVec, IntCounter,
    IntCounterVec, IntGauge, IntGaugeVec, TextEncoder,
};

// --- Metric Statics ---
// Initialized exactly once by `install`.

static MISSED_BLOCKS_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static LIFECYCLE_TRANSITIONS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static VALIDATOR_RANK: OnceCell<IntGaugeVec> = OnceCell::new();
static ACTIVE_VALIDATORS: OnceCell<IntGauge> = OnceCell::new();
static ADMITTED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static ADMISSION_REJECTED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static EXECUTION_REGISTERED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static PROPOSALS_SUBMITTED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static PROPOSALS_FINALIZED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static ENACTMENTS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static HOOK_DURATION_SECONDS: OnceCell<HistogramVec> = OnceCell::new();
static ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

/// The Prometheus-backed sink.
#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

/// Fetches a collector, returning from the enclosing function if `install()` has not run.
macro_rules! get_metric {
    ($metric:ident) => {
        match $metric.get() {
            Some(m) => m,
            None => return,
        }
    };
}

/// Stores a freshly registered collector, failing if `install` already ran.
macro_rules! set_metric {
    ($metric:ident, $collector:expr) => {
        $metric
            .set($collector)
            .map_err(|_| prometheus::Error::AlreadyReg)?
    };
}

impl ReputationMetricsSink for PrometheusSink {
    fn inc_missed_blocks(&self) {
        get_metric!(MISSED_BLOCKS_TOTAL).inc();
    }
    fn inc_lifecycle_transition(&self, transition: &'static str) {
        get_metric!(LIFECYCLE_TRANSITIONS_TOTAL)
            .with_label_values(&[transition])
            .inc();
    }
    fn set_validator_rank(&self, moniker: &str, rank: i64) {
        get_metric!(VALIDATOR_RANK)
            .with_label_values(&[moniker])
            .set(rank);
    }
    fn set_active_validators(&self, count: u64) {
        get_metric!(ACTIVE_VALIDATORS).set(i64::try_from(count).unwrap_or(i64::MAX));
    }
}

impl AdmissionMetricsSink for PrometheusSink {
    fn inc_admitted(&self) {
        get_metric!(ADMITTED_TOTAL).inc();
    }
    fn inc_rejected(&self, stage: &'static str, code: &'static str) {
        get_metric!(ADMISSION_REJECTED_TOTAL)
            .with_label_values(&[stage, code])
            .inc();
    }
    fn inc_execution_registered(&self, msg_type: &str) {
        get_metric!(EXECUTION_REGISTERED_TOTAL)
            .with_label_values(&[msg_type])
            .inc();
    }
}

impl GovernanceMetricsSink for PrometheusSink {
    fn inc_proposals_submitted(&self, kind: &'static str) {
        get_metric!(PROPOSALS_SUBMITTED_TOTAL)
            .with_label_values(&[kind])
            .inc();
    }
    fn inc_proposals_finalized(&self, result: &'static str) {
        get_metric!(PROPOSALS_FINALIZED_TOTAL)
            .with_label_values(&[result])
            .inc();
    }
    fn inc_enactments(&self, kind: &'static str, ok: bool) {
        get_metric!(ENACTMENTS_TOTAL)
            .with_label_values(&[kind, if ok { "ok" } else { "error" }])
            .inc();
    }
}

impl BlockMetricsSink for PrometheusSink {
    fn observe_hook_duration(&self, hook: &'static str, duration_secs: f64) {
        get_metric!(HOOK_DURATION_SECONDS)
            .with_label_values(&[hook])
            .observe(duration_secs);
    }
}

impl ErrorMetricsSink for PrometheusSink {
    fn inc_error(&self, kind: &'static str, code: &'static str) {
        get_metric!(ERRORS_TOTAL)
            .with_label_values(&[kind, code])
            .inc();
    }
}

/// Registers every collector with the default registry and installs [`PrometheusSink`]
/// as the global sink. Must be called at most once per process.
pub fn install() -> Result<&'static dyn MetricsSink, prometheus::Error> {
    set_metric!(
        MISSED_BLOCKS_TOTAL,
        register_int_counter!(
            "bastion_slashing_missed_blocks_total",
            "Total number of blocks missed by validators."
        )?
    );
    set_metric!(
        LIFECYCLE_TRANSITIONS_TOTAL,
        register_int_counter_vec!(
            "bastion_staking_lifecycle_transitions_total",
            "Validator lifecycle transitions, by transition.",
            &["transition"]
        )?
    );
    set_metric!(
        VALIDATOR_RANK,
        register_int_gauge_vec!(
            "bastion_staking_validator_rank",
            "Current rank of each validator.",
            &["moniker"]
        )?
    );
    set_metric!(
        ACTIVE_VALIDATORS,
        register_int_gauge!(
            "bastion_staking_active_validators",
            "Number of validators in the Active state."
        )?
    );
    set_metric!(
        ADMITTED_TOTAL,
        register_int_counter!(
            "bastion_ante_admitted_total",
            "Transactions that passed every admission stage."
        )?
    );
    set_metric!(
        ADMISSION_REJECTED_TOTAL,
        register_int_counter_vec!(
            "bastion_ante_rejected_total",
            "Transactions rejected during admission, by stage and error code.",
            &["stage", "code"]
        )?
    );
    set_metric!(
        EXECUTION_REGISTERED_TOTAL,
        register_int_counter_vec!(
            "bastion_ante_execution_registered_total",
            "Pending execution charges registered, by message type.",
            &["msg_type"]
        )?
    );
    set_metric!(
        PROPOSALS_SUBMITTED_TOTAL,
        register_int_counter_vec!(
            "bastion_gov_proposals_submitted_total",
            "Proposals submitted, by content kind.",
            &["kind"]
        )?
    );
    set_metric!(
        PROPOSALS_FINALIZED_TOTAL,
        register_int_counter_vec!(
            "bastion_gov_proposals_finalized_total",
            "Proposals reaching a terminal result, by result.",
            &["result"]
        )?
    );
    set_metric!(
        ENACTMENTS_TOTAL,
        register_int_counter_vec!(
            "bastion_gov_enactments_total",
            "Proposal enactments, by content kind and outcome.",
            &["kind", "outcome"]
        )?
    );
    set_metric!(
        HOOK_DURATION_SECONDS,
        register_histogram_vec!(
            "bastion_block_hook_duration_seconds",
            "Latency of block lifecycle hooks.",
            &["hook"],
            exponential_buckets(0.0001, 2.0, 16)?
        )?
    );
    set_metric!(
        ERRORS_TOTAL,
        register_int_counter_vec!(
            "bastion_errors_total",
            "Total number of errors, categorized by kind and code.",
            &["kind", "code"]
        )?
    );

    static PROMETHEUS_SINK: PrometheusSink = PrometheusSink;
    SINK.set(&PROMETHEUS_SINK)
        .map_err(|_| prometheus::Error::AlreadyReg)?;
    Ok(&PROMETHEUS_SINK)
}

/// Renders the default registry in the Prometheus text exposition format.
pub fn gather_text() -> Result<String, prometheus::Error> {
    let mut buf = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buf)?;
    String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
