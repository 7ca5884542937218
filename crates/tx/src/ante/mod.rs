// Path: crates/tx/src/ante/mod.rs

//! The fee admission pipeline.
//!
//! Stages run in a fixed order. Every stage validates before any stage writes, so a
//! rejection by a later stage never leaves side effects from an earlier one.

mod execution_fee;
mod fee_range;
mod poor_network;

pub use execution_fee::ExecutionFeeRegistration;
pub use fee_range::ValidateFeeRange;
pub use poor_network::PoorNetworkGate;

use bastion_api::services::{FeeProcessor, NetworkHealth, TokenRateRegistry};
use bastion_api::state::StateAccess;
use bastion_api::transaction::context::TxContext;
use bastion_api::transaction::decorator::AnteStage;
use bastion_services::PropertyKeeper;
use bastion_telemetry::admission_metrics;
use bastion_types::app::Transaction;
use bastion_types::error::{ErrorCode, TransactionError};
use std::sync::Arc;

/// A closed, ordered list of admission stages.
pub struct AnteHandler {
    stages: Vec<Box<dyn AnteStage>>,
}

impl std::fmt::Debug for AnteHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnteHandler")
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl AnteHandler {
    pub fn new(stages: Vec<Box<dyn AnteStage>>) -> Self {
        Self { stages }
    }

    /// Fee-range validation, poor-network gating, then execution-fee registration.
    pub fn standard(
        bond_denom: &str,
        properties: PropertyKeeper,
        rates: Arc<dyn TokenRateRegistry>,
        health: Arc<dyn NetworkHealth>,
        processor: Arc<dyn FeeProcessor>,
    ) -> Self {
        Self::new(vec![
            Box::new(ValidateFeeRange::new(bond_denom, rates.clone(), properties)),
            Box::new(PoorNetworkGate::new(bond_denom, health, rates, properties)),
            Box::new(ExecutionFeeRegistration::new(processor, properties)),
        ])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs every stage's read-only check, stopping at the first rejection.
    pub async fn validate(
        &self,
        state: &dyn StateAccess,
        tx: &Transaction,
        ctx: &TxContext,
    ) -> Result<(), TransactionError> {
        for stage in &self.stages {
            if let Err(e) = stage.validate(state, tx, ctx).await {
                tracing::debug!(
                    target: "ante",
                    stage = stage.name(),
                    signer = %tx.signer,
                    error = %e,
                    "transaction rejected"
                );
                admission_metrics().inc_rejected(stage.name(), e.code());
                return Err(e);
            }
        }
        Ok(())
    }

    /// Validates the transaction, then applies every stage's writes in order.
    pub async fn run(
        &self,
        state: &mut dyn StateAccess,
        tx: &Transaction,
        ctx: &TxContext,
    ) -> Result<(), TransactionError> {
        self.validate(&*state, tx, ctx).await?;
        for stage in &self.stages {
            stage.write(state, tx, ctx).await?;
        }
        admission_metrics().inc_admitted();
        Ok(())
    }
}
