// Path: crates/tx/src/ante/execution_fee.rs

use async_trait::async_trait;
use bastion_api::services::FeeProcessor;
use bastion_api::state::StateAccess;
use bastion_api::transaction::context::TxContext;
use bastion_api::transaction::decorator::AnteStage;
use bastion_services::PropertyKeeper;
use bastion_telemetry::admission_metrics;
use bastion_types::app::Transaction;
use bastion_types::error::TransactionError;
use std::sync::Arc;

/// Registers a pending execution charge for every message with an execution-fee
/// entry. Never rejects.
pub struct ExecutionFeeRegistration {
    processor: Arc<dyn FeeProcessor>,
    properties: PropertyKeeper,
}

impl ExecutionFeeRegistration {
    pub fn new(processor: Arc<dyn FeeProcessor>, properties: PropertyKeeper) -> Self {
        Self {
            processor,
            properties,
        }
    }
}

#[async_trait]
impl AnteStage for ExecutionFeeRegistration {
    fn name(&self) -> &'static str {
        "execution_fee"
    }

    async fn validate(
        &self,
        _state: &dyn StateAccess,
        _tx: &Transaction,
        _ctx: &TxContext,
    ) -> Result<(), TransactionError> {
        Ok(())
    }

    async fn write(
        &self,
        state: &mut dyn StateAccess,
        tx: &Transaction,
        ctx: &TxContext,
    ) -> Result<(), TransactionError> {
        for msg in &tx.messages {
            let Some(fee) = self.properties.execution_fee(state, msg.msg_type())? else {
                continue;
            };
            self.processor
                .register_execution_start(state, ctx, msg, &fee)?;
            admission_metrics().inc_execution_registered(msg.msg_type());
        }
        Ok(())
    }
}
