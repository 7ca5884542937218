// Path: crates/api/src/transaction/decorator.rs
//! Defines the trait for transaction admission stages (ante handlers).

use crate::state::StateAccess;
use crate::transaction::context::TxContext;
use async_trait::async_trait;
use bastion_types::app::Transaction;
use bastion_types::error::TransactionError;

/// One stage of the admission pipeline, run before any message executes.
///
/// Stages run in a fixed order and execution is split into two phases:
/// 1. `validate`: read-only checks. The first failing stage aborts admission and no
///    stage's `write` runs.
/// 2. `write`: side effects such as registering pending execution charges. Only runs
///    once every stage has passed `validate`.
#[async_trait]
pub trait AnteStage: Send + Sync {
    /// A short, stable name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Phase 1: read-only validation.
    ///
    /// The immutable `StateAccess` reference enforces at the type level that this phase
    /// cannot mutate state, so running it twice against the same state gives the same
    /// decision.
    async fn validate(
        &self,
        state: &dyn StateAccess,
        tx: &Transaction,
        ctx: &TxContext,
    ) -> Result<(), TransactionError>;

    /// Phase 2: apply state mutations.
    ///
    /// The default implementation does nothing, which suits pure validation stages.
    async fn write(
        &self,
        state: &mut dyn StateAccess,
        tx: &Transaction,
        ctx: &TxContext,
    ) -> Result<(), TransactionError> {
        let _ = (state, tx, ctx);
        Ok(())
    }
}
