// Path: crates/execution/src/app/state_machine.rs

use super::{class_label, BlockExecutor};
use bastion_api::state::{StateAccess, StateChangeSet, StateOverlay};
use bastion_api::transaction::context::TxContext;
use bastion_telemetry::error_metrics;
use bastion_types::app::Transaction;
use bastion_types::error::{ChainError, ErrorCode, TransactionError};

/// Result of a transaction that did not abort the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    /// `"OK"` or the rejecting error's stable code.
    pub code: &'static str,
    pub log: String,
}

impl TxOutcome {
    pub const OK: &'static str = "OK";

    fn ok() -> Self {
        Self {
            code: Self::OK,
            log: String::new(),
        }
    }

    fn rejected(err: &TransactionError) -> Self {
        Self {
            code: err.code(),
            log: err.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == Self::OK
    }
}

/// Fatal errors abort the block; everything else becomes a rejected outcome.
fn settle(
    result: Result<(), TransactionError>,
    ctx: &TxContext,
    phase: &'static str,
) -> Result<TxOutcome, ChainError> {
    match result {
        Ok(()) => Ok(TxOutcome::ok()),
        Err(e) if e.is_fatal() => {
            tracing::error!(target: "exec", height = ctx.block_height, signer = %ctx.signer, phase, error = %e, "invariant violated");
            error_metrics().inc_error(class_label(e.class()), e.code());
            Err(e.into())
        }
        Err(e) => {
            tracing::debug!(target: "exec", height = ctx.block_height, signer = %ctx.signer, phase, code = e.code(), "transaction rejected");
            error_metrics().inc_error(class_label(e.class()), e.code());
            Ok(TxOutcome::rejected(&e))
        }
    }
}

impl BlockExecutor {
    fn tx_context(&self, tx: &Transaction, simulation: bool) -> Result<TxContext, ChainError> {
        Ok(TxContext {
            simulation,
            ..self.block_context()?.with_signer(tx.signer)
        })
    }

    async fn execute_messages(
        &self,
        state: &mut dyn StateAccess,
        tx: &Transaction,
        ctx: &TxContext,
    ) -> Result<(), TransactionError> {
        for msg in &tx.messages {
            self.route(state, ctx, msg).await?;
        }
        Ok(())
    }

    async fn admit(
        &self,
        state: &dyn StateAccess,
        tx: &Transaction,
        ctx: &TxContext,
    ) -> Result<StateChangeSet, TransactionError> {
        let mut overlay = StateOverlay::new(state);
        self.ante.run(&mut overlay, tx, ctx).await?;
        Ok(overlay.into_ordered_batch())
    }

    async fn apply(
        &self,
        state: &dyn StateAccess,
        tx: &Transaction,
        ctx: &TxContext,
    ) -> Result<StateChangeSet, TransactionError> {
        let mut overlay = StateOverlay::new(state);
        self.execute_messages(&mut overlay, tx, ctx).await?;
        Ok(overlay.into_ordered_batch())
    }

    /// Admits and executes `tx` against a throwaway overlay. Nothing reaches `state`.
    pub async fn check_tx(
        &self,
        state: &dyn StateAccess,
        tx: &Transaction,
    ) -> Result<TxOutcome, ChainError> {
        let ctx = self.tx_context(tx, true)?;
        let mut overlay = StateOverlay::new(state);
        let result = match self.ante.run(&mut overlay, tx, &ctx).await {
            Ok(()) => self.execute_messages(&mut overlay, tx, &ctx).await,
            Err(e) => Err(e),
        };
        settle(result, &ctx, "check")
    }

    /// Admits `tx`, commits the admission writes, then executes its messages. Message
    /// writes are committed only if every message succeeds.
    pub async fn deliver_tx(
        &self,
        state: &mut dyn StateAccess,
        tx: &Transaction,
    ) -> Result<TxOutcome, ChainError> {
        let ctx = self.tx_context(tx, false)?;

        let (inserts, deletes) = match self.admit(&*state, tx, &ctx).await {
            Ok(batch) => batch,
            Err(e) => return settle(Err(e), &ctx, "ante"),
        };
        state.batch_apply(&inserts, &deletes)?;

        match self.apply(&*state, tx, &ctx).await {
            Ok((inserts, deletes)) => {
                state.batch_apply(&inserts, &deletes)?;
                tracing::debug!(target: "exec", height = ctx.block_height, signer = %ctx.signer, messages = tx.messages.len(), "transaction delivered");
                Ok(TxOutcome::ok())
            }
            Err(e) => settle(Err(e), &ctx, "execute"),
        }
    }
}
