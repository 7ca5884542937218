// Path: crates/execution/src/app/end_block.rs

//! Block-boundary hooks: signing facts at the start of a block, governance resolution and
//! enactment at its end.

use super::{class_label, BlockExecutor};
use bastion_api::lifecycle::{OnBeginBlock, OnEndBlock};
use bastion_api::services::BlockchainService;
use bastion_api::state::StateAccess;
use bastion_api::transaction::context::TxContext;
use bastion_telemetry::time::HookTimer;
use bastion_telemetry::{block_metrics, error_metrics};
use bastion_types::app::BlockHeader;
use bastion_types::error::{ChainError, ErrorCode, StateError};

fn hook_failed(service: &dyn BlockchainService, height: u64, e: StateError) -> ChainError {
    tracing::error!(target: "exec", service = service.id(), height, error = %e, "block hook failed");
    error_metrics().inc_error(class_label(e.class()), e.code());
    ChainError::State(e)
}

impl BlockExecutor {
    /// Opens block `header.height`, applying the previous commit's signing facts.
    /// Heights must be consecutive once the first block has been seen.
    pub async fn begin_block(
        &mut self,
        state: &mut dyn StateAccess,
        header: &BlockHeader,
    ) -> Result<(), ChainError> {
        if let Some(last) = self.last_height {
            let expected = last.saturating_add(1);
            if header.height != expected {
                return Err(ChainError::InvalidHeight {
                    expected,
                    got: header.height,
                });
            }
        }
        let _timer = HookTimer::new(block_metrics(), "begin_block");
        self.slashing
            .on_begin_block(state, header)
            .await
            .map_err(|e| hook_failed(&self.slashing, header.height, e))?;

        self.last_height = Some(header.height);
        self.block = Some(TxContext::for_block(header.height, header.time));
        tracing::debug!(target: "exec", height = header.height, time = header.time, "block begun");
        Ok(())
    }

    /// Closes the current block: tallies proposals whose voting ended and applies due
    /// enactments.
    pub async fn end_block(&mut self, state: &mut dyn StateAccess) -> Result<(), ChainError> {
        let ctx = self.block_context()?;
        let _timer = HookTimer::new(block_metrics(), "end_block");
        self.governance
            .on_end_block(state, &ctx)
            .await
            .map_err(|e| hook_failed(&self.governance, ctx.block_height, e))?;
        self.block = None;
        tracing::debug!(target: "exec", height = ctx.block_height, "block ended");
        Ok(())
    }

    pub(super) fn block_context(&self) -> Result<TxContext, ChainError> {
        self.block
            .ok_or_else(|| ChainError::Transaction("no block in progress".into()))
    }
}
