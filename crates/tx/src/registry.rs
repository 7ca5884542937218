// Path: crates/tx/src/registry.rs

//! State-backed implementations of the token-rate registry and the fee processor.

use bastion_api::services::{FeeProcessor, TokenRateRegistry};
use bastion_api::state::{StateAccess, StateAccessExt};
use bastion_api::transaction::context::TxContext;
use bastion_types::app::{AccountId, ExecutionFee, Message, TokenRate};
use bastion_types::error::StateError;
use bastion_types::keys::{pending_execution_key, token_rate_key, TOKEN_RATE_PREFIX};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Reads token rates from `tokens::rate::<denom>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateTokenRates;

impl StateTokenRates {
    pub fn set_rate(&self, state: &mut dyn StateAccess, rate: &TokenRate) -> Result<(), StateError> {
        state.put_encoded(&token_rate_key(&rate.denom), rate)
    }

    pub fn rates(&self, state: &dyn StateAccess) -> Result<Vec<TokenRate>, StateError> {
        Ok(state
            .scan_decoded::<TokenRate>(TOKEN_RATE_PREFIX)?
            .into_iter()
            .map(|(_, r)| r)
            .collect())
    }
}

impl TokenRateRegistry for StateTokenRates {
    fn rate(&self, state: &dyn StateAccess, denom: &str) -> Result<Option<TokenRate>, StateError> {
        state.get_decoded(&token_rate_key(denom))
    }
}

/// A registered, not yet settled, execution charge.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct PendingExecution {
    pub signer: AccountId,
    pub msg_type: String,
    pub execution_fee: u64,
    pub failure_fee: u64,
    pub timeout: u64,
}

/// Appends registrations to the per-block list at `fees::pending::<height>` for the
/// post-execution ledger to settle.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingExecutionLedger;

impl PendingExecutionLedger {
    /// Registrations recorded at `height`, in registration order.
    pub fn pending(
        &self,
        state: &dyn StateAccess,
        height: u64,
    ) -> Result<Vec<PendingExecution>, StateError> {
        Ok(state
            .get_decoded(&pending_execution_key(height))?
            .unwrap_or_default())
    }
}

impl FeeProcessor for PendingExecutionLedger {
    fn register_execution_start(
        &self,
        state: &mut dyn StateAccess,
        ctx: &TxContext,
        msg: &Message,
        fee: &ExecutionFee,
    ) -> Result<(), StateError> {
        let mut pending = self.pending(state, ctx.block_height)?;
        pending.push(PendingExecution {
            signer: ctx.signer,
            msg_type: msg.msg_type().to_string(),
            execution_fee: fee.execution_fee,
            failure_fee: fee.failure_fee,
            timeout: fee.timeout,
        });
        state.put_encoded(&pending_execution_key(ctx.block_height), &pending)
    }
}
