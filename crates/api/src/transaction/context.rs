// Path: crates/api/src/transaction/context.rs
//! Defines the stable context for transaction execution.

use bastion_types::app::AccountId;

/// Provides stable, read-only context to admission stages and keepers during execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxContext {
    /// The current block height being processed.
    pub block_height: u64,
    /// The deterministic time of the current block in UNIX seconds, taken from its header.
    pub block_time: u64,
    /// The `AccountId` of the entity that signed the current transaction.
    /// This is the authoritative source for permission checks within keepers.
    pub signer: AccountId,
    /// If true, the transaction is being simulated (`check_tx`) and its writes are
    /// discarded.
    pub simulation: bool,
}

impl TxContext {
    /// Context for block-level hooks, which act on behalf of the chain itself.
    pub fn for_block(block_height: u64, block_time: u64) -> Self {
        Self {
            block_height,
            block_time,
            signer: AccountId::default(),
            simulation: false,
        }
    }

    /// The same block context, signed by `signer`.
    pub fn with_signer(self, signer: AccountId) -> Self {
        Self { signer, ..self }
    }
}
