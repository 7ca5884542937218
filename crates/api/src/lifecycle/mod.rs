// Path: crates/api/src/lifecycle/mod.rs
//! Defines traits for components that hook into the block processing lifecycle.

use crate::services::BlockchainService;
use crate::state::StateAccess;
use crate::transaction::context::TxContext;
use async_trait::async_trait;
use bastion_types::app::BlockHeader;
use bastion_types::error::StateError;

/// A trait for services that need to act at the start of a block, before any
/// transaction is delivered.
#[async_trait]
pub trait OnBeginBlock: BlockchainService {
    /// Called once per block with the header and the previous commit's signing facts.
    async fn on_begin_block(
        &self,
        state: &mut dyn StateAccess,
        header: &BlockHeader,
    ) -> Result<(), StateError>;
}

/// A trait for services that need to perform actions at the end of a block.
#[async_trait]
pub trait OnEndBlock: BlockchainService {
    /// Called after all transactions in a block have been processed.
    async fn on_end_block(
        &self,
        state: &mut dyn StateAccess,
        ctx: &TxContext,
    ) -> Result<(), StateError>;
}
