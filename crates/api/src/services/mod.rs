// Path: crates/api/src/services/mod.rs
//! Traits for engine services and the external collaborators the engine consumes.

use crate::state::StateAccess;
use crate::transaction::context::TxContext;
use async_trait::async_trait;
use bastion_types::app::{ExecutionFee, Message, TokenRate};
use bastion_types::error::{StateError, TransactionError};

/// The base trait for any service wired into the block executor.
pub trait BlockchainService: Send + Sync {
    /// A unique, static, lowercase string identifier for the service.
    fn id(&self) -> &str;
}

/// Source of denomination exchange rates and fee eligibility.
pub trait TokenRateRegistry: Send + Sync {
    /// The rate registered for `denom`, if any.
    fn rate(&self, state: &dyn StateAccess, denom: &str) -> Result<Option<TokenRate>, StateError>;
}

/// The fee-processing ledger that settles execution charges after a message runs.
pub trait FeeProcessor: Send + Sync {
    /// Records that `msg` is about to execute under `fee`. Settlement as either
    /// `execution_fee` or `failure_fee` happens once the outcome is known.
    fn register_execution_start(
        &self,
        state: &mut dyn StateAccess,
        ctx: &TxContext,
        msg: &Message,
        fee: &ExecutionFee,
    ) -> Result<(), StateError>;
}

/// Decides whether the network currently runs in degraded ("poor") mode.
pub trait NetworkHealth: Send + Sync {
    /// Returns `true` while the network is poor.
    fn is_poor_network(&self, state: &dyn StateAccess) -> Result<bool, StateError>;
}

/// Executes messages owned by modules outside this engine, such as the native ledger's
/// bank send.
#[async_trait]
pub trait ExternalMessageHandler: Send + Sync {
    /// Returns `true` if this handler executes `msg`.
    fn handles(&self, msg: &Message) -> bool;

    /// Executes `msg` against `state`.
    async fn execute(
        &self,
        state: &mut dyn StateAccess,
        ctx: &TxContext,
        msg: &Message,
    ) -> Result<(), TransactionError>;
}
