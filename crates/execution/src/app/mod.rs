// Path: crates/execution/src/app/mod.rs
mod end_block;
mod router;
mod state_machine;

use anyhow::{Context, Result};
use bastion_api::services::ExternalMessageHandler;
use bastion_api::state::StateAccess;
use bastion_api::transaction::context::TxContext;
use bastion_services::{
    GovernanceModule, PermissionKeeper, PropertyKeeper, SlashingKeeper, StakingKeeper,
};
use bastion_tx::{AnteHandler, PendingExecutionLedger, StateTokenRates, ValidatorCountHealth};
use bastion_types::config::{EngineConfig, GenesisState};
use bastion_types::error::{ChainError, ErrorClass, ErrorCode, TransactionError};
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

pub use state_machine::TxOutcome;

/// Wires the keepers, the admission pipeline and the block hooks together and drives
/// them in block order: `begin_block`, any number of `deliver_tx`, `end_block`.
///
/// The executor owns no state. Every call receives the host's store; transaction and
/// enactment atomicity is provided by overlays committed only on success.
pub struct BlockExecutor {
    config: EngineConfig,
    permissions: PermissionKeeper,
    properties: PropertyKeeper,
    staking: StakingKeeper,
    slashing: SlashingKeeper,
    governance: GovernanceModule,
    rates: StateTokenRates,
    ante: AnteHandler,
    external: Option<Arc<dyn ExternalMessageHandler>>,
    last_height: Option<u64>,
    /// Context of the block between `begin_block` and `end_block`.
    block: Option<TxContext>,
}

impl Debug for BlockExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockExecutor")
            .field("config", &self.config)
            .field("ante", &self.ante)
            .field("external", &self.external.as_ref().map(|_| "Arc<dyn ExternalMessageHandler>"))
            .field("last_height", &self.last_height)
            .field("block", &self.block)
            .finish()
    }
}

pub(crate) fn class_label(class: ErrorClass) -> &'static str {
    match class {
        ErrorClass::Validation => "validation",
        ErrorClass::Authorization => "authorization",
        ErrorClass::Economic => "economic",
        ErrorClass::NotFound => "not_found",
        ErrorClass::Invariant => "invariant",
    }
}

impl BlockExecutor {
    pub fn new(config: EngineConfig) -> Self {
        let permissions = PermissionKeeper;
        let properties = PropertyKeeper::new(permissions);
        let staking = StakingKeeper::new(config.signing, permissions, properties);
        let slashing = SlashingKeeper::new(staking.clone(), properties);
        let governance = GovernanceModule::new(permissions, properties, staking.clone());
        let health = ValidatorCountHealth::new(config.poor_network, staking.clone(), properties);
        let ante = AnteHandler::standard(
            &config.bond_denom,
            properties,
            Arc::new(StateTokenRates),
            Arc::new(health),
            Arc::new(PendingExecutionLedger),
        );
        Self {
            config,
            permissions,
            properties,
            staking,
            slashing,
            governance,
            rates: StateTokenRates,
            ante,
            external: None,
            last_height: None,
            block: None,
        }
    }

    /// Loads the TOML engine config and the JSON genesis document.
    pub fn load(
        config_path: impl AsRef<Path>,
        genesis_path: impl AsRef<Path>,
    ) -> Result<(Self, GenesisState)> {
        let config_path = config_path.as_ref();
        let config = EngineConfig::load(config_path)
            .with_context(|| format!("loading engine config {}", config_path.display()))?;
        let genesis_path = genesis_path.as_ref();
        let genesis = GenesisState::load(genesis_path)
            .with_context(|| format!("loading genesis {}", genesis_path.display()))?;
        Ok((Self::new(config), genesis))
    }

    /// Routes messages owned by other modules, such as bank sends, to `handler`.
    pub fn with_external_handler(mut self, handler: Arc<dyn ExternalMessageHandler>) -> Self {
        self.external = Some(handler);
        self
    }

    /// Replaces the standard admission pipeline.
    pub fn with_ante_handler(mut self, ante: AnteHandler) -> Self {
        self.ante = ante;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn permissions(&self) -> &PermissionKeeper {
        &self.permissions
    }

    pub fn properties(&self) -> &PropertyKeeper {
        &self.properties
    }

    pub fn staking(&self) -> &StakingKeeper {
        &self.staking
    }

    pub fn slashing(&self) -> &SlashingKeeper {
        &self.slashing
    }

    pub fn governance(&self) -> &GovernanceModule {
        &self.governance
    }

    pub fn token_rates(&self) -> &StateTokenRates {
        &self.rates
    }

    /// Height of the last block begun, if any.
    pub fn last_height(&self) -> Option<u64> {
        self.last_height
    }

    /// Seeds consensus state at height zero.
    pub fn init_genesis(
        &self,
        state: &mut dyn StateAccess,
        genesis: &GenesisState,
    ) -> Result<(), ChainError> {
        genesis.validate()?;
        let fail = |what: &str, e: TransactionError| {
            ChainError::Genesis(format!("{}: {} ({})", what, e, e.code()))
        };

        self.properties
            .set_network_properties(state, &genesis.network_properties)
            .map_err(|e| fail("network properties", e))?;
        for fee in &genesis.execution_fees {
            self.properties
                .set_execution_fee(state, fee)
                .map_err(|e| fail("execution fee", e))?;
        }
        self.properties
            .set_poor_network_messages(state, &genesis.poor_network_messages)?;
        for role in &genesis.roles {
            self.permissions.set_role(state, role)?;
        }
        for actor in &genesis.actors {
            self.permissions.set_actor(state, actor)?;
        }
        for rate in &genesis.token_rates {
            self.rates.set_rate(state, rate)?;
        }
        for params in &genesis.validators {
            self.staking
                .create_validator(state, params, 0)
                .map_err(|e| fail("validator", e))?;
        }
        self.governance
            .set_next_proposal_id(state, genesis.starting_proposal_id)?;

        tracing::info!(
            target: "exec",
            roles = genesis.roles.len(),
            actors = genesis.actors.len(),
            validators = genesis.validators.len(),
            "genesis applied"
        );
        Ok(())
    }
}
