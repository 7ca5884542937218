// Path: crates/types/src/config/mod.rs

//! Engine configuration and genesis structures.
//!
//! `EngineConfig` carries node-local, TOML-loaded settings that every node of a network
//! must agree on (bond denomination, signing window). `GenesisState` is the JSON document
//! seeding consensus state at height zero.

use crate::app::{
    ClaimValidatorParams, ExecutionFee, NetworkActor, NetworkProperties, PermValue,
    PermissionSet, PoorNetworkMessages, Role, TokenRate, RATE_PRECISION, SUDO_ROLE_ID,
    VALIDATOR_ROLE_ID,
};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Selects how the poor-network condition is decided.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PoorNetworkPolicy {
    /// Poor while the number of active validators is below `min_validators`.
    #[default]
    ValidatorCount,
    /// Always poor.
    Always,
    /// Never poor.
    Never,
}

/// Parameters of the missed-block window.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct SigningParams {
    /// Window length in blocks.
    #[serde(default = "default_signed_blocks_window")]
    pub signed_blocks_window: u64,
    /// Percentage of the window a validator must sign to stay active.
    #[serde(default = "default_min_signed_per_window_percent")]
    pub min_signed_per_window_percent: u64,
}

fn default_signed_blocks_window() -> u64 {
    1000
}
fn default_min_signed_per_window_percent() -> u64 {
    50
}

impl Default for SigningParams {
    fn default() -> Self {
        Self {
            signed_blocks_window: default_signed_blocks_window(),
            min_signed_per_window_percent: default_min_signed_per_window_percent(),
        }
    }
}

impl SigningParams {
    /// Blocks that must be signed within one window.
    pub fn min_signed_per_window(&self) -> u64 {
        let scaled = u128::from(self.signed_blocks_window)
            * u128::from(self.min_signed_per_window_percent.min(100))
            / 100;
        u64::try_from(scaled).unwrap_or(self.signed_blocks_window)
    }

    /// Missed blocks tolerated within one window. One more inactivates.
    pub fn max_missed_blocks(&self) -> u64 {
        self.signed_blocks_window
            .saturating_sub(self.min_signed_per_window())
    }
}

/// Node-level engine configuration.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// The network's bond (native fee) denomination.
    #[serde(default = "default_bond_denom")]
    pub bond_denom: String,
    /// Missed-block window parameters.
    #[serde(default)]
    pub signing: SigningParams,
    /// Poor-network trigger.
    #[serde(default)]
    pub poor_network: PoorNetworkPolicy,
}

fn default_bond_denom() -> String {
    "ukex".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bond_denom: default_bond_denom(),
            signing: SigningParams::default(),
            poor_network: PoorNetworkPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Semantic checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bond_denom.trim().is_empty() {
            return Err(ConfigError::Invalid("bond_denom must not be empty".into()));
        }
        if self.signing.signed_blocks_window == 0 {
            return Err(ConfigError::Invalid(
                "signed_blocks_window must be positive".into(),
            ));
        }
        if self.signing.min_signed_per_window_percent > 100 {
            return Err(ConfigError::Invalid(
                "min_signed_per_window_percent must not exceed 100".into(),
            ));
        }
        Ok(())
    }
}

/// The document seeding consensus state.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GenesisState {
    /// Initial network properties.
    #[serde(default)]
    pub network_properties: NetworkProperties,
    /// Initial execution-fee schedule.
    #[serde(default = "ExecutionFee::default_schedule")]
    pub execution_fees: Vec<ExecutionFee>,
    /// Initial poor-network allowlist.
    #[serde(default = "PoorNetworkMessages::default_allowlist")]
    pub poor_network_messages: PoorNetworkMessages,
    /// Initial roles.
    #[serde(default = "default_roles")]
    pub roles: Vec<Role>,
    /// Initial actors.
    #[serde(default)]
    pub actors: Vec<NetworkActor>,
    /// Initial token rates.
    #[serde(default = "default_token_rates")]
    pub token_rates: Vec<TokenRate>,
    /// Validators claimed at genesis.
    #[serde(default)]
    pub validators: Vec<ClaimValidatorParams>,
    /// First proposal id handed out.
    #[serde(default = "default_starting_proposal_id")]
    pub starting_proposal_id: u64,
}

fn default_starting_proposal_id() -> u64 {
    1
}

/// The `Sudo` and `Validator` roles.
pub fn default_roles() -> Vec<Role> {
    vec![
        Role {
            id: SUDO_ROLE_ID,
            name: "Sudo".to_string(),
            permissions: PermissionSet::whitelisting(
                PermValue::all().filter(|p| *p != PermValue::Zero),
            ),
        },
        Role {
            id: VALIDATOR_ROLE_ID,
            name: "Validator".to_string(),
            permissions: PermissionSet::whitelisting([PermValue::ClaimValidator]),
        },
    ]
}

fn default_token_rates() -> Vec<TokenRate> {
    vec![TokenRate {
        denom: default_bond_denom(),
        rate: RATE_PRECISION as u64,
        fee_payments: true,
    }]
}

impl Default for GenesisState {
    fn default() -> Self {
        Self {
            network_properties: NetworkProperties::default(),
            execution_fees: ExecutionFee::default_schedule(),
            poor_network_messages: PoorNetworkMessages::default_allowlist(),
            roles: default_roles(),
            actors: Vec::new(),
            token_rates: default_token_rates(),
            validators: Vec::new(),
            starting_proposal_id: default_starting_proposal_id(),
        }
    }
}

impl GenesisState {
    /// Parses and validates a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let genesis: Self = serde_json::from_str(s)?;
        genesis.validate()?;
        Ok(genesis)
    }

    /// Reads and parses a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// Semantic checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |e: &dyn std::fmt::Display| ConfigError::Invalid(e.to_string());
        self.network_properties
            .validate()
            .map_err(|e| invalid(&e))?;
        for fee in &self.execution_fees {
            fee.validate().map_err(|e| invalid(&e))?;
        }
        if self.starting_proposal_id == 0 {
            return Err(ConfigError::Invalid(
                "starting_proposal_id must be at least 1".into(),
            ));
        }
        let mut role_ids = BTreeSet::new();
        for role in &self.roles {
            if !role_ids.insert(role.id) {
                return Err(ConfigError::Invalid(format!("duplicate role {}", role.id)));
            }
            if !role.permissions.is_disjoint() {
                return Err(ConfigError::Invalid(format!(
                    "role {} whitelists and blacklists the same permission",
                    role.id
                )));
            }
        }
        let mut addresses = BTreeSet::new();
        for actor in &self.actors {
            if !addresses.insert(actor.address) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate actor {}",
                    actor.address
                )));
            }
            if !actor.permissions.is_disjoint() {
                return Err(ConfigError::Invalid(format!(
                    "actor {} whitelists and blacklists the same permission",
                    actor.address
                )));
            }
        }
        Ok(())
    }
}
