// Path: crates/tx/src/health.rs

//! The default poor-network signal.

use bastion_api::services::NetworkHealth;
use bastion_api::state::StateAccess;
use bastion_services::{PropertyKeeper, StakingKeeper};
use bastion_types::config::PoorNetworkPolicy;
use bastion_types::error::StateError;

/// Poor while fewer than `min_validators` validators are Active, unless the policy
/// forces the mode.
#[derive(Debug, Clone, Default)]
pub struct ValidatorCountHealth {
    policy: PoorNetworkPolicy,
    staking: StakingKeeper,
    properties: PropertyKeeper,
}

impl ValidatorCountHealth {
    pub fn new(policy: PoorNetworkPolicy, staking: StakingKeeper, properties: PropertyKeeper) -> Self {
        Self {
            policy,
            staking,
            properties,
        }
    }
}

impl NetworkHealth for ValidatorCountHealth {
    fn is_poor_network(&self, state: &dyn StateAccess) -> Result<bool, StateError> {
        match self.policy {
            PoorNetworkPolicy::Always => Ok(true),
            PoorNetworkPolicy::Never => Ok(false),
            PoorNetworkPolicy::ValidatorCount => {
                let min = self.properties.network_properties(state)?.min_validators;
                Ok(self.staking.active_validator_count(state)? < min)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_api::state::MemoryStore;
    use bastion_services::PermissionKeeper;
    use bastion_types::app::{AccountId, ClaimValidatorParams, NetworkProperties};
    use bastion_types::config::SigningParams;

    #[test]
    fn poor_until_enough_validators_are_active() {
        let mut store = MemoryStore::default();
        let properties = PropertyKeeper::default();
        let staking = StakingKeeper::new(SigningParams::default(), PermissionKeeper, properties);
        let props = NetworkProperties {
            min_validators: 1,
            ..Default::default()
        };
        properties.set_network_properties(&mut store, &props).unwrap();

        let health = ValidatorCountHealth::new(PoorNetworkPolicy::ValidatorCount, staking.clone(), properties);
        assert!(health.is_poor_network(&store).unwrap());

        staking
            .create_validator(
                &mut store,
                &ClaimValidatorParams {
                    moniker: "one".into(),
                    website: String::new(),
                    social: String::new(),
                    identity: String::new(),
                    commission: 0,
                    val_key: AccountId([1; 32]),
                    cons_pubkey: vec![1; 32],
                },
                1,
            )
            .unwrap();
        assert!(!health.is_poor_network(&store).unwrap());

        let forced = ValidatorCountHealth::new(PoorNetworkPolicy::Always, staking, properties);
        assert!(forced.is_poor_network(&store).unwrap());
    }
}
