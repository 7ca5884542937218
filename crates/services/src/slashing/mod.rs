// Path: crates/services/src/slashing/mod.rs
//! Missed-block tracking and validator reputation.
//!
//! For every signing fact the keeper updates rank and streak, flips the validator's bit
//! in its circular window, keeps `missed_blocks_counter` equal to the window's popcount
//! and inactivates an Active validator once misses exceed the window allowance.

use crate::properties::PropertyKeeper;
use crate::staking::StakingKeeper;
use async_trait::async_trait;
use bastion_api::lifecycle::OnBeginBlock;
use bastion_api::services::BlockchainService;
use bastion_api::state::StateAccess;
use bastion_telemetry::reputation_metrics;
use bastion_types::app::{BlockHeader, ConsAddress, ValidatorStatus};
use bastion_types::error::StateError;

#[derive(Debug, Clone, Default)]
pub struct SlashingKeeper {
    staking: StakingKeeper,
    properties: PropertyKeeper,
}

impl SlashingKeeper {
    pub fn new(staking: StakingKeeper, properties: PropertyKeeper) -> Self {
        Self {
            staking,
            properties,
        }
    }

    /// Records whether the validator at `addr` signed the block at `height`.
    pub fn handle_validator_signature(
        &self,
        state: &mut dyn StateAccess,
        addr: &ConsAddress,
        signed: bool,
        height: u64,
        now: u64,
    ) -> Result<(), StateError> {
        let Some(mut validator) = self.staking.get_validator_by_cons_addr(state, addr)? else {
            tracing::warn!(target: "slashing", cons_addr = %addr, height, "signing fact for unknown validator");
            return Ok(());
        };
        if validator.tombstoned {
            return Ok(());
        }
        let props = self.properties.network_properties(state)?;

        // Rank and streak move on every fact; the window only drives eligibility.
        if signed {
            validator.record_signed();
        } else {
            validator.record_missed(props.mischance_rank_decrease_amount);
            reputation_metrics().inc_missed_blocks();
        }

        let mut info = self.staking.signing_info(state, addr)?;
        let mut window = self.staking.signing_window(state, addr)?;
        let slot = window.slot(info.index_offset);
        let previously_missed = window.set(slot, !signed)?;
        match (previously_missed, signed) {
            (false, false) => info.missed_blocks_counter += 1,
            (true, true) => {
                info.missed_blocks_counter =
                    info.missed_blocks_counter.checked_sub(1).ok_or_else(|| {
                        StateError::Invariant(format!(
                            "missed counter underflow for validator {}",
                            addr
                        ))
                    })?;
            }
            _ => {}
        }
        info.index_offset = info.index_offset.saturating_add(1);

        let popcount = window.count_missed();
        if info.missed_blocks_counter != popcount {
            return Err(StateError::Invariant(format!(
                "validator {} missed counter {} != window popcount {}",
                addr, info.missed_blocks_counter, popcount
            )));
        }

        tracing::trace!(
            target: "slashing",
            cons_addr = %addr,
            height,
            signed,
            slot,
            missed = info.missed_blocks_counter,
            rank = validator.rank,
            streak = validator.streak,
            "signing fact recorded"
        );

        self.staking.set_signing_info(state, &info)?;
        self.staking.set_signing_window(state, addr, &window)?;

        let max_missed = self.staking.signing_params().max_missed_blocks();
        if validator.status == ValidatorStatus::Active && info.missed_blocks_counter > max_missed {
            tracing::info!(
                target: "slashing",
                cons_addr = %addr,
                height,
                missed = info.missed_blocks_counter,
                max_missed,
                "missed-block allowance exceeded"
            );
            self.staking.inactivate(state, &mut validator, now)?;
        } else {
            self.staking.set_validator(state, &validator)?;
            reputation_metrics().set_validator_rank(&validator.moniker, validator.rank);
        }
        Ok(())
    }
}

impl BlockchainService for SlashingKeeper {
    fn id(&self) -> &str {
        "slashing"
    }
}

#[async_trait]
impl OnBeginBlock for SlashingKeeper {
    async fn on_begin_block(
        &self,
        state: &mut dyn StateAccess,
        header: &BlockHeader,
    ) -> Result<(), StateError> {
        for fact in &header.last_commit {
            self.handle_validator_signature(
                state,
                &fact.address,
                fact.signed,
                header.height,
                header.time,
            )?;
        }
        let active = self.staking.active_validator_count(state)?;
        reputation_metrics().set_active_validators(active);
        tracing::debug!(
            target: "slashing",
            height = header.height,
            facts = header.last_commit.len(),
            active,
            "signing facts processed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_api::state::MemoryStore;
    use bastion_types::app::{ClaimValidatorParams, NetworkProperties, SigningFact, Validator};
    use bastion_types::config::SigningParams;
    use crate::permissions::PermissionKeeper;

    fn keeper(window: u64) -> SlashingKeeper {
        let signing = SigningParams {
            signed_blocks_window: window,
            min_signed_per_window_percent: 50,
        };
        let staking = StakingKeeper::new(signing, PermissionKeeper, PropertyKeeper::default());
        SlashingKeeper::new(staking, PropertyKeeper::default())
    }

    fn setup(window: u64) -> (MemoryStore, SlashingKeeper, ConsAddress) {
        let mut store = MemoryStore::default();
        let keeper = keeper(window);
        keeper
            .properties
            .set_network_properties(&mut store, &NetworkProperties::default())
            .unwrap();
        let v = keeper
            .staking
            .create_validator(
                &mut store,
                &ClaimValidatorParams {
                    moniker: "alpha".into(),
                    website: String::new(),
                    social: String::new(),
                    identity: String::new(),
                    commission: 0,
                    val_key: bastion_types::app::AccountId([1; 32]),
                    cons_pubkey: vec![1; 32],
                },
                1,
            )
            .unwrap();
        (store, keeper, v.cons_address())
    }

    fn current(store: &MemoryStore, keeper: &SlashingKeeper, addr: &ConsAddress) -> Validator {
        keeper
            .staking
            .get_validator_by_cons_addr(store, addr)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn counter_tracks_bits_as_the_window_wraps() {
        let (mut store, keeper, addr) = setup(4);
        // miss, miss, sign, sign | sign (overwrites a miss), miss
        for (h, signed) in [false, false, true, true, true, false].into_iter().enumerate() {
            keeper
                .handle_validator_signature(&mut store, &addr, signed, h as u64, 0)
                .unwrap();
        }
        let info = keeper.staking.signing_info(&store, &addr).unwrap();
        assert_eq!(info.index_offset, 6);
        // Slots: [sign, miss, sign, sign]
        assert_eq!(info.missed_blocks_counter, 1);
        assert_eq!(current(&store, &keeper, &addr).mischance, 3);
    }

    #[test]
    fn rank_never_goes_negative() {
        let (mut store, keeper, addr) = setup(1000);
        for h in 0..10 {
            keeper
                .handle_validator_signature(&mut store, &addr, false, h, 0)
                .unwrap();
            let v = current(&store, &keeper, &addr);
            assert_eq!((v.rank, v.streak), (0, 0));
        }
    }

    #[test]
    fn corrupt_counter_is_an_invariant_violation() {
        let (mut store, keeper, addr) = setup(10);
        let mut info = keeper.staking.signing_info(&store, &addr).unwrap();
        info.missed_blocks_counter = 3;
        keeper.staking.set_signing_info(&mut store, &info).unwrap();

        let err = keeper
            .handle_validator_signature(&mut store, &addr, false, 1, 0)
            .unwrap_err();
        assert!(matches!(err, StateError::Invariant(_)));
    }

    #[test]
    fn paused_validator_is_not_inactivated() {
        let (mut store, keeper, addr) = setup(4);
        let mut v = current(&store, &keeper, &addr);
        v.status = ValidatorStatus::Paused;
        keeper.staking.set_validator(&mut store, &v).unwrap();
        for h in 0..4 {
            keeper
                .handle_validator_signature(&mut store, &addr, false, h, 0)
                .unwrap();
        }
        assert_eq!(current(&store, &keeper, &addr).status, ValidatorStatus::Paused);
    }

    #[tokio::test]
    async fn begin_block_applies_every_fact() {
        let (mut store, keeper, addr) = setup(4);
        let header = BlockHeader {
            height: 2,
            time: 20,
            last_commit: vec![
                SigningFact {
                    address: addr,
                    signed: true,
                },
                SigningFact {
                    address: ConsAddress([7; 20]),
                    signed: false,
                },
            ],
        };
        keeper.on_begin_block(&mut store, &header).await.unwrap();
        let v = current(&store, &keeper, &addr);
        assert_eq!((v.rank, v.streak), (1, 1));
    }
}
