// Path: crates/services/src/staking/mod.rs
//! Validator seats and their lifecycle.
//!
//! ```text
//!   Active --pause--> Paused --unpause--> Active
//!   Active --missed blocks / tombstone--> Inactive --activate (after jail)--> Active
//! ```
//!
//! Leaving `Inactive` or `Paused` clears the signing window so stale misses are never
//! counted against a freshly active validator. A tombstoned validator never becomes
//! Active again.

use crate::permissions::PermissionKeeper;
use crate::properties::PropertyKeeper;
use bastion_api::state::{StateAccess, StateAccessExt};
use bastion_api::transaction::context::TxContext;
use bastion_telemetry::reputation_metrics;
use bastion_types::app::{
    paginate, AccountId, ActorStatus, ClaimValidatorParams, ConsAddress, PageRequest,
    PageResponse, PermValue, SigningWindow, Validator, ValidatorSigningInfo, ValidatorStatus,
};
use bastion_types::config::SigningParams;
use bastion_types::error::{StateError, TransactionError, ValidatorError};
use bastion_types::keys::{
    missed_blocks_key, signing_info_key, validator_by_cons_key, validator_by_moniker_key,
    validator_key, VALIDATOR_PREFIX,
};

const MAX_MONIKER_LEN: usize = 64;

/// Filters for [`StakingKeeper::query_validators`]. Every set filter must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatorQuery {
    /// `ACTIVE`, `PAUSED` or `INACTIVE`, case-insensitive.
    pub status: Option<String>,
    /// Operator address (the validator's `val_key`).
    pub address: Option<AccountId>,
    /// Consensus public key.
    pub pubkey: Option<Vec<u8>>,
    /// Moniker, case-insensitive.
    pub moniker: Option<String>,
    /// Consensus address of a block proposer.
    pub proposer: Option<ConsAddress>,
    /// Return every validator and every actor whitelisted to claim a seat, ignoring
    /// filters and pagination.
    pub all: bool,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatorQueryResponse {
    pub validators: Vec<Validator>,
    /// Only populated in `all` mode.
    pub actors: Vec<AccountId>,
    pub pagination: PageResponse,
}

/// Keeper for [`Validator`] records, their indexes, signing info and windows.
#[derive(Debug, Clone, Default)]
pub struct StakingKeeper {
    signing: SigningParams,
    permissions: PermissionKeeper,
    properties: PropertyKeeper,
}

impl StakingKeeper {
    pub fn new(signing: SigningParams, permissions: PermissionKeeper, properties: PropertyKeeper) -> Self {
        Self {
            signing,
            permissions,
            properties,
        }
    }

    pub fn signing_params(&self) -> &SigningParams {
        &self.signing
    }

    // --- Records ---

    pub fn get_validator(
        &self,
        state: &dyn StateAccess,
        val_key: &AccountId,
    ) -> Result<Option<Validator>, StateError> {
        state.get_decoded(&validator_key(val_key))
    }

    pub fn validator(
        &self,
        state: &dyn StateAccess,
        val_key: &AccountId,
    ) -> Result<Validator, TransactionError> {
        self.get_validator(state, val_key)?
            .ok_or_else(|| ValidatorError::NotFound(val_key.to_string()).into())
    }

    pub fn get_validator_by_cons_addr(
        &self,
        state: &dyn StateAccess,
        addr: &ConsAddress,
    ) -> Result<Option<Validator>, StateError> {
        match state.get_decoded::<AccountId>(&validator_by_cons_key(addr))? {
            Some(val_key) => self.get_validator(state, &val_key),
            None => Ok(None),
        }
    }

    pub fn validator_by_cons_addr(
        &self,
        state: &dyn StateAccess,
        addr: &ConsAddress,
    ) -> Result<Validator, TransactionError> {
        self.get_validator_by_cons_addr(state, addr)?
            .ok_or_else(|| ValidatorError::NotFound(addr.to_string()).into())
    }

    pub fn validator_by_moniker(
        &self,
        state: &dyn StateAccess,
        moniker: &str,
    ) -> Result<Validator, TransactionError> {
        let val_key = state
            .get_decoded::<AccountId>(&validator_by_moniker_key(moniker))?
            .ok_or_else(|| ValidatorError::NotFound(moniker.to_string()))?;
        self.validator(state, &val_key)
    }

    /// Writes the validator after checking rank and streak are non-negative.
    pub fn set_validator(
        &self,
        state: &mut dyn StateAccess,
        validator: &Validator,
    ) -> Result<(), StateError> {
        validator.check_invariants()?;
        state.put_encoded(&validator_key(&validator.val_key), validator)
    }

    pub fn validators(&self, state: &dyn StateAccess) -> Result<Vec<Validator>, StateError> {
        Ok(state
            .scan_decoded::<Validator>(VALIDATOR_PREFIX)?
            .into_iter()
            .map(|(_, v)| v)
            .collect())
    }

    pub fn active_validator_count(&self, state: &dyn StateAccess) -> Result<u64, StateError> {
        Ok(self
            .validators(state)?
            .iter()
            .filter(|v| v.is_active())
            .count() as u64)
    }

    pub fn signing_info(
        &self,
        state: &dyn StateAccess,
        addr: &ConsAddress,
    ) -> Result<ValidatorSigningInfo, StateError> {
        state
            .get_decoded(&signing_info_key(addr))?
            .ok_or_else(|| StateError::Invariant(format!("validator {} has no signing info", addr)))
    }

    pub fn set_signing_info(
        &self,
        state: &mut dyn StateAccess,
        info: &ValidatorSigningInfo,
    ) -> Result<(), StateError> {
        state.put_encoded(&signing_info_key(&info.address), info)
    }

    /// The validator's window, or an empty one sized to the configured length.
    pub fn signing_window(
        &self,
        state: &dyn StateAccess,
        addr: &ConsAddress,
    ) -> Result<SigningWindow, StateError> {
        Ok(state
            .get_decoded(&missed_blocks_key(addr))?
            .unwrap_or_else(|| SigningWindow::new(self.signing.signed_blocks_window)))
    }

    pub fn set_signing_window(
        &self,
        state: &mut dyn StateAccess,
        addr: &ConsAddress,
        window: &SigningWindow,
    ) -> Result<(), StateError> {
        state.put_encoded(&missed_blocks_key(addr), window)
    }

    /// Clears the window and zeroes the offset and missed counter, syncing the signing
    /// info with the validator's jail and tombstone state.
    fn reset_signing(&self, state: &mut dyn StateAccess, validator: &Validator) -> Result<(), StateError> {
        let addr = validator.cons_address();
        let mut info = self.signing_info(state, &addr)?;
        info.index_offset = 0;
        info.missed_blocks_counter = 0;
        info.inactive_until = validator.inactive_until;
        info.tombstoned = validator.tombstoned;
        self.set_signing_info(state, &info)?;
        self.set_signing_window(
            state,
            &addr,
            &SigningWindow::new(self.signing.signed_blocks_window),
        )
    }

    // --- Seat creation ---

    /// Creates a validator seat without a permission check. Used by genesis and by
    /// [`StakingKeeper::claim_validator`].
    pub fn create_validator(
        &self,
        state: &mut dyn StateAccess,
        params: &ClaimValidatorParams,
        height: u64,
    ) -> Result<Validator, TransactionError> {
        let moniker = params.moniker.trim();
        if moniker.is_empty() || moniker.len() > MAX_MONIKER_LEN {
            return Err(ValidatorError::InvalidParams(format!(
                "moniker must be 1..={} bytes",
                MAX_MONIKER_LEN
            ))
            .into());
        }
        if params.cons_pubkey.is_empty() {
            return Err(ValidatorError::InvalidParams("empty consensus pubkey".into()).into());
        }
        if self.get_validator(state, &params.val_key)?.is_some() {
            return Err(ValidatorError::AlreadyClaimed(params.val_key.to_string()).into());
        }
        let addr = ConsAddress::from_pubkey(&params.cons_pubkey);
        if state.has(&validator_by_cons_key(&addr))? {
            return Err(ValidatorError::AlreadyClaimed(addr.to_string()).into());
        }
        if state.has(&validator_by_moniker_key(moniker))? {
            return Err(ValidatorError::MonikerTaken(moniker.to_string()).into());
        }

        let validator = Validator {
            val_key: params.val_key,
            cons_pubkey: params.cons_pubkey.clone(),
            moniker: moniker.to_string(),
            website: params.website.clone(),
            social: params.social.clone(),
            identity: params.identity.clone(),
            commission: params.commission,
            status: ValidatorStatus::Active,
            tombstoned: false,
            rank: 0,
            streak: 0,
            mischance: 0,
            inactive_until: 0,
        };
        self.set_validator(state, &validator)?;
        state.put_encoded(&validator_by_cons_key(&addr), &validator.val_key)?;
        state.put_encoded(&validator_by_moniker_key(moniker), &validator.val_key)?;
        self.set_signing_info(state, &ValidatorSigningInfo::new(addr, height))?;
        self.set_signing_window(
            state,
            &addr,
            &SigningWindow::new(self.signing.signed_blocks_window),
        )?;

        let mut actor = self
            .permissions
            .actor_or_new(state, &validator.val_key, height)?;
        actor.status = ActorStatus::Active;
        self.permissions.set_actor(state, &actor)?;

        tracing::info!(
            target: "staking",
            val_key = %validator.val_key,
            cons_addr = %addr,
            moniker = %validator.moniker,
            "validator seat claimed"
        );
        reputation_metrics().set_validator_rank(&validator.moniker, 0);
        Ok(validator)
    }

    // --- Lifecycle ---

    /// Moves an Active validator to Inactive: jails it for `jail_max_time`, applies the
    /// inactivation rank penalty and resets its window.
    pub fn inactivate(
        &self,
        state: &mut dyn StateAccess,
        validator: &mut Validator,
        now: u64,
    ) -> Result<(), StateError> {
        let props = self.properties.network_properties(state)?;
        validator.status = ValidatorStatus::Inactive;
        validator.inactive_until = now.saturating_add(props.jail_max_time);
        validator.apply_inactivation_penalty(props.inactive_rank_decrease_percent);
        self.set_validator(state, validator)?;
        self.reset_signing(state, validator)?;

        tracing::info!(
            target: "staking",
            val_key = %validator.val_key,
            rank = validator.rank,
            inactive_until = validator.inactive_until,
            "validator inactivated"
        );
        let metrics = reputation_metrics();
        metrics.inc_lifecycle_transition("inactivate");
        metrics.set_validator_rank(&validator.moniker, validator.rank);
        Ok(())
    }

    /// Entry point for double-sign evidence: permanently tombstones the validator and
    /// inactivates it if it is Active.
    pub fn tombstone(
        &self,
        state: &mut dyn StateAccess,
        addr: &ConsAddress,
        now: u64,
    ) -> Result<(), TransactionError> {
        let mut validator = self.validator_by_cons_addr(state, addr)?;
        if validator.tombstoned {
            return Ok(());
        }
        validator.tombstoned = true;
        if validator.status == ValidatorStatus::Active {
            self.inactivate(state, &mut validator, now)?;
        } else {
            self.set_validator(state, &validator)?;
            let mut info = self.signing_info(state, addr)?;
            info.tombstoned = true;
            self.set_signing_info(state, &info)?;
        }
        tracing::warn!(target: "staking", val_key = %validator.val_key, "validator tombstoned");
        reputation_metrics().inc_lifecycle_transition("tombstone");
        Ok(())
    }

    pub fn claim_validator(
        &self,
        state: &mut dyn StateAccess,
        ctx: &TxContext,
        params: &ClaimValidatorParams,
    ) -> Result<Validator, TransactionError> {
        self.permissions
            .require(state, &ctx.signer, PermValue::ClaimValidator)?;
        if params.val_key != ctx.signer {
            return Err(ValidatorError::InvalidParams(
                "val_key must be the signing account".into(),
            )
            .into());
        }
        self.create_validator(state, params, ctx.block_height)
    }

    pub fn pause(&self, state: &mut dyn StateAccess, ctx: &TxContext) -> Result<(), TransactionError> {
        let mut validator = self.validator(state, &ctx.signer)?;
        if validator.tombstoned {
            return Err(ValidatorError::Tombstoned.into());
        }
        match validator.status {
            ValidatorStatus::Active => {}
            ValidatorStatus::Paused => return Err(ValidatorError::NotActive.into()),
            ValidatorStatus::Inactive => {
                return Err(ValidatorError::WrongState(ValidatorStatus::Inactive).into())
            }
        }
        validator.status = ValidatorStatus::Paused;
        self.set_validator(state, &validator)?;
        tracing::info!(target: "staking", val_key = %validator.val_key, "validator paused");
        reputation_metrics().inc_lifecycle_transition("pause");
        Ok(())
    }

    pub fn unpause(&self, state: &mut dyn StateAccess, ctx: &TxContext) -> Result<(), TransactionError> {
        let mut validator = self.validator(state, &ctx.signer)?;
        if validator.tombstoned {
            return Err(ValidatorError::Tombstoned.into());
        }
        match validator.status {
            ValidatorStatus::Paused => {}
            ValidatorStatus::Active => return Err(ValidatorError::NotPaused.into()),
            ValidatorStatus::Inactive => {
                return Err(ValidatorError::WrongState(ValidatorStatus::Inactive).into())
            }
        }
        validator.status = ValidatorStatus::Active;
        self.set_validator(state, &validator)?;
        self.reset_signing(state, &validator)?;
        tracing::info!(target: "staking", val_key = %validator.val_key, "validator unpaused");
        reputation_metrics().inc_lifecycle_transition("unpause");
        Ok(())
    }

    pub fn activate(&self, state: &mut dyn StateAccess, ctx: &TxContext) -> Result<(), TransactionError> {
        let validator = self.validator(state, &ctx.signer)?;
        self.reinstate(state, validator, ctx.block_time, "activate")
    }

    /// Governance-driven reinstatement of an Inactive validator, subject to the same
    /// guards as a self-service `activate`.
    pub fn unjail(
        &self,
        state: &mut dyn StateAccess,
        val_key: &AccountId,
        now: u64,
    ) -> Result<(), TransactionError> {
        let mut validator = self.validator(state, val_key)?;
        // The proposal itself is the authorisation to skip the remaining jail time.
        validator.inactive_until = validator.inactive_until.min(now);
        self.reinstate(state, validator, now, "unjail")
    }

    fn reinstate(
        &self,
        state: &mut dyn StateAccess,
        mut validator: Validator,
        now: u64,
        transition: &'static str,
    ) -> Result<(), TransactionError> {
        if validator.tombstoned {
            return Err(ValidatorError::Tombstoned.into());
        }
        if validator.status != ValidatorStatus::Inactive {
            return Err(ValidatorError::NotInactive.into());
        }
        if now < validator.inactive_until {
            return Err(ValidatorError::StillInactive {
                until: validator.inactive_until,
                now,
            }
            .into());
        }
        validator.status = ValidatorStatus::Active;
        validator.inactive_until = 0;
        self.set_validator(state, &validator)?;
        self.reset_signing(state, &validator)?;
        tracing::info!(target: "staking", val_key = %validator.val_key, transition, "validator reactivated");
        reputation_metrics().inc_lifecycle_transition(transition);
        Ok(())
    }

    // --- Queries ---

    pub fn query_validators(
        &self,
        state: &dyn StateAccess,
        query: &ValidatorQuery,
    ) -> Result<ValidatorQueryResponse, TransactionError> {
        let validators = self.validators(state)?;
        if query.all {
            let actors = self
                .permissions
                .actors_with_whitelisted_permission(state, PermValue::ClaimValidator)?;
            return Ok(ValidatorQueryResponse {
                pagination: PageResponse {
                    total: Some(validators.len() as u64),
                    has_more: false,
                },
                validators,
                actors,
            });
        }

        let status = query
            .status
            .as_deref()
            .map(|s| s.parse::<ValidatorStatus>())
            .transpose()
            .map_err(ValidatorError::InvalidStatus)?;

        let matching = validators.into_iter().filter(|v| {
            status.map_or(true, |s| v.status == s)
                && query.address.map_or(true, |a| v.val_key == a)
                && query
                    .pubkey
                    .as_ref()
                    .map_or(true, |pk| &v.cons_pubkey == pk)
                && query
                    .moniker
                    .as_ref()
                    .map_or(true, |m| v.moniker.eq_ignore_ascii_case(m))
                && query.proposer.map_or(true, |p| v.cons_address() == p)
        });
        let (validators, pagination) = paginate(matching, &query.page);
        Ok(ValidatorQueryResponse {
            validators,
            actors: Vec::new(),
            pagination,
        })
    }
}
