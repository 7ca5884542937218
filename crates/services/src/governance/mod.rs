// Path: crates/services/src/governance/mod.rs
//! Governance proposals: submission, voting, tallying and enactment.
//!
//! A proposal is tallied in the first end-block at or after its `voting_end_time`.
//! Enacted proposals are queued under their `enactment_time` and applied exactly once,
//! each inside its own overlay so a failing enactment leaves no partial writes.

use crate::permissions::PermissionKeeper;
use crate::properties::PropertyKeeper;
use crate::staking::StakingKeeper;
use async_trait::async_trait;
use bastion_api::lifecycle::OnEndBlock;
use bastion_api::services::BlockchainService;
use bastion_api::state::{StateAccess, StateAccessExt, StateOverlay};
use bastion_api::transaction::context::TxContext;
use bastion_telemetry::governance_metrics;
use bastion_types::app::{
    paginate, DataRegistryEntry, PageRequest, PageResponse, PermissionSet, PoorNetworkMessages,
    Proposal, ProposalContent, ProposalResult, Role, TallyResult, Vote, VoteOption,
};
use bastion_types::error::{
    GovernanceError, PermissionError, StateError, TransactionError, ValidatorError,
};
use bastion_types::keys::{
    enactment_key, proposal_key, vote_key, vote_prefix, GOVERNANCE_ENACTMENT_PREFIX,
    GOVERNANCE_NEXT_PROPOSAL_ID_KEY, GOVERNANCE_PROPOSAL_KEY_PREFIX,
};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct GovernanceModule {
    permissions: PermissionKeeper,
    properties: PropertyKeeper,
    staking: StakingKeeper,
}

fn result_label(result: ProposalResult) -> &'static str {
    match result {
        ProposalResult::Pending => "pending",
        ProposalResult::Enacted => "enacted",
        ProposalResult::Rejected => "rejected",
    }
}

/// Only state-layer failures are fatal; everything else is a recoverable rejection.
fn into_state_error(err: TransactionError) -> StateError {
    match err {
        TransactionError::State(e) => e,
        other => StateError::Invariant(other.to_string()),
    }
}

impl GovernanceModule {
    pub fn new(
        permissions: PermissionKeeper,
        properties: PropertyKeeper,
        staking: StakingKeeper,
    ) -> Self {
        Self {
            permissions,
            properties,
            staking,
        }
    }

    pub fn set_next_proposal_id(
        &self,
        state: &mut dyn StateAccess,
        id: u64,
    ) -> Result<(), StateError> {
        state.put_encoded(GOVERNANCE_NEXT_PROPOSAL_ID_KEY, &id)
    }

    fn next_proposal_id(&self, state: &mut dyn StateAccess) -> Result<u64, StateError> {
        let id = state
            .get_decoded::<u64>(GOVERNANCE_NEXT_PROPOSAL_ID_KEY)?
            .unwrap_or(1);
        self.set_next_proposal_id(state, id.saturating_add(1))?;
        Ok(id)
    }

    fn unauthorized(signer: impl std::fmt::Display, what: impl std::fmt::Display) -> TransactionError {
        GovernanceError::Unauthorized(format!("{} may not {}", signer, what)).into()
    }

    /// Checks that depend on current state rather than the content alone.
    fn validate_against_state(
        &self,
        state: &dyn StateAccess,
        content: &ProposalContent,
    ) -> Result<(), TransactionError> {
        match content {
            ProposalContent::AssignPermission {
                address,
                permission,
            } => {
                if let Some(actor) = self.permissions.actor(state, address)? {
                    if actor.permissions.is_blacklisted(*permission) {
                        return Err(PermissionError::AlreadyBlacklisted(*permission).into());
                    }
                }
            }
            ProposalContent::SetNetworkProperty { property, value } => {
                let mut props = self.properties.network_properties(state)?;
                props
                    .set(*property, *value)
                    .and_then(|()| props.validate())
                    .map_err(|e| GovernanceError::InvalidContent(e.to_string()))?;
            }
            ProposalContent::CreateRole { role_id, .. } => {
                if self.permissions.role(state, *role_id)?.is_some() {
                    return Err(GovernanceError::RoleExists(*role_id).into());
                }
            }
            ProposalContent::UnjailValidator { val_key, .. } => {
                if self.staking.validator(state, val_key)?.tombstoned {
                    return Err(ValidatorError::Tombstoned.into());
                }
            }
            ProposalContent::SetPoorNetworkMessages { .. }
            | ProposalContent::UpsertDataRegistry { .. } => {}
        }
        Ok(())
    }

    /// Creates a proposal, returning its id. Content that fails validation is never stored.
    pub fn submit_proposal(
        &self,
        state: &mut dyn StateAccess,
        ctx: &TxContext,
        content: ProposalContent,
        description: String,
    ) -> Result<u64, TransactionError> {
        let create = content.create_permission();
        if !self.permissions.is_allowed(state, &ctx.signer, create)? {
            return Err(Self::unauthorized(ctx.signer, format_args!("submit {}", create)));
        }
        content.validate_basic()?;
        self.validate_against_state(state, &content)?;

        let props = self.properties.network_properties(state)?;
        let id = self.next_proposal_id(state)?;
        let voting_end_time = ctx.block_time.saturating_add(props.proposal_end_time);
        let proposal = Proposal {
            id,
            proposer: ctx.signer,
            content,
            description,
            submit_time: ctx.block_time,
            voting_end_time,
            enactment_time: voting_end_time.saturating_add(props.proposal_enactment_time),
            result: ProposalResult::Pending,
            tally: None,
            applied_at: None,
            enactment_error: None,
        };
        state.put_encoded(&proposal_key(id), &proposal)?;

        tracing::info!(
            target: "gov",
            id,
            kind = proposal.content.msg_type(),
            proposer = %ctx.signer,
            voting_end_time,
            "proposal submitted"
        );
        governance_metrics().inc_proposals_submitted(proposal.content.msg_type());
        Ok(id)
    }

    /// Records or replaces the signer's vote while voting is open.
    pub fn vote(
        &self,
        state: &mut dyn StateAccess,
        ctx: &TxContext,
        proposal_id: u64,
        option: VoteOption,
    ) -> Result<(), TransactionError> {
        let proposal = self.proposal(state, proposal_id)?;
        if proposal.result != ProposalResult::Pending || ctx.block_time >= proposal.voting_end_time
        {
            return Err(GovernanceError::VotingClosed(proposal_id).into());
        }

        let permission = proposal.content.vote_permission();
        let actor = self
            .permissions
            .actor(state, &ctx.signer)?
            .ok_or_else(|| Self::unauthorized(ctx.signer, format_args!("vote with {}", permission)))?;
        if !self
            .permissions
            .actor_has_permission(state, &actor, permission)?
        {
            return Err(Self::unauthorized(ctx.signer, format_args!("vote with {}", permission)));
        }
        if !actor.may_cast(option) {
            return Err(Self::unauthorized(ctx.signer, format_args!("cast {:?}", option)));
        }

        state.put_encoded(
            &vote_key(proposal_id, &ctx.signer),
            &Vote {
                proposal_id,
                voter: ctx.signer,
                option,
            },
        )?;
        tracing::debug!(target: "gov", proposal_id, voter = %ctx.signer, ?option, "vote recorded");
        Ok(())
    }

    // --- Queries ---

    pub fn proposal(&self, state: &dyn StateAccess, id: u64) -> Result<Proposal, TransactionError> {
        state
            .get_decoded(&proposal_key(id))?
            .ok_or_else(|| GovernanceError::ProposalNotFound(id).into())
    }

    pub fn proposals(
        &self,
        state: &dyn StateAccess,
        page: &PageRequest,
    ) -> Result<(Vec<Proposal>, PageResponse), StateError> {
        let all = state.scan_decoded::<Proposal>(GOVERNANCE_PROPOSAL_KEY_PREFIX)?;
        Ok(paginate(all.into_iter().map(|(_, p)| p), page))
    }

    pub fn votes(&self, state: &dyn StateAccess, proposal_id: u64) -> Result<Vec<Vote>, StateError> {
        Ok(state
            .scan_decoded::<Vote>(&vote_prefix(proposal_id))?
            .into_iter()
            .map(|(_, v)| v)
            .collect())
    }

    // --- Resolution ---

    /// Counts the votes of currently eligible voters and fixes the proposal's result.
    pub fn tally(&self, state: &mut dyn StateAccess, proposal: &mut Proposal) -> Result<(), StateError> {
        let quorum = self.properties.network_properties(state)?.vote_quorum;
        let permission = proposal.content.vote_permission();

        let mut eligible = BTreeSet::new();
        for actor in self.permissions.actors(state)? {
            if self
                .permissions
                .actor_has_permission(state, &actor, permission)?
            {
                eligible.insert(actor.address);
            }
        }
        let mut tally = TallyResult {
            eligible: eligible.len() as u64,
            ..Default::default()
        };
        for vote in self.votes(state, proposal.id)? {
            if eligible.contains(&vote.voter) {
                tally.add(vote.option);
            }
        }

        proposal.result = tally.outcome(quorum);
        proposal.tally = Some(tally);
        state.put_encoded(&proposal_key(proposal.id), proposal)?;
        if proposal.result == ProposalResult::Enacted {
            state.put_encoded(
                &enactment_key(proposal.enactment_time, proposal.id),
                &proposal.id,
            )?;
        }

        log::info!(
            "Proposal {} {}: yes {}, no {}, veto {}, abstain {} of {} eligible (quorum {}%)",
            proposal.id,
            result_label(proposal.result),
            tally.yes,
            tally.no,
            tally.no_with_veto,
            tally.abstain,
            tally.eligible,
            quorum
        );
        governance_metrics().inc_proposals_finalized(result_label(proposal.result));
        Ok(())
    }

    fn apply_content(
        &self,
        state: &mut dyn StateAccess,
        content: &ProposalContent,
        ctx: &TxContext,
    ) -> Result<(), TransactionError> {
        match content {
            ProposalContent::AssignPermission {
                address,
                permission,
            } => self
                .permissions
                .assign_permission(state, address, *permission, ctx.block_height),
            ProposalContent::SetNetworkProperty { property, value } => {
                self.properties.set_property(state, *property, *value)
            }
            ProposalContent::SetPoorNetworkMessages { messages } => {
                self.properties.set_poor_network_messages(
                    state,
                    &PoorNetworkMessages {
                        messages: messages.clone(),
                    },
                )?;
                Ok(())
            }
            ProposalContent::CreateRole {
                role_id,
                name,
                whitelist,
                blacklist,
            } => self.permissions.insert_role(
                state,
                Role {
                    id: *role_id,
                    name: name.clone(),
                    permissions: PermissionSet {
                        whitelist: whitelist.clone(),
                        blacklist: blacklist.clone(),
                    },
                },
            ),
            ProposalContent::UpsertDataRegistry {
                key,
                hash,
                reference,
                encoding,
                size,
            } => {
                self.properties.upsert_data_registry(
                    state,
                    key,
                    &DataRegistryEntry {
                        hash: hash.clone(),
                        reference: reference.clone(),
                        encoding: encoding.clone(),
                        size: *size,
                    },
                )?;
                Ok(())
            }
            ProposalContent::UnjailValidator { val_key, .. } => {
                self.staking.unjail(state, val_key, ctx.block_time)
            }
        }
    }

    /// Applies every queued enactment whose time has come, in (time, id) order.
    pub fn enact_due(&self, state: &mut dyn StateAccess, ctx: &TxContext) -> Result<(), StateError> {
        let queued = state.scan_decoded::<u64>(GOVERNANCE_ENACTMENT_PREFIX)?;
        for (queue_key, id) in queued {
            let mut proposal = self.proposal(state, id).map_err(into_state_error)?;
            if proposal.enactment_time > ctx.block_time {
                break;
            }

            let kind = proposal.content.msg_type();
            let outcome = {
                let mut overlay = StateOverlay::new(&*state);
                self.apply_content(&mut overlay, &proposal.content, ctx)
                    .map(|()| overlay.into_ordered_batch())
            };
            match outcome {
                Ok((inserts, deletes)) => {
                    state.batch_apply(&inserts, &deletes)?;
                    tracing::info!(target: "gov", id, kind, "proposal enacted");
                    governance_metrics().inc_enactments(kind, true);
                }
                Err(e) if e.is_fatal() => {
                    tracing::error!(target: "gov", id, kind, error = %e, "enactment failed fatally");
                    return Err(into_state_error(e));
                }
                Err(e) => {
                    tracing::warn!(target: "gov", id, kind, error = %e, "enactment rejected");
                    proposal.enactment_error = Some(e.to_string());
                    governance_metrics().inc_enactments(kind, false);
                }
            }

            proposal.applied_at = Some(ctx.block_time);
            state.put_encoded(&proposal_key(id), &proposal)?;
            state.delete(&queue_key)?;
        }
        Ok(())
    }
}

impl BlockchainService for GovernanceModule {
    fn id(&self) -> &str {
        "governance"
    }
}

#[async_trait]
impl OnEndBlock for GovernanceModule {
    async fn on_end_block(
        &self,
        state: &mut dyn StateAccess,
        ctx: &TxContext,
    ) -> Result<(), StateError> {
        let due: Vec<Proposal> = state
            .scan_decoded::<Proposal>(GOVERNANCE_PROPOSAL_KEY_PREFIX)?
            .into_iter()
            .map(|(_, p)| p)
            .filter(|p| p.result == ProposalResult::Pending && ctx.block_time >= p.voting_end_time)
            .collect();
        for mut proposal in due {
            self.tally(state, &mut proposal)?;
        }
        self.enact_due(state, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_api::state::MemoryStore;
    use bastion_types::app::{
        AccountId, NetworkActor, NetworkProperties, NetworkProperty, PermValue, SUDO_ROLE_ID,
    };
    use bastion_types::config::default_roles;

    fn addr(n: u8) -> AccountId {
        AccountId([n; 32])
    }

    /// A store with default properties and `councillors` Sudo actors (addresses 1..=n).
    fn setup(councillors: u8) -> (MemoryStore, GovernanceModule) {
        let mut store = MemoryStore::default();
        let gov = GovernanceModule::default();
        gov.properties
            .set_network_properties(&mut store, &NetworkProperties::default())
            .unwrap();
        for role in default_roles() {
            gov.permissions.set_role(&mut store, &role).unwrap();
        }
        for n in 1..=councillors {
            let mut actor = NetworkActor::new(addr(n), 0);
            actor.roles.insert(SUDO_ROLE_ID);
            gov.permissions.set_actor(&mut store, &actor).unwrap();
        }
        (store, gov)
    }

    fn at(signer: u8, time: u64) -> TxContext {
        TxContext::for_block(time, time).with_signer(addr(signer))
    }

    fn min_fee_proposal() -> ProposalContent {
        ProposalContent::SetNetworkProperty {
            property: NetworkProperty::MinTxFee,
            value: 250,
        }
    }

    #[tokio::test]
    async fn enacted_proposal_applies_at_enactment_time() {
        let (mut store, gov) = setup(3);
        let id = gov
            .submit_proposal(&mut store, &at(1, 1_000), min_fee_proposal(), "raise fee".into())
            .unwrap();
        assert_eq!(id, 1);
        gov.vote(&mut store, &at(1, 1_100), id, VoteOption::Yes).unwrap();

        // Voting ends at 1_600, enactment at 1_900.
        gov.on_end_block(&mut store, &at(0, 1_599)).await.unwrap();
        assert_eq!(gov.proposal(&store, id).unwrap().result, ProposalResult::Pending);

        gov.on_end_block(&mut store, &at(0, 1_600)).await.unwrap();
        let p = gov.proposal(&store, id).unwrap();
        assert_eq!(p.result, ProposalResult::Enacted);
        assert_eq!(p.applied_at, None);
        assert_eq!(gov.properties.network_properties(&store).unwrap().min_tx_fee, 100);

        gov.on_end_block(&mut store, &at(0, 1_900)).await.unwrap();
        let p = gov.proposal(&store, id).unwrap();
        assert_eq!(p.applied_at, Some(1_900));
        assert_eq!(p.enactment_error, None);
        assert_eq!(gov.properties.network_properties(&store).unwrap().min_tx_fee, 250);
        assert!(store.prefix_scan(GOVERNANCE_ENACTMENT_PREFIX).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn turnout_below_quorum_is_rejected() {
        let (mut store, gov) = setup(4);
        let id = gov
            .submit_proposal(&mut store, &at(1, 0), min_fee_proposal(), String::new())
            .unwrap();
        // 1 of 4 eligible voters: 25% < 33%.
        gov.vote(&mut store, &at(2, 10), id, VoteOption::Yes).unwrap();
        gov.on_end_block(&mut store, &at(0, 600)).await.unwrap();

        let p = gov.proposal(&store, id).unwrap();
        assert_eq!(p.result, ProposalResult::Rejected);
        assert_eq!(p.tally.unwrap().eligible, 4);
    }

    #[tokio::test]
    async fn veto_counts_against_yes() {
        let (mut store, gov) = setup(3);
        let id = gov
            .submit_proposal(&mut store, &at(1, 0), min_fee_proposal(), String::new())
            .unwrap();
        gov.vote(&mut store, &at(1, 1), id, VoteOption::Yes).unwrap();
        gov.vote(&mut store, &at(2, 1), id, VoteOption::No).unwrap();
        gov.vote(&mut store, &at(3, 1), id, VoteOption::NoWithVeto).unwrap();
        // Last write wins before the deadline.
        gov.vote(&mut store, &at(3, 2), id, VoteOption::Abstain).unwrap();
        gov.on_end_block(&mut store, &at(0, 600)).await.unwrap();
        assert_eq!(gov.proposal(&store, id).unwrap().result, ProposalResult::Rejected);
        assert_eq!(gov.votes(&store, id).unwrap().len(), 3);
    }

    #[test]
    fn voting_closes_at_the_deadline() {
        let (mut store, gov) = setup(1);
        let id = gov
            .submit_proposal(&mut store, &at(1, 0), min_fee_proposal(), String::new())
            .unwrap();
        assert_eq!(
            gov.vote(&mut store, &at(1, 600), id, VoteOption::Yes),
            Err(GovernanceError::VotingClosed(id).into())
        );
        assert_eq!(
            gov.vote(&mut store, &at(1, 0), 42, VoteOption::Yes),
            Err(GovernanceError::ProposalNotFound(42).into())
        );
    }

    #[test]
    fn submission_is_gated_and_validated() {
        let (mut store, gov) = setup(1);
        assert!(matches!(
            gov.submit_proposal(&mut store, &at(9, 0), min_fee_proposal(), String::new()),
            Err(TransactionError::Governance(GovernanceError::Unauthorized(_)))
        ));
        assert!(matches!(
            gov.submit_proposal(
                &mut store,
                &at(1, 0),
                ProposalContent::AssignPermission {
                    address: addr(5),
                    permission: PermValue::Zero,
                },
                String::new()
            ),
            Err(TransactionError::Governance(GovernanceError::InvalidContent(_)))
        ));
        assert!(matches!(
            gov.submit_proposal(
                &mut store,
                &at(1, 0),
                ProposalContent::SetNetworkProperty {
                    property: NetworkProperty::MinTxFee,
                    value: 5_000_000,
                },
                String::new()
            ),
            Err(TransactionError::Governance(GovernanceError::InvalidContent(_)))
        ));
        assert_eq!(
            gov.submit_proposal(
                &mut store,
                &at(1, 0),
                ProposalContent::CreateRole {
                    role_id: SUDO_ROLE_ID,
                    name: "dup".into(),
                    whitelist: Default::default(),
                    blacklist: Default::default(),
                },
                String::new()
            ),
            Err(GovernanceError::RoleExists(SUDO_ROLE_ID).into())
        );
        // Rejected submissions never consume an id.
        assert_eq!(
            gov.submit_proposal(&mut store, &at(1, 0), min_fee_proposal(), String::new()),
            Ok(1)
        );
    }

    #[tokio::test]
    async fn failed_enactment_is_recorded_without_partial_writes() {
        let (mut store, gov) = setup(1);
        let content = ProposalContent::CreateRole {
            role_id: 10,
            name: "auditors".into(),
            whitelist: [PermValue::ClaimCouncilor].into_iter().collect(),
            blacklist: Default::default(),
        };
        let id = gov
            .submit_proposal(&mut store, &at(1, 0), content, String::new())
            .unwrap();
        gov.vote(&mut store, &at(1, 1), id, VoteOption::Yes).unwrap();
        gov.on_end_block(&mut store, &at(0, 600)).await.unwrap();

        // The role appears through another path before enactment.
        gov.permissions
            .create_role(&mut store, &at(1, 700), 10, "first")
            .unwrap();
        gov.on_end_block(&mut store, &at(0, 900)).await.unwrap();

        let p = gov.proposal(&store, id).unwrap();
        assert_eq!(p.result, ProposalResult::Enacted);
        assert_eq!(p.applied_at, Some(900));
        assert!(p.enactment_error.unwrap().contains("already exists"));
        assert_eq!(gov.permissions.role(&store, 10).unwrap().unwrap().name, "first");

        // Nothing is re-applied later.
        gov.on_end_block(&mut store, &at(0, 2_000)).await.unwrap();
        assert_eq!(gov.proposal(&store, id).unwrap().applied_at, Some(900));
    }

    #[test]
    fn proposals_are_listed_by_id() {
        let (mut store, gov) = setup(1);
        for _ in 0..3 {
            gov.submit_proposal(&mut store, &at(1, 0), min_fee_proposal(), String::new())
                .unwrap();
        }
        let (page, resp) = gov
            .proposals(
                &store,
                &PageRequest {
                    offset: 1,
                    limit: 5,
                    count_total: true,
                },
            )
            .unwrap();
        assert_eq!(page.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(resp.total, Some(3));
    }
}
