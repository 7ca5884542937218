// Path: crates/types/src/app/governance.rs
//! Governance proposals, votes, tallies and the data registry.

use super::identity::AccountId;
use super::permissions::{PermValue, RoleId};
use super::properties::{check_value, NetworkProperty};
use super::tx::msg_types;
use crate::error::GovernanceError;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Represents a voting option for a governance proposal.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode,
)]
pub enum VoteOption {
    /// A vote in favor of the proposal.
    Yes,
    /// A vote against the proposal.
    No,
    /// An abstention; counts towards turnout only.
    Abstain,
    /// A vote against that counts on the `No` side of the majority test.
    NoWithVeto,
}

/// The change a proposal enacts once it passes.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum ProposalContent {
    /// Whitelist a permission for an actor.
    AssignPermission {
        /// Target actor.
        address: AccountId,
        /// Permission to whitelist.
        permission: PermValue,
    },
    /// Set a single network property.
    SetNetworkProperty {
        /// Property key.
        property: NetworkProperty,
        /// New value.
        value: u64,
    },
    /// Replace the poor-network allowlist.
    SetPoorNetworkMessages {
        /// Allowed message type tags.
        messages: BTreeSet<String>,
    },
    /// Create a new role.
    CreateRole {
        /// New role identifier.
        role_id: RoleId,
        /// Display name.
        name: String,
        /// Whitelisted permissions.
        whitelist: BTreeSet<PermValue>,
        /// Blacklisted permissions.
        blacklist: BTreeSet<PermValue>,
    },
    /// Insert or replace a data-registry record.
    UpsertDataRegistry {
        /// Registry key.
        key: String,
        /// Content hash.
        hash: String,
        /// Where the content lives.
        reference: String,
        /// Content encoding.
        encoding: String,
        /// Content size in bytes.
        size: u64,
    },
    /// Reinstate an inactive validator.
    UnjailValidator {
        /// Validator operator key.
        val_key: AccountId,
        /// Free-form justification.
        reference: String,
    },
}

impl ProposalContent {
    /// Permission required to submit this content.
    pub fn create_permission(&self) -> PermValue {
        match self {
            Self::AssignPermission { .. } => PermValue::CreateSetPermissionsProposal,
            Self::SetNetworkProperty { .. } => PermValue::CreateSetNetworkPropertyProposal,
            Self::SetPoorNetworkMessages { .. } => PermValue::CreateSetPoorNetworkMessagesProposal,
            Self::CreateRole { .. } => PermValue::CreateRoleProposal,
            Self::UpsertDataRegistry { .. } => PermValue::UpsertDataRegistryProposal,
            Self::UnjailValidator { .. } => PermValue::CreateUnjailValidatorProposal,
        }
    }

    /// Permission required to vote on this content.
    pub fn vote_permission(&self) -> PermValue {
        match self {
            Self::AssignPermission { .. } => PermValue::VoteSetPermissionProposal,
            Self::SetNetworkProperty { .. } => PermValue::VoteSetNetworkPropertyProposal,
            Self::SetPoorNetworkMessages { .. } => PermValue::VoteSetPoorNetworkMessagesProposal,
            Self::CreateRole { .. } => PermValue::VoteCreateRoleProposal,
            Self::UpsertDataRegistry { .. } => PermValue::VoteUpsertDataRegistryProposal,
            Self::UnjailValidator { .. } => PermValue::VoteUnjailValidatorProposal,
        }
    }

    /// Message type tag of the submission carrying this content.
    pub fn msg_type(&self) -> &'static str {
        match self {
            Self::AssignPermission { .. } => msg_types::PROPOSAL_ASSIGN_PERMISSION,
            Self::SetNetworkProperty { .. } => msg_types::PROPOSAL_SET_NETWORK_PROPERTY,
            Self::SetPoorNetworkMessages { .. } => msg_types::PROPOSAL_SET_POOR_NETWORK_MESSAGES,
            Self::CreateRole { .. } => msg_types::PROPOSAL_CREATE_ROLE,
            Self::UpsertDataRegistry { .. } => msg_types::PROPOSAL_UPSERT_DATA_REGISTRY,
            Self::UnjailValidator { .. } => msg_types::PROPOSAL_UNJAIL_VALIDATOR,
        }
    }

    /// Checks that need no state. State-dependent checks happen at submission.
    pub fn validate_basic(&self) -> Result<(), GovernanceError> {
        let invalid = |msg: &str| Err(GovernanceError::InvalidContent(msg.to_string()));
        match self {
            Self::AssignPermission { permission, .. } => {
                if *permission == PermValue::Zero {
                    return invalid("PERMISSION_ZERO cannot be assigned");
                }
            }
            Self::SetNetworkProperty { property, value } => {
                check_value(*property, *value)
                    .map_err(|e| GovernanceError::InvalidContent(e.to_string()))?;
            }
            Self::SetPoorNetworkMessages { messages } => {
                if messages.iter().any(|m| m.trim().is_empty()) {
                    return invalid("message type must not be empty");
                }
            }
            Self::CreateRole {
                role_id,
                whitelist,
                blacklist,
                ..
            } => {
                if *role_id == 0 {
                    return invalid("role id must be non-zero");
                }
                if !whitelist.is_disjoint(blacklist) {
                    return invalid("role whitelist and blacklist overlap");
                }
            }
            Self::UpsertDataRegistry { key, hash, .. } => {
                if key.trim().is_empty() || hash.trim().is_empty() {
                    return invalid("data registry key and hash must not be empty");
                }
            }
            Self::UnjailValidator { .. } => {}
        }
        Ok(())
    }
}

/// Outcome of a proposal. `Pending` until the voting period ends.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode)]
pub enum ProposalResult {
    /// Voting is open.
    Pending,
    /// Quorum met and the yes side won; applied at `enactment_time`.
    Enacted,
    /// Quorum missed or the yes side lost.
    Rejected,
}

/// Vote counts among eligible voters at tally time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode)]
pub struct TallyResult {
    /// Actors allowed to vote on the content.
    pub eligible: u64,
    /// `Yes` votes.
    pub yes: u64,
    /// `No` votes.
    pub no: u64,
    /// `Abstain` votes.
    pub abstain: u64,
    /// `NoWithVeto` votes.
    pub no_with_veto: u64,
}

impl TallyResult {
    /// Counts one vote.
    pub fn add(&mut self, option: VoteOption) {
        match option {
            VoteOption::Yes => self.yes += 1,
            VoteOption::No => self.no += 1,
            VoteOption::Abstain => self.abstain += 1,
            VoteOption::NoWithVeto => self.no_with_veto += 1,
        }
    }

    /// Total votes cast.
    pub fn turnout(&self) -> u64 {
        self.yes + self.no + self.abstain + self.no_with_veto
    }

    /// `turnout * 100 >= quorum * eligible`, with at least one eligible voter.
    pub fn quorum_met(&self, quorum_percent: u64) -> bool {
        self.eligible > 0
            && u128::from(self.turnout()) * 100
                >= u128::from(quorum_percent) * u128::from(self.eligible)
    }

    /// Final result for the given quorum.
    pub fn outcome(&self, quorum_percent: u64) -> ProposalResult {
        if self.quorum_met(quorum_percent) && self.yes > self.no + self.no_with_veto {
            ProposalResult::Enacted
        } else {
            ProposalResult::Rejected
        }
    }
}

/// A governance proposal. Votes are stored as separate records.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Proposal {
    /// Sequential identifier.
    pub id: u64,
    /// Submitting actor.
    pub proposer: AccountId,
    /// The change to enact.
    pub content: ProposalContent,
    /// Free-form description.
    pub description: String,
    /// Submission time (seconds).
    pub submit_time: u64,
    /// Votes are rejected at or after this time.
    pub voting_end_time: u64,
    /// Earliest time the content is applied.
    pub enactment_time: u64,
    /// Current result.
    pub result: ProposalResult,
    /// Final tally, set when the result becomes terminal.
    pub tally: Option<TallyResult>,
    /// Time the content was applied, if it has been.
    pub applied_at: Option<u64>,
    /// Error code if applying the content failed.
    pub enactment_error: Option<String>,
}

/// One actor's vote on one proposal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct Vote {
    /// Proposal voted on.
    pub proposal_id: u64,
    /// Voting actor.
    pub voter: AccountId,
    /// Chosen option.
    pub option: VoteOption,
}

/// A proposal-governed registry record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct DataRegistryEntry {
    /// Content hash.
    pub hash: String,
    /// Where the content lives.
    pub reference: String,
    /// Content encoding.
    pub encoding: String,
    /// Content size in bytes.
    pub size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(eligible: u64, votes: &[VoteOption]) -> TallyResult {
        let mut t = TallyResult {
            eligible,
            ..Default::default()
        };
        votes.iter().for_each(|v| t.add(*v));
        t
    }

    #[test]
    fn quorum_compares_turnout_against_eligible_voters() {
        use VoteOption::*;
        assert!(tally(3, &[Yes]).quorum_met(33));
        assert!(!tally(4, &[Yes]).quorum_met(33));
        assert!(!tally(0, &[]).quorum_met(0));
    }

    #[test]
    fn veto_counts_against_the_majority() {
        use VoteOption::*;
        assert_eq!(tally(3, &[Yes, Yes, No]).outcome(33), ProposalResult::Enacted);
        assert_eq!(
            tally(3, &[Yes, No, NoWithVeto]).outcome(33),
            ProposalResult::Rejected
        );
        assert_eq!(tally(4, &[Abstain, Abstain]).outcome(50), ProposalResult::Rejected);
    }

    #[test]
    fn structural_validation_rejects_bad_content() {
        let zero = ProposalContent::AssignPermission {
            address: AccountId::default(),
            permission: PermValue::Zero,
        };
        assert!(zero.validate_basic().is_err());

        let overlap = ProposalContent::CreateRole {
            role_id: 7,
            name: "ops".into(),
            whitelist: [PermValue::ChangeTxFee].into_iter().collect(),
            blacklist: [PermValue::ChangeTxFee].into_iter().collect(),
        };
        assert!(overlap.validate_basic().is_err());

        let quorum = ProposalContent::SetNetworkProperty {
            property: NetworkProperty::VoteQuorum,
            value: 150,
        };
        assert!(quorum.validate_basic().is_err());
    }

    #[test]
    fn every_content_has_distinct_create_and_vote_permissions() {
        let content = ProposalContent::UnjailValidator {
            val_key: AccountId::default(),
            reference: String::new(),
        };
        assert_eq!(
            content.create_permission(),
            PermValue::CreateUnjailValidatorProposal
        );
        assert_eq!(content.vote_permission(), PermValue::VoteUnjailValidatorProposal);
    }
}
