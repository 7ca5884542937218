// Path: crates/types/src/app/permissions.rs
//! Permission values, the two-set `PermissionSet`, actors and roles.

use super::governance::VoteOption;
use super::identity::AccountId;
use crate::error::PermissionError;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifier of a role.
pub type RoleId = u64;

/// Role that whitelists every governance permission at genesis.
pub const SUDO_ROLE_ID: RoleId = 1;
/// Role that whitelists `ClaimValidator` at genesis.
pub const VALIDATOR_ROLE_ID: RoleId = 2;

/// An enumerated permission tag. Numeric codes are part of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
#[derive(Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
#[allow(missing_docs)]
pub enum PermValue {
    Zero = 0,
    SetPermissions = 1,
    ClaimValidator = 2,
    ClaimCouncilor = 3,
    CreateSetPermissionsProposal = 4,
    VoteSetPermissionProposal = 5,
    UpsertTokenAlias = 6,
    ChangeTxFee = 7,
    UpsertTokenRate = 8,
    UpsertRole = 9,
    UpsertDataRegistryProposal = 10,
    VoteUpsertDataRegistryProposal = 11,
    CreateSetNetworkPropertyProposal = 12,
    VoteSetNetworkPropertyProposal = 13,
    CreateUpsertTokenAliasProposal = 14,
    CreateSetPoorNetworkMessagesProposal = 15,
    VoteUpsertTokenAliasProposal = 16,
    CreateUpsertTokenRateProposal = 17,
    VoteUpsertTokenRateProposal = 18,
    VoteSetPoorNetworkMessagesProposal = 19,
    CreateUnjailValidatorProposal = 20,
    VoteUnjailValidatorProposal = 21,
    CreateRoleProposal = 22,
    VoteCreateRoleProposal = 23,
}

const PERMISSION_NAMES: [(PermValue, &str); 24] = [
    (PermValue::Zero, "PERMISSION_ZERO"),
    (PermValue::SetPermissions, "PERMISSION_SET_PERMISSIONS"),
    (PermValue::ClaimValidator, "PERMISSION_CLAIM_VALIDATOR"),
    (PermValue::ClaimCouncilor, "PERMISSION_CLAIM_COUNCILOR"),
    (
        PermValue::CreateSetPermissionsProposal,
        "PERMISSION_CREATE_SET_PERMISSIONS_PROPOSAL",
    ),
    (
        PermValue::VoteSetPermissionProposal,
        "PERMISSION_VOTE_SET_PERMISSIONS_PROPOSAL",
    ),
    (PermValue::UpsertTokenAlias, "PERMISSION_UPSERT_TOKEN_ALIAS"),
    (PermValue::ChangeTxFee, "PERMISSION_CHANGE_TX_FEE"),
    (PermValue::UpsertTokenRate, "PERMISSION_UPSERT_TOKEN_RATE"),
    (PermValue::UpsertRole, "PERMISSION_UPSERT_ROLE"),
    (
        PermValue::UpsertDataRegistryProposal,
        "PERMISSION_UPSERT_DATA_REGISTRY_PROPOSAL",
    ),
    (
        PermValue::VoteUpsertDataRegistryProposal,
        "PERMISSION_VOTE_UPSERT_DATA_REGISTRY_PROPOSAL",
    ),
    (
        PermValue::CreateSetNetworkPropertyProposal,
        "PERMISSION_CREATE_SET_NETWORK_PROPERTY_PROPOSAL",
    ),
    (
        PermValue::VoteSetNetworkPropertyProposal,
        "PERMISSION_VOTE_SET_NETWORK_PROPERTY_PROPOSAL",
    ),
    (
        PermValue::CreateUpsertTokenAliasProposal,
        "PERMISSION_CREATE_UPSERT_TOKEN_ALIAS_PROPOSAL",
    ),
    (
        PermValue::CreateSetPoorNetworkMessagesProposal,
        "PERMISSION_CREATE_SET_POOR_NETWORK_MESSAGES",
    ),
    (
        PermValue::VoteUpsertTokenAliasProposal,
        "PERMISSION_VOTE_UPSERT_TOKEN_ALIAS_PROPOSAL",
    ),
    (
        PermValue::CreateUpsertTokenRateProposal,
        "PERMISSION_CREATE_UPSERT_TOKEN_RATE_PROPOSAL",
    ),
    (
        PermValue::VoteUpsertTokenRateProposal,
        "PERMISSION_VOTE_UPSERT_TOKEN_RATE_PROPOSAL",
    ),
    (
        PermValue::VoteSetPoorNetworkMessagesProposal,
        "PERMISSION_VOTE_SET_POOR_NETWORK_MESSAGES_PROPOSAL",
    ),
    (
        PermValue::CreateUnjailValidatorProposal,
        "PERMISSION_CREATE_UNJAIL_VALIDATOR_PROPOSAL",
    ),
    (
        PermValue::VoteUnjailValidatorProposal,
        "PERMISSION_VOTE_UNJAIL_VALIDATOR_PROPOSAL",
    ),
    (PermValue::CreateRoleProposal, "PERMISSION_CREATE_ROLE_PROPOSAL"),
    (
        PermValue::VoteCreateRoleProposal,
        "PERMISSION_VOTE_CREATE_ROLE_PROPOSAL",
    ),
];

impl PermValue {
    /// Every permission, in code order.
    pub fn all() -> impl Iterator<Item = PermValue> {
        PERMISSION_NAMES.iter().map(|(p, _)| *p)
    }

    /// The numeric wire code.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// The canonical `PERMISSION_*` name.
    pub fn name(self) -> &'static str {
        PERMISSION_NAMES
            .iter()
            .find(|(p, _)| *p == self)
            .map(|(_, n)| *n)
            .unwrap_or("PERMISSION_ZERO")
    }

    /// Looks a permission up by numeric code.
    pub fn from_code(code: u32) -> Result<Self, PermissionError> {
        Self::all()
            .find(|p| p.code() == code)
            .ok_or_else(|| PermissionError::Unknown(code.to_string()))
    }
}

impl core::fmt::Display for PermValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for PermValue {
    type Err = PermissionError;

    /// Accepts either the canonical name or the decimal code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = s.parse::<u32>() {
            return Self::from_code(code);
        }
        PERMISSION_NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(s))
            .map(|(p, _)| *p)
            .ok_or_else(|| PermissionError::Unknown(s.to_string()))
    }
}

impl From<PermValue> for String {
    fn from(p: PermValue) -> Self {
        p.name().to_string()
    }
}

impl TryFrom<String> for PermValue {
    type Error = PermissionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A two-set authorization primitive. A permission is never in both sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct PermissionSet {
    /// Explicitly granted permissions.
    #[serde(default)]
    pub whitelist: BTreeSet<PermValue>,
    /// Explicitly denied permissions.
    #[serde(default)]
    pub blacklist: BTreeSet<PermValue>,
}

impl PermissionSet {
    /// A set whitelisting exactly the given permissions.
    pub fn whitelisting(perms: impl IntoIterator<Item = PermValue>) -> Self {
        Self {
            whitelist: perms.into_iter().collect(),
            blacklist: BTreeSet::new(),
        }
    }

    /// Returns `true` if `p` is whitelisted.
    pub fn is_whitelisted(&self, p: PermValue) -> bool {
        self.whitelist.contains(&p)
    }

    /// Returns `true` if `p` is blacklisted.
    pub fn is_blacklisted(&self, p: PermValue) -> bool {
        self.blacklist.contains(&p)
    }

    /// Whitelists `p`. Idempotent; fails if `p` is blacklisted.
    pub fn add_to_whitelist(&mut self, p: PermValue) -> Result<(), PermissionError> {
        if self.is_blacklisted(p) {
            return Err(PermissionError::AlreadyBlacklisted(p));
        }
        self.whitelist.insert(p);
        Ok(())
    }

    /// Blacklists `p`. Idempotent; fails if `p` is whitelisted.
    pub fn add_to_blacklist(&mut self, p: PermValue) -> Result<(), PermissionError> {
        if self.is_whitelisted(p) {
            return Err(PermissionError::AlreadyWhitelisted(p));
        }
        self.blacklist.insert(p);
        Ok(())
    }

    /// Removes `p` from the whitelist.
    pub fn remove_from_whitelist(&mut self, p: PermValue) -> Result<(), PermissionError> {
        if !self.whitelist.remove(&p) {
            return Err(PermissionError::NotWhitelisted(p));
        }
        Ok(())
    }

    /// Removes `p` from the blacklist.
    pub fn remove_from_blacklist(&mut self, p: PermValue) -> Result<(), PermissionError> {
        if !self.blacklist.remove(&p) {
            return Err(PermissionError::NotBlacklisted(p));
        }
        Ok(())
    }

    /// The explicit rule this set holds for `p`, if any. Blacklist wins.
    pub fn rule_for(&self, p: PermValue) -> Option<bool> {
        if self.is_blacklisted(p) {
            Some(false)
        } else if self.is_whitelisted(p) {
            Some(true)
        } else {
            None
        }
    }

    /// Returns `true` if the two sets share no permission.
    pub fn is_disjoint(&self) -> bool {
        self.whitelist.is_disjoint(&self.blacklist)
    }
}

/// Resolves whether an actor is granted `p`.
///
/// Precedence: actor blacklist, actor whitelist, then each role in the order given
/// (first explicit rule wins). Anything unmatched is denied.
pub fn resolve_permission<'a>(
    actor: &PermissionSet,
    roles: impl IntoIterator<Item = &'a PermissionSet>,
    p: PermValue,
) -> bool {
    if let Some(rule) = actor.rule_for(p) {
        return rule;
    }
    roles
        .into_iter()
        .find_map(|role| role.rule_for(p))
        .unwrap_or(false)
}

/// Status of a network actor. Independent of any validator status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum ActorStatus {
    #[default]
    Undefined,
    Unclaimed,
    Active,
    Paused,
    Inactive,
    Jailed,
    Removed,
}

/// An address-identified participant with roles and permissions.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct NetworkActor {
    /// The actor's address.
    pub address: AccountId,
    /// Assigned roles.
    #[serde(default)]
    pub roles: BTreeSet<RoleId>,
    /// Actor status.
    #[serde(default)]
    pub status: ActorStatus,
    /// Directly assigned permissions.
    #[serde(default)]
    pub permissions: PermissionSet,
    /// Vote options this actor is allowed to cast. Empty means all options.
    #[serde(default)]
    pub voting_options: BTreeSet<VoteOption>,
    /// Height at which the actor record was created.
    #[serde(default)]
    pub join_height: u64,
}

impl NetworkActor {
    /// A fresh actor with no roles or permissions.
    pub fn new(address: AccountId, join_height: u64) -> Self {
        Self {
            address,
            roles: BTreeSet::new(),
            status: ActorStatus::Undefined,
            permissions: PermissionSet::default(),
            voting_options: BTreeSet::new(),
            join_height,
        }
    }

    /// Returns `true` if the actor may cast `option`.
    pub fn may_cast(&self, option: VoteOption) -> bool {
        self.voting_options.is_empty() || self.voting_options.contains(&option)
    }
}

/// A named bundle of default permissions.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Role {
    /// Role identifier.
    pub id: RoleId,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Permissions granted or denied to every holder.
    #[serde(default)]
    pub permissions: PermissionSet,
}
