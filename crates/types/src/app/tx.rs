// Path: crates/types/src/app/tx.rs
//! Transactions, messages, coins and token rates.

use super::governance::{ProposalContent, VoteOption};
use super::identity::AccountId;
use super::permissions::{PermValue, RoleId};
use super::properties::{ExecutionFee, NetworkProperties};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Message type tags. These key the execution-fee table and the poor-network allowlist.
pub mod msg_types {
    #![allow(missing_docs)]
    pub const BANK_SEND: &str = "send";
    pub const CLAIM_VALIDATOR: &str = "claim-validator";
    pub const CLAIM_COUNCILOR: &str = "claim-councilor";
    pub const ACTIVATE: &str = "activate";
    pub const PAUSE: &str = "pause";
    pub const UNPAUSE: &str = "unpause";
    pub const WHITELIST_PERMISSIONS: &str = "whitelist-permissions";
    pub const BLACKLIST_PERMISSIONS: &str = "blacklist-permissions";
    pub const CREATE_ROLE: &str = "create-role";
    pub const ASSIGN_ROLE: &str = "assign-role";
    pub const REMOVE_ROLE: &str = "remove-role";
    pub const WHITELIST_ROLE_PERMISSION: &str = "whitelist-role-permission";
    pub const BLACKLIST_ROLE_PERMISSION: &str = "blacklist-role-permission";
    pub const REMOVE_WHITELIST_ROLE_PERMISSION: &str = "remove-whitelist-role-permission";
    pub const REMOVE_BLACKLIST_ROLE_PERMISSION: &str = "remove-blacklist-role-permission";
    pub const SET_NETWORK_PROPERTIES: &str = "set-network-properties";
    pub const SET_EXECUTION_FEE: &str = "set-execution-fee";
    pub const UPSERT_TOKEN_ALIAS: &str = "upsert-token-alias";
    pub const VOTE_PROPOSAL: &str = "vote-proposal";
    pub const PROPOSAL_ASSIGN_PERMISSION: &str = "proposal-assign-permission";
    pub const PROPOSAL_SET_NETWORK_PROPERTY: &str = "proposal-set-network-property";
    pub const PROPOSAL_SET_POOR_NETWORK_MESSAGES: &str = "proposal-set-poor-network-messages";
    pub const PROPOSAL_CREATE_ROLE: &str = "proposal-create-role";
    pub const PROPOSAL_UPSERT_DATA_REGISTRY: &str = "proposal-upsert-data-registry";
    pub const PROPOSAL_UNJAIL_VALIDATOR: &str = "proposal-unjail-validator";
}

/// Fixed-point scale of [`TokenRate::rate`]: `1_000_000` is a rate of 1.0.
pub const RATE_PRECISION: u128 = 1_000_000;

/// An amount of one denomination.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Coin {
    /// Denomination.
    pub denom: String,
    /// Amount in base units.
    pub amount: u128,
}

impl Coin {
    /// Builds a coin.
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

/// Exchange rate of a denomination into the bond denomination.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct TokenRate {
    /// Denomination.
    pub denom: String,
    /// Rate scaled by [`RATE_PRECISION`].
    pub rate: u64,
    /// Whether the denomination may be used to pay fees.
    pub fee_payments: bool,
}

/// Parameters of a validator-seat claim.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ClaimValidatorParams {
    pub moniker: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub social: String,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub commission: u64,
    pub val_key: AccountId,
    pub cons_pubkey: Vec<u8>,
}

/// A state-transition request carried by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Message {
    /// Native ledger transfer, executed by the external bank handler.
    BankSend { to: AccountId, amount: Vec<Coin> },
    ClaimValidator(ClaimValidatorParams),
    Pause,
    Unpause,
    Activate,
    WhitelistPermissions { address: AccountId, permission: PermValue },
    BlacklistPermissions { address: AccountId, permission: PermValue },
    CreateRole { role_id: RoleId, name: String },
    AssignRole { address: AccountId, role_id: RoleId },
    RemoveRole { address: AccountId, role_id: RoleId },
    WhitelistRolePermission { role_id: RoleId, permission: PermValue },
    BlacklistRolePermission { role_id: RoleId, permission: PermValue },
    RemoveWhitelistRolePermission { role_id: RoleId, permission: PermValue },
    RemoveBlacklistRolePermission { role_id: RoleId, permission: PermValue },
    SetNetworkProperties(NetworkProperties),
    SetExecutionFee(ExecutionFee),
    SubmitProposal {
        content: ProposalContent,
        description: String,
    },
    VoteProposal { proposal_id: u64, option: VoteOption },
}

impl Message {
    /// The message type tag.
    pub fn msg_type(&self) -> &'static str {
        match self {
            Self::BankSend { .. } => msg_types::BANK_SEND,
            Self::ClaimValidator(_) => msg_types::CLAIM_VALIDATOR,
            Self::Pause => msg_types::PAUSE,
            Self::Unpause => msg_types::UNPAUSE,
            Self::Activate => msg_types::ACTIVATE,
            Self::WhitelistPermissions { .. } => msg_types::WHITELIST_PERMISSIONS,
            Self::BlacklistPermissions { .. } => msg_types::BLACKLIST_PERMISSIONS,
            Self::CreateRole { .. } => msg_types::CREATE_ROLE,
            Self::AssignRole { .. } => msg_types::ASSIGN_ROLE,
            Self::RemoveRole { .. } => msg_types::REMOVE_ROLE,
            Self::WhitelistRolePermission { .. } => msg_types::WHITELIST_ROLE_PERMISSION,
            Self::BlacklistRolePermission { .. } => msg_types::BLACKLIST_ROLE_PERMISSION,
            Self::RemoveWhitelistRolePermission { .. } => {
                msg_types::REMOVE_WHITELIST_ROLE_PERMISSION
            }
            Self::RemoveBlacklistRolePermission { .. } => {
                msg_types::REMOVE_BLACKLIST_ROLE_PERMISSION
            }
            Self::SetNetworkProperties(_) => msg_types::SET_NETWORK_PROPERTIES,
            Self::SetExecutionFee(_) => msg_types::SET_EXECUTION_FEE,
            Self::SubmitProposal { content, .. } => content.msg_type(),
            Self::VoteProposal { .. } => msg_types::VOTE_PROPOSAL,
        }
    }

    /// Total amount of `denom` moved by a bank send; zero for other messages.
    pub fn bank_send_amount(&self, denom: &str) -> u128 {
        match self {
            Self::BankSend { amount, .. } => amount
                .iter()
                .filter(|c| c.denom == denom)
                .fold(0u128, |acc, c| acc.saturating_add(c.amount)),
            _ => 0,
        }
    }
}

/// A signed bundle of messages with an attached fee. Signature verification happens
/// upstream.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Transaction {
    /// The signing actor.
    pub signer: AccountId,
    /// Messages executed in order.
    pub messages: Vec<Message>,
    /// Fee coins.
    pub fee: Vec<Coin>,
    /// Free-form memo.
    #[serde(default)]
    pub memo: String,
}

impl Transaction {
    /// Builds a transaction without a memo.
    pub fn new(signer: AccountId, messages: Vec<Message>, fee: Vec<Coin>) -> Self {
        Self {
            signer,
            messages,
            fee,
            memo: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_submissions_are_tagged_by_content() {
        let msg = Message::SubmitProposal {
            content: ProposalContent::SetPoorNetworkMessages {
                messages: Default::default(),
            },
            description: String::new(),
        };
        assert_eq!(msg.msg_type(), msg_types::PROPOSAL_SET_POOR_NETWORK_MESSAGES);
    }

    #[test]
    fn bank_send_amount_sums_matching_denoms() {
        let msg = Message::BankSend {
            to: AccountId::default(),
            amount: vec![
                Coin::new("ukex", 5),
                Coin::new("uatom", 100),
                Coin::new("ukex", 7),
            ],
        };
        assert_eq!(msg.bank_send_amount("ukex"), 12);
        assert_eq!(Message::Pause.bank_send_amount("ukex"), 0);
    }
}
