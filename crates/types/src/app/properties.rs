// Path: crates/types/src/app/properties.rs
//! Governance-tunable network properties, the execution-fee schedule and the
//! poor-network allowlist.

use super::tx::msg_types;
use crate::error::PropertyError;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Key addressing one field of [`NetworkProperties`]. Codes are part of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum NetworkProperty {
    MinTxFee = 0,
    MaxTxFee = 1,
    VoteQuorum = 2,
    ProposalEndTime = 3,
    ProposalEnactmentTime = 4,
    EnableForeignFeePayments = 5,
    MischanceRankDecreaseAmount = 6,
    InactiveRankDecreasePercent = 7,
    PoorNetworkMaxBankSend = 8,
    MinValidators = 9,
    JailMaxTime = 10,
    EnableTokenWhitelist = 11,
    EnableTokenBlacklist = 12,
}

const PROPERTY_NAMES: [(NetworkProperty, &str); 13] = [
    (NetworkProperty::MinTxFee, "MIN_TX_FEE"),
    (NetworkProperty::MaxTxFee, "MAX_TX_FEE"),
    (NetworkProperty::VoteQuorum, "VOTE_QUORUM"),
    (NetworkProperty::ProposalEndTime, "PROPOSAL_END_TIME"),
    (NetworkProperty::ProposalEnactmentTime, "PROPOSAL_ENACTMENT_TIME"),
    (NetworkProperty::EnableForeignFeePayments, "ENABLE_FOREIGN_FEE_PAYMENTS"),
    (
        NetworkProperty::MischanceRankDecreaseAmount,
        "MISCHANCE_RANK_DECREASE_AMOUNT",
    ),
    (
        NetworkProperty::InactiveRankDecreasePercent,
        "INACTIVE_RANK_DECREASE_PERCENT",
    ),
    (NetworkProperty::PoorNetworkMaxBankSend, "POOR_NETWORK_MAX_BANK_SEND"),
    (NetworkProperty::MinValidators, "MIN_VALIDATORS"),
    (NetworkProperty::JailMaxTime, "JAIL_MAX_TIME"),
    (NetworkProperty::EnableTokenWhitelist, "ENABLE_TOKEN_WHITELIST"),
    (NetworkProperty::EnableTokenBlacklist, "ENABLE_TOKEN_BLACKLIST"),
];

impl NetworkProperty {
    /// Every property, in code order.
    pub fn all() -> impl Iterator<Item = NetworkProperty> {
        PROPERTY_NAMES.iter().map(|(p, _)| *p)
    }

    /// The canonical name.
    pub fn name(self) -> &'static str {
        PROPERTY_NAMES
            .iter()
            .find(|(p, _)| *p == self)
            .map(|(_, n)| *n)
            .unwrap_or("UNKNOWN")
    }

    /// Looks a property up by numeric code, rejecting codes outside the enum.
    pub fn from_code(code: u32) -> Result<Self, PropertyError> {
        Self::all()
            .find(|p| *p as u32 == code)
            .ok_or_else(|| PropertyError::UnknownProperty(code.to_string()))
    }

    /// Returns `true` for properties stored as booleans.
    pub fn is_bool(self) -> bool {
        matches!(
            self,
            Self::EnableForeignFeePayments | Self::EnableTokenWhitelist | Self::EnableTokenBlacklist
        )
    }
}

impl core::fmt::Display for NetworkProperty {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for NetworkProperty {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = s.parse::<u32>() {
            return Self::from_code(code);
        }
        PROPERTY_NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(s))
            .map(|(p, _)| *p)
            .ok_or_else(|| PropertyError::UnknownProperty(s.to_string()))
    }
}

/// The singleton record of governance-tunable parameters.
///
/// Times are in seconds; percentages are whole numbers in `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct NetworkProperties {
    pub min_tx_fee: u64,
    pub max_tx_fee: u64,
    pub vote_quorum: u64,
    pub proposal_end_time: u64,
    pub proposal_enactment_time: u64,
    pub enable_foreign_fee_payments: bool,
    pub mischance_rank_decrease_amount: u64,
    pub inactive_rank_decrease_percent: u64,
    pub poor_network_max_bank_send: u64,
    pub min_validators: u64,
    pub jail_max_time: u64,
    pub enable_token_whitelist: bool,
    pub enable_token_blacklist: bool,
}

impl Default for NetworkProperties {
    fn default() -> Self {
        Self {
            min_tx_fee: 100,
            max_tx_fee: 1_000_000,
            vote_quorum: 33,
            proposal_end_time: 600,
            proposal_enactment_time: 300,
            enable_foreign_fee_payments: true,
            mischance_rank_decrease_amount: 10,
            inactive_rank_decrease_percent: 50,
            poor_network_max_bank_send: 1_000_000,
            min_validators: 1,
            jail_max_time: 600,
            enable_token_whitelist: false,
            enable_token_blacklist: true,
        }
    }
}

impl NetworkProperties {
    /// Reads the field addressed by `key`. Booleans read as `1`/`0`.
    pub fn get(&self, key: NetworkProperty) -> u64 {
        match key {
            NetworkProperty::MinTxFee => self.min_tx_fee,
            NetworkProperty::MaxTxFee => self.max_tx_fee,
            NetworkProperty::VoteQuorum => self.vote_quorum,
            NetworkProperty::ProposalEndTime => self.proposal_end_time,
            NetworkProperty::ProposalEnactmentTime => self.proposal_enactment_time,
            NetworkProperty::EnableForeignFeePayments => self.enable_foreign_fee_payments as u64,
            NetworkProperty::MischanceRankDecreaseAmount => self.mischance_rank_decrease_amount,
            NetworkProperty::InactiveRankDecreasePercent => self.inactive_rank_decrease_percent,
            NetworkProperty::PoorNetworkMaxBankSend => self.poor_network_max_bank_send,
            NetworkProperty::MinValidators => self.min_validators,
            NetworkProperty::JailMaxTime => self.jail_max_time,
            NetworkProperty::EnableTokenWhitelist => self.enable_token_whitelist as u64,
            NetworkProperty::EnableTokenBlacklist => self.enable_token_blacklist as u64,
        }
    }

    /// Writes the field addressed by `key`. Boolean properties treat any non-zero
    /// value as `true`.
    pub fn set(&mut self, key: NetworkProperty, value: u64) -> Result<(), PropertyError> {
        check_value(key, value)?;
        let flag = value != 0;
        match key {
            NetworkProperty::MinTxFee => self.min_tx_fee = value,
            NetworkProperty::MaxTxFee => self.max_tx_fee = value,
            NetworkProperty::VoteQuorum => self.vote_quorum = value,
            NetworkProperty::ProposalEndTime => self.proposal_end_time = value,
            NetworkProperty::ProposalEnactmentTime => self.proposal_enactment_time = value,
            NetworkProperty::EnableForeignFeePayments => self.enable_foreign_fee_payments = flag,
            NetworkProperty::MischanceRankDecreaseAmount => {
                self.mischance_rank_decrease_amount = value
            }
            NetworkProperty::InactiveRankDecreasePercent => {
                self.inactive_rank_decrease_percent = value
            }
            NetworkProperty::PoorNetworkMaxBankSend => self.poor_network_max_bank_send = value,
            NetworkProperty::MinValidators => self.min_validators = value,
            NetworkProperty::JailMaxTime => self.jail_max_time = value,
            NetworkProperty::EnableTokenWhitelist => self.enable_token_whitelist = flag,
            NetworkProperty::EnableTokenBlacklist => self.enable_token_blacklist = flag,
        }
        Ok(())
    }

    /// Validates a whole record, as submitted by `SetNetworkProperties`.
    pub fn validate(&self) -> Result<(), PropertyError> {
        for key in NetworkProperty::all() {
            check_value(key, self.get(key))?;
        }
        if self.min_tx_fee > self.max_tx_fee {
            return Err(PropertyError::InvalidValue {
                property: NetworkProperty::MinTxFee.name().to_string(),
                value: self.min_tx_fee,
                reason: format!("exceeds max tx fee {}", self.max_tx_fee),
            });
        }
        Ok(())
    }
}

/// Checks a single value against the range accepted for `key`.
pub fn check_value(key: NetworkProperty, value: u64) -> Result<(), PropertyError> {
    let percent = matches!(
        key,
        NetworkProperty::VoteQuorum | NetworkProperty::InactiveRankDecreasePercent
    );
    if percent && value > 100 {
        return Err(PropertyError::InvalidValue {
            property: key.name().to_string(),
            value,
            reason: "percentage must not exceed 100".to_string(),
        });
    }
    Ok(())
}

/// Fee schedule for one transaction type.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ExecutionFee {
    /// Human-readable name.
    pub name: String,
    /// Message type tag this fee applies to.
    pub transaction_type: String,
    /// Charged when the message executes successfully.
    pub execution_fee: u64,
    /// Charged when the message fails.
    pub failure_fee: u64,
    /// Execution timeout in seconds.
    pub timeout: u64,
    /// Opaque parameters for the fee processor.
    #[serde(default)]
    pub default_parameters: u64,
}

impl ExecutionFee {
    /// Builds a fee entry with no default parameters.
    pub fn new(
        name: &str,
        transaction_type: &str,
        execution_fee: u64,
        failure_fee: u64,
        timeout: u64,
    ) -> Self {
        Self {
            name: name.to_string(),
            transaction_type: transaction_type.to_string(),
            execution_fee,
            failure_fee,
            timeout,
            default_parameters: 0,
        }
    }

    /// Worst-case charge for a message of this type.
    pub fn max_cost(&self) -> u64 {
        self.execution_fee.max(self.failure_fee)
    }

    /// Structural checks applied on upsert.
    pub fn validate(&self) -> Result<(), PropertyError> {
        if self.transaction_type.trim().is_empty() {
            return Err(PropertyError::InvalidExecutionFee(
                "transaction type must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The schedule installed at genesis.
    pub fn default_schedule() -> Vec<ExecutionFee> {
        vec![
            Self::new("Claim Validator Seat", "claim-validator-seat", 10, 1, 10),
            Self::new("Claim Governance Seat", "claim-governance-seat", 10, 1, 10),
            Self::new("Claim Proposal Type X", "claim-proposal-type-x", 10, 1, 10),
            Self::new("Vote Proposal Type X", "vote-proposal-type-x", 10, 1, 10),
            Self::new("Submit Proposal Type X", "submit-proposal-type-x", 10, 1, 10),
            Self::new("Veto Proposal Type X", "veto-proposal-type-x", 10, 1, 10),
            Self::new(
                "Upsert Token Alias Execution Fee",
                msg_types::UPSERT_TOKEN_ALIAS,
                10,
                1,
                10,
            ),
            Self::new("Activate a validator", msg_types::ACTIVATE, 100, 1000, 10),
            Self::new("Pause a validator", msg_types::PAUSE, 10, 100, 10),
            Self::new("Unpause a validator", msg_types::UNPAUSE, 10, 100, 10),
        ]
    }
}

/// Message types admitted while the network is in poor mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct PoorNetworkMessages {
    /// Allowed message type tags.
    pub messages: BTreeSet<String>,
}

impl PoorNetworkMessages {
    /// Returns `true` if `msg_type` may be executed in poor mode. An empty allowlist
    /// places no restriction on message types.
    pub fn allows(&self, msg_type: &str) -> bool {
        self.messages.is_empty() || self.messages.contains(msg_type)
    }

    /// The allowlist installed at genesis.
    pub fn default_allowlist() -> Self {
        let messages = [
            msg_types::PROPOSAL_ASSIGN_PERMISSION,
            msg_types::PROPOSAL_SET_NETWORK_PROPERTY,
            msg_types::SET_NETWORK_PROPERTIES,
            msg_types::VOTE_PROPOSAL,
            msg_types::CLAIM_COUNCILOR,
            msg_types::WHITELIST_PERMISSIONS,
            msg_types::BLACKLIST_PERMISSIONS,
            msg_types::CREATE_ROLE,
            msg_types::ASSIGN_ROLE,
            msg_types::REMOVE_ROLE,
            msg_types::WHITELIST_ROLE_PERMISSION,
            msg_types::BLACKLIST_ROLE_PERMISSION,
            msg_types::REMOVE_WHITELIST_ROLE_PERMISSION,
            msg_types::REMOVE_BLACKLIST_ROLE_PERMISSION,
            msg_types::CLAIM_VALIDATOR,
            msg_types::ACTIVATE,
            msg_types::PAUSE,
            msg_types::UNPAUSE,
        ];
        Self {
            messages: messages.iter().map(|m| m.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_property_round_trips_through_get_and_set() {
        let mut props = NetworkProperties::default();
        for key in NetworkProperty::all() {
            let value = if key.is_bool() { 1 } else { 42 };
            props.set(key, value).unwrap();
            assert_eq!(props.get(key), value, "{key}");
        }
    }

    #[test]
    fn boolean_properties_treat_nonzero_as_true() {
        let mut props = NetworkProperties::default();
        props
            .set(NetworkProperty::EnableForeignFeePayments, 0)
            .unwrap();
        assert!(!props.enable_foreign_fee_payments);
        props
            .set(NetworkProperty::EnableForeignFeePayments, 7)
            .unwrap();
        assert!(props.enable_foreign_fee_payments);
        assert_eq!(props.get(NetworkProperty::EnableForeignFeePayments), 1);
    }

    #[test]
    fn unknown_property_keys_are_rejected() {
        assert!(matches!(
            NetworkProperty::from_code(13),
            Err(PropertyError::UnknownProperty(_))
        ));
        assert!("NOT_A_PROPERTY".parse::<NetworkProperty>().is_err());
        assert_eq!(
            "vote_quorum".parse::<NetworkProperty>().unwrap(),
            NetworkProperty::VoteQuorum
        );
    }

    #[test]
    fn percentages_are_bounded() {
        let mut props = NetworkProperties::default();
        assert!(props.set(NetworkProperty::VoteQuorum, 101).is_err());
        assert_eq!(props.vote_quorum, 33);

        props.min_tx_fee = props.max_tx_fee + 1;
        assert!(props.validate().is_err());
    }

    #[test]
    fn execution_fee_max_cost_takes_the_larger_charge() {
        let activate = ExecutionFee::new("Activate", msg_types::ACTIVATE, 100, 1000, 10);
        assert_eq!(activate.max_cost(), 1000);
        assert_eq!(ExecutionFee::default_schedule().len(), 10);
    }

    #[test]
    fn empty_allowlist_places_no_restriction() {
        assert!(PoorNetworkMessages::default().allows("anything"));
        let defaults = PoorNetworkMessages::default_allowlist();
        assert_eq!(defaults.messages.len(), 18);
        assert!(defaults.allows(msg_types::PAUSE));
        assert!(!defaults.allows(msg_types::BANK_SEND));
    }
}
