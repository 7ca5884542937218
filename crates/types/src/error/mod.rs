// Path: crates/types/src/error/mod.rs
//! Core error types for the Bastion engine.

use crate::app::{PermValue, ValidatorStatus};
use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Coarse classification of every engine error.
///
/// Everything except [`ErrorClass::Invariant`] is recoverable: it rejects a single
/// operation or transaction and leaves state untouched. An invariant violation means the
/// state machine itself is broken and the block must not be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Malformed input or a duplicate/conflicting mutation.
    Validation,
    /// The caller is not allowed to perform the action, or the target is in the wrong state.
    Authorization,
    /// The attached fee is unacceptable.
    Economic,
    /// The referenced record does not exist.
    NotFound,
    /// Internal consistency was violated.
    Invariant,
}

/// Errors related to the state store or the codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// The requested key was not found in the state.
    #[error("Key not found in state: {0}")]
    KeyNotFound(String),
    /// A stored record could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
    /// A record could not be encoded.
    #[error("Encode error: {0}")]
    Encode(String),
    /// An error occurred in the state backend.
    #[error("State backend error: {0}")]
    Backend(String),
    /// A stored value is structurally invalid.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// An internal invariant of the state machine was violated.
    #[error("Invariant violation: {0}")]
    Invariant(String),
}

impl StateError {
    /// Classifies the error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::KeyNotFound(_) => ErrorClass::NotFound,
            _ => ErrorClass::Invariant,
        }
    }
}

impl ErrorCode for StateError {
    fn code(&self) -> &'static str {
        match self {
            Self::KeyNotFound(_) => "STATE_KEY_NOT_FOUND",
            Self::Decode(_) => "STATE_DECODE_ERROR",
            Self::Encode(_) => "STATE_ENCODE_ERROR",
            Self::Backend(_) => "STATE_BACKEND_ERROR",
            Self::InvalidValue(_) => "STATE_INVALID_VALUE",
            Self::Invariant(_) => "STATE_INVARIANT_VIOLATION",
        }
    }
}

/// Errors raised by permission-set mutation and resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// The permission sits in the blacklist and cannot be whitelisted.
    #[error("permission is already blacklisted: {0:?}")]
    AlreadyBlacklisted(PermValue),
    /// The permission sits in the whitelist and cannot be blacklisted.
    #[error("permission is already whitelisted: {0:?}")]
    AlreadyWhitelisted(PermValue),
    /// The permission is not in the whitelist.
    #[error("permission is not whitelisted: {0:?}")]
    NotWhitelisted(PermValue),
    /// The permission is not in the blacklist.
    #[error("permission is not blacklisted: {0:?}")]
    NotBlacklisted(PermValue),
    /// The input does not name a known permission.
    #[error("unknown permission: {0}")]
    Unknown(String),
    /// The actor's resolved permissions do not grant the requested permission.
    #[error("actor {actor} is not permitted to {permission:?}")]
    Denied {
        /// Hex address of the actor.
        actor: String,
        /// The permission that was requested.
        permission: PermValue,
    },
}

impl PermissionError {
    /// Classifies the error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Denied { .. } => ErrorClass::Authorization,
            _ => ErrorClass::Validation,
        }
    }
}

impl ErrorCode for PermissionError {
    fn code(&self) -> &'static str {
        match self {
            Self::AlreadyBlacklisted(_) => "PERM_ALREADY_BLACKLISTED",
            Self::AlreadyWhitelisted(_) => "PERM_ALREADY_WHITELISTED",
            Self::NotWhitelisted(_) => "PERM_NOT_WHITELISTED",
            Self::NotBlacklisted(_) => "PERM_NOT_BLACKLISTED",
            Self::Unknown(_) => "PERM_UNKNOWN",
            Self::Denied { .. } => "PERM_DENIED",
        }
    }
}

/// Errors raised by the network-property store and execution-fee table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// The key does not name a network property.
    #[error("unknown network property: {0}")]
    UnknownProperty(String),
    /// The value is outside the range accepted for the property.
    #[error("invalid value {value} for {property}: {reason}")]
    InvalidValue {
        /// Property name.
        property: String,
        /// Rejected value.
        value: u64,
        /// Human-readable constraint.
        reason: String,
    },
    /// An execution fee entry is malformed.
    #[error("invalid execution fee: {0}")]
    InvalidExecutionFee(String),
}

impl PropertyError {
    /// Classifies the error.
    pub fn class(&self) -> ErrorClass {
        ErrorClass::Validation
    }
}

impl ErrorCode for PropertyError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownProperty(_) => "PROPERTY_UNKNOWN",
            Self::InvalidValue { .. } => "PROPERTY_INVALID_VALUE",
            Self::InvalidExecutionFee(_) => "PROPERTY_INVALID_EXECUTION_FEE",
        }
    }
}

/// Errors raised by validator lifecycle transitions and lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidatorError {
    /// No validator matches the lookup.
    #[error("validator not found: {0}")]
    NotFound(String),
    /// The transition requires an Active validator.
    #[error("validator is not active")]
    NotActive,
    /// The transition requires a Paused validator.
    #[error("validator is not paused")]
    NotPaused,
    /// The transition requires an Inactive validator.
    #[error("validator is not inactive")]
    NotInactive,
    /// The validator's jail period has not elapsed.
    #[error("validator is inactive until {until}, current time {now}")]
    StillInactive {
        /// Earliest activation time.
        until: u64,
        /// Current block time.
        now: u64,
    },
    /// The validator has been permanently removed.
    #[error("validator is tombstoned")]
    Tombstoned,
    /// The validator's status does not admit the requested transition.
    #[error("invalid transition from status {0:?}")]
    WrongState(ValidatorStatus),
    /// A validator already exists for this address or consensus key.
    #[error("validator already claimed: {0}")]
    AlreadyClaimed(String),
    /// Another validator already uses this moniker.
    #[error("moniker already taken: {0}")]
    MonikerTaken(String),
    /// A query filter names an unknown status.
    #[error("invalid validator status filter: {0}")]
    InvalidStatus(String),
    /// Claim parameters are malformed.
    #[error("invalid validator parameters: {0}")]
    InvalidParams(String),
}

impl ValidatorError {
    /// Classifies the error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound(_) => ErrorClass::NotFound,
            Self::AlreadyClaimed(_)
            | Self::MonikerTaken(_)
            | Self::InvalidStatus(_)
            | Self::InvalidParams(_) => ErrorClass::Validation,
            _ => ErrorClass::Authorization,
        }
    }
}

impl ErrorCode for ValidatorError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "VALIDATOR_NOT_FOUND",
            Self::NotActive => "VALIDATOR_NOT_ACTIVE",
            Self::NotPaused => "VALIDATOR_NOT_PAUSED",
            Self::NotInactive => "VALIDATOR_NOT_INACTIVE",
            Self::StillInactive { .. } => "VALIDATOR_STILL_INACTIVE",
            Self::Tombstoned => "VALIDATOR_TOMBSTONED",
            Self::WrongState(_) => "VALIDATOR_WRONG_STATE",
            Self::AlreadyClaimed(_) => "VALIDATOR_ALREADY_CLAIMED",
            Self::MonikerTaken(_) => "VALIDATOR_MONIKER_TAKEN",
            Self::InvalidStatus(_) => "VALIDATOR_INVALID_STATUS",
            Self::InvalidParams(_) => "VALIDATOR_INVALID_PARAMS",
        }
    }
}

/// Errors related to governance proposals, roles and the data registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    /// The proposal ID does not exist.
    #[error("Proposal with ID {0} not found")]
    ProposalNotFound(u64),
    /// The voting period of the proposal has ended.
    #[error("Voting period for proposal {0} is closed")]
    VotingClosed(u64),
    /// The proposal content failed structural validation.
    #[error("Invalid proposal content: {0}")]
    InvalidContent(String),
    /// The actor lacks the create or vote permission for this content.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// A role with this ID already exists.
    #[error("Role {0} already exists")]
    RoleExists(u64),
    /// No role with this ID exists.
    #[error("Role {0} not found")]
    RoleNotFound(u64),
    /// No data-registry entry with this key exists.
    #[error("Data registry entry not found: {0}")]
    DataRegistryEntryNotFound(String),
}

impl GovernanceError {
    /// Classifies the error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ProposalNotFound(_)
            | Self::RoleNotFound(_)
            | Self::DataRegistryEntryNotFound(_) => ErrorClass::NotFound,
            Self::VotingClosed(_) | Self::Unauthorized(_) => ErrorClass::Authorization,
            Self::InvalidContent(_) | Self::RoleExists(_) => ErrorClass::Validation,
        }
    }
}

impl ErrorCode for GovernanceError {
    fn code(&self) -> &'static str {
        match self {
            Self::ProposalNotFound(_) => "GOV_PROPOSAL_NOT_FOUND",
            Self::VotingClosed(_) => "GOV_VOTING_CLOSED",
            Self::InvalidContent(_) => "GOV_INVALID_CONTENT",
            Self::Unauthorized(_) => "GOV_UNAUTHORIZED",
            Self::RoleExists(_) => "GOV_ROLE_EXISTS",
            Self::RoleNotFound(_) => "GOV_ROLE_NOT_FOUND",
            Self::DataRegistryEntryNotFound(_) => "GOV_DATA_REGISTRY_NOT_FOUND",
        }
    }
}

/// Errors raised by the fee admission pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeeError {
    /// A fee coin uses a non-bond denomination while foreign fees are disabled.
    #[error("foreign fee payments are disabled: {denom}")]
    ForeignFeeDisabled {
        /// Offending denomination.
        denom: String,
    },
    /// The denomination has no rate or is not accepted for fees.
    #[error("denomination is not fee eligible: {denom}")]
    DenomNotFeeEligible {
        /// Offending denomination.
        denom: String,
    },
    /// The converted fee is outside `[min, max]`.
    #[error("fee {fee} out of range [{min}, {max}]")]
    FeeOutOfRange {
        /// Fee in bond-denomination units.
        fee: u128,
        /// Minimum accepted fee.
        min: u128,
        /// Maximum accepted fee.
        max: u128,
    },
    /// The converted fee cannot cover the worst-case execution fees of the messages.
    #[error("fee {fee} is below the execution cost {required}")]
    FeeBelowExecutionCost {
        /// Fee in bond-denomination units.
        fee: u128,
        /// Sum of `max(execution_fee, failure_fee)` over all messages.
        required: u128,
    },
    /// The network is in poor mode and the message is not admitted.
    #[error("message not allowed on poor network: {0}")]
    MessageNotAllowedOnPoorNetwork(String),
}

impl FeeError {
    /// Classifies the error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MessageNotAllowedOnPoorNetwork(_) => ErrorClass::Authorization,
            _ => ErrorClass::Economic,
        }
    }
}

impl ErrorCode for FeeError {
    fn code(&self) -> &'static str {
        match self {
            Self::ForeignFeeDisabled { .. } => "FEE_FOREIGN_DISABLED",
            Self::DenomNotFeeEligible { .. } => "FEE_DENOM_NOT_ELIGIBLE",
            Self::FeeOutOfRange { .. } => "FEE_OUT_OF_RANGE",
            Self::FeeBelowExecutionCost { .. } => "FEE_BELOW_EXECUTION_COST",
            Self::MessageNotAllowedOnPoorNetwork(_) => "FEE_POOR_NETWORK_MESSAGE",
        }
    }
}

/// Errors raised while loading configuration or genesis.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing failed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The configuration parsed but is semantically invalid.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors related to the processing of a single transaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// An error occurred during serialization.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The transaction is structurally invalid.
    #[error("Invalid transaction: {0}")]
    Invalid(String),
    /// No handler is registered for the message type.
    #[error("Unsupported message type: {0}")]
    Unsupported(String),
    /// A permission error.
    #[error("Permission error: {0}")]
    Permission(#[from] PermissionError),
    /// A network-property error.
    #[error("Property error: {0}")]
    Property(#[from] PropertyError),
    /// A validator lifecycle error.
    #[error("Validator error: {0}")]
    Validator(#[from] ValidatorError),
    /// An error originating from the governance module.
    #[error("Governance error: {0}")]
    Governance(#[from] GovernanceError),
    /// A fee admission error.
    #[error("Fee error: {0}")]
    Fee(#[from] FeeError),
    /// An error originating from the state store.
    #[error("State error: {0}")]
    State(#[from] StateError),
}

impl TransactionError {
    /// Classifies the error, delegating to the wrapped domain error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Serialization(_) | Self::Invalid(_) | Self::Unsupported(_) => {
                ErrorClass::Validation
            }
            Self::Permission(e) => e.class(),
            Self::Property(e) => e.class(),
            Self::Validator(e) => e.class(),
            Self::Governance(e) => e.class(),
            Self::Fee(e) => e.class(),
            Self::State(e) => e.class(),
        }
    }

    /// Returns `true` if the error must abort the whole block rather than one transaction.
    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::Invariant
    }
}

impl ErrorCode for TransactionError {
    fn code(&self) -> &'static str {
        match self {
            Self::Serialization(_) => "TX_SERIALIZATION_ERROR",
            Self::Invalid(_) => "TX_INVALID",
            Self::Unsupported(_) => "TX_UNSUPPORTED",
            Self::Permission(e) => e.code(),
            Self::Property(e) => e.code(),
            Self::Validator(e) => e.code(),
            Self::Governance(e) => e.code(),
            Self::Fee(e) => e.code(),
            Self::State(e) => e.code(),
        }
    }
}

impl From<serde_json::Error> for TransactionError {
    fn from(e: serde_json::Error) -> Self {
        TransactionError::Serialization(e.to_string())
    }
}

impl From<parity_scale_codec::Error> for TransactionError {
    fn from(e: parity_scale_codec::Error) -> Self {
        TransactionError::State(StateError::Decode(e.to_string()))
    }
}

/// Block-level errors. Any of these aborts the block being processed.
#[derive(Error, Debug)]
pub enum ChainError {
    /// The state store failed or an invariant was violated.
    #[error("State error: {0}")]
    State(#[from] StateError),
    /// A recoverable transaction error surfaced in a block-level hook.
    #[error("Transaction error: {0}")]
    Transaction(String),
    /// Genesis could not be applied.
    #[error("Genesis error: {0}")]
    Genesis(String),
    /// The engine configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Block headers arrived out of order.
    #[error("Invalid block height. Expected {expected}, got {got}")]
    InvalidHeight {
        /// Expected height.
        expected: u64,
        /// Received height.
        got: u64,
    },
}

impl From<TransactionError> for ChainError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::State(e) => ChainError::State(e),
            other => ChainError::Transaction(other.to_string()),
        }
    }
}

impl ErrorCode for ChainError {
    fn code(&self) -> &'static str {
        match self {
            Self::State(e) => e.code(),
            Self::Transaction(_) => "CHAIN_TRANSACTION_ERROR",
            Self::Genesis(_) => "CHAIN_GENESIS_ERROR",
            Self::Config(_) => "CHAIN_CONFIG_ERROR",
            Self::InvalidHeight { .. } => "CHAIN_INVALID_HEIGHT",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_keep_their_codes_through_transaction_error() {
        let err: TransactionError = FeeError::FeeOutOfRange {
            fee: 10,
            min: 100,
            max: 1_000_000,
        }
        .into();
        assert_eq!(err.code(), "FEE_OUT_OF_RANGE");
        assert_eq!(err.class(), ErrorClass::Economic);
        assert!(!err.is_fatal());
    }

    #[test]
    fn invariant_violations_are_fatal() {
        let err: TransactionError =
            StateError::Invariant("missed counter 3 != bitmap popcount 2".into()).into();
        assert!(err.is_fatal());
        assert!(matches!(ChainError::from(err), ChainError::State(_)));
    }

    #[test]
    fn classification_follows_taxonomy() {
        assert_eq!(
            ValidatorError::NotFound("x".into()).class(),
            ErrorClass::NotFound
        );
        assert_eq!(ValidatorError::Tombstoned.class(), ErrorClass::Authorization);
        assert_eq!(
            PermissionError::AlreadyWhitelisted(PermValue::ClaimValidator).class(),
            ErrorClass::Validation
        );
        assert_eq!(
            GovernanceError::VotingClosed(1).class(),
            ErrorClass::Authorization
        );
        assert_eq!(
            FeeError::MessageNotAllowedOnPoorNetwork("bank-send".into()).class(),
            ErrorClass::Authorization
        );
    }

    #[test]
    fn permission_messages_match_wire_text() {
        let msg = PermissionError::AlreadyBlacklisted(PermValue::ChangeTxFee).to_string();
        assert!(msg.starts_with("permission is already blacklisted"));
    }
}
