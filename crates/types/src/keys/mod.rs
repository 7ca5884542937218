// Path: crates/types/src/keys/mod.rs
//! Defines constants for well-known state keys.
//!
//! These constants and builders are the single source of truth for where each record
//! lives in the key-value store. Numeric key components are big-endian so that prefix
//! iteration visits them in ascending order.

use crate::app::{AccountId, ConsAddress, RoleId};

/// The state key for the `NetworkProperties` singleton.
pub const NETWORK_PROPERTIES_KEY: &[u8] = b"gov::properties";
/// The state key prefix for execution fees, keyed by transaction type.
pub const EXECUTION_FEE_PREFIX: &[u8] = b"gov::execution_fee::";
/// The state key for the poor-network allowlist.
pub const POOR_NETWORK_MESSAGES_KEY: &[u8] = b"gov::poor_network_messages";
/// The state key prefix for network actors, keyed by address.
pub const ACTOR_PREFIX: &[u8] = b"gov::actor::";
/// The state key prefix for roles, keyed by big-endian role id.
pub const ROLE_PREFIX: &[u8] = b"gov::role::";
/// The state key for the next available proposal ID.
pub const GOVERNANCE_NEXT_PROPOSAL_ID_KEY: &[u8] = b"gov::next_id";
/// The state key prefix for storing proposals by ID.
pub const GOVERNANCE_PROPOSAL_KEY_PREFIX: &[u8] = b"gov::proposal::";
/// The state key prefix for storing votes, keyed by (proposal id, voter).
pub const GOVERNANCE_VOTE_KEY_PREFIX: &[u8] = b"gov::vote::";
/// The state key prefix for the enactment queue, keyed by (enactment time, proposal id).
pub const GOVERNANCE_ENACTMENT_PREFIX: &[u8] = b"gov::enactment::";
/// The state key prefix for data-registry records.
pub const DATA_REGISTRY_PREFIX: &[u8] = b"gov::data_registry::";

/// The state key prefix for validators, keyed by operator address.
pub const VALIDATOR_PREFIX: &[u8] = b"staking::validator::";
/// Index from consensus address to operator address.
pub const VALIDATOR_BY_CONS_PREFIX: &[u8] = b"staking::by_cons::";
/// Index from lower-cased moniker to operator address.
pub const VALIDATOR_BY_MONIKER_PREFIX: &[u8] = b"staking::by_moniker::";

/// The state key prefix for signing info, keyed by consensus address.
pub const SIGNING_INFO_PREFIX: &[u8] = b"slashing::signing_info::";
/// The state key prefix for missed-block windows, keyed by consensus address.
pub const MISSED_BLOCKS_PREFIX: &[u8] = b"slashing::missed::";

/// The state key prefix for token rates, keyed by denomination.
pub const TOKEN_RATE_PREFIX: &[u8] = b"tokens::rate::";
/// The state key prefix for pending execution registrations, keyed by block height.
pub const PENDING_EXECUTION_PREFIX: &[u8] = b"fees::pending::";

/// Key of the execution fee for `tx_type`.
pub fn execution_fee_key(tx_type: &str) -> Vec<u8> {
    [EXECUTION_FEE_PREFIX, tx_type.as_bytes()].concat()
}

/// Key of an actor record.
pub fn actor_key(address: &AccountId) -> Vec<u8> {
    [ACTOR_PREFIX, address.as_ref()].concat()
}

/// Key of a role record.
pub fn role_key(id: RoleId) -> Vec<u8> {
    [ROLE_PREFIX, &id.to_be_bytes()[..]].concat()
}

/// Key of a proposal record.
pub fn proposal_key(id: u64) -> Vec<u8> {
    [GOVERNANCE_PROPOSAL_KEY_PREFIX, &id.to_be_bytes()[..]].concat()
}

/// Prefix of every vote on proposal `id`.
pub fn vote_prefix(id: u64) -> Vec<u8> {
    [GOVERNANCE_VOTE_KEY_PREFIX, &id.to_be_bytes()[..]].concat()
}

/// Key of `voter`'s vote on proposal `id`.
pub fn vote_key(id: u64, voter: &AccountId) -> Vec<u8> {
    [vote_prefix(id).as_slice(), voter.as_ref()].concat()
}

/// Key of a queued enactment.
pub fn enactment_key(time: u64, id: u64) -> Vec<u8> {
    [
        GOVERNANCE_ENACTMENT_PREFIX,
        &time.to_be_bytes()[..],
        &id.to_be_bytes()[..],
    ]
    .concat()
}

/// Key of a data-registry record.
pub fn data_registry_key(key: &str) -> Vec<u8> {
    [DATA_REGISTRY_PREFIX, key.as_bytes()].concat()
}

/// Key of a validator record.
pub fn validator_key(val_key: &AccountId) -> Vec<u8> {
    [VALIDATOR_PREFIX, val_key.as_ref()].concat()
}

/// Key of the consensus-address index entry.
pub fn validator_by_cons_key(addr: &ConsAddress) -> Vec<u8> {
    [VALIDATOR_BY_CONS_PREFIX, addr.as_ref()].concat()
}

/// Key of the moniker index entry. Monikers are unique case-insensitively.
pub fn validator_by_moniker_key(moniker: &str) -> Vec<u8> {
    [
        VALIDATOR_BY_MONIKER_PREFIX,
        moniker.to_lowercase().as_bytes(),
    ]
    .concat()
}

/// Key of a validator's signing info.
pub fn signing_info_key(addr: &ConsAddress) -> Vec<u8> {
    [SIGNING_INFO_PREFIX, addr.as_ref()].concat()
}

/// Key of a validator's missed-block window.
pub fn missed_blocks_key(addr: &ConsAddress) -> Vec<u8> {
    [MISSED_BLOCKS_PREFIX, addr.as_ref()].concat()
}

/// Key of a token rate.
pub fn token_rate_key(denom: &str) -> Vec<u8> {
    [TOKEN_RATE_PREFIX, denom.as_bytes()].concat()
}

/// Key of the pending execution registrations recorded at `height`.
pub fn pending_execution_key(height: u64) -> Vec<u8> {
    [PENDING_EXECUTION_PREFIX, &height.to_be_bytes()[..]].concat()
}
