// Path: crates/types/src/app/staking.rs
//! Validator records, signing info and the circular missed-block window.

use super::identity::{AccountId, ConsAddress};
use crate::error::StateError;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a validator. `tombstoned` is tracked separately as a
/// permanent overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(missing_docs)]
pub enum ValidatorStatus {
    Active,
    Paused,
    Inactive,
}

impl ValidatorStatus {
    /// Canonical upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl core::str::FromStr for ValidatorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(Self::Active),
            "PAUSED" => Ok(Self::Paused),
            "INACTIVE" => Ok(Self::Inactive),
            other => Err(other.to_string()),
        }
    }
}

/// A validator and its reputation counters.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Validator {
    /// Operator account; the primary key.
    pub val_key: AccountId,
    /// Consensus public key bytes.
    pub cons_pubkey: Vec<u8>,
    /// Unique display name.
    pub moniker: String,
    /// Optional website.
    pub website: String,
    /// Optional social handle.
    pub social: String,
    /// Optional identity reference.
    pub identity: String,
    /// Commission in millionths.
    pub commission: u64,
    /// Lifecycle state.
    pub status: ValidatorStatus,
    /// Permanent removal flag.
    pub tombstoned: bool,
    /// Cumulative reputation, never negative.
    pub rank: i64,
    /// Consecutive signed blocks, never negative.
    pub streak: i64,
    /// Cumulative count of missed-block penalties.
    pub mischance: i64,
    /// Earliest time (seconds) at which an inactive validator may activate.
    pub inactive_until: u64,
}

impl Validator {
    /// The address the consensus layer reports signing facts under.
    pub fn cons_address(&self) -> ConsAddress {
        ConsAddress::from_pubkey(&self.cons_pubkey)
    }

    /// Returns `true` if the validator currently participates in consensus.
    pub fn is_active(&self) -> bool {
        self.status == ValidatorStatus::Active && !self.tombstoned
    }

    /// Reputation update for a signed block.
    pub fn record_signed(&mut self) {
        self.streak = self.streak.saturating_add(1);
        self.rank = self.rank.saturating_add(1);
    }

    /// Reputation update for a missed block. Rank is clamped at zero.
    pub fn record_missed(&mut self, rank_decrease: u64) {
        let dec = i64::try_from(rank_decrease).unwrap_or(i64::MAX);
        self.streak = 0;
        self.rank = self.rank.saturating_sub(dec).max(0);
        self.mischance = self.mischance.saturating_add(1);
    }

    /// Applies the inactivation penalty: `rank = floor(rank * (100 - percent) / 100)`.
    pub fn apply_inactivation_penalty(&mut self, percent: u64) {
        let keep = i128::from(100u64.saturating_sub(percent.min(100)));
        let scaled = i128::from(self.rank.max(0)) * keep / 100;
        self.rank = i64::try_from(scaled).unwrap_or(i64::MAX);
    }

    /// Checks the non-negativity invariants on rank and streak.
    pub fn check_invariants(&self) -> Result<(), StateError> {
        if self.rank < 0 || self.streak < 0 {
            return Err(StateError::Invariant(format!(
                "validator {} has rank {} and streak {}",
                self.val_key, self.rank, self.streak
            )));
        }
        Ok(())
    }
}

/// Per-validator missed-block bookkeeping, keyed by consensus address.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct ValidatorSigningInfo {
    /// Consensus address.
    pub address: ConsAddress,
    /// Height at which tracking started.
    pub start_height: u64,
    /// Number of heights recorded since the last reset.
    pub index_offset: u64,
    /// Number of `true` bits in the validator's window.
    pub missed_blocks_counter: u64,
    /// Mirror of the validator's `inactive_until`.
    pub inactive_until: u64,
    /// Mirror of the validator's `tombstoned` flag.
    pub tombstoned: bool,
}

impl ValidatorSigningInfo {
    /// Fresh signing info starting at `start_height`.
    pub fn new(address: ConsAddress, start_height: u64) -> Self {
        Self {
            address,
            start_height,
            index_offset: 0,
            missed_blocks_counter: 0,
            inactive_until: 0,
            tombstoned: false,
        }
    }
}

/// A fixed-size circular bit array. A set bit marks a missed block.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct SigningWindow {
    len: u64,
    bits: Vec<u8>,
}

impl SigningWindow {
    /// An all-clear window of `len` slots.
    pub fn new(len: u64) -> Self {
        let bytes = usize::try_from(len.div_ceil(8)).unwrap_or(0);
        Self {
            len,
            bits: vec![0; bytes],
        }
    }

    /// Window length in slots.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` for a zero-length window.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maps an ever-increasing offset onto a slot.
    pub fn slot(&self, index_offset: u64) -> u64 {
        if self.len == 0 {
            0
        } else {
            index_offset % self.len
        }
    }

    fn locate(&self, slot: u64) -> Option<(usize, u8)> {
        if slot >= self.len {
            return None;
        }
        let byte = usize::try_from(slot / 8).ok()?;
        Some((byte, 1u8 << (slot % 8)))
    }

    /// Returns the bit at `slot`. Out-of-range slots read as clear.
    pub fn get(&self, slot: u64) -> bool {
        self.locate(slot)
            .and_then(|(byte, mask)| self.bits.get(byte).map(|b| b & mask != 0))
            .unwrap_or(false)
    }

    /// Writes the bit at `slot` and returns its previous value.
    pub fn set(&mut self, slot: u64, missed: bool) -> Result<bool, StateError> {
        let (byte, mask) = self.locate(slot).ok_or_else(|| {
            StateError::Invariant(format!("slot {} outside window of {}", slot, self.len))
        })?;
        let cell = self.bits.get_mut(byte).ok_or_else(|| {
            StateError::Invariant(format!("window storage shorter than {} slots", self.len))
        })?;
        let previous = *cell & mask != 0;
        if missed {
            *cell |= mask;
        } else {
            *cell &= !mask;
        }
        Ok(previous)
    }

    /// Number of set bits.
    pub fn count_missed(&self) -> u64 {
        self.bits.iter().map(|b| u64::from(b.count_ones())).sum()
    }

    /// Clears every bit.
    pub fn clear(&mut self) {
        self.bits.iter_mut().for_each(|b| *b = 0);
    }

    /// Resizes to `len`, clearing all history.
    pub fn reset(&mut self, len: u64) {
        *self = Self::new(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> Validator {
        Validator {
            val_key: AccountId([1; 32]),
            cons_pubkey: vec![2; 32],
            moniker: "alpha".into(),
            website: String::new(),
            social: String::new(),
            identity: String::new(),
            commission: 0,
            status: ValidatorStatus::Active,
            tombstoned: false,
            rank: 0,
            streak: 0,
            mischance: 0,
            inactive_until: 0,
        }
    }

    #[test]
    fn missed_blocks_never_push_rank_below_zero() {
        let mut v = validator();
        for _ in 0..10 {
            v.record_missed(10);
        }
        assert_eq!((v.rank, v.streak, v.mischance), (0, 0, 10));
        v.check_invariants().unwrap();
    }

    #[test]
    fn inactivation_penalty_floors() {
        let mut v = validator();
        v.rank = 91;
        v.apply_inactivation_penalty(50);
        assert_eq!(v.rank, 45);
        v.apply_inactivation_penalty(100);
        assert_eq!(v.rank, 0);
    }

    #[test]
    fn window_tracks_previous_bits() {
        let mut w = SigningWindow::new(10);
        assert!(!w.set(3, true).unwrap());
        assert!(w.set(3, true).unwrap());
        assert!(w.get(3));
        assert_eq!(w.count_missed(), 1);
        assert_eq!(w.slot(13), 3);
        assert!(w.set(10, true).is_err());
        w.clear();
        assert_eq!(w.count_missed(), 0);
    }

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!("paused".parse::<ValidatorStatus>(), Ok(ValidatorStatus::Paused));
        assert!("jailed".parse::<ValidatorStatus>().is_err());
    }
}
