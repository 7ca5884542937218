// Path: crates/types/src/codec.rs

//! Canonical, deterministic binary codec for every record persisted to state.
//!
//! Validators, signing windows, proposals and the network-property singleton are all
//! stored as SCALE (`parity-scale-codec`) bytes. Keeping the wrappers in the base crate
//! guarantees that every keeper reads and writes the same representation.

use crate::error::StateError;
use parity_scale_codec::{Decode, DecodeAll, Encode};

/// Encodes a value into its canonical SCALE byte representation.
pub fn to_bytes_canonical<T: Encode>(v: &T) -> Result<Vec<u8>, String> {
    Ok(v.encode())
}

/// Decodes a value from canonical SCALE bytes, rejecting trailing input.
pub fn from_bytes_canonical<T: Decode>(b: &[u8]) -> Result<T, String> {
    T::decode_all(&mut &*b).map_err(|e| format!("canonical decode failed: {}", e))
}

/// Decodes a state record, mapping codec failures into [`StateError::Decode`].
pub fn decode_state<T: Decode>(b: &[u8]) -> Result<T, StateError> {
    from_bytes_canonical(b).map_err(StateError::Decode)
}

/// Encodes a state record. SCALE encoding is infallible; the `Result` keeps call sites
/// uniform with [`decode_state`].
pub fn encode_state<T: Encode>(v: &T) -> Result<Vec<u8>, StateError> {
    to_bytes_canonical(v).map_err(StateError::Encode)
}
