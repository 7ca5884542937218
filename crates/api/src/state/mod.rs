// Path: crates/api/src/state/mod.rs
//! Core traits for state access.
//!
//! - `StateAccess`: the dyn-safe key-value interface every keeper is written against.
//! - `StateOverlay`: a copy-on-write layer making a transaction or enactment atomic.
//! - `MemoryStore`: an ordered in-process store.
//! - `StateAccessExt`: typed read/write helpers over the canonical codec.

use bastion_types::codec::{decode_state, encode_state};
use bastion_types::error::StateError;
use parity_scale_codec::{Decode, Encode};
use std::sync::Arc;

/// An atomically reference-counted, owned key slice.
pub type StateKey = Arc<[u8]>;
/// An atomically reference-counted, owned value slice.
pub type StateVal = Arc<[u8]>;
/// An owned key-value pair from the state, using cheap-to-clone Arcs.
pub type StateKVPair = (StateKey, StateVal);
/// A streaming iterator over key-value pairs from the state.
pub type StateScanIter<'a> =
    Box<dyn Iterator<Item = Result<StateKVPair, StateError>> + Send + 'a>;

mod accessor;
mod memory;
mod overlay;

pub use accessor::*;
pub use memory::MemoryStore;
pub use overlay::*;

/// Typed helpers over [`StateAccess`] using the canonical codec.
pub trait StateAccessExt: StateAccess {
    /// Reads and decodes the record at `key`.
    fn get_decoded<T: Decode>(&self, key: &[u8]) -> Result<Option<T>, StateError> {
        self.get(key)?.map(|b| decode_state(&b)).transpose()
    }

    /// Encodes and writes `value` at `key`.
    fn put_encoded<T: Encode>(&mut self, key: &[u8], value: &T) -> Result<(), StateError> {
        self.insert(key, &encode_state(value)?)
    }

    /// Decodes every record under `prefix`, in ascending key order.
    fn scan_decoded<T: Decode>(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, T)>, StateError> {
        self.prefix_scan(prefix)?
            .map(|entry| {
                let (k, v) = entry?;
                Ok((k.to_vec(), decode_state(&v)?))
            })
            .collect()
    }
}

impl<S: StateAccess + ?Sized> StateAccessExt for S {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_helpers_round_trip_through_dyn_access() {
        let mut store = MemoryStore::default();
        {
            let state: &mut dyn StateAccess = &mut store;
            state.put_encoded(b"n::1", &7u64).unwrap();
            state.put_encoded(b"n::2", &9u64).unwrap();
        }
        let state: &dyn StateAccess = &store;
        assert_eq!(state.get_decoded::<u64>(b"n::1").unwrap(), Some(7));
        assert_eq!(state.get_decoded::<u64>(b"n::3").unwrap(), None);
        let all: Vec<u64> = state
            .scan_decoded::<u64>(b"n::")
            .unwrap()
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(all, vec![7, 9]);
    }

    #[test]
    fn corrupt_records_surface_as_decode_errors() {
        let mut store = MemoryStore::default();
        store.insert(b"bad", &[1, 2, 3]).unwrap();
        assert!(matches!(
            store.get_decoded::<u64>(b"bad"),
            Err(StateError::Decode(_))
        ));
    }
}
