// Path: crates/api/src/state/overlay.rs

//! A copy-on-write state overlay used to make transactions and enactments atomic.

use crate::state::{StateAccess, StateKVPair, StateScanIter};
use bastion_types::error::StateError;
use std::cmp::Ordering;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::ops::Bound::{Excluded, Included, Unbounded};
use std::sync::Arc;

/// A batch of key-value pairs to be inserted or updated in the state.
pub type StateInserts = Vec<(Vec<u8>, Vec<u8>)>;

/// A batch of keys to be deleted from the state.
pub type StateDeletes = Vec<Vec<u8>>;

/// A complete set of state changes (inserts/updates and deletes).
pub type StateChangeSet = (StateInserts, StateDeletes);

/// The smallest key strictly greater than every key starting with `prefix`.
/// `None` if no such key exists (empty or all-`0xFF` prefix).
pub(crate) fn next_prefix(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut ub = prefix.to_vec();
    while let Some(last) = ub.pop() {
        if last != 0xFF {
            ub.push(last + 1);
            return Some(ub);
        }
    }
    None
}

struct MergingIterator<'a> {
    base: Peekable<StateScanIter<'a>>,
    writes: Peekable<btree_map::Range<'a, Vec<u8>, Option<Vec<u8>>>>,
}

impl<'a> MergingIterator<'a> {
    fn emit(key: &[u8], value: &[u8]) -> Option<Result<StateKVPair, StateError>> {
        Some(Ok((Arc::from(key), Arc::from(value))))
    }
}

impl<'a> Iterator for MergingIterator<'a> {
    type Item = Result<StateKVPair, StateError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let order = match (self.base.peek(), self.writes.peek()) {
                (Some(Err(_)), _) => return self.base.next(),
                (Some(Ok((bk, _))), Some((wk, _))) => bk.as_ref().cmp(wk.as_slice()),
                (Some(Ok(_)), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => return None,
            };
            if order == Ordering::Less {
                return self.base.next();
            }
            if order == Ordering::Equal {
                // Shadowed by a local write.
                self.base.next();
            }
            if let Some((key, Some(value))) = self.writes.next() {
                return Self::emit(key, value);
            }
            // A local delete: skip it and keep merging.
        }
    }
}

/// An in-memory, copy-on-write overlay for any `StateAccess`.
///
/// Reads consult the local write set first and fall through to `base`. Writes never
/// reach `base` until the caller commits the overlay's change set, so dropping an
/// overlay discards every change made through it.
#[derive(Clone)]
pub struct StateOverlay<'a> {
    base: &'a dyn StateAccess,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> StateOverlay<'a> {
    /// Creates a new, empty overlay on top of a base state accessor.
    pub fn new(base: &'a dyn StateAccess) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
        }
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Consumes the overlay and returns its writes in ascending key order.
    pub fn into_ordered_batch(self) -> StateChangeSet {
        let mut inserts = Vec::new();
        let mut deletes = Vec::new();
        for (key, value) in self.writes {
            match value {
                Some(value) => inserts.push((key, value)),
                None => deletes.push(key),
            }
        }
        (inserts, deletes)
    }
}

impl<'a> StateAccess for StateOverlay<'a> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        match self.writes.get(key) {
            Some(local) => Ok(local.clone()),
            None => self.base.get(key),
        }
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn batch_set(&mut self, updates: &[(Vec<u8>, Vec<u8>)]) -> Result<(), StateError> {
        for (key, value) in updates {
            self.insert(key, value)?;
        }
        Ok(())
    }

    fn batch_get(&self, keys: &[Vec<u8>]) -> Result<Vec<Option<Vec<u8>>>, StateError> {
        keys.iter().map(|k| self.get(k)).collect()
    }

    fn batch_apply(
        &mut self,
        inserts: &[(Vec<u8>, Vec<u8>)],
        deletes: &[Vec<u8>],
    ) -> Result<(), StateError> {
        for key in deletes {
            self.delete(key)?;
        }
        self.batch_set(inserts)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<StateScanIter<'_>, StateError> {
        let base = self.base.prefix_scan(prefix)?.peekable();
        let upper = match next_prefix(prefix) {
            Some(ub) => Excluded(ub),
            None => Unbounded,
        };
        let writes = self
            .writes
            .range((Included(prefix.to_vec()), upper))
            .peekable();
        Ok(Box::new(MergingIterator { base, writes }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryStore;

    fn keys(state: &dyn StateAccess, prefix: &[u8]) -> Vec<Vec<u8>> {
        state
            .prefix_scan(prefix)
            .unwrap()
            .map(|r| r.unwrap().0.to_vec())
            .collect()
    }

    #[test]
    fn next_prefix_handles_carry() {
        assert_eq!(next_prefix(b"ab"), Some(b"ac".to_vec()));
        assert_eq!(next_prefix(&[0x01, 0xFF]), Some(vec![0x02]));
        assert_eq!(next_prefix(&[0xFF, 0xFF]), None);
        assert_eq!(next_prefix(b""), None);
    }

    #[test]
    fn scan_merges_local_writes_over_base() {
        let mut base = MemoryStore::default();
        base.insert(b"v::a", b"1").unwrap();
        base.insert(b"v::c", b"3").unwrap();
        base.insert(b"v::d", b"4").unwrap();
        base.insert(b"w::z", b"0").unwrap();

        let mut overlay = StateOverlay::new(&base);
        overlay.insert(b"v::b", b"2").unwrap();
        overlay.insert(b"v::c", b"33").unwrap();
        overlay.delete(b"v::d").unwrap();

        assert_eq!(
            keys(&overlay, b"v::"),
            vec![b"v::a".to_vec(), b"v::b".to_vec(), b"v::c".to_vec()]
        );
        assert_eq!(overlay.get(b"v::c").unwrap(), Some(b"33".to_vec()));
        assert_eq!(overlay.get(b"v::d").unwrap(), None);
        // Base is untouched until commit.
        assert_eq!(base.get(b"v::c").unwrap(), Some(b"3".to_vec()));
    }

    #[test]
    fn change_set_commits_atomically() {
        let mut base = MemoryStore::default();
        base.insert(b"k1", b"old").unwrap();
        let (inserts, deletes) = {
            let mut overlay = StateOverlay::new(&base);
            overlay.insert(b"k2", b"new").unwrap();
            overlay.delete(b"k1").unwrap();
            overlay.into_ordered_batch()
        };
        base.batch_apply(&inserts, &deletes).unwrap();
        assert_eq!(base.get(b"k1").unwrap(), None);
        assert_eq!(base.get(b"k2").unwrap(), Some(b"new".to_vec()));
    }
}
