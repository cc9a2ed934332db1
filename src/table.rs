//! StripedTable: bucket store, lock striping, and the resizer.
//!
//! Locking discipline, outermost first:
//! - `inner: RwLock<BucketArray>` guards the *identity* of the bucket array.
//!   Every per-key operation holds it shared; only a resize holds it
//!   exclusively, so the array and its lock set can never be swapped out from
//!   under an in-flight lookup or insert.
//! - One `Mutex<Chain>` per bucket slot, locked in lockstep with the slot it
//!   guards. A per-key operation holds exactly one bucket lock; operations on
//!   buckets that don't collide proceed fully in parallel.
//!
//! The live-entry count is a relaxed atomic: it feeds the load-factor
//! heuristic and `len()`, neither of which needs to be exact mid-flight. The
//! resize decision is re-checked under the write lock, so racing inserts that
//! both observe a crossed threshold still grow the table exactly once.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::chain::Chain;
use crate::error::{Error, Result};
use crate::hash::{bucket_index, djb2};

/// Bucket count used by the reference workload; a convenient starting point
/// when the caller has no better estimate.
pub const DEFAULT_CAPACITY: usize = 128;

/// Load factor above which an insert grows the table before placing its key.
pub const MAX_LOAD_FACTOR: f64 = 0.75;

pub(crate) struct BucketArray {
    pub(crate) buckets: Box<[Mutex<Chain>]>,
}

impl BucketArray {
    /// Reserve `capacity` empty, independently lockable bucket slots.
    /// Allocation failure is reported, not aborted on.
    fn allocate(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(capacity)
            .map_err(|source| Error::BucketAlloc {
                requested: capacity,
                source,
            })?;
        buckets.resize_with(capacity, || Mutex::new(Chain::default()));
        Ok(Self {
            buckets: buckets.into_boxed_slice(),
        })
    }
}

/// A concurrency-safe, in-memory byte key/value table.
///
/// Keys and values are arbitrary byte strings; keys are unique across the
/// table. All methods take `&self` and are safe to call from many threads.
pub struct StripedTable {
    inner: RwLock<BucketArray>,
    count: AtomicUsize,
}

impl StripedTable {
    /// Create an empty table with `capacity` buckets.
    ///
    /// Capacity only grows from here (doubling once the load factor exceeds
    /// [`MAX_LOAD_FACTOR`]); it never shrinks.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self {
            inner: RwLock::new(BucketArray::allocate(capacity)?),
            count: AtomicUsize::new(0),
        })
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current bucket count.
    pub fn capacity(&self) -> usize {
        self.inner.read().buckets.len()
    }

    /// Insert `value` under `key`, overwriting any previous value in place.
    ///
    /// Checks the load factor *before* placing the key and grows the table
    /// first when it is exceeded. The only failure mode is a failed bucket
    /// allocation during that growth, in which case the table is left at its
    /// prior capacity and the key is not inserted.
    pub fn insert(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.grow_if_needed()?;
        let inner = self.inner.read();
        let slot = bucket_index(djb2(key), inner.buckets.len());
        let mut chain = inner.buckets[slot].lock();
        if chain.upsert(key, value) {
            self.count.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Look up `key`, returning an owned copy of the value bytes.
    ///
    /// `None` is a normal not-found outcome. The copy means callers never
    /// hold an alias into storage that is only valid under a bucket lock; an
    /// empty stored value comes back as `Some` of an empty vector, distinct
    /// from absence.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let inner = self.inner.read();
        let slot = bucket_index(djb2(key), inner.buckets.len());
        let chain = inner.buckets[slot].lock();
        chain.get(key).map(<[u8]>::to_vec)
    }

    /// Remove `key` if present. Returns whether it was found; `false` is a
    /// normal outcome, not an error.
    pub fn remove(&self, key: &[u8]) -> bool {
        let inner = self.inner.read();
        let slot = bucket_index(djb2(key), inner.buckets.len());
        let mut chain = inner.buckets[slot].lock();
        if chain.remove(key) {
            self.count.fetch_sub(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Grow to double capacity when the load factor has been exceeded.
    ///
    /// The doubled array is fully allocated before the live table is touched,
    /// so a failed allocation leaves the old array, lock set, and capacity
    /// untouched. Migration moves each chain node to its slot under the new
    /// modulus; entry payloads are not copied.
    fn grow_if_needed(&self) -> Result<()> {
        if !self.over_threshold(self.inner.read().buckets.len()) {
            return Ok(());
        }

        let mut inner = self.inner.write();
        // Re-check: another insert may have grown the table while this one
        // waited for the write lock.
        let capacity = inner.buckets.len();
        if !self.over_threshold(capacity) {
            return Ok(());
        }

        let doubled = capacity
            .checked_mul(2)
            .ok_or(Error::CapacityOverflow { current: capacity })?;
        let mut grown = BucketArray::allocate(doubled)?;
        for bucket in inner.buckets.iter_mut() {
            let chain = bucket.get_mut();
            while let Some(entry) = chain.pop_front() {
                let slot = bucket_index(djb2(entry.key()), doubled);
                grown.buckets[slot].get_mut().push_front(entry);
            }
        }
        *inner = grown;
        Ok(())
    }

    fn over_threshold(&self, capacity: usize) -> bool {
        self.count.load(Ordering::Relaxed) as f64 / capacity as f64 > MAX_LOAD_FACTOR
    }

    /// Shared access to the bucket array for the snapshot walk.
    pub(crate) fn read_buckets(&self) -> parking_lot::RwLockReadGuard<'_, BucketArray> {
        self.inner.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: a fresh table is empty at exactly the requested capacity.
    #[test]
    fn with_capacity_starts_empty() {
        let t = StripedTable::with_capacity(DEFAULT_CAPACITY).unwrap();
        assert_eq!(t.len(), 0);
        assert!(t.is_empty());
        assert_eq!(t.capacity(), 128);
    }

    /// Invariant: zero capacity is rejected, not silently adjusted.
    #[test]
    fn zero_capacity_rejected() {
        match StripedTable::with_capacity(0) {
            Err(Error::ZeroCapacity) => {}
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    /// Invariant: insert-then-get round-trips the exact value bytes.
    #[test]
    fn insert_then_get() {
        let t = StripedTable::with_capacity(8).unwrap();
        t.insert(b"key1", b"value1").unwrap();
        assert_eq!(t.get(b"key1"), Some(b"value1".to_vec()));
        assert_eq!(t.get(b"key2"), None);
        assert_eq!(t.len(), 1);
    }

    /// Invariant: overwriting a key keeps count stable and later lookups see
    /// only the newest value.
    #[test]
    fn overwrite_keeps_count() {
        let t = StripedTable::with_capacity(8).unwrap();
        t.insert(b"k", b"old").unwrap();
        t.insert(b"k", b"new and longer").unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(b"k"), Some(b"new and longer".to_vec()));
    }

    /// Invariant: remove reports presence and updates count; removing an
    /// absent key changes nothing.
    #[test]
    fn remove_semantics() {
        let t = StripedTable::with_capacity(8).unwrap();
        t.insert(b"k", b"v").unwrap();
        assert!(!t.remove(b"absent"));
        assert_eq!(t.len(), 1);
        assert!(t.remove(b"k"));
        assert_eq!(t.len(), 0);
        assert_eq!(t.get(b"k"), None);
        assert!(!t.remove(b"k"));
    }

    /// Invariant: crossing the load factor doubles capacity and every
    /// previously inserted key stays retrievable with its original value.
    #[test]
    fn resize_preserves_entries() {
        let t = StripedTable::with_capacity(4).unwrap();
        for i in 0..100u32 {
            t.insert(&i.to_le_bytes(), format!("value-{i}").as_bytes())
                .unwrap();
        }
        assert_eq!(t.len(), 100);
        // 4 doubled until 100/capacity <= 0.75: at least 256 buckets.
        assert!(t.capacity() >= 256);
        assert_eq!(t.capacity().count_ones(), 1, "doubling from a power of two");
        for i in 0..100u32 {
            assert_eq!(
                t.get(&i.to_le_bytes()),
                Some(format!("value-{i}").into_bytes())
            );
        }
    }

    /// Invariant: the threshold comparison is strictly greater-than, as in
    /// the reference: a load factor of exactly 0.75 does not grow the table,
    /// the first insert that observes it exceeded does.
    #[test]
    fn growth_is_strictly_greater_than() {
        let t = StripedTable::with_capacity(4).unwrap();
        t.insert(b"a", b"1").unwrap();
        t.insert(b"b", b"2").unwrap();
        t.insert(b"c", b"3").unwrap();
        // 3/4 == 0.75, not strictly over: still 4 buckets.
        t.insert(b"d", b"4").unwrap();
        assert_eq!(t.capacity(), 4);
        // 4/4 > 0.75: the next insert grows first.
        t.insert(b"e", b"5").unwrap();
        assert_eq!(t.capacity(), 8);
        assert_eq!(t.len(), 5);
    }
}
