//! DJB2 string hash and bucket-index reduction.
//!
//! The table's on-disk format does not depend on the hash, but bucket
//! placement does: an index is only meaningful for the capacity it was
//! computed against, so callers re-reduce on every operation and never cache
//! an index across a resize.

/// DJB2 over raw bytes: seed 5381, `h = h * 33 + byte` with wrapping
/// arithmetic. Deterministic and non-cryptographic.
pub(crate) fn djb2(key: &[u8]) -> u64 {
    let mut h: u64 = 5381;
    for &b in key {
        h = h.wrapping_mul(33).wrapping_add(u64::from(b));
    }
    h
}

/// Reduce a hash to a bucket slot for the given capacity.
///
/// Capacity is never zero (enforced at table construction).
pub(crate) fn bucket_index(hash: u64, capacity: usize) -> usize {
    (hash % capacity as u64) as usize
}
