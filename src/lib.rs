//! stripetable: a concurrency-safe, in-memory byte key/value table with
//! lock-striped buckets and flat-file snapshots.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: build a shared hash table in small, independently testable layers,
//!   with one lock per bucket so unrelated keys never contend.
//! - Layers:
//!   - `hash`: DJB2 over raw key bytes, reduced modulo the *current* capacity
//!     at every call site; indices are never cached across a resize.
//!   - `chain`: the single-threaded structural layer, one bucket's owned
//!     collision list, with node-level relinking for the resizer.
//!   - `table`: `StripedTable`, the concurrent engine owning the bucket
//!     array, its lock striping, the live-entry count, and the doubling
//!     resizer.
//!   - `snapshot`: the length-prefixed record codec and the bucket-by-bucket
//!     file walk.
//!
//! Locking
//! - A table-wide `RwLock` guards the bucket array's identity: per-key
//!   operations hold it shared plus exactly one bucket `Mutex`; a resize
//!   holds it exclusively while it migrates chains into a doubled array and
//!   publishes the replacement. Readers can therefore never observe a torn
//!   or stale bucket array.
//! - Same-bucket operations serialize at that bucket's mutex in lock-arrival
//!   order; disjoint buckets proceed in parallel. Lock acquisition blocks
//!   indefinitely; there are no timeouts.
//!
//! Resize
//! - Triggered synchronously by the insert that observes
//!   `count / capacity > 0.75`, before that key is placed. The decision is
//!   re-checked under the exclusive lock so racing inserts grow the table
//!   once. The doubled array is fully allocated before the live table is
//!   touched: an allocation failure aborts the insert and leaves the prior
//!   capacity intact. Migration relinks entry nodes; key and value bytes are
//!   never copied.
//!
//! Snapshots
//! - Flat binary file of `[key_len u64 LE][key][value_len u64 LE][value]`
//!   records, no header or checksum; end of data is end of file. Writing is
//!   best-effort under concurrent writers (one bucket at a time); loading
//!   merges into the target table through the normal insert path, later
//!   duplicates overwriting. A file ending mid-record is reported as
//!   [`Error::TruncatedRecord`].
//!
//! Notes and non-goals
//! - Not a durable database: no write-ahead log, no crash atomicity.
//! - Point operations only; no ordered iteration or range queries.
//! - `get` returns an owned copy of the value, never a view into locked
//!   storage, so callers cannot retain aliases across bucket operations.

mod chain;
mod error;
mod hash;
mod snapshot;
mod table;

// Public surface
pub use error::{Error, Result};
pub use table::{StripedTable, DEFAULT_CAPACITY, MAX_LOAD_FACTOR};
