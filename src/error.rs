//! Error surface for table construction, resize, and snapshot I/O.

use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong constructing a table, growing it, or moving a
/// snapshot through a file. Not-found on `get`/`remove` is deliberately *not*
/// represented here; it is a normal outcome (`Option`/`bool`).
#[derive(Debug, Error)]
pub enum Error {
    /// A table needs at least one bucket.
    #[error("table capacity must be at least 1")]
    ZeroCapacity,

    /// Reserving a bucket array failed. Raised from `with_capacity` and from a
    /// resize; a failed resize aborts the triggering insert and leaves the
    /// table at its prior capacity.
    #[error("failed to allocate a bucket array of {requested} slots")]
    BucketAlloc {
        requested: usize,
        #[source]
        source: TryReserveError,
    },

    /// Doubling the bucket array would overflow `usize`.
    #[error("doubling table capacity {current} overflows usize")]
    CapacityOverflow { current: usize },

    /// Snapshot file could not be opened, read, or written. The in-memory
    /// table is untouched when the file fails to open.
    #[error("snapshot I/O failed")]
    Io(#[from] io::Error),

    /// The snapshot ended in the middle of a record. Records decoded before
    /// this offset have already been applied to the target table.
    #[error("snapshot truncated mid-record at byte offset {offset}")]
    TruncatedRecord { offset: u64 },
}
