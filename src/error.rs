use std::io;

use crate::pos::BlockPos;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by a backing [`Store`](crate::store::Store) engine.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid log header")]
    InvalidHeader,
    #[error("Unsupported log version: {0}")]
    UnsupportedVersion(u16),
    #[error("Failed to decode {0}: {1}")]
    Decode(&'static str, io::Error),
    #[error("Failed to encode {0}: {1}")]
    Encode(&'static str, io::Error),
    #[error("Corrupted log: {0}")]
    CorruptedLog(String),
    #[error("Torn record at offset {offset}")]
    TornRecord { offset: u64 },
    #[error("Lock error: {0}")]
    LockError(io::Error),
    #[error("Store is closed")]
    Closed,
}

/// Errors reported by the block database and its codecs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing engine failed; fatal to the triggering operation.
    #[error("Storage failure during {op}: {source}")]
    StorageFailure {
        op: &'static str,
        #[source]
        source: StoreError,
    },
    /// A stored value is blank or does not decode.
    #[error("Corrupt record at {pos}: {reason}")]
    CorruptRecord { pos: BlockPos, reason: String },
    /// A block was handed in under a position other than its own.
    #[error("Block at {actual} cannot be saved under {expected}")]
    PositionMismatch { expected: BlockPos, actual: BlockPos },
    #[error("Malformed key: {0}")]
    MalformedKey(String),
    #[error("Truncated envelope: missing version byte")]
    TruncatedEnvelope,
    /// Field-level (de)serialization failure raised by a block implementation.
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn storage(op: &'static str) -> impl FnOnce(StoreError) -> Error {
        move |source| Error::StorageFailure { op, source }
    }

    /// Codec-level conditions that indicate a bug in the on-disk format handling. These
    /// are never masked by the ignore-load-errors policy.
    pub fn is_format_bug(&self) -> bool {
        matches!(self, Error::MalformedKey(_) | Error::TruncatedEnvelope)
    }
}
