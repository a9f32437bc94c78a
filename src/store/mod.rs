pub mod log;
pub mod memory;
pub mod memtable;

pub use self::log::LogStore;
pub use memory::MemoryStore;

use crate::error::StoreError;
use std::ops::{Bound, RangeBounds};

pub type Result<T> = std::result::Result<T, StoreError>;

/// An ordered key-value engine. Keys are compared as raw bytes.
///
/// Writers are serialized through `&mut self`; a live scan borrows the store, so it
/// cannot observe concurrent writes.
pub trait Store {
    /// The iterator returned by scan().
    type ScanIterator<'a>: ScanIterator + 'a
    where
        Self: 'a;

    /// Inserts or updates a key-value pair.
    fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<()>;

    /// Retrieves the value for a given key. `None` means the key does not exist, which
    /// is distinct from a stored empty value.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Removes a key. Removing a missing key is not an error.
    fn delete(&mut self, key: &[u8]) -> Result<()>;

    /// Iterates over an ordered range of key-value pairs.
    fn scan<R>(&self, range: R) -> Self::ScanIterator<'_>
    where
        R: RangeBounds<Vec<u8>>;

    /// Iterates over all key-value pairs starting with the given prefix.
    fn scan_prefix(&self, prefix: &[u8]) -> Self::ScanIterator<'_> {
        let start = Bound::Included(prefix.to_vec());
        let end = match prefix.iter().rposition(|b| *b != 0xff) {
            Some(i) => Bound::Excluded(
                prefix[..i]
                    .iter()
                    .chain(std::iter::once(&(prefix[i] + 1)))
                    .copied()
                    .collect::<Vec<u8>>(),
            ),
            None => Bound::Unbounded,
        };
        self.scan((start, end))
    }

    /// Synchronizes buffered writes to durable storage. Writes are not guaranteed to
    /// survive a crash until this is called.
    fn sync(&mut self) -> Result<()>;
}

pub trait ScanIterator: Iterator<Item = Result<(Vec<u8>, Vec<u8>)>> {}

impl<I> ScanIterator for I where I: Iterator<Item = Result<(Vec<u8>, Vec<u8>)>> {}

/// Clones a borrowed range into owned bounds.
pub(crate) fn owned_bounds<R>(range: &R) -> (Bound<Vec<u8>>, Bound<Vec<u8>>)
where
    R: RangeBounds<Vec<u8>>,
{
    (range.start_bound().cloned(), range.end_bound().cloned())
}
