use std::ops::RangeBounds;

use super::memtable::{Memtable, ScanIter};
use super::{Result, Store};

/// Non-durable store backed only by a [`Memtable`]. Used for tests and for worlds that
/// are never written to disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    memtable: Memtable,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.memtable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memtable.is_empty()
    }
}

impl Store for MemoryStore {
    type ScanIterator<'a> = ScanIter<'a>;

    fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.memtable.put(key.to_vec(), value);
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.memtable.get(key))
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.memtable.remove(key);
        Ok(())
    }

    fn scan<R>(&self, range: R) -> Self::ScanIterator<'_>
    where
        R: RangeBounds<Vec<u8>>,
    {
        self.memtable.scan(range)
    }

    fn sync(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_missing_key_is_ok() {
        let mut store = MemoryStore::new();
        store.delete(b"missing").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_put_get_delete() {
        let mut store = MemoryStore::new();
        store.put(b"k", b"v".to_vec()).unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.len(), 1);

        store.delete(b"k").unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
        assert!(store.is_empty());
    }
}
