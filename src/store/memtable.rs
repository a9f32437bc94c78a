use crossbeam_skiplist::{map::Entry, SkipMap};
use std::ops::{Bound, RangeBounds};

use super::{owned_bounds, Result};

/// Ordered in-memory key-value table. Deleted keys are removed outright, so every entry
/// present is live.
#[derive(Debug, Default)]
pub struct Memtable {
    data: SkipMap<Vec<u8>, Vec<u8>>,
}

impl Memtable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates a key-value pair in the Memtable.
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) {
        self.data.insert(key, value);
    }

    /// Retrieves the value for a given key.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.get(key).map(|entry| entry.value().clone())
    }

    /// Removes a key, returning whether it was present.
    pub fn remove(&self, key: &[u8]) -> bool {
        self.data.remove(key).is_some()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Scan range of keys
    pub fn scan<R>(&self, range: R) -> ScanIter<'_>
    where
        R: RangeBounds<Vec<u8>>,
    {
        ScanIter {
            inner: self.data.range(owned_bounds(&range)),
        }
    }

    /// Iterates over every entry in key order.
    pub fn iter(&self) -> ScanIter<'_> {
        self.scan(..)
    }
}

type SkipMapRange<'a> = crossbeam_skiplist::map::Range<
    'a,
    Vec<u8>,
    (Bound<Vec<u8>>, Bound<Vec<u8>>),
    Vec<u8>,
    Vec<u8>,
>;

pub struct ScanIter<'a> {
    inner: SkipMapRange<'a>,
}

impl<'a> ScanIter<'a> {
    /// Maps a SkipMap Entry to the expected output format.
    fn map(entry: Entry<'_, Vec<u8>, Vec<u8>>) -> <Self as Iterator>::Item {
        Ok((entry.key().clone(), entry.value().clone()))
    }
}

impl<'a> Iterator for ScanIter<'a> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Self::map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let memtable = Memtable::new();

        memtable.put(b"key1".to_vec(), b"value1".to_vec());
        memtable.put(b"key2".to_vec(), b"value2".to_vec());
        memtable.put(b"key3".to_vec(), Vec::new());

        assert_eq!(memtable.get(b"key1"), Some(b"value1".to_vec()));
        assert_eq!(memtable.get(b"key2"), Some(b"value2".to_vec()));
        // Stored-but-empty is not the same as absent.
        assert_eq!(memtable.get(b"key3"), Some(Vec::new()));
        assert_eq!(memtable.get(b"key4"), None);
        assert_eq!(memtable.len(), 3);
    }

    #[test]
    fn test_overwrite_and_remove() {
        let memtable = Memtable::new();

        memtable.put(b"key1".to_vec(), b"value1".to_vec());
        memtable.put(b"key1".to_vec(), b"v".to_vec());
        assert_eq!(memtable.get(b"key1"), Some(b"v".to_vec()));
        assert_eq!(memtable.len(), 1);

        assert!(memtable.remove(b"key1"));
        assert!(!memtable.remove(b"key1"));
        assert!(memtable.is_empty());
    }

    #[test]
    fn test_scan() {
        let memtable = Memtable::new();

        memtable.put(b"key1".to_vec(), b"value1".to_vec());
        memtable.put(b"key2".to_vec(), b"value2".to_vec());
        memtable.put(b"key3".to_vec(), b"value3".to_vec());

        let mut scan_iter = memtable.scan(b"key1".to_vec()..=b"key2".to_vec());

        let first = scan_iter
            .next()
            .expect("Expected first result")
            .expect("Error in first result");
        assert_eq!(first, (b"key1".to_vec(), b"value1".to_vec()));

        let second = scan_iter
            .next()
            .expect("Expected second result")
            .expect("Error in second result");
        assert_eq!(second, (b"key2".to_vec(), b"value2".to_vec()));

        assert!(scan_iter.next().is_none(), "Expected no more results");
    }

    #[test]
    fn test_memtable_keys_are_sorted() {
        let memtable = Memtable::new();

        memtable.put(b"key3".to_vec(), b"value3".to_vec());
        memtable.put(b"key1".to_vec(), b"value1".to_vec());
        memtable.put(b"key2".to_vec(), b"value2".to_vec());

        let scanned_keys: Vec<_> = memtable.iter().map(|res| res.unwrap().0).collect();

        assert_eq!(
            scanned_keys,
            vec![b"key1".to_vec(), b"key2".to_vec(), b"key3".to_vec()]
        );
    }
}
