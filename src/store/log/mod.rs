mod header;
mod wal;

pub use header::{Header, HEADER_SIZE, LOG_VERSION, MAGIC_NUMBER};
pub use wal::{Record, ReplayIterator, Wal};

use std::fs;
use std::ops::RangeBounds;
use std::path::{Path, PathBuf};

use super::memtable::{Memtable, ScanIter};
use super::{Result, Store};
use crate::error::StoreError;
use crate::flock::StoreLock;

const LOG_FILE: &str = "blocks.log";
const COMPACT_FILE: &str = "blocks.log.compact";

/// Durable store: an in-memory [`Memtable`] rebuilt on open by replaying an append-only
/// record log.
///
/// Every write is appended to the log before it is applied to the memtable. Writes sit in
/// the log's buffer until [`Store::sync`] is called.
#[derive(Debug)]
pub struct LogStore {
    dir: PathBuf,
    memtable: Memtable,
    wal: Wal,
    _lock: StoreLock,
}

impl LogStore {
    /// Opens or creates the store in `dir`, taking an exclusive lock on it.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let lock = StoreLock::acquire(&dir)?;

        // A leftover from an interrupted compaction; the live log is still intact.
        let stale = dir.join(COMPACT_FILE);
        if stale.exists() {
            tracing::warn!(path = %stale.display(), "Removing incomplete compaction file");
            fs::remove_file(&stale)?;
        }

        let mut wal = Wal::open(&dir.join(LOG_FILE))?;
        let memtable = Memtable::new();
        let mut records = 0usize;

        let mut replay = wal.replay()?;
        let torn_at = loop {
            match replay.next() {
                Some(Ok(Record::Put(key, value))) => memtable.put(key, value),
                Some(Ok(Record::Delete(key))) => {
                    memtable.remove(&key);
                }
                Some(Err(StoreError::TornRecord { offset })) => break Some(offset),
                Some(Err(e)) => return Err(e),
                None => break None,
            }
            records += 1;
        };
        drop(replay);

        if let Some(offset) = torn_at {
            tracing::warn!(
                path = %wal.path().display(),
                offset = offset,
                "Truncating torn record at end of log"
            );
            wal.truncate(offset)?;
        }

        tracing::info!(
            dir = %dir.display(),
            records = records,
            keys = memtable.len(),
            "Opened log store"
        );

        Ok(Self {
            dir,
            memtable,
            wal,
            _lock: lock,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.memtable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memtable.is_empty()
    }

    /// Current size of the log file in bytes.
    pub fn log_size(&mut self) -> Result<u64> {
        self.wal.len()
    }

    /// Rewrites the log so it holds exactly one put per live key, then swaps it in.
    pub fn compact(&mut self) -> Result<()> {
        let before = self.wal.len()?;
        let tmp_path = self.dir.join(COMPACT_FILE);
        let log_path = self.dir.join(LOG_FILE);

        {
            let mut compacted = Wal::open(&tmp_path)?;
            for entry in self.memtable.iter() {
                let (key, value) = entry?;
                compacted.put(&key, &value)?;
            }
            compacted.sync()?;
        }

        fs::rename(&tmp_path, &log_path)?;
        self.wal = Wal::open(&log_path)?;

        tracing::info!(
            keys = self.memtable.len(),
            before = before,
            after = self.wal.len()?,
            "Compacted log"
        );
        Ok(())
    }
}

impl Store for LogStore {
    type ScanIterator<'a> = ScanIter<'a>;

    fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.wal.put(key, &value)?;
        self.memtable.put(key.to_vec(), value);
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.memtable.get(key))
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        // Nothing to log for a key that was never there.
        if self.memtable.get(key).is_none() {
            return Ok(());
        }
        self.wal.delete(key)?;
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
        self.wal.sync()
    }
}

impl Drop for LogStore {
    fn drop(&mut self) {
        if let Err(e) = self.wal.flush() {
            tracing::warn!(dir = %self.dir.display(), error = %e, "Failed to flush log on drop");
        }
    }
}
