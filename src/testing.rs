//! Fixtures shared by the unit tests.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::ops::RangeBounds;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::span;

use crate::block::{BlockHost, MapBlock};
use crate::error::{Error, Result, StoreError};
use crate::pos::BlockPos;
use crate::store::{self, MemoryStore, Store};

/// Oldest version [`TestBlock`] still reads.
pub const MIN_READ_VERSION: u8 = 25;

/// A block holding an opaque byte payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestBlock {
    pub pos: BlockPos,
    pub data: Vec<u8>,
    pub dirty: bool,
    pub placeholder: bool,
}

impl TestBlock {
    pub fn new(pos: BlockPos, data: &[u8]) -> Self {
        Self {
            pos,
            data: data.to_vec(),
            dirty: true,
            placeholder: false,
        }
    }

    pub fn placeholder(pos: BlockPos) -> Self {
        Self {
            placeholder: true,
            ..Self::new(pos, &[])
        }
    }
}

impl MapBlock for TestBlock {
    const WRITE_VERSION: u8 = 29;

    fn pos(&self) -> BlockPos {
        self.pos
    }

    fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    fn serialize_fields(&self, writer: &mut dyn Write, _version: u8) -> Result<()> {
        let len = u16::try_from(self.data.len())
            .map_err(|_| Error::Serialization("payload too large".to_string()))?;
        writer.write_u16::<BigEndian>(len)?;
        writer.write_all(&self.data)?;
        Ok(())
    }

    fn deserialize_fields(&mut self, reader: &mut dyn Read, version: u8) -> Result<()> {
        if !(MIN_READ_VERSION..=Self::WRITE_VERSION).contains(&version) {
            return Err(Error::Serialization(format!(
                "unsupported block version {}",
                version
            )));
        }
        let len = reader.read_u16::<BigEndian>()? as usize;
        let mut data = vec![0; len];
        reader.read_exact(&mut data)?;
        self.data = data;
        Ok(())
    }

    fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

/// Envelope bytes for `data` as written at `version`.
pub fn envelope_for(version: u8, data: &[u8]) -> Vec<u8> {
    let mut bytes = vec![version];
    bytes.extend_from_slice(&(data.len() as u16).to_be_bytes());
    bytes.extend_from_slice(data);
    bytes
}

/// World host keeping loaded blocks in a map.
#[derive(Debug, Default)]
pub struct TestHost {
    pub blocks: BTreeMap<BlockPos, TestBlock>,
    pub created: usize,
}

impl BlockHost for TestHost {
    type Block = TestBlock;

    fn block_mut(&mut self, pos: BlockPos) -> Option<&mut TestBlock> {
        self.blocks.get_mut(&pos)
    }

    fn blank_block(&mut self, pos: BlockPos) -> TestBlock {
        self.created += 1;
        TestBlock::new(pos, &[])
    }

    fn insert_block(&mut self, block: TestBlock) {
        self.blocks.insert(block.pos, block);
    }
}

/// A [`MemoryStore`] with injectable engine failures.
#[derive(Debug, Default)]
pub struct FailingStore {
    pub inner: MemoryStore,
    /// Fail scans after yielding this many entries.
    pub fail_scan_after: Option<usize>,
    pub fail_deletes: bool,
    pub fail_gets: bool,
}

fn injected() -> StoreError {
    StoreError::CorruptedLog("injected failure".to_string())
}

impl Store for FailingStore {
    type ScanIterator<'a> = Box<dyn Iterator<Item = store::Result<(Vec<u8>, Vec<u8>)>> + 'a>;

    fn put(&mut self, key: &[u8], value: Vec<u8>) -> store::Result<()> {
        self.inner.put(key, value)
    }

    fn get(&self, key: &[u8]) -> store::Result<Option<Vec<u8>>> {
        if self.fail_gets {
            return Err(injected());
        }
        self.inner.get(key)
    }

    fn delete(&mut self, key: &[u8]) -> store::Result<()> {
        if self.fail_deletes {
            return Err(injected());
        }
        self.inner.delete(key)
    }

    fn scan<R>(&self, range: R) -> Self::ScanIterator<'_>
    where
        R: RangeBounds<Vec<u8>>,
    {
        match self.fail_scan_after {
            Some(n) => Box::new(
                self.inner
                    .scan(range)
                    .take(n)
                    .chain(std::iter::once(Err(injected()))),
            ),
            None => Box::new(self.inner.scan(range)),
        }
    }

    fn sync(&mut self) -> store::Result<()> {
        Ok(())
    }
}

/// Subscriber that counts events by level and ignores everything else.
struct EventCounter {
    errors: Arc<AtomicUsize>,
    next_span: AtomicU64,
}

impl tracing::Subscriber for EventCounter {
    fn enabled(&self, _metadata: &tracing::Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, _span: &span::Attributes<'_>) -> span::Id {
        span::Id::from_u64(self.next_span.fetch_add(1, Ordering::Relaxed))
    }

    fn record(&self, _span: &span::Id, _values: &span::Record<'_>) {}

    fn record_follows_from(&self, _span: &span::Id, _follows: &span::Id) {}

    fn event(&self, event: &tracing::Event<'_>) {
        if *event.metadata().level() == tracing::Level::ERROR {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn enter(&self, _span: &span::Id) {}

    fn exit(&self, _span: &span::Id) {}
}

/// Runs `f` with a thread-local subscriber and returns its result together with the
/// number of error-level events it emitted.
pub fn count_errors<T>(f: impl FnOnce() -> T) -> (T, usize) {
    let errors = Arc::new(AtomicUsize::new(0));
    let subscriber = EventCounter {
        errors: errors.clone(),
        next_span: AtomicU64::new(1),
    };
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, errors.load(Ordering::SeqCst))
}
