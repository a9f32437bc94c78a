//! Block persistence on top of a [`Store`].
//!
//! Blocks live under the order-preserving current key. Records written under the
//! legacy decimal key are still found on load and retired the next time the block is
//! saved, so a store migrates lazily without a bulk pass.

use crate::block::{BlockHost, MapBlock};
use crate::config::StoreConfig;
use crate::encoding::format::{BlockKeys, Formatter as _};
use crate::encoding::{envelope, keycode, legacy, Key as _};
use crate::error::{Error, Result, StoreError};
use crate::pos::BlockPos;
use crate::store::{LogStore, Store};

#[derive(Debug)]
pub struct BlockDatabase<S: Store = LogStore> {
    store: Option<S>,
    config: StoreConfig,
    /// Blocks saved since `begin_save`, when a save pass is open.
    pass: Option<usize>,
}

impl BlockDatabase<LogStore> {
    /// Opens the durable store at `<dir>/<namespace>.db`.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let path = config.store_path();
        let store = LogStore::open(&path).map_err(Error::storage("open"))?;
        tracing::info!(path = %path.display(), blocks = store.len(), "Opened block database");
        Ok(Self::with_store(store, config))
    }

    /// Rewrites the log without superseded records.
    pub fn compact(&mut self) -> Result<()> {
        self.store_mut()?.compact().map_err(Error::storage("compact"))
    }
}

impl<S: Store> BlockDatabase<S> {
    pub fn with_store(store: S, config: StoreConfig) -> Self {
        Self {
            store: Some(store),
            config,
            pass: None,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The engine, or `Closed` once the database has been closed.
    pub fn store(&self) -> Result<&S> {
        self.store
            .as_ref()
            .ok_or_else(|| Error::storage("access")(StoreError::Closed))
    }

    pub fn store_mut(&mut self) -> Result<&mut S> {
        self.store
            .as_mut()
            .ok_or_else(|| Error::storage("access")(StoreError::Closed))
    }

    pub fn is_closed(&self) -> bool {
        self.store.is_none()
    }

    /// Starts a batch of saves.
    pub fn begin_save(&mut self) -> Result<()> {
        self.store()?;
        self.pass = Some(0);
        Ok(())
    }

    /// Ends a batch of saves and makes it durable.
    pub fn end_save(&mut self) -> Result<()> {
        self.store_mut()?.sync().map_err(Error::storage("sync"))?;
        if let Some(saved) = self.pass.take() {
            tracing::debug!(saved = saved, "Finished save pass");
        }
        Ok(())
    }

    /// Writes `block` under the current key for `pos` and retires any legacy record
    /// for the same position. Placeholder blocks are skipped. `pos` must be the block's
    /// own position.
    pub fn save_block<B: MapBlock>(&mut self, pos: BlockPos, block: &mut B) -> Result<()> {
        if block.pos() != pos {
            return Err(Error::PositionMismatch {
                expected: pos,
                actual: block.pos(),
            });
        }
        if block.is_placeholder() {
            tracing::trace!(pos = %pos, "Skipping placeholder block");
            return Ok(());
        }

        let sync = self.config.sync_writes;
        let store = self.store_mut()?;

        let value = envelope::encode(B::WRITE_VERSION, |writer, version| {
            block.serialize_fields(writer, version)
        })?;
        store
            .put(&pos.encode(), value)
            .map_err(Error::storage("put"))?;

        // Coordinates the legacy scheme cannot address never had a legacy record.
        if let Some(legacy_key) = legacy::key_for(pos) {
            store
                .delete(&legacy_key)
                .map_err(Error::storage("delete"))?;
        }

        if sync {
            store.sync().map_err(Error::storage("sync"))?;
        }

        if let Some(saved) = self.pass.as_mut() {
            *saved += 1;
        }
        block.clear_dirty();
        Ok(())
    }

    /// Loads the block at `pos` into `host`.
    ///
    /// An already-loaded block is overwritten in place; otherwise a blank block is
    /// filled and handed to the host. Returns `None` when nothing is stored for `pos`,
    /// or when the record is corrupt and `ignore_load_errors` is set.
    pub fn load_block<'h, H: BlockHost>(
        &self,
        pos: BlockPos,
        host: &'h mut H,
    ) -> Result<Option<&'h mut H::Block>> {
        let Some((key, value)) = self.lookup(pos)? else {
            return Ok(None);
        };

        if value.is_empty() {
            let err = Error::CorruptRecord {
                pos,
                reason: "zero-length value".to_string(),
            };
            return self.recover(pos, &key, err);
        }

        let decoded = match host.block_mut(pos) {
            Some(block) => decode_into(block, &value),
            None => {
                let mut block = host.blank_block(pos);
                let decoded = decode_into(&mut block, &value);
                if decoded.is_ok() {
                    host.insert_block(block);
                }
                decoded
            }
        };
        if let Err(e) = decoded {
            return self.recover(pos, &key, e);
        }

        Ok(host.block_mut(pos).map(|block| {
            block.clear_dirty();
            block
        }))
    }

    /// Finds the stored value for `pos`, falling back to the legacy key only when the
    /// engine has no record under the current key.
    fn lookup(&self, pos: BlockPos) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let store = self.store()?;

        let key = pos.encode();
        if let Some(value) = store.get(&key).map_err(Error::storage("get"))? {
            return Ok(Some((key, value)));
        }

        let Some(legacy_key) = legacy::key_for(pos) else {
            return Ok(None);
        };
        match store.get(&legacy_key).map_err(Error::storage("get"))? {
            Some(value) => {
                tracing::debug!(pos = %pos, key = %BlockKeys::key(&legacy_key), "Found block under legacy key");
                Ok(Some((legacy_key, value)))
            }
            None => Ok(None),
        }
    }

    /// Applies the load-error policy to a corrupt record.
    fn recover<T>(&self, pos: BlockPos, key: &[u8], err: Error) -> Result<Option<T>> {
        if err.is_format_bug() {
            return Err(err);
        }

        let err = match err {
            err @ Error::CorruptRecord { .. } => err,
            other => Error::CorruptRecord {
                pos,
                reason: other.to_string(),
            },
        };

        if self.config.ignore_load_errors {
            tracing::error!(
                pos = %pos,
                key = %BlockKeys::key(key),
                error = %err,
                "Ignoring corrupt block; treating it as unexplored"
            );
            return Ok(None);
        }

        tracing::error!(pos = %pos, key = %BlockKeys::key(key), error = %err, "Failed to load block");
        Err(err)
    }

    /// Lists every block stored under the current key scheme, in key order.
    pub fn list_all_blocks(&self) -> Result<BlockPositions<'_, S>> {
        let store = self.store()?;
        Ok(BlockPositions {
            inner: store.scan_prefix(&[keycode::KEY_PREFIX]),
            done: false,
        })
    }

    /// Collects [`list_all_blocks`](Self::list_all_blocks), failing on the first error.
    pub fn list_all_loadable_blocks(&self) -> Result<Vec<BlockPos>> {
        self.list_all_blocks()?.collect()
    }

    /// Syncs and releases the engine. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut store) = self.store.take() else {
            return Ok(());
        };
        self.pass = None;
        store.sync().map_err(Error::storage("close"))?;
        tracing::debug!("Closed block database");
        Ok(())
    }
}

impl<S: Store> Drop for BlockDatabase<S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "Failed to close block database");
        }
    }
}

fn decode_into<B: MapBlock>(block: &mut B, value: &[u8]) -> Result<()> {
    envelope::decode(value, |reader, version| {
        block.deserialize_fields(reader, version)
    })
}

/// Positions of stored blocks in ascending key order. Fused after the first error.
pub struct BlockPositions<'a, S: Store + 'a> {
    inner: S::ScanIterator<'a>,
    done: bool,
}

impl<'a, S: Store + 'a> Iterator for BlockPositions<'a, S> {
    type Item = Result<BlockPos>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = match self.inner.next()? {
            Ok((key, _)) => BlockPos::decode(&key),
            Err(e) => Err(Error::storage("scan")(e)),
        };
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}
