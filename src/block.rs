//! Seams to the world host. The database never owns a block across calls; it borrows
//! the host's copy for the duration of a save or load.

use std::io::{Read, Write};

use crate::error::Result;
use crate::pos::BlockPos;

/// A fixed-size chunk of the world that knows how to (de)serialize its own fields.
pub trait MapBlock {
    /// Serialization version written by [`serialize_fields`](MapBlock::serialize_fields).
    const WRITE_VERSION: u8;

    fn pos(&self) -> BlockPos;

    /// Placeholder blocks stand in for unloaded areas and are never persisted.
    fn is_placeholder(&self) -> bool {
        false
    }

    /// Writes the block's fields in the layout for `version`.
    fn serialize_fields(&self, writer: &mut dyn Write, version: u8) -> Result<()>;

    /// Reads fields written at `version`, replacing the block's contents. Versions the
    /// block does not understand must be rejected with an error.
    fn deserialize_fields(&mut self, reader: &mut dyn Read, version: u8) -> Result<()>;

    /// Marks the in-memory block as matching what is on disk.
    fn clear_dirty(&mut self);
}

/// The world container that owns loaded blocks.
pub trait BlockHost {
    type Block: MapBlock;

    /// The already-loaded block at `pos`, if any.
    fn block_mut(&mut self, pos: BlockPos) -> Option<&mut Self::Block>;

    /// A fresh, empty block for `pos` that is not yet part of the world.
    fn blank_block(&mut self, pos: BlockPos) -> Self::Block;

    /// Adopts a block created by [`blank_block`](BlockHost::blank_block).
    fn insert_block(&mut self, block: Self::Block);
}
