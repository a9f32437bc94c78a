pub mod block;
pub mod config;
pub mod database;
pub mod encoding;
pub mod error;
pub mod flock;
pub mod hasher;
pub mod pos;
pub mod store;

#[cfg(test)]
mod testing;

pub use block::{BlockHost, MapBlock};
pub use config::StoreConfig;
pub use database::{BlockDatabase, BlockPositions};
pub use error::{Error, Result, StoreError};
pub use hasher::Hasher;
pub use pos::BlockPos;
pub use store::{LogStore, MemoryStore, Store};
