use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a map block in the world grid, in block units.
///
/// The total order is lexicographic over `(x, y, z)`; the current key encoding
/// preserves it byte-for-byte.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BlockPos {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl BlockPos {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }
}

impl From<(i16, i16, i16)> for BlockPos {
    fn from((x, y, z): (i16, i16, i16)) -> Self {
        Self::new(x, y, z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}
