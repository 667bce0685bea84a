//! Quadtree tile addressing.
//!
//! A [`TileIndex`] identifies one cell of the globe's quadtree. Level 0 is
//! the coarsest level; the root row holds two tiles side by side (western
//! and eastern hemisphere), so level `L` spans `2^(L+1)` columns by `2^L`
//! rows. Each level increment doubles resolution in both axes.

use std::cmp::Ordering;
use std::fmt;

/// Deepest level for which [`TileIndex::hash_key`] is collision-free.
///
/// The key packs (level, x, y) into 64 bits with 5 bits for the level and
/// 29 bits for each axis; through level 22 every representable index maps
/// to a distinct key.
pub const MAX_HASHABLE_LEVEL: u8 = 22;

/// Address of one tile in the globe quadtree.
///
/// Rows (`y`) grow southward from the north pole, columns (`x`) grow
/// eastward from the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileIndex {
    /// Column within the level (0 to `2^(level+1) - 1`).
    pub x: i32,
    /// Row within the level (0 to `2^level - 1`).
    pub y: i32,
    /// Quadtree subdivision level, 0 = coarsest.
    pub level: u8,
}

impl TileIndex {
    /// Create a new tile index.
    pub fn new(x: i32, y: i32, level: u8) -> Self {
        Self { x, y, level }
    }

    /// The index of the parent tile, one level coarser.
    ///
    /// # Panics
    ///
    /// Panics in debug builds when called on a level-0 index, which has no
    /// parent.
    pub fn parent(&self) -> TileIndex {
        debug_assert!(self.level > 0, "level-0 tile has no parent");
        TileIndex {
            x: self.x / 2,
            y: self.y / 2,
            level: self.level - 1,
        }
    }

    /// UV offset of this tile's quadrant within its parent.
    ///
    /// The u component is 0.5 for eastern children. The v axis runs
    /// northward while rows grow southward, so northern children (even
    /// rows) sit in the upper half of the parent's UV space and get the
    /// 0.5 v offset.
    pub fn position_relative_parent(&self) -> [f32; 2] {
        [
            if self.x % 2 == 0 { 0.0 } else { 0.5 },
            if self.y % 2 == 0 { 0.5 } else { 0.0 },
        ]
    }

    /// Pack (level, x, y) into a single 64-bit key.
    ///
    /// Collision-free for every index up to [`MAX_HASHABLE_LEVEL`]; the
    /// level occupies the low 5 bits, x and y 29 bits each above it.
    pub fn hash_key(&self) -> u64 {
        debug_assert!(
            self.level <= MAX_HASHABLE_LEVEL,
            "level {} exceeds the hashable maximum {}",
            self.level,
            MAX_HASHABLE_LEVEL
        );
        debug_assert!(self.x >= 0 && self.y >= 0, "negative tile coordinates");
        (self.level as u64) | ((self.x as u64) << 5) | ((self.y as u64) << 34)
    }
}

impl PartialOrd for TileIndex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TileIndex {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.level, self.x, self.y).cmp(&(other.level, other.x, other.y))
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{},{}", self.level, self.x, self.y)
    }
}
