//! Tile value types shared by every provider.
//!
//! A [`Tile`] is what a provider hands the renderer for one quadtree cell:
//! a GPU texture reference (owned by the cache), an optional depth
//! transform for height data, and a status. [`ChunkTile`] pairs a tile
//! with the UV sub-rectangle that maps it onto a rendered chunk.

use std::sync::Arc;

use crate::texture::Texture;

/// Availability of a tile at a requested index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileStatus {
    /// No tile is loaded for the index. The tile may still be loading, may
    /// have failed to read, or may simply not exist in the dataset.
    Unavailable,
    /// The requested level is beyond the provider's maximum level.
    OutOfRange,
    /// A decoded texture is resident and ready to render.
    Ok,
}

/// Linear mapping from normalized texture samples to height values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileDepthTransform {
    pub scale: f32,
    pub offset: f32,
}

impl TileDepthTransform {
    /// The identity transform, used by providers without height semantics.
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
        }
    }
}

impl Default for TileDepthTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Offset and scale selecting the sub-rectangle of a texture that covers a
/// rendered chunk.
///
/// Resolving a chunk through an ancestor tile shrinks the scale by half per
/// ascended level and accumulates the quadrant offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileUvTransform {
    pub uv_offset: [f32; 2],
    pub uv_scale: [f32; 2],
}

impl TileUvTransform {
    /// Whole-texture transform: zero offset, unit scale.
    pub fn identity() -> Self {
        Self {
            uv_offset: [0.0, 0.0],
            uv_scale: [1.0, 1.0],
        }
    }
}

impl Default for TileUvTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// One renderable tile.
///
/// A tile with status [`TileStatus::Ok`] always carries a texture; the
/// other statuses never do. Textures are owned by the tile cache - clones
/// of the `Arc` held outside it are transient per-frame references.
#[derive(Debug, Clone)]
pub struct Tile {
    pub texture: Option<Arc<Texture>>,
    pub depth_transform: Option<TileDepthTransform>,
    pub status: TileStatus,
}

impl Tile {
    /// The "no tile" value: no texture, status Unavailable.
    pub fn unavailable() -> Self {
        Self {
            texture: None,
            depth_transform: None,
            status: TileStatus::Unavailable,
        }
    }

    /// A tile rejected because the requested level exceeds the provider's
    /// maximum.
    pub fn out_of_range() -> Self {
        Self {
            texture: None,
            depth_transform: None,
            status: TileStatus::OutOfRange,
        }
    }

    /// A ready tile wrapping a resident texture.
    pub fn ready(texture: Arc<Texture>, depth_transform: Option<TileDepthTransform>) -> Self {
        Self {
            texture: Some(texture),
            depth_transform,
            status: TileStatus::Ok,
        }
    }

    /// True when the tile is renderable.
    pub fn is_ok(&self) -> bool {
        self.status == TileStatus::Ok
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::unavailable()
    }
}

/// A resolved tile for one rendered chunk: the tile itself, the UV
/// sub-rectangle mapping it onto the chunk, and the depth transform.
#[derive(Debug, Clone)]
pub struct ChunkTile {
    pub tile: Tile,
    pub uv_transform: TileUvTransform,
    pub depth_transform: TileDepthTransform,
}

/// An ordered set of chunk tiles, one per ancestor distance, resolved
/// together for one chunk. Every slot is always populated.
pub type ChunkTilePile = Vec<ChunkTile>;
