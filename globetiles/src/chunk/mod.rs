//! Ancestor resolution for rendered chunks.
//!
//! A chunk at level L may have no loaded tile yet (an async miss) or may
//! lie beyond the dataset's native resolution. The renderer still needs
//! *some* texture, so [`chunk_tile`] walks up the ancestor chain until a
//! usable tile is found, accumulating the UV sub-rectangle that maps the
//! ancestor texture onto the original chunk footprint. The cost is a
//! magnified (lower-resolution) texture, never a missing one.
//!
//! [`chunk_tile_pile`] resolves one entry per ancestor distance for
//! renderers that blend several detail levels in one pass; every slot is
//! always populated, falling back to the previous entry or the global
//! placeholder tile.

use crate::provider::TileProvider;
use crate::tile::{ChunkTile, ChunkTilePile, Tile, TileDepthTransform, TileIndex, TileStatus, TileUvTransform};

/// Ancestor budget used when the caller does not bound the walk. Deeper
/// than any hashable level, so the walk is bounded by reaching level 1
/// instead.
pub const DEFAULT_MAX_PARENTS: u32 = 22;

/// One ascent step: the parent index plus the UV transform adjusted so
/// the accumulated rectangle still covers the original chunk footprint.
///
/// Each ascent halves the UV scale and offsets by the child's quadrant
/// within its parent.
pub fn ascend_to_parent(index: TileIndex, uv: TileUvTransform) -> (TileIndex, TileUvTransform) {
    let quadrant = index.position_relative_parent();
    let uv = TileUvTransform {
        uv_offset: [
            uv.uv_offset[0] * 0.5 + quadrant[0],
            uv.uv_offset[1] * 0.5 + quadrant[1],
        ],
        uv_scale: [uv.uv_scale[0] * 0.5, uv.uv_scale[1] * 0.5],
    };
    (index.parent(), uv)
}

fn sentinel(uv: TileUvTransform) -> ChunkTile {
    ChunkTile {
        tile: Tile::unavailable(),
        uv_transform: uv,
        depth_transform: TileDepthTransform::identity(),
    }
}

/// Resolve a renderable tile for the chunk at `index`.
///
/// `parents` ancestor hops are taken up front (multi-layer piling), then
/// the walk ascends into the provider's level range and keeps ascending
/// past unloaded tiles. `max_parents` bounds the total ascent; when the
/// budget runs out, or level 1 is reached without an OK tile, the
/// unavailable sentinel is returned instead.
pub fn chunk_tile(
    provider: &mut TileProvider,
    index: TileIndex,
    parents: u32,
    max_parents: u32,
) -> ChunkTile {
    let mut index = index;
    let mut uv = TileUvTransform::identity();
    let mut budget = max_parents as i64;

    // Step 1: ascend the number of levels the caller already consumed.
    for _ in 0..parents {
        if index.level <= 1 {
            break;
        }
        (index, uv) = ascend_to_parent(index, uv);
    }
    budget -= parents as i64;

    // Step 2: ascend into the range of defined data.
    let max_level = provider.max_level();
    while index.level > max_level {
        (index, uv) = ascend_to_parent(index, uv);
        budget -= 1;
    }
    if budget < 0 {
        return sentinel(uv);
    }

    // Step 3: ascend past tiles that are not loaded yet.
    while index.level > 1 {
        let tile = provider.tile(index);
        if tile.status != TileStatus::Ok {
            budget -= 1;
            if budget < 0 {
                return sentinel(uv);
            }
            (index, uv) = ascend_to_parent(index, uv);
        } else {
            debug_assert!(tile.texture.is_some(), "OK tile must carry a texture");
            let depth_transform = provider.depth_transform();
            return ChunkTile {
                tile,
                uv_transform: uv,
                depth_transform,
            };
        }
    }

    sentinel(uv)
}

/// Resolve `pile_size` chunk tiles for `index`, one per ancestor distance
/// 0..pile_size.
///
/// Slot `i` requests `i` ancestor hops. An unresolvable slot is filled
/// with the previous slot's tile, or with `default_tile` for slot 0, so
/// the renderer never sees an empty slot - only possibly-degraded
/// resolution.
pub fn chunk_tile_pile(
    provider: &mut TileProvider,
    index: TileIndex,
    pile_size: usize,
    default_tile: &Tile,
) -> ChunkTilePile {
    let mut pile: ChunkTilePile = Vec::with_capacity(pile_size);
    for i in 0..pile_size {
        let mut entry = chunk_tile(provider, index, i as u32, DEFAULT_MAX_PARENTS);
        if entry.tile.status == TileStatus::Unavailable {
            if i == 0 {
                entry.tile = default_tile.clone();
                entry.uv_transform = TileUvTransform::identity();
            } else {
                // Slot i-1 is already populated, possibly itself degraded.
                entry.tile = pile[i - 1].tile.clone();
                entry.uv_transform = pile[i - 1].uv_transform;
            }
        }
        pile.push(entry);
    }
    pile
}
