//! Process-wide tile cache.
//!
//! One [`TileCache`] is shared by every provider. It maps a
//! [`ProviderTileKey`] to a decoded, GPU-resident [`Tile`] under a byte
//! budget with strict least-recently-used eviction, and recycles evicted
//! texture objects through a per-family pool so render-to-texture
//! providers do not reallocate every frame.
//!
//! `get`/`put`/`exist` are safe to call from any thread; texture creation
//! (`create_tile_and_put`, `texture`) must stay on the render thread,
//! which owns the graphics context behind the backend.

mod lru;

pub use lru::LruMap;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::provider::ProviderId;
use crate::reader::RawTile;
use crate::texture::{Texture, TextureBackend, TextureFormat, TileTextureInitData};
use crate::tile::{Tile, TileDepthTransform, TileIndex};

/// Cache key: a tile index qualified by the provider that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderTileKey {
    pub provider_id: ProviderId,
    pub index: TileIndex,
}

impl ProviderTileKey {
    pub fn new(provider_id: ProviderId, index: TileIndex) -> Self {
        Self { provider_id, index }
    }
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub resident_bytes: usize,
    pub entry_count: usize,
}

struct CachedTile {
    tile: Tile,
    /// Texture family key; evicted textures return to this pool bin.
    generation: u64,
}

struct CacheInner {
    tiles: LruMap<ProviderTileKey, CachedTile>,
    resident_bytes: usize,
    /// Reusable texture objects keyed by init-data family.
    texture_pool: HashMap<u64, Vec<Arc<Texture>>>,
}

/// Shared, byte-budgeted store of decoded tiles.
pub struct TileCache {
    inner: Mutex<CacheInner>,
    budget_bytes: usize,
    backend: Arc<dyn TextureBackend>,
    default_tile: Tile,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl TileCache {
    /// Edge length of the global placeholder tile's texture.
    const DEFAULT_TILE_SIZE: u32 = 8;

    /// Create a cache with the given soft byte budget.
    ///
    /// Also creates the global placeholder tile (a transparent 8×8 RGBA
    /// texture) that [`chunk_tile_pile`](crate::chunk::chunk_tile_pile)
    /// uses to fill slots with no data.
    pub fn new(budget_bytes: usize, backend: Arc<dyn TextureBackend>) -> Self {
        let init = TileTextureInitData::new(Self::DEFAULT_TILE_SIZE, TextureFormat::Rgba8, false);
        let texture = backend.create_texture(&init, &vec![0u8; init.total_bytes()]);
        let default_tile = Tile::ready(texture, None);

        Self {
            inner: Mutex::new(CacheInner {
                tiles: LruMap::new(),
                resident_bytes: 0,
                texture_pool: HashMap::new(),
            }),
            budget_bytes,
            backend,
            default_tile,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up a tile, refreshing its recency.
    ///
    /// Returns the unavailable tile on a miss; never triggers loading.
    pub fn get(&self, key: &ProviderTileKey) -> Tile {
        let mut inner = self.inner.lock();
        match inner.tiles.get(key) {
            Some(cached) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                cached.tile.clone()
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Tile::unavailable()
            }
        }
    }

    /// Whether `key` has a cached entry. Does not refresh recency.
    pub fn exist(&self, key: &ProviderTileKey) -> bool {
        self.inner.lock().tiles.contains(key)
    }

    /// Insert `tile` under `key`, evicting least-recently-used entries
    /// until the byte budget is met.
    ///
    /// A pre-existing entry under the same key is evicted and replaced;
    /// entries are never mutated in place. The entry being inserted is
    /// never evicted by the same call.
    pub fn put(&self, key: ProviderTileKey, generation: u64, tile: Tile) {
        let tile_bytes = tile_byte_size(&tile);
        let mut inner = self.inner.lock();

        if let Some(previous) = inner.tiles.remove(&key) {
            inner.resident_bytes -= tile_byte_size(&previous.tile);
            Self::recycle(&mut inner, previous);
        }

        inner.tiles.put(key, CachedTile { tile, generation });
        inner.resident_bytes += tile_bytes;

        while inner.resident_bytes > self.budget_bytes {
            if inner.tiles.peek_lru_key() == Some(&key) {
                // The entry just inserted is the only remaining candidate.
                break;
            }
            let Some((evicted_key, evicted)) = inner.tiles.pop_lru() else {
                break;
            };
            inner.resident_bytes -= tile_byte_size(&evicted.tile);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(key = %evicted_key.index, "evicted tile");
            Self::recycle(&mut inner, evicted);
        }
    }

    /// Upload a finished raw tile and insert it.
    ///
    /// A raw tile tagged with a read error is inserted as an unavailable
    /// entry (no texture), so continued interest naturally re-requests it.
    /// Render thread only.
    pub fn create_tile_and_put(&self, key: ProviderTileKey, raw: RawTile) {
        if let Some(error) = &raw.error {
            debug!(key = %raw.index, %error, "caching failed tile read");
            self.put(key, raw.init.hash_key(), Tile::unavailable());
            return;
        }

        let texture = self.texture(&raw.init);
        self.backend.upload(&texture, &raw.pixels);

        let depth_transform = raw.metadata.as_ref().map(|metadata| {
            let min = metadata.min_values.first().copied().unwrap_or(0.0);
            let max = metadata.max_values.first().copied().unwrap_or(1.0);
            TileDepthTransform {
                scale: max - min,
                offset: min,
            }
        });

        let tile = Tile::ready(texture, depth_transform);
        self.put(key, raw.init.hash_key(), tile);
    }

    /// Obtain a texture of the requested family, recycling a pooled
    /// object when one is available. Render thread only.
    pub fn texture(&self, init: &TileTextureInitData) -> Arc<Texture> {
        let pooled = {
            let mut inner = self.inner.lock();
            inner
                .texture_pool
                .get_mut(&init.hash_key())
                .and_then(|bin| bin.pop())
        };
        match pooled {
            Some(texture) => texture,
            None => self
                .backend
                .create_texture(init, &vec![0u8; init.total_bytes()]),
        }
    }

    /// Evict everything, including pooled textures.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.tiles.clear();
        inner.resident_bytes = 0;
        inner.texture_pool.clear();
        debug!("tile cache cleared");
    }

    /// The global placeholder tile used to fill empty pile slots.
    pub fn default_tile(&self) -> &Tile {
        &self.default_tile
    }

    /// The texture backend this cache uploads through.
    pub fn backend(&self) -> &Arc<dyn TextureBackend> {
        &self.backend
    }

    pub fn budget_bytes(&self) -> usize {
        self.budget_bytes
    }

    /// Snapshot the cache counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            resident_bytes: inner.resident_bytes,
            entry_count: inner.tiles.len(),
        }
    }

    /// Return an evicted entry's texture to the pool when the cache held
    /// the only reference to it.
    fn recycle(inner: &mut CacheInner, evicted: CachedTile) {
        if let Some(texture) = evicted.tile.texture {
            if Arc::strong_count(&texture) == 1 {
                inner
                    .texture_pool
                    .entry(evicted.generation)
                    .or_default()
                    .push(texture);
            }
        }
    }
}

fn tile_byte_size(tile: &Tile) -> usize {
    tile.texture.as_ref().map(|t| t.byte_size()).unwrap_or(0)
}
