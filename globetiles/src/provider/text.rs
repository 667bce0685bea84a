//! Debug text tile providers.
//!
//! These providers render a short text per tile instead of reading a
//! dataset: [`SizeReferenceProvider`] prints the tile's longitudinal
//! ground distance, [`TileIndexProvider`] prints the quadtree address.
//! Glyph rasterization is delegated to a [`TextRenderer`] collaborator
//! supplied by the host's font stack; the rendered tiles go through the
//! shared cache's texture pool so no texture is allocated per frame.

use std::sync::Arc;

use crate::cache::{ProviderTileKey, TileCache};
use crate::config::{tile_texture_init_data, LayerGroup, Radii, SizeReferenceConfig};
use crate::texture::TileTextureInitData;
use crate::tile::{Tile, TileIndex};

use super::ProviderId;

/// Default glyph size for debug text tiles, in pixels.
const FONT_SIZE: u32 = 64;

/// Rasterizes text into a tile-sized pixel buffer.
///
/// Implemented by the host application on top of its font renderer. The
/// returned buffer must match `init.total_bytes()`.
pub trait TextRenderer: Send + Sync {
    fn render_text(
        &self,
        text: &str,
        position: [f32; 2],
        color: [f32; 4],
        init: &TileTextureInitData,
    ) -> Vec<u8>;
}

/// Shared core of the text-rendering providers: per-index cached tiles
/// rendered on demand into pooled textures.
pub(super) struct TextTileProvider {
    init: TileTextureInitData,
    cache: Arc<TileCache>,
    renderer: Arc<dyn TextRenderer>,
}

impl TextTileProvider {
    fn new(cache: Arc<TileCache>, renderer: Arc<dyn TextRenderer>) -> Self {
        Self {
            init: tile_texture_init_data(LayerGroup::ColorLayers, false, None),
            cache,
            renderer,
        }
    }

    /// Fetch the tile for `index`, rendering `text` into a pooled texture
    /// on the first request. Render thread only.
    fn tile(&self, id: ProviderId, index: TileIndex, text: &str, position: [f32; 2]) -> Tile {
        let key = ProviderTileKey::new(id, index);
        let cached = self.cache.get(&key);
        if cached.texture.is_some() {
            return cached;
        }

        let pixels = self
            .renderer
            .render_text(text, position, [1.0, 1.0, 1.0, 1.0], &self.init);
        let texture = self.cache.texture(&self.init);
        self.cache.backend().upload(&texture, &pixels);

        let tile = Tile::ready(texture, None);
        self.cache.put(key, self.init.hash_key(), tile.clone());
        tile
    }

    /// Rendered text tiles live in the shared cache, so resetting drops
    /// the whole cache.
    fn reset(&self) {
        self.cache.clear();
    }

    fn init(&self) -> &TileTextureInitData {
        &self.init
    }
}

/// Geographic bounds of a tile: (min_lat, max_lat, min_lon, max_lon) in
/// degrees, for the 2×1-rooted equirectangular quadtree.
fn patch_bounds(index: TileIndex) -> (f64, f64, f64, f64) {
    let columns = 2u32 << index.level;
    let rows = 1u32 << index.level;
    let lon_width = 360.0 / columns as f64;
    let lat_height = 180.0 / rows as f64;

    let min_lon = -180.0 + index.x as f64 * lon_width;
    let max_lat = 90.0 - index.y as f64 * lat_height;
    (max_lat - lat_height, max_lat, min_lon, min_lon + lon_width)
}

/// Renders each tile's longitudinal ground distance on the configured
/// ellipsoid.
pub(super) struct SizeReferenceProvider {
    text: TextTileProvider,
    radii: Radii,
}

impl SizeReferenceProvider {
    pub(super) fn new(
        config: &SizeReferenceConfig,
        cache: Arc<TileCache>,
        renderer: Arc<dyn TextRenderer>,
    ) -> Self {
        Self {
            text: TextTileProvider::new(cache, renderer),
            radii: config.radii,
        }
    }

    pub(super) fn tile(&self, id: ProviderId, index: TileIndex) -> Tile {
        let (min_lat, max_lat, min_lon, max_lon) = patch_bounds(index);
        let above_equator = (min_lat + max_lat) / 2.0 > 0.0;
        // Measure along the tile edge closer to the equator, where the
        // tile is widest.
        let lat = if above_equator { min_lat } else { max_lat };

        let radius = self.radii.equatorial_mean();
        let distance = radius * lat.to_radians().cos() * (max_lon - min_lon).to_radians();

        let (value, unit) = if distance > 9999.0 {
            (distance / 1000.0, "km")
        } else {
            (distance, "m")
        };
        let text = format!(" {:.0} {}", value, unit);

        let height = self.text.init().height() as f32;
        let font = FONT_SIZE as f32;
        let position = [
            0.0,
            if above_equator {
                font / 2.0
            } else {
                height - 3.0 * font / 2.0
            },
        ];
        self.text.tile(id, index, &text, position)
    }

    pub(super) fn reset(&self) {
        self.text.reset();
    }
}

/// Renders each tile's own quadtree address, for debugging traversal.
pub(super) struct TileIndexProvider {
    text: TextTileProvider,
}

impl TileIndexProvider {
    pub(super) fn new(cache: Arc<TileCache>, renderer: Arc<dyn TextRenderer>) -> Self {
        Self {
            text: TextTileProvider::new(cache, renderer),
        }
    }

    pub(super) fn tile(&self, id: ProviderId, index: TileIndex) -> Tile {
        let text = format!("level: {}\nx: {}\ny: {}", index.level, index.x, index.y);

        let width = self.text.init().width() as f32;
        let height = self.text.init().height() as f32;
        let digits = (index.level as f32 * std::f32::consts::LN_2 / std::f32::consts::LN_10).ceil();
        let position = [
            width / 4.0 - (width / 32.0) * digits,
            height / 2.0 + FONT_SIZE as f32,
        ];
        self.text.tile(id, index, &text, position)
    }

    pub(super) fn reset(&self) {
        self.text.reset();
    }
}
