//! Static single-image tile provider.
//!
//! Loads one image file eagerly at construction and serves it for every
//! requested index. Useful for uniform base layers and placeholder
//! imagery.

use std::sync::Arc;

use tracing::warn;

use crate::config::{ConfigError, SingleImageConfig};
use crate::texture::{TextureBackend, TextureFormat, TileTextureInitData};
use crate::tile::{Tile, TileDepthTransform, TileStatus};

pub(super) struct SingleImageProvider {
    file_path: String,
    backend: Arc<dyn TextureBackend>,
    tile: Tile,
}

impl SingleImageProvider {
    pub(super) fn new(
        config: &SingleImageConfig,
        backend: Arc<dyn TextureBackend>,
    ) -> Result<Self, ConfigError> {
        let tile = load_tile(&config.file_path, &backend)?;
        Ok(Self {
            file_path: config.file_path.clone(),
            backend,
            tile,
        })
    }

    /// The one tile, regardless of index.
    pub(super) fn tile(&self) -> Tile {
        self.tile.clone()
    }

    pub(super) fn tile_status(&self) -> TileStatus {
        self.tile.status
    }

    /// Reload the image from disk. A load failure mid-run keeps the
    /// previous texture; construction already proved the path once.
    pub(super) fn reset(&mut self) {
        match load_tile(&self.file_path, &self.backend) {
            Ok(tile) => self.tile = tile,
            Err(error) => {
                warn!(path = %self.file_path, %error, "single image reload failed");
            }
        }
    }

    pub(super) fn depth_transform(&self) -> TileDepthTransform {
        TileDepthTransform::identity()
    }
}

fn load_tile(path: &str, backend: &Arc<dyn TextureBackend>) -> Result<Tile, ConfigError> {
    let image = image::open(path)
        .map_err(|e| ConfigError::ImageLoad {
            path: path.to_string(),
            reason: e.to_string(),
        })?
        .to_rgba8();

    let init = TileTextureInitData::from_dimensions(image.width(), image.height(), TextureFormat::Rgba8);
    let texture = backend.create_texture(&init, image.as_raw());
    Ok(Tile::ready(texture, None))
}
