//! Async raster-backed tile provider.
//!
//! Wraps one [`AsyncTileDataProvider`] over one dataset. `tile()` never
//! blocks: it answers from the cache and enqueues an asynchronous read on
//! a miss; `update()` uploads one finished read per frame and rebuilds the
//! pipeline once a reset-triggered drain completes.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{ProviderTileKey, TileCache};
use crate::config::{tile_texture_init_data, ConfigError, DefaultProviderConfig};
use crate::pipeline::AsyncTileDataProvider;
use crate::reader::ReaderFactory;
use crate::texture::TileTextureInitData;
use crate::tile::{Tile, TileDepthTransform, TileIndex, TileStatus, MAX_HASHABLE_LEVEL};

use super::ProviderId;

pub(super) struct DefaultTileProvider {
    name: String,
    dataset: String,
    perform_preprocessing: bool,
    num_read_threads: usize,
    init_data: TileTextureInitData,
    cache: Arc<TileCache>,
    readers: Arc<dyn ReaderFactory>,
    /// `None` only after a pipeline rebuild failed; the provider then
    /// serves Unavailable until the next reset.
    pipeline: Option<AsyncTileDataProvider>,
}

impl DefaultTileProvider {
    pub(super) fn new(
        config: &DefaultProviderConfig,
        cache: Arc<TileCache>,
        readers: Arc<dyn ReaderFactory>,
    ) -> Result<Self, ConfigError> {
        let name = config
            .name
            .clone()
            .unwrap_or_else(|| config.dataset.clone());
        let init_data =
            tile_texture_init_data(config.layer_group, config.pad_tiles, config.tile_pixel_size);
        let perform_preprocessing = config
            .perform_preprocessing
            .unwrap_or_else(|| config.layer_group.default_preprocessing());
        let num_read_threads = config.num_read_threads.unwrap_or(1);

        let mut provider = Self {
            name,
            dataset: config.dataset.clone(),
            perform_preprocessing,
            num_read_threads,
            init_data,
            cache,
            readers,
            pipeline: None,
        };
        // Construction-time reader failures are fatal configuration errors.
        provider.pipeline = Some(provider.create_pipeline()?);
        Ok(provider)
    }

    fn create_pipeline(&self) -> Result<AsyncTileDataProvider, ConfigError> {
        let reader = self.readers.create_reader(
            &self.dataset,
            self.init_data,
            self.perform_preprocessing,
        )?;
        Ok(AsyncTileDataProvider::new(
            &self.name,
            reader,
            self.num_read_threads,
        ))
    }

    pub(super) fn tile(&mut self, id: ProviderId, index: TileIndex) -> Tile {
        let Some(pipeline) = &mut self.pipeline else {
            return Tile::unavailable();
        };
        if index.level > pipeline.reader().max_chunk_level() {
            return Tile::out_of_range();
        }

        let key = ProviderTileKey::new(id, index);
        let tile = self.cache.get(&key);
        if tile.texture.is_none() {
            pipeline.enqueue_tile_io(index);
        }
        tile
    }

    pub(super) fn tile_status(&self, id: ProviderId, index: TileIndex) -> TileStatus {
        let Some(pipeline) = &self.pipeline else {
            return TileStatus::Unavailable;
        };
        if index.level > pipeline.reader().max_chunk_level() {
            return TileStatus::OutOfRange;
        }
        self.cache.get(&ProviderTileKey::new(id, index)).status
    }

    /// Poll the pipeline; returns whether a tile was uploaded this frame.
    pub(super) fn update(&mut self, id: ProviderId) -> bool {
        let Some(pipeline) = &mut self.pipeline else {
            return false;
        };

        pipeline.update();
        let uploaded = match pipeline.pop_finished_raw_tile() {
            Some(raw) => {
                let key = ProviderTileKey::new(id, raw.index);
                self.cache.create_tile_and_put(key, raw);
                true
            }
            None => false,
        };

        if pipeline.should_be_deleted() {
            debug!(name = %self.name, "rebuilding drained tile read pipeline");
            self.pipeline = None;
            match self.create_pipeline() {
                Ok(pipeline) => self.pipeline = Some(pipeline),
                Err(error) => {
                    warn!(name = %self.name, %error, "pipeline rebuild failed");
                }
            }
        }
        uploaded
    }

    /// Drop all cached tiles and drain the read pipeline; `update` rebuilds
    /// it once the drain completes.
    pub(super) fn reset(&mut self) {
        self.cache.clear();
        match &mut self.pipeline {
            Some(pipeline) => pipeline.prepare_to_be_deleted(),
            None => match self.create_pipeline() {
                Ok(pipeline) => self.pipeline = Some(pipeline),
                Err(error) => {
                    warn!(name = %self.name, %error, "pipeline rebuild failed");
                }
            },
        }
    }

    pub(super) fn max_level(&self) -> u8 {
        match &self.pipeline {
            Some(pipeline) => pipeline.reader().max_chunk_level(),
            // Without a reader the hash-key encoding is the only ceiling.
            None => MAX_HASHABLE_LEVEL,
        }
    }

    pub(super) fn depth_transform(&self) -> TileDepthTransform {
        match &self.pipeline {
            Some(pipeline) => pipeline.reader().depth_transform(),
            None => TileDepthTransform::identity(),
        }
    }

    pub(super) fn no_data_value_as_float(&self) -> f32 {
        match &self.pipeline {
            Some(pipeline) => pipeline.reader().no_data_value_as_float(),
            None => f32::MIN,
        }
    }
}
