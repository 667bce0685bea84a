//! Exact-index override provider.
//!
//! Holds a map from specific quadtree addresses to dedicated providers,
//! plus a default child. `tile()` answers only for overridden indices -
//! composition with the default provider happens at the layer above -
//! while metadata queries and lifecycle operations flow through the
//! default child.

use std::collections::HashMap;

use crate::config::{ByIndexConfig, ConfigError};
use crate::tile::{Tile, TileDepthTransform, TileIndex, TileStatus, MAX_HASHABLE_LEVEL};

use super::{ProviderContext, ProviderIdRegistry, TileProvider};

pub(super) struct TileProviderByIndex {
    default_provider: Box<TileProvider>,
    /// Overrides keyed by `TileIndex::hash_key`.
    overrides: HashMap<u64, TileProvider>,
}

impl TileProviderByIndex {
    pub(super) fn new(config: &ByIndexConfig, ctx: &ProviderContext) -> Result<Self, ConfigError> {
        let default_provider = Box::new(TileProvider::from_config(&config.default_provider, ctx)?);

        let mut overrides = HashMap::with_capacity(config.index_providers.len());
        for entry in &config.index_providers {
            let spec = entry.tile_index;
            if spec.level > MAX_HASHABLE_LEVEL {
                return Err(ConfigError::LevelTooDeep {
                    level: spec.level,
                    max: MAX_HASHABLE_LEVEL,
                });
            }
            let index = TileIndex::new(spec.x, spec.y, spec.level);
            let provider = TileProvider::from_config(&entry.tile_provider, ctx)?;
            overrides.insert(index.hash_key(), provider);
        }

        Ok(Self {
            default_provider,
            overrides,
        })
    }

    pub(super) fn initialize_children(
        &mut self,
        registry: &ProviderIdRegistry,
    ) -> Result<(), ConfigError> {
        for provider in self.overrides.values_mut() {
            provider.initialize(registry)?;
        }
        self.default_provider.initialize(registry)
    }

    pub(super) fn for_each_child(&mut self, f: &mut dyn FnMut(&mut TileProvider)) {
        for provider in self.overrides.values_mut() {
            f(provider);
        }
        f(&mut self.default_provider);
    }

    pub(super) fn tile(&mut self, index: TileIndex) -> Tile {
        match self.overrides.get_mut(&index.hash_key()) {
            Some(provider) => provider.tile(index),
            None => Tile::unavailable(),
        }
    }

    pub(super) fn tile_status(&self, index: TileIndex) -> TileStatus {
        match self.overrides.get(&index.hash_key()) {
            Some(provider) => provider.tile_status(index),
            None => TileStatus::Unavailable,
        }
    }

    pub(super) fn max_level(&self) -> u8 {
        self.default_provider.max_level()
    }

    pub(super) fn depth_transform(&self) -> TileDepthTransform {
        self.default_provider.depth_transform()
    }
}
