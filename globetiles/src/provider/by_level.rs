//! Per-level override provider.
//!
//! Each child provider is registered with a maximum level and serves every
//! level at or below it, down to the next registration. Gaps in the table
//! are filled from deeper registrations, and requests beyond the deepest
//! registration clamp to it.

use crate::config::{ByLevelConfig, ConfigError};
use crate::tile::{Tile, TileIndex, TileStatus};

use super::{ProviderContext, ProviderIdRegistry, TileProvider};

pub(super) struct TileProviderByLevel {
    providers: Vec<TileProvider>,
    /// `level_indices[level]` is the index into `providers` serving that
    /// level; one slot per level 0..=deepest registered max level.
    level_indices: Vec<usize>,
}

impl TileProviderByLevel {
    pub(super) fn new(config: &ByLevelConfig, ctx: &ProviderContext) -> Result<Self, ConfigError> {
        let mut providers = Vec::with_capacity(config.level_providers.len());
        let mut table: Vec<Option<usize>> = Vec::new();

        for entry in &config.level_providers {
            let provider = TileProvider::from_config(&entry.tile_provider, ctx)?;
            providers.push(provider);
            let provider_index = providers.len() - 1;

            let max_level = entry.max_level as usize;
            if table.len() <= max_level {
                table.resize(max_level + 1, None);
            }
            table[max_level] = Some(provider_index);
        }

        // Fill gaps from the back: a level without its own registration is
        // served by the next deeper one.
        for level in (0..table.len().saturating_sub(1)).rev() {
            if table[level].is_none() {
                table[level] = table[level + 1];
            }
        }

        let level_indices = table
            .into_iter()
            .map(|slot| slot.expect("gap filling leaves no empty slot below a registration"))
            .collect();

        Ok(Self {
            providers,
            level_indices,
        })
    }

    fn provider_index(&self, level: u8) -> Option<usize> {
        if self.level_indices.is_empty() {
            return None;
        }
        let clamped = (level as usize).min(self.level_indices.len() - 1);
        Some(self.level_indices[clamped])
    }

    pub(super) fn level_provider(&self, level: u8) -> Option<&TileProvider> {
        self.provider_index(level).map(|i| &self.providers[i])
    }

    pub(super) fn level_provider_mut(&mut self, level: u8) -> Option<&mut TileProvider> {
        self.provider_index(level).map(|i| &mut self.providers[i])
    }

    pub(super) fn initialize_children(
        &mut self,
        registry: &ProviderIdRegistry,
    ) -> Result<(), ConfigError> {
        for provider in &mut self.providers {
            provider.initialize(registry)?;
        }
        Ok(())
    }

    pub(super) fn for_each_child(&mut self, f: &mut dyn FnMut(&mut TileProvider)) {
        for provider in &mut self.providers {
            f(provider);
        }
    }

    pub(super) fn tile(&mut self, index: TileIndex) -> Tile {
        match self.level_provider_mut(index.level) {
            Some(provider) => provider.tile(index),
            None => Tile::unavailable(),
        }
    }

    pub(super) fn tile_status(&self, index: TileIndex) -> TileStatus {
        match self.level_provider(index.level) {
            Some(provider) => provider.tile_status(index),
            None => TileStatus::Unavailable,
        }
    }

    /// The deepest level with its own registration.
    pub(super) fn max_level(&self) -> u8 {
        (self.level_indices.len() as u8).saturating_sub(1)
    }
}
