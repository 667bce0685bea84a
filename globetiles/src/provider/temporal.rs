//! Time-varying tile provider.
//!
//! A temporal dataset is a family of raster datasets addressed by a
//! formatted time key. Simulation time is quantized onto the dataset's
//! bucket resolution and substituted into a dataset template; one default
//! sub-provider is lazily instantiated per distinct key and reused for
//! every timestamp that lands in the same bucket.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::config::{ConfigError, DefaultProviderConfig, ProviderConfig, TemporalConfig, TIME_PLACEHOLDER};
use crate::time::{TimeFormat, TimeQuantizer};
use crate::tile::{Tile, TileDepthTransform, TileIndex, TileStatus};

use super::{ProviderContext, ProviderId, ProviderIdRegistry, TileProvider};

pub(super) struct TemporalTileProvider {
    /// Default-provider configuration whose dataset locator contains the
    /// time placeholder.
    template: DefaultProviderConfig,
    quantizer: TimeQuantizer,
    format: TimeFormat,
    use_fixed_time: bool,
    fixed_time: Option<String>,
    ctx: ProviderContext,
    /// Set at initialize; needed to initialize lazily created children.
    registry: Option<ProviderIdRegistry>,
    sub_providers: HashMap<String, TileProvider>,
    /// Key resolved by the most recent `update`.
    current_key: Option<String>,
}

impl TemporalTileProvider {
    pub(super) fn new(config: &TemporalConfig, ctx: &ProviderContext) -> Result<Self, ConfigError> {
        if !config.template.dataset.contains(TIME_PLACEHOLDER) {
            return Err(ConfigError::MissingTimePlaceholder);
        }

        let time = &config.time;
        let quantizer =
            TimeQuantizer::new(&time.start, &time.end, &time.resolution, Utc::now())?;
        let format: TimeFormat = time.format.parse()?;

        Ok(Self {
            template: config.template.clone(),
            quantizer,
            format,
            use_fixed_time: time.use_fixed_time,
            fixed_time: time.fixed_time.clone(),
            ctx: ctx.clone(),
            registry: None,
            sub_providers: HashMap::new(),
            current_key: None,
        })
    }

    pub(super) fn set_registry(&mut self, registry: ProviderIdRegistry) {
        self.registry = Some(registry);
    }

    /// The time key for `now`: the fixed key when pinned, otherwise the
    /// formatted quantized bucket.
    fn key_for(&self, now: DateTime<Utc>) -> Option<String> {
        if self.use_fixed_time {
            if let Some(fixed) = &self.fixed_time {
                if !fixed.is_empty() {
                    return Some(fixed.clone());
                }
            }
        }
        self.quantizer
            .quantize(now, true)
            .map(|bucket| self.format.format(bucket))
    }

    /// Get or lazily create the sub-provider for `key`.
    fn ensure_sub_provider(&mut self, key: &str) -> Result<(), ConfigError> {
        if self.sub_providers.contains_key(key) {
            return Ok(());
        }

        let mut child_config = self.template.clone();
        child_config.dataset = child_config.dataset.replace(TIME_PLACEHOLDER, key);
        debug!(dataset = %child_config.dataset, "instantiating temporal sub-provider");

        let mut provider =
            TileProvider::from_config(&ProviderConfig::Default(child_config), &self.ctx)?;
        let registry = self
            .registry
            .as_ref()
            .expect("temporal provider used before initialize");
        provider.initialize(registry)?;
        self.sub_providers.insert(key.to_string(), provider);
        Ok(())
    }

    /// Resolve the sub-provider for `now` and update it.
    pub(super) fn update(&mut self, now: DateTime<Utc>) -> bool {
        if let Some(key) = self.key_for(now) {
            match self.ensure_sub_provider(&key) {
                Ok(()) => self.current_key = Some(key),
                Err(e) => error!(key = %key, error = %e, "temporal sub-provider creation failed"),
            }
        }
        match self.current_mut() {
            Some(provider) => provider.update(now),
            None => false,
        }
    }

    fn current(&self) -> Option<&TileProvider> {
        self.sub_providers.get(self.current_key.as_ref()?)
    }

    fn current_mut(&mut self) -> Option<&mut TileProvider> {
        let key = self.current_key.clone()?;
        self.sub_providers.get_mut(&key)
    }

    /// Identity of the currently resolved sub-provider, if any.
    pub(super) fn current_provider_id(&self) -> Option<ProviderId> {
        self.current().map(|provider| provider.unique_identifier())
    }

    pub(super) fn tile(&mut self, index: TileIndex) -> Tile {
        match self.current_mut() {
            Some(provider) => provider.tile(index),
            // No update has resolved a time key yet.
            None => Tile::unavailable(),
        }
    }

    pub(super) fn tile_status(&self, index: TileIndex) -> TileStatus {
        match self.current() {
            Some(provider) => provider.tile_status(index),
            None => TileStatus::Unavailable,
        }
    }

    pub(super) fn max_level(&self) -> u8 {
        match self.current() {
            Some(provider) => provider.max_level(),
            None => 0,
        }
    }

    pub(super) fn depth_transform(&self) -> TileDepthTransform {
        match self.current() {
            Some(provider) => provider.depth_transform(),
            None => TileDepthTransform::identity(),
        }
    }

    pub(super) fn for_each_child(&mut self, f: &mut dyn FnMut(&mut TileProvider)) {
        for provider in self.sub_providers.values_mut() {
            f(provider);
        }
    }
}
