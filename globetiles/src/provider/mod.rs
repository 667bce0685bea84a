//! Tile provider variants and dispatch.
//!
//! A [`TileProvider`] answers "what tile exists at this index" for one
//! data layer. The variants form a closed set - a tagged union, not an
//! open trait - so every operation dispatches through one exhaustive
//! `match` and adding a variant forces every dispatch site to be updated:
//!
//! - `Default` - async raster-backed provider over one dataset
//! - `SingleImage` - one eagerly-loaded static texture
//! - `SizeReference` / `TileIndex` - procedurally rendered debug text
//! - `ByIndex` - exact-index overrides over a default child
//! - `ByLevel` - per-level override table
//! - `Temporal` - per-timekey sub-providers for time-varying datasets
//!
//! Providers move through Uninitialized → Initialized → Deinitialized;
//! [`initialize`](TileProvider::initialize) assigns the process-unique id
//! that qualifies the provider's cache keys. Operating on a provider
//! outside the Initialized state is a programming error and panics.

mod by_index;
mod by_level;
mod default;
mod registry;
mod single_image;
mod temporal;
mod text;

pub use registry::{ProviderId, ProviderIdRegistry};
pub use text::TextRenderer;

#[cfg(test)]
pub(crate) use text::tests::StubTextRenderer;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::cache::TileCache;
use crate::config::{ConfigError, ProviderConfig};
use crate::reader::ReaderFactory;
use crate::tile::{Tile, TileDepthTransform, TileIndex, TileStatus};

use by_index::TileProviderByIndex;
use by_level::TileProviderByLevel;
use default::DefaultTileProvider;
use single_image::SingleImageProvider;
use temporal::TemporalTileProvider;
use text::{SizeReferenceProvider, TileIndexProvider};

/// `max_level` answer of providers without a native resolution ceiling.
///
/// An explicit "no ceiling" marker: callers ascending past a dataset's
/// maximum level will never need to ascend for these providers.
pub const UNBOUNDED_LEVEL: u8 = u8::MAX;

/// Shared collaborators handed to provider construction.
#[derive(Clone)]
pub struct ProviderContext {
    /// The process-wide tile cache.
    pub cache: Arc<TileCache>,
    /// Opens dataset readers for default providers.
    pub readers: Arc<dyn ReaderFactory>,
    /// Rasterizes debug text for the text providers.
    pub text_renderer: Arc<dyn TextRenderer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleState {
    Uninitialized,
    Initialized,
    Deinitialized,
}

enum ProviderKind {
    Default(DefaultTileProvider),
    SingleImage(SingleImageProvider),
    SizeReference(SizeReferenceProvider),
    TileIndex(TileIndexProvider),
    ByIndex(TileProviderByIndex),
    ByLevel(TileProviderByLevel),
    Temporal(TemporalTileProvider),
}

/// One tile-providing strategy for one data layer.
pub struct TileProvider {
    state: LifecycleState,
    id: Option<ProviderId>,
    kind: ProviderKind,
}

impl TileProvider {
    /// Construct a provider tree from configuration.
    ///
    /// Fatal on any configuration problem; no partially-constructed
    /// provider is returned. The result is Uninitialized - call
    /// [`initialize`](TileProvider::initialize) before use.
    pub fn from_config(config: &ProviderConfig, ctx: &ProviderContext) -> Result<Self, ConfigError> {
        let kind = match config {
            ProviderConfig::Default(c) => ProviderKind::Default(DefaultTileProvider::new(
                c,
                ctx.cache.clone(),
                ctx.readers.clone(),
            )?),
            ProviderConfig::SingleImage(c) => ProviderKind::SingleImage(
                SingleImageProvider::new(c, ctx.cache.backend().clone())?,
            ),
            ProviderConfig::SizeReference(c) => ProviderKind::SizeReference(
                SizeReferenceProvider::new(c, ctx.cache.clone(), ctx.text_renderer.clone()),
            ),
            ProviderConfig::TileIndex(_) => ProviderKind::TileIndex(TileIndexProvider::new(
                ctx.cache.clone(),
                ctx.text_renderer.clone(),
            )),
            ProviderConfig::ByIndex(c) => ProviderKind::ByIndex(TileProviderByIndex::new(c, ctx)?),
            ProviderConfig::ByLevel(c) => ProviderKind::ByLevel(TileProviderByLevel::new(c, ctx)?),
            ProviderConfig::Temporal(c) => {
                ProviderKind::Temporal(TemporalTileProvider::new(c, ctx)?)
            }
        };
        Ok(Self {
            state: LifecycleState::Uninitialized,
            id: None,
            kind,
        })
    }

    /// Assign this provider (and every nested provider) its unique id.
    ///
    /// # Panics
    ///
    /// Panics when called more than once.
    pub fn initialize(&mut self, registry: &ProviderIdRegistry) -> Result<(), ConfigError> {
        assert_eq!(
            self.state,
            LifecycleState::Uninitialized,
            "tile provider can only be initialized once"
        );
        self.id = Some(registry.next_id()?);
        self.state = LifecycleState::Initialized;

        match &mut self.kind {
            ProviderKind::Default(_)
            | ProviderKind::SingleImage(_)
            | ProviderKind::SizeReference(_)
            | ProviderKind::TileIndex(_) => Ok(()),
            ProviderKind::ByIndex(p) => p.initialize_children(registry),
            ProviderKind::ByLevel(p) => p.initialize_children(registry),
            ProviderKind::Temporal(p) => {
                // Children are created lazily; they draw ids from the same
                // registry at creation time.
                p.set_registry(registry.clone());
                Ok(())
            }
        }
    }

    /// Tear the provider down. Terminal: any further operation panics.
    pub fn deinitialize(&mut self) {
        self.assert_usable("deinitialize");
        match &mut self.kind {
            ProviderKind::Default(_)
            | ProviderKind::SingleImage(_)
            | ProviderKind::SizeReference(_)
            | ProviderKind::TileIndex(_) => {}
            ProviderKind::ByIndex(p) => p.for_each_child(&mut |child| child.deinitialize()),
            ProviderKind::ByLevel(p) => p.for_each_child(&mut |child| child.deinitialize()),
            ProviderKind::Temporal(p) => p.for_each_child(&mut |child| child.deinitialize()),
        }
        self.state = LifecycleState::Deinitialized;
    }

    /// The id assigned at initialization.
    pub fn unique_identifier(&self) -> ProviderId {
        self.assert_usable("unique_identifier");
        self.id.expect("initialized provider has an id")
    }

    /// The tile at `index`, never blocking.
    ///
    /// A miss on an async-backed provider enqueues a background load and
    /// returns the current (possibly unavailable) cache entry.
    pub fn tile(&mut self, index: TileIndex) -> Tile {
        self.assert_usable("tile");
        let id = self.id.expect("initialized provider has an id");
        match &mut self.kind {
            ProviderKind::Default(p) => p.tile(id, index),
            ProviderKind::SingleImage(p) => p.tile(),
            ProviderKind::SizeReference(p) => p.tile(id, index),
            ProviderKind::TileIndex(p) => p.tile(id, index),
            ProviderKind::ByIndex(p) => p.tile(index),
            ProviderKind::ByLevel(p) => p.tile(index),
            ProviderKind::Temporal(p) => p.tile(index),
        }
    }

    /// Availability at `index` without side effects: no load is enqueued.
    pub fn tile_status(&self, index: TileIndex) -> TileStatus {
        self.assert_usable("tile_status");
        let id = self.id.expect("initialized provider has an id");
        match &self.kind {
            ProviderKind::Default(p) => p.tile_status(id, index),
            ProviderKind::SingleImage(p) => p.tile_status(),
            ProviderKind::SizeReference(_) => TileStatus::Ok,
            ProviderKind::TileIndex(_) => TileStatus::Ok,
            ProviderKind::ByIndex(p) => p.tile_status(index),
            ProviderKind::ByLevel(p) => p.tile_status(index),
            ProviderKind::Temporal(p) => p.tile_status(index),
        }
    }

    /// Per-frame maintenance; `now` is the simulation time driving
    /// temporal providers. Returns whether anything changed.
    pub fn update(&mut self, now: DateTime<Utc>) -> bool {
        self.assert_usable("update");
        let id = self.id.expect("initialized provider has an id");
        match &mut self.kind {
            ProviderKind::Default(p) => p.update(id),
            ProviderKind::SingleImage(_) => false,
            ProviderKind::SizeReference(_) => false,
            ProviderKind::TileIndex(_) => false,
            ProviderKind::ByIndex(p) => {
                let mut changed = false;
                p.for_each_child(&mut |child| changed |= child.update(now));
                changed
            }
            ProviderKind::ByLevel(p) => {
                let mut changed = false;
                p.for_each_child(&mut |child| changed |= child.update(now));
                changed
            }
            ProviderKind::Temporal(p) => p.update(now),
        }
    }

    /// Drop cached tiles and rebuild loading state.
    pub fn reset(&mut self) {
        self.assert_usable("reset");
        match &mut self.kind {
            ProviderKind::Default(p) => p.reset(),
            ProviderKind::SingleImage(p) => p.reset(),
            ProviderKind::SizeReference(p) => p.reset(),
            ProviderKind::TileIndex(p) => p.reset(),
            ProviderKind::ByIndex(p) => p.for_each_child(&mut |child| child.reset()),
            ProviderKind::ByLevel(p) => p.for_each_child(&mut |child| child.reset()),
            ProviderKind::Temporal(p) => p.for_each_child(&mut |child| child.reset()),
        }
    }

    /// Deepest level this provider can serve; [`UNBOUNDED_LEVEL`] means
    /// no ceiling.
    pub fn max_level(&self) -> u8 {
        match &self.kind {
            ProviderKind::Default(p) => p.max_level(),
            ProviderKind::SingleImage(_) => UNBOUNDED_LEVEL,
            ProviderKind::SizeReference(_) => UNBOUNDED_LEVEL,
            ProviderKind::TileIndex(_) => UNBOUNDED_LEVEL,
            ProviderKind::ByIndex(p) => p.max_level(),
            ProviderKind::ByLevel(p) => p.max_level(),
            ProviderKind::Temporal(p) => p.max_level(),
        }
    }

    /// Height mapping of the underlying dataset; identity for providers
    /// without height semantics.
    pub fn depth_transform(&self) -> TileDepthTransform {
        match &self.kind {
            ProviderKind::Default(p) => p.depth_transform(),
            ProviderKind::SingleImage(p) => p.depth_transform(),
            ProviderKind::SizeReference(_) => TileDepthTransform::identity(),
            ProviderKind::TileIndex(_) => TileDepthTransform::identity(),
            ProviderKind::ByIndex(p) => p.depth_transform(),
            ProviderKind::ByLevel(_) => TileDepthTransform::identity(),
            ProviderKind::Temporal(p) => p.depth_transform(),
        }
    }

    /// The dataset's missing-data marker value.
    pub fn no_data_value_as_float(&self) -> f32 {
        self.assert_usable("no_data_value_as_float");
        match &self.kind {
            ProviderKind::Default(p) => p.no_data_value_as_float(),
            ProviderKind::SingleImage(_) => f32::MIN,
            ProviderKind::SizeReference(_) => f32::MIN,
            ProviderKind::TileIndex(_) => f32::MIN,
            ProviderKind::ByIndex(_) => f32::MIN,
            ProviderKind::ByLevel(_) => f32::MIN,
            ProviderKind::Temporal(_) => f32::MIN,
        }
    }

    /// Identity of a temporal provider's currently resolved sub-provider.
    /// `None` for non-temporal providers or before the first `update`.
    pub fn current_temporal_provider(&self) -> Option<ProviderId> {
        match &self.kind {
            ProviderKind::Temporal(p) => p.current_provider_id(),
            _ => None,
        }
    }

    fn assert_usable(&self, operation: &str) {
        assert_eq!(
            self.state,
            LifecycleState::Initialized,
            "'{}' called on a provider in state {:?}",
            operation,
            self.state
        );
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::LayerGroup;
    use crate::reader::{RawTile, RawTileDataReader, ReadError};
    use crate::texture::{SoftwareTextureBackend, TileTextureInitData};
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{Duration, Instant};

    /// In-memory reader: serves synthetic pixels up to a maximum level.
    pub(crate) struct StubReader {
        init: TileTextureInitData,
        max_level: u8,
        reads: AtomicU64,
    }

    impl RawTileDataReader for StubReader {
        fn read_tile_data(&self, index: TileIndex) -> RawTile {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if index.level > self.max_level {
                return RawTile::failed(index, self.init, ReadError::OutOfBounds(index));
            }
            RawTile {
                index,
                pixels: vec![index.level; self.init.total_bytes()],
                init: self.init,
                metadata: None,
                error: None,
            }
        }

        fn max_chunk_level(&self) -> u8 {
            self.max_level
        }

        fn texture_init_data(&self) -> TileTextureInitData {
            self.init
        }
    }

    /// Factory producing [`StubReader`]s; dataset locators of the form
    /// `"fail"` refuse to open.
    pub(crate) struct StubReaderFactory {
        pub max_level: u8,
    }

    impl ReaderFactory for StubReaderFactory {
        fn create_reader(
            &self,
            locator: &str,
            init: TileTextureInitData,
            _perform_preprocessing: bool,
        ) -> Result<Arc<dyn RawTileDataReader>, ConfigError> {
            if locator == "fail" {
                return Err(ConfigError::DatasetOpen {
                    dataset: locator.to_string(),
                    reason: "stub refusal".to_string(),
                });
            }
            Ok(Arc::new(StubReader {
                init,
                max_level: self.max_level,
                reads: AtomicU64::new(0),
            }))
        }
    }

    pub(crate) fn test_context(max_level: u8) -> ProviderContext {
        let backend = Arc::new(SoftwareTextureBackend::new());
        ProviderContext {
            cache: Arc::new(TileCache::new(256 * 1024 * 1024, backend)),
            readers: Arc::new(StubReaderFactory { max_level }),
            text_renderer: Arc::new(StubTextRenderer::new()),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn default_config(dataset: &str) -> ProviderConfig {
        ProviderConfig::Default(crate::config::DefaultProviderConfig {
            name: None,
            dataset: dataset.to_string(),
            layer_group: LayerGroup::ColorLayers,
            tile_pixel_size: Some(4),
            pad_tiles: false,
            perform_preprocessing: None,
            num_read_threads: None,
        })
    }

    fn initialized(config: &ProviderConfig, ctx: &ProviderContext) -> TileProvider {
        let mut provider = TileProvider::from_config(config, ctx).unwrap();
        provider.initialize(&ProviderIdRegistry::new()).unwrap();
        provider
    }

    /// Drive `update` until `condition` holds or a timeout elapses.
    fn pump_until(
        provider: &mut TileProvider,
        mut condition: impl FnMut(&mut TileProvider) -> bool,
    ) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            provider.update(now());
            if condition(provider) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        false
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    #[test]
    fn test_initialize_assigns_unique_ids() {
        let ctx = test_context(5);
        let registry = ProviderIdRegistry::new();

        let mut a = TileProvider::from_config(&default_config("a.wms"), &ctx).unwrap();
        let mut b = TileProvider::from_config(&default_config("b.wms"), &ctx).unwrap();
        a.initialize(&registry).unwrap();
        b.initialize(&registry).unwrap();

        assert_ne!(a.unique_identifier(), b.unique_identifier());
    }

    #[test]
    #[should_panic(expected = "can only be initialized once")]
    fn test_double_initialize_panics() {
        let ctx = test_context(5);
        let registry = ProviderIdRegistry::new();
        let mut provider = TileProvider::from_config(&default_config("a.wms"), &ctx).unwrap();
        provider.initialize(&registry).unwrap();
        provider.initialize(&registry).unwrap();
    }

    #[test]
    #[should_panic(expected = "'tile' called on a provider in state Uninitialized")]
    fn test_tile_before_initialize_panics() {
        let ctx = test_context(5);
        let mut provider = TileProvider::from_config(&default_config("a.wms"), &ctx).unwrap();
        provider.tile(TileIndex::new(0, 0, 1));
    }

    #[test]
    #[should_panic(expected = "'tile' called on a provider in state Deinitialized")]
    fn test_tile_after_deinitialize_panics() {
        let ctx = test_context(5);
        let mut provider = initialized(&default_config("a.wms"), &ctx);
        provider.deinitialize();
        provider.tile(TileIndex::new(0, 0, 1));
    }

    #[test]
    fn test_failing_dataset_is_fatal_at_construction() {
        let ctx = test_context(5);
        let result = TileProvider::from_config(&default_config("fail"), &ctx);
        assert!(matches!(result, Err(ConfigError::DatasetOpen { .. })));
    }

    // ------------------------------------------------------------------
    // Default provider
    // ------------------------------------------------------------------

    #[test]
    fn test_default_provider_out_of_range() {
        let ctx = test_context(5);
        let mut provider = initialized(&default_config("earth.wms"), &ctx);

        let tile = provider.tile(TileIndex::new(0, 0, 8));
        assert_eq!(tile.status, TileStatus::OutOfRange);
        assert_eq!(provider.tile_status(TileIndex::new(0, 0, 8)), TileStatus::OutOfRange);
        assert_eq!(provider.max_level(), 5);
    }

    #[test]
    fn test_default_provider_async_load_completes() {
        let ctx = test_context(5);
        let mut provider = initialized(&default_config("earth.wms"), &ctx);
        let index = TileIndex::new(1, 0, 2);

        // First request misses and enqueues.
        let first = provider.tile(index);
        assert_eq!(first.status, TileStatus::Unavailable);

        // The background read lands through update().
        assert!(pump_until(&mut provider, |p| p.tile(index).is_ok()));
        assert_eq!(provider.tile_status(index), TileStatus::Ok);
    }

    #[test]
    fn test_default_provider_reset_rebuilds_pipeline() {
        let ctx = test_context(5);
        let mut provider = initialized(&default_config("earth.wms"), &ctx);
        let index = TileIndex::new(1, 0, 2);

        assert!(pump_until(&mut provider, |p| p.tile(index).is_ok()));
        provider.reset();
        assert_eq!(
            provider.tile_status(index),
            TileStatus::Unavailable,
            "reset must clear cached tiles"
        );

        // After the drained pipeline is rebuilt, loading works again.
        assert!(pump_until(&mut provider, |p| p.tile(index).is_ok()));
    }

    // ------------------------------------------------------------------
    // ByIndex
    // ------------------------------------------------------------------

    #[test]
    fn test_by_index_overrides_exact_index_only() {
        let ctx = test_context(5);
        let config = ProviderConfig::from_value(json!({
            "type": "ByIndex",
            "default_provider": {
                "type": "Default", "dataset": "base.wms",
                "layer_group": "ColorLayers", "tile_pixel_size": 4,
            },
            "index_providers": [
                {
                    "tile_index": { "level": 2, "x": 1, "y": 0 },
                    "tile_provider": {
                        "type": "Default", "dataset": "patch.wms",
                        "layer_group": "ColorLayers", "tile_pixel_size": 4,
                    }
                }
            ]
        }))
        .unwrap();
        let mut provider = initialized(&config, &ctx);

        let overridden = TileIndex::new(1, 0, 2);
        assert!(pump_until(&mut provider, |p| p.tile(overridden).is_ok()));

        // A non-overridden index stays unavailable at this layer.
        let other = TileIndex::new(0, 0, 2);
        provider.tile(other);
        provider.update(now());
        assert_eq!(provider.tile_status(other), TileStatus::Unavailable);

        // Metadata flows through the default child.
        assert_eq!(provider.max_level(), 5);
    }

    #[test]
    fn test_by_index_rejects_too_deep_override() {
        let ctx = test_context(5);
        let config = ProviderConfig::from_value(json!({
            "type": "ByIndex",
            "default_provider": {
                "type": "Default", "dataset": "base.wms",
                "layer_group": "ColorLayers", "tile_pixel_size": 4,
            },
            "index_providers": [
                {
                    "tile_index": { "level": 40, "x": 0, "y": 0 },
                    "tile_provider": {
                        "type": "Default", "dataset": "patch.wms",
                        "layer_group": "ColorLayers", "tile_pixel_size": 4,
                    }
                }
            ]
        }))
        .unwrap();
        let result = TileProvider::from_config(&config, &ctx);
        assert!(matches!(result, Err(ConfigError::LevelTooDeep { .. })));
    }

    // ------------------------------------------------------------------
    // ByLevel
    // ------------------------------------------------------------------

    fn by_level_provider(ctx: &ProviderContext) -> TileProvider {
        // Overrides registered at max levels 2 and 5.
        let config = ProviderConfig::from_value(json!({
            "type": "ByLevel",
            "layer_group": "ColorLayers",
            "level_providers": [
                {
                    "max_level": 2,
                    "tile_provider": {
                        "type": "Default", "dataset": "coarse.wms",
                        "layer_group": "ColorLayers", "tile_pixel_size": 4,
                    }
                },
                {
                    "max_level": 5,
                    "tile_provider": {
                        "type": "Default", "dataset": "fine.wms",
                        "layer_group": "ColorLayers", "tile_pixel_size": 4,
                    }
                }
            ]
        }))
        .unwrap();
        initialized(&config, ctx)
    }

    #[test]
    fn test_by_level_routes_between_registrations() {
        let ctx = test_context(10);
        let mut provider = by_level_provider(&ctx);

        // Levels at or below 2 route to the first provider; level 3 falls
        // in the gap and routes to the level-5 registration.
        assert!(pump_until(&mut provider, |p| p.tile(TileIndex::new(0, 0, 1)).is_ok()));
        assert!(pump_until(&mut provider, |p| p.tile(TileIndex::new(0, 0, 3)).is_ok()));
        assert_eq!(provider.max_level(), 5);
    }

    #[test]
    fn test_by_level_clamps_beyond_deepest() {
        let ctx = test_context(10);
        let mut provider = by_level_provider(&ctx);

        // Level 10 clamps to the deepest (level-5) registration, which
        // serves it through its own dataset.
        let deep = TileIndex::new(0, 0, 10);
        assert!(pump_until(&mut provider, |p| p.tile(deep).is_ok()));
    }

    #[test]
    fn test_by_level_empty_table_is_unavailable() {
        let ctx = test_context(5);
        let config = ProviderConfig::from_value(json!({
            "type": "ByLevel",
            "layer_group": "ColorLayers",
            "level_providers": []
        }))
        .unwrap();
        let mut provider = initialized(&config, &ctx);

        assert_eq!(
            provider.tile(TileIndex::new(0, 0, 1)).status,
            TileStatus::Unavailable
        );
        assert_eq!(provider.max_level(), 0);
    }

    // ------------------------------------------------------------------
    // Temporal
    // ------------------------------------------------------------------

    fn temporal_provider(ctx: &ProviderContext) -> TileProvider {
        let config = ProviderConfig::from_value(json!({
            "type": "Temporal",
            "template": {
                "dataset": "modis/${TimeKey}.wms",
                "layer_group": "ColorLayers",
                "tile_pixel_size": 4,
            },
            "time": {
                "start": "2020-01-01",
                "end": "2020-12-31",
                "resolution": "1d",
                "format": "YYYY-MM-DD",
            }
        }))
        .unwrap();
        initialized(&config, ctx)
    }

    fn utc(s: &str) -> DateTime<Utc> {
        crate::time::parse_time(s).unwrap()
    }

    #[test]
    fn test_temporal_same_day_reuses_sub_provider() {
        let ctx = test_context(5);
        let mut provider = temporal_provider(&ctx);

        provider.update(utc("2020-03-05T08:00:00Z"));
        let morning = provider.current_temporal_provider().unwrap();
        provider.tile(TileIndex::new(0, 0, 1));

        provider.update(utc("2020-03-05T21:30:00Z"));
        let evening = provider.current_temporal_provider().unwrap();
        assert_eq!(
            morning, evening,
            "timestamps within one day must share a sub-provider"
        );

        provider.update(utc("2020-03-06T01:00:00Z"));
        let next_day = provider.current_temporal_provider().unwrap();
        assert_ne!(morning, next_day, "the next day gets its own sub-provider");
    }

    #[test]
    fn test_temporal_fixed_time_pins_the_key() {
        let ctx = test_context(5);
        let config = ProviderConfig::from_value(json!({
            "type": "Temporal",
            "template": {
                "dataset": "modis/${TimeKey}.wms",
                "layer_group": "ColorLayers",
                "tile_pixel_size": 4,
            },
            "time": {
                "start": "2020-01-01",
                "end": "2020-12-31",
                "resolution": "1d",
                "format": "YYYY-MM-DD",
                "use_fixed_time": true,
                "fixed_time": "2020-06-01",
            }
        }))
        .unwrap();
        let mut provider = initialized(&config, &ctx);

        provider.update(utc("2020-03-05T08:00:00Z"));
        let first = provider.current_temporal_provider().unwrap();
        provider.update(utc("2020-09-20T08:00:00Z"));
        let second = provider.current_temporal_provider().unwrap();
        assert_eq!(first, second, "fixed time must pin one sub-provider");
    }

    #[test]
    fn test_temporal_template_without_placeholder_is_fatal() {
        let ctx = test_context(5);
        let config = ProviderConfig::from_value(json!({
            "type": "Temporal",
            "template": {
                "dataset": "modis/static.wms",
                "layer_group": "ColorLayers",
            },
        }))
        .unwrap();
        let result = TileProvider::from_config(&config, &ctx);
        assert!(matches!(result, Err(ConfigError::MissingTimePlaceholder)));
    }

    #[test]
    fn test_temporal_tile_before_update_is_unavailable() {
        let ctx = test_context(5);
        let mut provider = temporal_provider(&ctx);
        assert_eq!(
            provider.tile(TileIndex::new(0, 0, 1)).status,
            TileStatus::Unavailable
        );
    }

    #[test]
    fn test_temporal_serves_tiles_through_sub_provider() {
        let ctx = test_context(5);
        let mut provider = temporal_provider(&ctx);
        let index = TileIndex::new(1, 0, 2);

        provider.update(utc("2020-03-05T08:00:00Z"));
        provider.tile(index);
        assert!(pump_until(&mut provider, |p| p.tile(index).is_ok()));
    }

    // ------------------------------------------------------------------
    // Static providers
    // ------------------------------------------------------------------

    #[test]
    fn test_text_provider_serves_any_level() {
        let ctx = test_context(5);
        let config = ProviderConfig::from_value(json!({ "type": "TileIndex" })).unwrap();
        let mut provider = initialized(&config, &ctx);

        assert!(provider.tile(TileIndex::new(0, 0, 1)).is_ok());
        assert!(provider.tile(TileIndex::new(100, 50, 9)).is_ok());
        assert_eq!(provider.max_level(), UNBOUNDED_LEVEL);
        assert_eq!(provider.tile_status(TileIndex::new(0, 0, 1)), TileStatus::Ok);
    }

    #[test]
    fn test_no_data_value_dispatch() {
        let ctx = test_context(5);
        let config = ProviderConfig::from_value(json!({ "type": "TileIndex" })).unwrap();
        let provider = initialized(&config, &ctx);
        assert_eq!(provider.no_data_value_as_float(), f32::MIN);
    }
}
