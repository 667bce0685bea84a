//! Provider configuration.
//!
//! Providers are constructed from a nested configuration tree supplied by
//! the host application's configuration loader. The tree deserializes with
//! serde (internally tagged by `type`), so a JSON layer description like
//!
//! ```json
//! {
//!     "type": "ByLevel",
//!     "layer_group": "ColorLayers",
//!     "level_providers": [
//!         { "max_level": 2, "tile_provider": { "type": "Default", "dataset": "low.wms", "layer_group": "ColorLayers" } },
//!         { "max_level": 5, "tile_provider": { "type": "Default", "dataset": "high.wms", "layer_group": "ColorLayers" } }
//!     ]
//! }
//! ```
//!
//! maps directly onto [`ProviderConfig`]. Configuration errors are fatal
//! at construction; no partially-configured provider is left usable.

use serde::Deserialize;
use thiserror::Error;

use crate::texture::{TextureFormat, TileTextureInitData};

/// Placeholder substituted with the formatted time key in a temporal
/// provider's dataset template.
pub const TIME_PLACEHOLDER: &str = "${TimeKey}";

/// Errors raised while constructing providers from configuration.
///
/// All of these are fatal: they surface at startup and abort construction
/// of the offending provider tree.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration tree itself failed to deserialize (missing key,
    /// unknown `type` tag, wrong value shape).
    #[error("malformed provider configuration: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A single-image provider's file could not be loaded.
    #[error("unable to load image '{path}': {reason}")]
    ImageLoad { path: String, reason: String },

    /// The reader factory could not open a dataset.
    #[error("unable to open dataset '{dataset}': {reason}")]
    DatasetOpen { dataset: String, reason: String },

    /// An override tile index exceeds the hashable level range.
    #[error("tile index level {level} exceeds the maximum of {max}")]
    LevelTooDeep { level: u8, max: u8 },

    /// Unknown temporal time format name.
    #[error("unknown time format '{0}'")]
    InvalidTimeFormat(String),

    /// Temporal time resolution that is not `<count><d|h|m>`.
    #[error("invalid time resolution '{0}'")]
    InvalidTimeResolution(String),

    /// Unparseable or inverted temporal time range.
    #[error("invalid time range: {0}")]
    InvalidTimeRange(String),

    /// A temporal dataset template without the time placeholder.
    #[error("temporal dataset template is missing the '{TIME_PLACEHOLDER}' placeholder")]
    MissingTimePlaceholder,

    /// More providers were initialized than the 16-bit id space can hold.
    #[error("tile provider id space exhausted (more than {} providers)", u16::MAX)]
    ProviderIdSpaceExhausted,
}

/// The layer group a provider feeds, which fixes its default texture
/// family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LayerGroup {
    ColorLayers,
    GrayScaleLayers,
    NightLayers,
    WaterMasks,
    Overlays,
    HeightLayers,
}

impl LayerGroup {
    /// Height layers are preprocessed (min/max depth extraction) by
    /// default; everything else is not.
    pub fn default_preprocessing(&self) -> bool {
        matches!(self, LayerGroup::HeightLayers)
    }

    /// Texture format used for tiles of this group.
    pub fn texture_format(&self) -> TextureFormat {
        match self {
            LayerGroup::HeightLayers => TextureFormat::R32F,
            _ => TextureFormat::Rgba8,
        }
    }

    /// Preferred tile edge length in pixels. Height data is sampled far
    /// more coarsely than imagery.
    pub fn default_pixel_size(&self) -> u32 {
        match self {
            LayerGroup::HeightLayers => 64,
            _ => 512,
        }
    }
}

/// Derive the texture init descriptor for a provider from its layer group,
/// padding setting, and optional pixel-size override.
pub fn tile_texture_init_data(
    group: LayerGroup,
    pad_tiles: bool,
    pixel_size: Option<u32>,
) -> TileTextureInitData {
    let size = pixel_size.unwrap_or_else(|| group.default_pixel_size());
    TileTextureInitData::new(size, group.texture_format(), pad_tiles)
}

/// Configuration of one tile provider, tagged by variant.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ProviderConfig {
    Default(DefaultProviderConfig),
    SingleImage(SingleImageConfig),
    SizeReference(SizeReferenceConfig),
    TileIndex(TileIndexConfig),
    ByIndex(ByIndexConfig),
    ByLevel(ByLevelConfig),
    Temporal(TemporalConfig),
}

impl ProviderConfig {
    /// Deserialize a provider configuration from a loose JSON value, the
    /// shape the host's configuration loader hands over.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Configuration of an async raster-backed provider.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultProviderConfig {
    /// Display name used in log output.
    #[serde(default)]
    pub name: Option<String>,
    /// Dataset locator handed to the reader factory.
    pub dataset: String,
    pub layer_group: LayerGroup,
    /// Preferred tile edge length in pixels; the layer group's default
    /// when absent.
    #[serde(default)]
    pub tile_pixel_size: Option<u32>,
    #[serde(default)]
    pub pad_tiles: bool,
    /// Min/max depth extraction during decode; defaults per layer group.
    #[serde(default)]
    pub perform_preprocessing: Option<bool>,
    /// Worker threads for this dataset's read pipeline. Clamped to one
    /// unless the reader supports concurrent reads.
    #[serde(default)]
    pub num_read_threads: Option<usize>,
}

/// Configuration of a single static image served for every index.
#[derive(Debug, Clone, Deserialize)]
pub struct SingleImageConfig {
    pub file_path: String,
}

/// Ellipsoid radii for the size-reference debug provider.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum Radii {
    /// A sphere given by one radius in meters.
    Sphere(f64),
    /// Per-axis radii in meters.
    Ellipsoid([f64; 3]),
}

impl Radii {
    /// Mean equatorial radius, used for longitudinal distances.
    pub fn equatorial_mean(&self) -> f64 {
        match self {
            Radii::Sphere(r) => *r,
            Radii::Ellipsoid([a, b, _]) => (a + b) / 2.0,
        }
    }
}

/// Configuration of the size-reference debug provider.
#[derive(Debug, Clone, Deserialize)]
pub struct SizeReferenceConfig {
    pub radii: Radii,
}

/// Configuration of the tile-index debug provider (no options).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TileIndexConfig {}

/// Configuration of a provider composed of exact-index overrides over a
/// default provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ByIndexConfig {
    pub default_provider: Box<ProviderConfig>,
    #[serde(default)]
    pub index_providers: Vec<IndexProviderConfig>,
}

/// One exact-index override.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexProviderConfig {
    pub tile_index: TileIndexSpec,
    pub tile_provider: Box<ProviderConfig>,
}

/// A quadtree address in configuration form.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TileIndexSpec {
    pub level: u8,
    pub x: i32,
    pub y: i32,
}

/// Configuration of a provider with per-level overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct ByLevelConfig {
    pub layer_group: LayerGroup,
    #[serde(default)]
    pub level_providers: Vec<LevelProviderConfig>,
}

/// One per-level override, used at and below `max_level`.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelProviderConfig {
    pub max_level: u8,
    pub tile_provider: Box<ProviderConfig>,
}

/// Configuration of a time-varying dataset.
///
/// `template` is a default-provider configuration whose dataset locator
/// contains [`TIME_PLACEHOLDER`]; one sub-provider is instantiated per
/// quantized time key.
#[derive(Debug, Clone, Deserialize)]
pub struct TemporalConfig {
    pub template: DefaultProviderConfig,
    #[serde(default)]
    pub time: TemporalTimeConfig,
}

/// Time range, bucket resolution, and key format of a temporal dataset.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemporalTimeConfig {
    /// Range start, ISO-8601 (`2002-06-01` or `2002-06-01T12:00:00Z`).
    pub start: String,
    /// Range end: ISO-8601, `"Today"`, or `"Yesterday"`.
    pub end: String,
    /// Bucket size: `<count><d|h|m>`, e.g. `"1d"`, `"6h"`, `"30m"`.
    pub resolution: String,
    /// Time key format name, e.g. `"YYYY-MM-DD"`.
    pub format: String,
    pub use_fixed_time: bool,
    pub fixed_time: Option<String>,
}

impl Default for TemporalTimeConfig {
    fn default() -> Self {
        Self {
            start: "2000-01-01".to_string(),
            end: "Today".to_string(),
            resolution: "2d".to_string(),
            format: "YYYY-MM-DDThh:mm:ssZ".to_string(),
            use_fixed_time: false,
            fixed_time: None,
        }
    }
}
