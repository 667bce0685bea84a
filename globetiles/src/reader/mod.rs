//! Raster dataset reader contract.
//!
//! Decoding geospatial rasters is delegated to an external collaborator.
//! This module defines the contract the tile subsystem consumes: a
//! [`RawTileDataReader`] turns a tile index into decoded pixel data plus
//! metadata, and a [`ReaderFactory`] opens readers from a dataset locator
//! string at provider-construction time.
//!
//! Readers are called from background worker threads and may block on file
//! or network I/O for as long as they need.

use std::sync::Arc;

use thiserror::Error;

use crate::config::ConfigError;
use crate::texture::TileTextureInitData;
use crate::tile::{TileDepthTransform, TileIndex};

/// Errors a reader can tag onto an individual tile read.
///
/// These are non-fatal: the tile is reported unavailable and the pipeline
/// keeps serving subsequent requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    /// The underlying file or network source failed.
    #[error("I/O failure: {0}")]
    Io(String),
    /// The requested index lies outside the source dataset.
    #[error("tile {0} is outside the dataset bounds")]
    OutOfBounds(TileIndex),
    /// The source data could not be decoded.
    #[error("decode failure: {0}")]
    Decode(String),
}

/// Per-tile statistics extracted during preprocessing of height data.
#[derive(Debug, Clone, PartialEq)]
pub struct TileMetaData {
    /// Maximum sample value per channel.
    pub max_values: Vec<f32>,
    /// Minimum sample value per channel.
    pub min_values: Vec<f32>,
    /// Whether any no-data sample was seen, per channel.
    pub has_missing_data: Vec<bool>,
}

/// One decoded tile as produced by a reader on a worker thread.
///
/// The pixel buffer is owned by whichever thread currently holds the
/// `RawTile`: the worker until it is pushed onto the completed queue, then
/// the render thread, which uploads it and hands the texture to the cache.
#[derive(Debug, Clone)]
pub struct RawTile {
    pub index: TileIndex,
    pub pixels: Vec<u8>,
    /// Texture family the pixel buffer belongs to.
    pub init: TileTextureInitData,
    /// Preprocessing results, present for height data.
    pub metadata: Option<TileMetaData>,
    /// Set when the read failed; the pixel buffer is then unspecified.
    pub error: Option<ReadError>,
}

impl RawTile {
    /// A failed read for `index`.
    pub fn failed(index: TileIndex, init: TileTextureInitData, error: ReadError) -> Self {
        Self {
            index,
            pixels: Vec::new(),
            init,
            metadata: None,
            error: Some(error),
        }
    }
}

/// Synchronous, possibly blocking access to one geospatial raster dataset.
///
/// Implementations must be safe to call from a background thread. A reader
/// is shared by the worker threads of exactly one pipeline; unless
/// [`supports_concurrent_reads`](RawTileDataReader::supports_concurrent_reads)
/// says otherwise, only a single worker will call it at a time.
pub trait RawTileDataReader: Send + Sync {
    /// Read and decode the tile at `index`. Blocking.
    ///
    /// Failures are reported through [`RawTile::error`], never panics.
    fn read_tile_data(&self, index: TileIndex) -> RawTile;

    /// Deepest level at which this dataset has native data.
    fn max_chunk_level(&self) -> u8;

    /// Mapping from normalized samples to height values. Identity for
    /// non-height datasets.
    fn depth_transform(&self) -> TileDepthTransform {
        TileDepthTransform::identity()
    }

    /// The sample value marking missing data.
    fn no_data_value_as_float(&self) -> f32 {
        f32::MIN
    }

    /// Texture family of the tiles this reader produces.
    fn texture_init_data(&self) -> TileTextureInitData;

    /// Whether several worker threads may call
    /// [`read_tile_data`](RawTileDataReader::read_tile_data) concurrently.
    fn supports_concurrent_reads(&self) -> bool {
        false
    }
}

/// Opens readers from dataset locator strings.
///
/// Supplied by the host application; called once per default provider at
/// construction time (and again when a provider rebuilds its pipeline).
pub trait ReaderFactory: Send + Sync {
    /// Open the dataset named by `locator`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DatasetOpen`] when the dataset cannot be
    /// opened - a fatal configuration error.
    fn create_reader(
        &self,
        locator: &str,
        init: TileTextureInitData,
        perform_preprocessing: bool,
    ) -> Result<Arc<dyn RawTileDataReader>, ConfigError>;
}
