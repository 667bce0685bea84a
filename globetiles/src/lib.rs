//! Globetiles - tile providers and caching for planetary globe rendering
//!
//! This library maps quadtree chunk addresses of a rendered globe onto
//! image tiles sourced from geospatial raster datasets far too large to
//! hold in memory. Tiles are decoded on background worker threads, cached
//! GPU-side under a byte budget with LRU eviction, and degraded gracefully
//! to ancestor tiles while loads are in flight - the render loop is never
//! stalled by tile I/O.
//!
//! The main pieces:
//!
//! - [`tile::TileIndex`] addresses one quadtree cell; [`tile::Tile`] is
//!   what providers hand the renderer.
//! - [`cache::TileCache`] is the process-wide, byte-budgeted tile store.
//! - [`pipeline::AsyncTileDataProvider`] runs the per-dataset worker pool
//!   over a [`reader::RawTileDataReader`] supplied by the host.
//! - [`provider::TileProvider`] is the closed family of provider
//!   strategies (raster-backed, static image, debug text, by-index,
//!   by-level, temporal), constructed from [`config::ProviderConfig`].
//! - [`chunk::chunk_tile`] / [`chunk::chunk_tile_pile`] resolve a
//!   renderable tile (or pile of tiles) for a chunk, walking up the
//!   ancestor chain when the exact resolution is not available.

pub mod cache;
pub mod chunk;
pub mod config;
pub mod pipeline;
pub mod provider;
pub mod reader;
pub mod texture;
pub mod tile;
pub mod time;

pub use cache::{CacheStats, ProviderTileKey, TileCache};
pub use chunk::{chunk_tile, chunk_tile_pile, DEFAULT_MAX_PARENTS};
pub use config::{ConfigError, LayerGroup, ProviderConfig};
pub use pipeline::AsyncTileDataProvider;
pub use provider::{
    ProviderContext, ProviderId, ProviderIdRegistry, TextRenderer, TileProvider, UNBOUNDED_LEVEL,
};
pub use reader::{RawTile, RawTileDataReader, ReadError, ReaderFactory};
pub use texture::{SoftwareTextureBackend, Texture, TextureBackend, TextureFormat, TileTextureInitData};
pub use tile::{
    ChunkTile, ChunkTilePile, Tile, TileDepthTransform, TileIndex, TileStatus, TileUvTransform,
    MAX_HASHABLE_LEVEL,
};
