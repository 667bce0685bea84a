//! GPU texture abstraction consumed by the tile cache.
//!
//! The tile subsystem never talks to a graphics API directly. It describes
//! the textures it needs with [`TileTextureInitData`] and creates them
//! through a [`TextureBackend`] owned by the cache. The renderer supplies a
//! backend bound to its graphics context; [`SoftwareTextureBackend`] keeps
//! pixel data in CPU memory for headless use and tests.
//!
//! Texture creation and upload are confined to the render thread - the
//! only thread that may own a graphics context.

mod software;

pub use software::SoftwareTextureBackend;

use std::sync::Arc;

/// Pixel padding added around a tile when `pad_tiles` is requested, in
/// texels per edge. Padding lets the renderer sample across chunk seams.
pub const TILE_PADDING: u32 = 1;

/// Pixel format of a tile texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit RGBA color.
    Rgba8,
    /// Single-channel 32-bit float, used for height data.
    R32F,
}

impl TextureFormat {
    /// Bytes per pixel for this format.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            TextureFormat::Rgba8 => 4,
            TextureFormat::R32F => 4,
        }
    }
}

/// Size and format of a tile texture, fixed per provider.
///
/// Two init descriptors with the same hash key describe interchangeable
/// texture objects; the cache's texture pool recycles by that key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileTextureInitData {
    width: u32,
    height: u32,
    format: TextureFormat,
    padded: bool,
}

impl TileTextureInitData {
    /// Describe a square tile texture of `tile_size` texels per side,
    /// optionally padded by [`TILE_PADDING`] texels on each edge.
    pub fn new(tile_size: u32, format: TextureFormat, pad_tiles: bool) -> Self {
        let padding = if pad_tiles { 2 * TILE_PADDING } else { 0 };
        Self {
            width: tile_size + padding,
            height: tile_size + padding,
            format,
            padded: pad_tiles,
        }
    }

    /// Describe a texture with explicit dimensions (single-image tiles
    /// take the source image's size).
    pub fn from_dimensions(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            padded: false,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn padded(&self) -> bool {
        self.padded
    }

    /// Total pixel buffer size in bytes.
    pub fn total_bytes(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// Key identifying the family of interchangeable textures this
    /// descriptor creates.
    pub fn hash_key(&self) -> u64 {
        let format_bits: u64 = match self.format {
            TextureFormat::Rgba8 => 0,
            TextureFormat::R32F => 1,
        };
        (self.width as u64) | ((self.height as u64) << 20) | (format_bits << 40) | ((self.padded as u64) << 44)
    }
}

/// An opaque handle to one GPU (or software) texture object.
///
/// The id is unique per backend instance. The tile cache owns every
/// texture it creates; byte accounting against the cache budget uses
/// [`Texture::byte_size`].
#[derive(Debug)]
pub struct Texture {
    id: u64,
    init: TileTextureInitData,
}

impl Texture {
    /// Construct a handle. Only backends create textures.
    pub fn new(id: u64, init: TileTextureInitData) -> Self {
        Self { id, init }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn init(&self) -> &TileTextureInitData {
        &self.init
    }

    /// Resident size in bytes, as counted against the cache budget.
    pub fn byte_size(&self) -> usize {
        self.init.total_bytes()
    }
}

/// Creation and upload of texture objects.
///
/// Implementations wrap a graphics context (or, for
/// [`SoftwareTextureBackend`], plain memory). Allocation failure is fatal:
/// the cache enforces its own byte budget, so running out of texture
/// memory indicates a misconfigured budget and implementations are
/// expected to panic rather than report it.
pub trait TextureBackend: Send + Sync {
    /// Allocate a texture described by `init` and upload `pixels` into it.
    ///
    /// # Panics
    ///
    /// Panics when `pixels` does not match `init.total_bytes()`.
    fn create_texture(&self, init: &TileTextureInitData, pixels: &[u8]) -> Arc<Texture>;

    /// Replace the full contents of an existing texture.
    ///
    /// # Panics
    ///
    /// Panics when `pixels` does not match the texture's init descriptor.
    fn upload(&self, texture: &Texture, pixels: &[u8]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_data_unpadded_size() {
        let init = TileTextureInitData::new(512, TextureFormat::Rgba8, false);
        assert_eq!(init.width(), 512);
        assert_eq!(init.height(), 512);
        assert_eq!(init.total_bytes(), 512 * 512 * 4);
    }

    #[test]
    fn test_init_data_padded_size() {
        let init = TileTextureInitData::new(64, TextureFormat::R32F, true);
        assert_eq!(init.width(), 66);
        assert_eq!(init.height(), 66);
        assert_eq!(init.total_bytes(), 66 * 66 * 4);
    }

    #[test]
    fn test_hash_key_separates_families() {
        let color = TileTextureInitData::new(512, TextureFormat::Rgba8, false);
        let height = TileTextureInitData::new(512, TextureFormat::R32F, false);
        let padded = TileTextureInitData::new(512, TextureFormat::Rgba8, true);

        assert_ne!(color.hash_key(), height.hash_key());
        assert_ne!(color.hash_key(), padded.hash_key());
    }

    #[test]
    fn test_hash_key_equal_for_equal_descriptors() {
        let a = TileTextureInitData::new(64, TextureFormat::R32F, true);
        let b = TileTextureInitData::new(64, TextureFormat::R32F, true);
        assert_eq!(a.hash_key(), b.hash_key());
    }
}
