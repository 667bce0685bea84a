//! CPU-memory texture backend.
//!
//! Stores uploaded pixel buffers in a concurrent map keyed by texture id.
//! Used for headless operation and as the recording backend in tests: the
//! bytes handed to [`TextureBackend::upload`] can be read back with
//! [`SoftwareTextureBackend::pixels`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use super::{Texture, TextureBackend, TileTextureInitData};

/// Texture backend that keeps pixel data in CPU memory.
#[derive(Debug, Default)]
pub struct SoftwareTextureBackend {
    next_id: AtomicU64,
    store: DashMap<u64, Vec<u8>>,
}

impl SoftwareTextureBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read back the last pixel buffer uploaded to `texture_id`.
    pub fn pixels(&self, texture_id: u64) -> Option<Vec<u8>> {
        self.store.get(&texture_id).map(|entry| entry.value().clone())
    }

    /// Number of textures created so far.
    pub fn created_count(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed)
    }
}

impl TextureBackend for SoftwareTextureBackend {
    fn create_texture(&self, init: &TileTextureInitData, pixels: &[u8]) -> Arc<Texture> {
        assert_eq!(
            pixels.len(),
            init.total_bytes(),
            "pixel buffer does not match texture init data"
        );
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.store.insert(id, pixels.to_vec());
        Arc::new(Texture::new(id, *init))
    }

    fn upload(&self, texture: &Texture, pixels: &[u8]) {
        assert_eq!(
            pixels.len(),
            texture.init().total_bytes(),
            "pixel buffer does not match texture init data"
        );
        self.store.insert(texture.id(), pixels.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::TextureFormat;

    #[test]
    fn test_create_records_pixels() {
        let backend = SoftwareTextureBackend::new();
        let init = TileTextureInitData::new(2, TextureFormat::Rgba8, false);
        let pixels: Vec<u8> = (0..init.total_bytes() as u8).collect();

        let texture = backend.create_texture(&init, &pixels);

        assert_eq!(backend.pixels(texture.id()), Some(pixels));
        assert_eq!(texture.byte_size(), init.total_bytes());
    }

    #[test]
    fn test_upload_replaces_pixels() {
        let backend = SoftwareTextureBackend::new();
        let init = TileTextureInitData::new(2, TextureFormat::Rgba8, false);
        let texture = backend.create_texture(&init, &vec![0u8; init.total_bytes()]);

        let replacement = vec![7u8; init.total_bytes()];
        backend.upload(&texture, &replacement);

        assert_eq!(backend.pixels(texture.id()), Some(replacement));
    }

    #[test]
    fn test_ids_are_unique() {
        let backend = SoftwareTextureBackend::new();
        let init = TileTextureInitData::new(2, TextureFormat::Rgba8, false);
        let a = backend.create_texture(&init, &vec![0u8; init.total_bytes()]);
        let b = backend.create_texture(&init, &vec![0u8; init.total_bytes()]);
        assert_ne!(a.id(), b.id());
        assert_eq!(backend.created_count(), 2);
    }

    #[test]
    #[should_panic(expected = "pixel buffer does not match")]
    fn test_create_with_wrong_size_panics() {
        let backend = SoftwareTextureBackend::new();
        let init = TileTextureInitData::new(2, TextureFormat::Rgba8, false);
        backend.create_texture(&init, &[0u8; 3]);
    }
}
