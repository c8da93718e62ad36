use std::collections::HashMap;

use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("could not decode asset {key:?}: {source}")]
    Decode {
        key: String,
        #[source]
        source: image::ImageError,
    },

    #[error("asset {0:?} decoded to zero dimensions")]
    EmptyImage(String),
}

/// Decoded RGBA pixels keyed by source identity (url or content digest).
///
/// The scene model itself is pixel-free; everything that needs to draw
/// (the preview renderer, a host canvas) resolves sources through here.
#[derive(Default)]
pub struct AssetStore {
    images: HashMap<String, RgbaImage>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode raw bytes and store them under the key. Returns the decoded
    /// dimensions.
    pub fn insert_bytes(&mut self, key: &str, bytes: &[u8]) -> Result<(u32, u32), AssetError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|source| AssetError::Decode {
                key: key.to_string(),
                source,
            })?
            .to_rgba8();
        let (w, h) = decoded.dimensions();
        if w == 0 || h == 0 {
            return Err(AssetError::EmptyImage(key.to_string()));
        }
        self.images.insert(key.to_string(), decoded);
        Ok((w, h))
    }

    /// Store already-decoded pixels (the ingestion pipeline's output).
    pub fn insert_decoded(&mut self, key: &str, pixels: RgbaImage) {
        self.images.insert(key.to_string(), pixels);
    }

    pub fn get(&self, key: &str) -> Option<&RgbaImage> {
        self.images.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.images.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<RgbaImage> {
        self.images.remove(key)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }
}
