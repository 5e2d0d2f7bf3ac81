use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

use super::error::StorageError;
use super::filename::strip_extension;
use super::traits::{ImageStore, StoredImage};
use crate::config::TransformConfig;

/// Normalises an image to an RGB square JPEG of fixed size and quality.
#[derive(Debug, Clone, Copy)]
pub struct ImageTransform {
    size: u32,
    quality: u8,
}

impl ImageTransform {
    pub fn new(size: u32, quality: u8) -> Self {
        Self {
            size: size.max(1),
            quality: quality.clamp(1, 100),
        }
    }

    /// Decode, convert to RGB8, resize to `size`x`size` and re-encode as JPEG.
    pub fn apply(&self, data: &[u8]) -> Result<Vec<u8>, StorageError> {
        let img = image::load_from_memory(data)
            .map_err(|e| StorageError::Transform(format!("decode: {e}")))?;

        let rgb = img.to_rgb8();
        let resized = image::imageops::resize(&rgb, self.size, self.size, FilterType::Lanczos3);

        let mut buf = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut buf, self.quality)
            .encode_image(&resized)
            .map_err(|e| StorageError::Transform(format!("encode: {e}")))?;

        Ok(buf.into_inner())
    }
}

impl From<&TransformConfig> for ImageTransform {
    fn from(config: &TransformConfig) -> Self {
        Self::new(config.size, config.quality)
    }
}

/// Runs an [`ImageTransform`] before delegating to the wrapped store.
///
/// A failed transform is logged and the original bytes are stored unchanged.
pub struct TransformingImageStore {
    inner: Arc<dyn ImageStore>,
    transform: ImageTransform,
}

impl TransformingImageStore {
    pub fn new(inner: Arc<dyn ImageStore>, transform: ImageTransform) -> Self {
        Self { inner, transform }
    }
}

#[async_trait]
impl ImageStore for TransformingImageStore {
    async fn store(
        &self,
        car_id: i32,
        data: &[u8],
        original_filename: &str,
    ) -> Result<StoredImage, StorageError> {
        let transform = self.transform;
        let input = data.to_vec();
        let result = tokio::task::spawn_blocking(move || transform.apply(&input))
            .await
            .map_err(|e| StorageError::Transform(format!("transform task failed: {e}")))
            .and_then(|r| r);

        match result {
            Ok(jpeg) => {
                let filename = format!("{}.jpg", strip_extension(original_filename));
                self.inner.store(car_id, &jpeg, &filename).await
            }
            Err(e) => {
                tracing::warn!(car_id, error = %e, "Image transform failed, storing original");
                self.inner.store(car_id, data, original_filename).await
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        self.inner.delete(key).await
    }

    fn display_url(&self, reference: &str) -> String {
        self.inner.display_url(reference)
    }

    fn key_for_reference(&self, reference: &str) -> String {
        self.inner.key_for_reference(reference)
    }
}
