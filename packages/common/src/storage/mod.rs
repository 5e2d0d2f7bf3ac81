mod error;
mod filename;
mod traits;

#[cfg(feature = "cloudinary")]
pub mod cloudinary;
pub mod filesystem;
#[cfg(feature = "transform")]
pub mod transform;

use std::sync::Arc;

pub use error::StorageError;
pub use filename::{car_image_filename, extension_of};
pub use traits::{ImageStore, StoredImage};

use crate::config::{CloudinaryConfig, ImageBackend, ImageConfig, TransformConfig};
use filesystem::FilesystemImageStore;

/// Build the image store selected by `config.backend`, wrapped in the
/// pre-store transform when that is enabled.
pub async fn build_image_store(config: &ImageConfig) -> Result<Arc<dyn ImageStore>, StorageError> {
    let store: Arc<dyn ImageStore> = match config.backend {
        ImageBackend::Local => Arc::new(
            FilesystemImageStore::new(
                config.local.dir.clone(),
                config.local.url_prefix.clone(),
                config.local.max_size,
            )
            .await?,
        ),
        ImageBackend::Cloudinary => cloudinary_store(&config.cloudinary)?,
    };

    if config.transform.enabled {
        with_transform(store, &config.transform)
    } else {
        Ok(store)
    }
}

#[cfg(feature = "cloudinary")]
fn cloudinary_store(config: &CloudinaryConfig) -> Result<Arc<dyn ImageStore>, StorageError> {
    Ok(Arc::new(cloudinary::CloudinaryImageStore::new(config)?))
}

#[cfg(not(feature = "cloudinary"))]
fn cloudinary_store(_config: &CloudinaryConfig) -> Result<Arc<dyn ImageStore>, StorageError> {
    Err(StorageError::Config(
        "built without the `cloudinary` feature".into(),
    ))
}

#[cfg(feature = "transform")]
fn with_transform(
    store: Arc<dyn ImageStore>,
    config: &TransformConfig,
) -> Result<Arc<dyn ImageStore>, StorageError> {
    Ok(Arc::new(transform::TransformingImageStore::new(
        store,
        transform::ImageTransform::from(config),
    )))
}

#[cfg(not(feature = "transform"))]
fn with_transform(
    _store: Arc<dyn ImageStore>,
    _config: &TransformConfig,
) -> Result<Arc<dyn ImageStore>, StorageError> {
    Err(StorageError::Config(
        "built without the `transform` feature".into(),
    ))
}
