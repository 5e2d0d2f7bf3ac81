use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::filename::{car_image_filename, validate_flat_filename};
use super::traits::{ImageStore, StoredImage};

/// Filesystem-backed image store.
///
/// Images live flat in `base_path` as `car_<id>.<ext>` and are served
/// read-only under `url_prefix`. Writes are staged in a sibling directory so
/// partial files are never reachable through the served directory.
pub struct FilesystemImageStore {
    base_path: PathBuf,
    staging_path: PathBuf,
    url_prefix: String,
    max_size: u64,
}

impl FilesystemImageStore {
    /// Create a new filesystem image store, creating its directories.
    pub async fn new(
        base_path: PathBuf,
        url_prefix: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        let url_prefix = normalize_url_prefix(&url_prefix.into())?;
        let staging_path = staging_dir(&base_path)?;

        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(&staging_path).await?;
        Ok(Self {
            base_path,
            staging_path,
            url_prefix,
            max_size,
        })
    }

    /// Directory images are written to.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    /// Directory in-progress writes are staged in.
    pub fn staging_path(&self) -> &PathBuf {
        &self.staging_path
    }

    fn image_path(&self, filename: &str) -> PathBuf {
        self.base_path.join(filename)
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.staging_path.join(uuid::Uuid::new_v4().to_string())
    }
}

/// Check a URL prefix the image directory is mounted under and strip its
/// trailing slashes.
///
/// The result starts with `/`, is not the root itself and contains no route
/// wildcard characters.
pub fn normalize_url_prefix(prefix: &str) -> Result<String, StorageError> {
    let trimmed = prefix.trim().trim_end_matches('/');
    let invalid = |reason: &str| {
        StorageError::Config(format!("invalid image url_prefix {prefix:?}: {reason}"))
    };

    if trimmed.is_empty() {
        return Err(invalid("must not be empty or '/'"));
    }
    if !trimmed.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }
    if trimmed.contains(['{', '}', '*']) {
        return Err(invalid("must not contain '{', '}' or '*'"));
    }
    Ok(trimmed.to_string())
}

/// `<parent>/.<name>.staging`, next to the image directory on the same
/// filesystem so the final rename stays atomic.
fn staging_dir(base_path: &Path) -> Result<PathBuf, StorageError> {
    let name = base_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            StorageError::Config(format!(
                "image directory {} has no final path component",
                base_path.display()
            ))
        })?;
    let parent = base_path.parent().unwrap_or_else(|| Path::new("."));
    Ok(parent.join(format!(".{name}.staging")))
}

#[async_trait]
impl ImageStore for FilesystemImageStore {
    async fn store(
        &self,
        car_id: i32,
        data: &[u8],
        original_filename: &str,
    ) -> Result<StoredImage, StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let filename = car_image_filename(car_id, original_filename)?;
        let image_path = self.image_path(&filename);

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &image_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(car_id, %filename, size = data.len(), "Stored image on disk");

        Ok(StoredImage {
            reference: filename.clone(),
            key: filename,
        })
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let filename = validate_flat_filename(key)?;
        match fs::remove_file(self.image_path(filename)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn display_url(&self, reference: &str) -> String {
        format!("{}/{}", self.url_prefix, reference)
    }

    fn key_for_reference(&self, reference: &str) -> String {
        reference.to_string()
    }
}
