use thiserror::Error;

/// Errors that can occur during image storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested image was not found.
    #[error("image not found: {0}")]
    NotFound(String),
    /// An I/O error occurred.
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The derived filename or storage key is not a flat, safe name.
    #[error("invalid image filename: {0}")]
    InvalidFilename(String),
    /// The image exceeds the configured size limit.
    #[error("image exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// The hosted image service rejected the request or was unreachable.
    #[error("remote image service error: {0}")]
    Remote(String),
    /// Decoding, resizing or re-encoding the image failed.
    #[error("image transform failed: {0}")]
    Transform(String),
    /// The image store is misconfigured.
    #[error("image store configuration error: {0}")]
    Config(String),
}

#[cfg(feature = "cloudinary")]
impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote(err.to_string())
    }
}
