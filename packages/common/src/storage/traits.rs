use async_trait::async_trait;

use super::error::StorageError;

/// Location of an image after a successful store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// What the car record persists and resolves into a display URL
    /// (a local filename or a remote secure URL).
    pub reference: String,
    /// Authoritative key the store needs to delete the image again.
    pub key: String,
}

/// Auxiliary blob storage for car images, keyed by car ID.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store image bytes for a car and return where they ended up.
    ///
    /// Storing again for the same car overwrites or supersedes the previous image.
    async fn store(
        &self,
        car_id: i32,
        data: &[u8],
        original_filename: &str,
    ) -> Result<StoredImage, StorageError>;

    /// Delete an image by its storage key.
    ///
    /// Returns `true` if the image was deleted, `false` if it did not exist.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    /// Resolve a stored reference into the URL clients fetch the image from.
    fn display_url(&self, reference: &str) -> String;

    /// Derive a storage key from a reference, for records persisted without one.
    fn key_for_reference(&self, reference: &str) -> String;
}
