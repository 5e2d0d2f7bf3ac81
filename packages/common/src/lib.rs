pub mod config;
pub mod storage;

pub use config::{ImageBackend, ImageConfig};
pub use storage::{ImageStore, StorageError, StoredImage};
