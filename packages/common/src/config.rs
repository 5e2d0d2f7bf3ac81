use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

/// Which image store implementation backs the service.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImageBackend {
    /// Files on local disk, served by the HTTP server.
    #[default]
    Local,
    /// Hosted Cloudinary-compatible image service.
    Cloudinary,
}

/// App-level image storage configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ImageConfig {
    #[serde(default)]
    pub backend: ImageBackend,
    /// Surface image store failures to callers instead of logging and
    /// continuing without an image. Default: false.
    #[serde(default)]
    pub fail_on_error: bool,
    #[serde(default)]
    pub local: LocalImageConfig,
    #[serde(default)]
    pub cloudinary: CloudinaryConfig,
    #[serde(default)]
    pub transform: TransformConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocalImageConfig {
    /// Directory images are written to. Default: "./images".
    #[serde(default = "default_local_dir")]
    pub dir: PathBuf,
    /// URL prefix the directory is served under. Default: "/images".
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
    /// Largest accepted image in bytes. Default: 16 MiB.
    #[serde(default = "default_max_size")]
    pub max_size: u64,
}

fn default_local_dir() -> PathBuf {
    PathBuf::from("./images")
}
fn default_url_prefix() -> String {
    "/images".into()
}
fn default_max_size() -> u64 {
    16 * 1024 * 1024
}

impl Default for LocalImageConfig {
    fn default() -> Self {
        Self {
            dir: default_local_dir(),
            url_prefix: default_url_prefix(),
            max_size: default_max_size(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct CloudinaryConfig {
    #[serde(default)]
    pub cloud_name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    /// Logical folder uploads are placed in. Default: "cars".
    #[serde(default = "default_folder")]
    pub folder: String,
    /// API root, without the cloud name. Default: "https://api.cloudinary.com/v1_1".
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_folder() -> String {
    "cars".into()
}
fn default_api_base() -> String {
    "https://api.cloudinary.com/v1_1".into()
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: default_folder(),
            api_base: default_api_base(),
        }
    }
}

impl fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("folder", &self.folder)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Pre-store image normalisation.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct TransformConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Edge length of the square output in pixels. Default: 512.
    #[serde(default = "default_transform_size")]
    pub size: u32,
    /// JPEG quality, 1-100. Default: 85.
    #[serde(default = "default_transform_quality")]
    pub quality: u8,
}

fn default_transform_size() -> u32 {
    512
}
fn default_transform_quality() -> u8 {
    85
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            size: default_transform_size(),
            quality: default_transform_quality(),
        }
    }
}
