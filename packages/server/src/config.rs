use std::env;

use common::config::ImageConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origins. Empty means any origin.
    #[serde(default)]
    pub allow_origins: Vec<String>,
    /// Send `Access-Control-Allow-Credentials`. Origins, methods and headers
    /// are then echoed from the request instead of answered with `*`.
    #[serde(default)]
    pub allow_credentials: bool,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

fn default_cors_max_age() -> u64 {
    3600
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: Vec::new(),
            allow_credentials: false,
            max_age: default_cors_max_age(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub images: ImageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("database.url", "sqlite://./cars.db?mode=rwc")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., CARS__SERVER__PORT)
            .add_source(Environment::with_prefix("CARS").separator("__"))
            // Conventional deployment variables win over everything else
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option(
                "images.cloudinary.cloud_name",
                env::var("CLOUDINARY_CLOUD_NAME").ok(),
            )?
            .set_override_option(
                "images.cloudinary.api_key",
                env::var("CLOUDINARY_API_KEY").ok(),
            )?
            .set_override_option(
                "images.cloudinary.api_secret",
                env::var("CLOUDINARY_API_SECRET").ok(),
            )?
            .build()?;

        s.try_deserialize()
    }
}
