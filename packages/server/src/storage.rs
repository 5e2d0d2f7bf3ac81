use std::sync::Arc;

use anyhow::Context;
use common::storage::{ImageStore, build_image_store};
use sea_orm::{DatabaseConnection, DbErr};
use tracing::info;

use crate::config::AppConfig;
use crate::database::init_db;

/// Everything the car service persists to: the record store and the image
/// store, plus the policy for image failures.
///
/// Built once at start-up by [`StorageContext::init`] and released by
/// [`StorageContext::teardown`].
#[derive(Clone)]
pub struct StorageContext {
    pub db: DatabaseConnection,
    pub images: Arc<dyn ImageStore>,
    pub fail_on_image_error: bool,
}

impl StorageContext {
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let db = init_db(&config.database.url)
            .await
            .context("Failed to initialize database")?;

        let images = build_image_store(&config.images)
            .await
            .context("Failed to initialize image store")?;

        info!(
            backend = ?config.images.backend,
            transform = config.images.transform.enabled,
            fail_on_error = config.images.fail_on_error,
            "Storage initialized"
        );

        Ok(Self {
            db,
            images,
            fail_on_image_error: config.images.fail_on_error,
        })
    }

    /// Close the database pool.
    pub async fn teardown(self) -> Result<(), DbErr> {
        self.db.close().await
    }
}
