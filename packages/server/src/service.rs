//! Car service: coordinates the record store with the image store.
//!
//! Rows are committed one statement at a time; image store calls happen
//! between those commits and are never rolled back together with them.

use std::sync::Arc;

use common::storage::{ImageStore, StorageError};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use tracing::{debug, info, warn};

use crate::entity::car;
use crate::error::AppError;
use crate::models::car::{CarInput, CarResponse, ImageUpload, UpdateCarRequest, validate_car_input};
use crate::records;
use crate::storage::StorageContext;

#[derive(Clone)]
pub struct CarService {
    db: DatabaseConnection,
    images: Arc<dyn ImageStore>,
    fail_on_image_error: bool,
}

impl CarService {
    pub fn new(storage: &StorageContext) -> Self {
        Self {
            db: storage.db.clone(),
            images: Arc::clone(&storage.images),
            fail_on_image_error: storage.fail_on_image_error,
        }
    }

    /// Create one row per item, storing the matching file (if any) after each insert.
    ///
    /// `files` is either empty or exactly as long as `items`. Nothing is
    /// written unless every item validates.
    pub async fn bulk_create(
        &self,
        items: Vec<CarInput>,
        files: Vec<Option<ImageUpload>>,
    ) -> Result<Vec<CarResponse>, AppError> {
        if !files.is_empty() && files.len() != items.len() {
            return Err(AppError::Validation(format!(
                "Got {} files for {} cars; send one file slot per car or none",
                files.len(),
                items.len()
            )));
        }
        let cars = items
            .iter()
            .map(validate_car_input)
            .collect::<Result<Vec<_>, _>>()?;

        let mut files = files.into_iter();
        let mut created = Vec::with_capacity(cars.len());

        for new_car in &cars {
            let upload = files.next().flatten();
            let mut model = records::insert(&self.db, new_car).await?;
            debug!(car_id = model.id, "Inserted car");

            if let Some(upload) = upload {
                model = self.attach_image(model, &upload).await?;
            }
            created.push(self.to_response(model));
        }

        info!(count = created.len(), "Created cars");
        Ok(created)
    }

    pub async fn list(&self) -> Result<Vec<CarResponse>, AppError> {
        let cars = records::all(&self.db).await?;
        Ok(cars.into_iter().map(|m| self.to_response(m)).collect())
    }

    pub async fn get(&self, id: i32) -> Result<CarResponse, AppError> {
        let model = find_car(&self.db, id).await?;
        Ok(self.to_response(model))
    }

    /// Apply the supplied fields, then replace the image if a file came along.
    ///
    /// All fields are validated before anything is written.
    pub async fn update(
        &self,
        id: i32,
        request: UpdateCarRequest,
        file: Option<ImageUpload>,
    ) -> Result<CarResponse, AppError> {
        let changes = request.into_changes()?;

        let txn = self.db.begin().await?;
        let existing = find_car(&txn, id).await?;
        let mut model = if changes.is_empty() {
            existing
        } else {
            records::update_fields(&txn, existing, changes).await?
        };
        txn.commit().await?;

        if let Some(upload) = file {
            model = self.replace_image(model, &upload).await?;
        }

        Ok(self.to_response(model))
    }

    /// Delete the row, removing its image first. Image deletion failures are
    /// logged and otherwise ignored.
    pub async fn delete(&self, id: i32) -> Result<CarResponse, AppError> {
        let model = find_car(&self.db, id).await?;

        if let Some(key) = self.image_key(&model) {
            match self.images.delete(&key).await {
                Ok(true) => debug!(car_id = id, %key, "Deleted image"),
                Ok(false) => debug!(car_id = id, %key, "Image already absent"),
                Err(e) => warn!(car_id = id, %key, error = %e, "Failed to delete image"),
            }
        }

        if !records::delete(&self.db, id).await? {
            return Err(AppError::NotFound("Car not found".into()));
        }

        info!(car_id = id, "Deleted car");
        Ok(self.to_response(model))
    }

    async fn attach_image(
        &self,
        model: car::Model,
        upload: &ImageUpload,
    ) -> Result<car::Model, AppError> {
        match self
            .images
            .store(model.id, &upload.data, &upload.filename)
            .await
        {
            Ok(stored) => Ok(records::set_image(&self.db, model, Some(stored)).await?),
            Err(e) => {
                self.absorb(model.id, e)?;
                Ok(model)
            }
        }
    }

    async fn replace_image(
        &self,
        model: car::Model,
        upload: &ImageUpload,
    ) -> Result<car::Model, AppError> {
        // Whether the row's current image (if any) is known to be gone.
        let previous_removed = match self.image_key(&model) {
            Some(key) => match self.images.delete(&key).await {
                Ok(_) => true,
                Err(e) => {
                    warn!(car_id = model.id, %key, error = %e, "Failed to delete previous image");
                    false
                }
            },
            None => true,
        };

        match self
            .images
            .store(model.id, &upload.data, &upload.filename)
            .await
        {
            Ok(stored) => Ok(records::set_image(&self.db, model, Some(stored)).await?),
            Err(e) => {
                // Never keep pointing at an image that was just deleted.
                let model = if previous_removed && model.image_ref.is_some() {
                    records::set_image(&self.db, model, None).await?
                } else {
                    model
                };
                self.absorb(model.id, e)?;
                Ok(model)
            }
        }
    }

    /// Apply the image failure policy to a failed store.
    fn absorb(&self, car_id: i32, err: StorageError) -> Result<(), AppError> {
        if self.fail_on_image_error {
            return Err(err.into());
        }
        warn!(car_id, error = %err, "Failed to store image, continuing without it");
        Ok(())
    }

    /// Stored key, or one derived from the reference for rows written without a key.
    fn image_key(&self, model: &car::Model) -> Option<String> {
        model.image_key.clone().or_else(|| {
            model
                .image_ref
                .as_deref()
                .map(|r| self.images.key_for_reference(r))
        })
    }

    fn to_response(&self, model: car::Model) -> CarResponse {
        let image_url = model
            .image_ref
            .as_deref()
            .map(|r| self.images.display_url(r));
        CarResponse::new(model, image_url)
    }
}

async fn find_car<C: ConnectionTrait>(db: &C, id: i32) -> Result<car::Model, AppError> {
    records::find(db, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Car not found".into()))
}
