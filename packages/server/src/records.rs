//! Queries against the `cars` table.
//!
//! Every function is generic over [`ConnectionTrait`] so it runs on the pool
//! or inside a transaction alike.

use common::storage::StoredImage;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, QueryOrder, Set};

use crate::entity::car;
use crate::models::car::{CarChanges, NewCar};

/// Insert a car without an image and return the stored row with its new id.
pub async fn insert<C: ConnectionTrait>(db: &C, new_car: &NewCar) -> Result<car::Model, DbErr> {
    car::ActiveModel {
        make: Set(new_car.make.clone()),
        model: Set(new_car.model.clone()),
        year: Set(new_car.year),
        image_ref: Set(None),
        image_key: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn find<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<car::Model>, DbErr> {
    car::Entity::find_by_id(id).one(db).await
}

pub async fn all<C: ConnectionTrait>(db: &C) -> Result<Vec<car::Model>, DbErr> {
    car::Entity::find()
        .order_by_asc(car::Column::Id)
        .all(db)
        .await
}

/// Write only the fields present in `changes`.
pub async fn update_fields<C: ConnectionTrait>(
    db: &C,
    existing: car::Model,
    changes: CarChanges,
) -> Result<car::Model, DbErr> {
    let mut active: car::ActiveModel = existing.into();

    if let Some(make) = changes.make {
        active.make = Set(make);
    }
    if let Some(model) = changes.model {
        active.model = Set(model);
    }
    if let Some(year) = changes.year {
        active.year = Set(year);
    }

    active.update(db).await
}

/// Overwrite the image columns, or clear them with `None`.
pub async fn set_image<C: ConnectionTrait>(
    db: &C,
    existing: car::Model,
    image: Option<StoredImage>,
) -> Result<car::Model, DbErr> {
    let (image_ref, image_key) = match image {
        Some(stored) => (Some(stored.reference), Some(stored.key)),
        None => (None, None),
    };

    let mut active: car::ActiveModel = existing.into();
    active.image_ref = Set(image_ref);
    active.image_key = Set(image_key);
    active.update(db).await
}

/// Delete by id. Returns `false` if no row matched.
pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, DbErr> {
    let res = car::Entity::delete_by_id(id).exec(db).await?;
    Ok(res.rows_affected > 0)
}
