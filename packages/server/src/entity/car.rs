use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cars")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub make: String,

    #[sea_orm(indexed)]
    pub model: String,

    pub year: i32,

    /// Local filename or remote URL of the stored image.
    pub image_ref: Option<String>,

    /// Key the image store deletes the image by (filename or service public id).
    pub image_key: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}
