use axum::body::Bytes;
use serde::{Deserialize, Serialize};

use crate::entity::car;
use crate::error::AppError;

/// One car in a bulk-create request.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct CarInput {
    #[schema(example = "Toyota")]
    pub make: String,
    #[schema(example = "Corolla")]
    pub model: String,
    /// Integer, or a string holding an integer.
    #[schema(example = 2020)]
    pub year: YearInput,
}

/// A validated car ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCar {
    pub make: String,
    pub model: String,
    pub year: i32,
}

/// A year as clients send it: a JSON number, or text from a form field.
#[derive(Debug, Clone, PartialEq, Deserialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum YearInput {
    Number(i64),
    Text(String),
}

impl YearInput {
    pub fn parse(&self) -> Result<i32, AppError> {
        let value = match self {
            YearInput::Number(n) => *n,
            YearInput::Text(s) => s.trim().parse::<i64>().map_err(|_| {
                AppError::Validation(format!("year must be an integer, got {s:?}"))
            })?,
        };
        i32::try_from(value)
            .map_err(|_| AppError::Validation(format!("year {value} is out of range")))
    }
}

/// Partial update. Omitted fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, utoipa::ToSchema)]
pub struct UpdateCarRequest {
    pub make: Option<String>,
    pub model: Option<String>,
    /// Integer, or a string holding an integer.
    pub year: Option<YearInput>,
}

/// Validated field changes for a car.
#[derive(Debug, Default, PartialEq)]
pub struct CarChanges {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
}

impl CarChanges {
    pub fn is_empty(&self) -> bool {
        self.make.is_none() && self.model.is_none() && self.year.is_none()
    }
}

impl UpdateCarRequest {
    /// Validate every supplied field without touching storage.
    pub fn into_changes(self) -> Result<CarChanges, AppError> {
        let year = self.year.as_ref().map(YearInput::parse).transpose()?;
        let make = self
            .make
            .map(|m| validate_name("make", &m).map(str::to_string))
            .transpose()?;
        let model = self
            .model
            .map(|m| validate_name("model", &m).map(str::to_string))
            .transpose()?;
        Ok(CarChanges { make, model, year })
    }
}

/// An uploaded image file.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub data: Bytes,
}

impl ImageUpload {
    /// Build from a multipart file part. Parts without a filename or without
    /// content count as "no file".
    pub fn from_part(file_name: Option<String>, data: Bytes) -> Option<Self> {
        match file_name {
            Some(filename) if !filename.trim().is_empty() && !data.is_empty() => {
                Some(Self { filename, data })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CarResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Toyota")]
    pub make: String,
    #[schema(example = "Corolla")]
    pub model: String,
    #[schema(example = 2020)]
    pub year: i32,
    /// Where the car's image can be fetched, if it has one.
    #[schema(example = "/images/car_1.jpg")]
    pub image_url: Option<String>,
}

impl CarResponse {
    pub fn new(m: car::Model, image_url: Option<String>) -> Self {
        Self {
            id: m.id,
            make: m.make,
            model: m.model,
            year: m.year,
            image_url,
        }
    }
}

/// Trimmed, non-empty text field.
pub fn validate_name<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}

pub fn validate_car_input(input: &CarInput) -> Result<NewCar, AppError> {
    Ok(NewCar {
        make: validate_name("make", &input.make)?.to_string(),
        model: validate_name("model", &input.model)?.to_string(),
        year: input.year.parse()?,
    })
}
