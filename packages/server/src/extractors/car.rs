//! Request bodies for the car endpoints.
//!
//! Both write endpoints take either JSON or `multipart/form-data`, chosen by
//! the request's `Content-Type`.

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{HeaderMap, header};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};

use crate::error::AppError;
use crate::extractors::json::AppJson;
use crate::models::car::{CarInput, ImageUpload, UpdateCarRequest, YearInput};

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

/// `POST /cars` body: a JSON array of cars, or a multipart form with a
/// JSON-encoded `cars` field and one `files` (or `files[]`) part per car.
pub struct CreateCarsPayload {
    pub cars: Vec<CarInput>,
    pub files: Vec<Option<ImageUpload>>,
}

impl<S> FromRequest<S> for CreateCarsPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(req.headers()) {
            let AppJson(cars) = AppJson::<Vec<CarInput>>::from_request(req, state).await?;
            return Ok(Self {
                cars,
                files: Vec::new(),
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        let mut cars_json: Option<String> = None;
        let mut files = Vec::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            match field.name() {
                Some("cars") => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("Failed to read cars: {e}")))?;
                    cars_json = Some(text);
                }
                Some("files") | Some("files[]") => {
                    let file_name = field.file_name().map(|s| s.to_string());
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
                    files.push(ImageUpload::from_part(file_name, data));
                }
                _ => {} // Ignore unknown fields.
            }
        }

        let cars_json =
            cars_json.ok_or_else(|| AppError::Validation("Missing 'cars' field".into()))?;
        let cars: Vec<CarInput> = serde_json::from_str(&cars_json)
            .map_err(|e| AppError::Validation(format!("Invalid cars JSON: {e}")))?;

        Ok(Self { cars, files })
    }
}

#[derive(TryFromMultipart)]
struct UpdateCarForm {
    make: Option<String>,
    model: Option<String>,
    year: Option<String>,
    #[form_data(limit = "32MiB")]
    file: Option<FieldData<Bytes>>,
}

/// `PUT /cars/{id}` body: JSON with optional `make`, `model`, `year`, or a
/// multipart form with the same optional fields plus an optional `file`.
pub struct UpdateCarPayload {
    pub request: UpdateCarRequest,
    pub file: Option<ImageUpload>,
}

/// Blank form fields are treated as not supplied.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl<S> FromRequest<S> for UpdateCarPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(req.headers()) {
            let AppJson(request) = AppJson::<UpdateCarRequest>::from_request(req, state).await?;
            return Ok(Self {
                request,
                file: None,
            });
        }

        let TypedMultipart(form) = TypedMultipart::<UpdateCarForm>::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?;

        let file = form
            .file
            .and_then(|f| ImageUpload::from_part(f.metadata.file_name, f.contents));

        Ok(Self {
            request: UpdateCarRequest {
                make: non_blank(form.make),
                model: non_blank(form.model),
                year: non_blank(form.year).map(YearInput::Text),
            },
            file,
        })
    }
}
