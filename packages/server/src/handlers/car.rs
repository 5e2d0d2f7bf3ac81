use axum::Json;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::car::{CreateCarsPayload, UpdateCarPayload};
use crate::models::car::{CarInput, CarResponse, UpdateCarRequest};
use crate::state::AppState;

pub fn car_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(32 * 1024 * 1024) // 32 MB
}

#[utoipa::path(
    post,
    path = "/cars",
    tag = "Cars",
    operation_id = "createCars",
    summary = "Create cars in bulk",
    description = "Accepts a JSON array of cars, or a multipart form with a JSON-encoded `cars` \
        field plus optional `files` parts (one per car, in order). Each car is committed on its \
        own; a failed image upload leaves that car without an image unless the server is \
        configured to report storage failures.",
    request_body(content = Vec<CarInput>, description = "Cars to create"),
    responses(
        (status = 201, description = "Cars created", body = Vec<CarResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 502, description = "Image store failed (STORAGE_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(count = payload.cars.len()))]
pub async fn create_cars(
    State(state): State<AppState>,
    payload: CreateCarsPayload,
) -> Result<impl IntoResponse, AppError> {
    let created = state.cars.bulk_create(payload.cars, payload.files).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/cars",
    tag = "Cars",
    operation_id = "listCars",
    summary = "List all cars",
    responses((status = 200, description = "All cars", body = Vec<CarResponse>)),
)]
#[instrument(skip(state))]
pub async fn list_cars(State(state): State<AppState>) -> Result<Json<Vec<CarResponse>>, AppError> {
    Ok(Json(state.cars.list().await?))
}

#[utoipa::path(
    get,
    path = "/cars/{id}",
    tag = "Cars",
    operation_id = "getCar",
    summary = "Get a car by ID",
    params(("id" = i32, Path, description = "Car ID")),
    responses(
        (status = 200, description = "Car details", body = CarResponse),
        (status = 404, description = "Car not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CarResponse>, AppError> {
    Ok(Json(state.cars.get(id).await?))
}

#[utoipa::path(
    put,
    path = "/cars/{id}",
    tag = "Cars",
    operation_id = "updateCar",
    summary = "Update a car",
    description = "Partially updates a car: only supplied fields change. Accepts JSON, or a \
        multipart form with optional `make`, `model`, `year` and `file` fields. `year` may be \
        sent as text and must parse as an integer. A new file replaces the previous image.",
    params(("id" = i32, Path, description = "Car ID")),
    request_body(content = UpdateCarRequest, description = "Fields to change"),
    responses(
        (status = 200, description = "Car updated", body = CarResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Car not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Image store failed (STORAGE_FAILURE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn update_car(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: UpdateCarPayload,
) -> Result<Json<CarResponse>, AppError> {
    let updated = state
        .cars
        .update(id, payload.request, payload.file)
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/cars/{id}",
    tag = "Cars",
    operation_id = "deleteCar",
    summary = "Delete a car",
    description = "Deletes the car and, best-effort, its image. Returns the deleted car.",
    params(("id" = i32, Path, description = "Car ID")),
    responses(
        (status = 200, description = "Car deleted", body = CarResponse),
        (status = 404, description = "Car not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_car(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CarResponse>, AppError> {
    Ok(Json(state.cars.delete(id).await?))
}
