pub mod config;
pub mod cors;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod records;
pub mod routes;
pub mod service;
pub mod state;
pub mod storage;

use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Car API",
        version = "1.0.0",
        description = "Manage a catalogue of cars and their images"
    ),
    paths(
        handlers::root::root,
        handlers::car::create_cars,
        handlers::car::list_cars,
        handlers::car::get_car,
        handlers::car::update_car,
        handlers::car::delete_car,
    ),
    tags(
        (name = "Root", description = "Service greeting"),
        (name = "Cars", description = "Car CRUD operations"),
    ),
)]
struct ApiDoc;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let cors = cors::cors_layer(&state.config.server.cors);

    routes::app_routes(&state.config)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
