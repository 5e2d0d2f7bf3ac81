use axum::{Router, routing::get};
use common::ImageBackend;
use common::storage::filesystem::normalize_url_prefix;
use tower_http::services::ServeDir;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn app_routes(config: &AppConfig) -> Router<AppState> {
    let router = Router::new()
        .route("/", get(handlers::root::root))
        .merge(car_routes());

    // Local images are served read-only next to the API. The prefix was
    // already checked when the image store was built.
    match config.images.backend {
        ImageBackend::Local => match normalize_url_prefix(&config.images.local.url_prefix) {
            Ok(prefix) => router.nest_service(&prefix, ServeDir::new(&config.images.local.dir)),
            Err(e) => {
                tracing::error!(error = %e, "Not serving local images");
                router
            }
        },
        ImageBackend::Cloudinary => router,
    }
}

fn car_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/cars",
            get(handlers::car::list_cars).post(handlers::car::create_cars),
        )
        .route(
            "/cars/{id}",
            get(handlers::car::get_car)
                .put(handlers::car::update_car)
                .delete(handlers::car::delete_car),
        )
        .layer(handlers::car::car_upload_body_limit())
}
