use std::time::Duration;

use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

use crate::config::CorsConfig;

/// Build the CORS layer. An empty origin list allows any origin.
///
/// Browsers refuse `*` on credentialed requests, so with `allow_credentials`
/// the layer mirrors the request's origin, method and headers instead.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().max_age(Duration::from_secs(config.max_age));

    let layer = if config.allow_credentials {
        layer
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        layer.allow_methods(Any).allow_headers(Any)
    };

    if config.allow_origins.is_empty() {
        return if config.allow_credentials {
            layer.allow_origin(AllowOrigin::mirror_request())
        } else {
            layer.allow_origin(Any)
        };
    }

    let origins: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}
