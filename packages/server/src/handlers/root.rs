use axum::Json;
use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
pub struct Greeting {
    #[schema(example = "Welcome to the Car API")]
    pub message: &'static str,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Root",
    operation_id = "root",
    summary = "Greeting",
    responses((status = 200, description = "Static greeting", body = Greeting)),
)]
pub async fn root() -> Json<Greeting> {
    Json(Greeting {
        message: "Welcome to the Car API",
    })
}
