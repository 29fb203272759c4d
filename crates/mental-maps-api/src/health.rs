use axum::Json;

use mental_maps_types::api::HealthResponse;

pub const SERVICE_NAME: &str = "mental-maps-backend";
pub const API_VERSION: &str = "v1";

/// GET /health: liveness only; does not touch the database.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
        version: API_VERSION.to_string(),
    })
}
