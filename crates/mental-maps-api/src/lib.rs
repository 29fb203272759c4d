//! HTTP API for mental maps: maps, their elements, and moderation reports.

pub mod convert;
pub mod error;
pub mod extract;
pub mod health;
pub mod ids;
pub mod maps;
pub mod middleware;
pub mod pagination;
pub mod policy;
pub mod reports;
pub mod state;

#[cfg(test)]
mod test_support;

use axum::{
    Router,
    extract::{DefaultBodyLimit, OriginalUri},
    http::Method,
    middleware::from_fn_with_state,
    routing::get,
};

use crate::error::ApiError;
use crate::middleware::require_auth;
use crate::state::AppState;

pub const BASE_PATH: &str = "/api/v1";

/// 1 MiB request bodies.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// All routes under [`BASE_PATH`]. Everything except `/health` requires a
/// bearer token; unmatched paths and methods get a 404 envelope.
pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/maps", get(maps::list_maps).post(maps::create_map))
        .route("/maps/{map_id}", get(maps::get_map))
        .route(
            "/maps/{map_id}/elements",
            get(maps::list_elements).post(maps::add_element),
        )
        .route(
            "/reports",
            get(reports::list_reports).post(reports::create_report),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let v1_routes = Router::new()
        .route("/health", get(health::health))
        .merge(protected_routes);

    Router::new()
        .nest(BASE_PATH, v1_routes)
        .fallback(route_not_found)
        .method_not_allowed_fallback(route_not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

async fn route_not_found(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::not_found(format!("Route not found: {} {}", method, uri))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::test_app;

    #[tokio::test]
    async fn health_needs_no_token() {
        let app = test_app();
        let (status, body) = app.send(Method::GET, "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "status": "ok", "service": "mental-maps-backend", "version": "v1" })
        );
    }

    #[tokio::test]
    async fn protected_routes_reject_missing_or_unknown_tokens() {
        let app = test_app();
        let routes = [
            (Method::POST, "/api/v1/maps", Some(json!({ "title": "x" }))),
            (Method::GET, "/api/v1/maps", None),
            (Method::GET, "/api/v1/maps/map_00000000", None),
            (
                Method::POST,
                "/api/v1/maps/map_00000000/elements",
                Some(json!({ "type": "node", "x": 0, "y": 0 })),
            ),
            (Method::GET, "/api/v1/maps/map_00000000/elements", None),
            (
                Method::POST,
                "/api/v1/reports",
                Some(json!({ "mapId": "map_00000000", "reason": "spam" })),
            ),
            (Method::GET, "/api/v1/reports", None),
        ];

        for (method, uri, body) in routes {
            for token in [None, Some("u_nobody")] {
                let (status, response) = app.send(method.clone(), uri, token, body.clone()).await;
                assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri} {token:?}");
                assert_eq!(response["error"]["code"], "UNAUTHORIZED");
            }
        }
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_unauthorized() {
        let app = test_app();
        let (status, _) = app
            .send_with_header(Method::GET, "/api/v1/maps", "Basic u_alice")
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .send_with_header(Method::GET, "/api/v1/maps", "bearer u_alice")
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unmatched_routes_are_not_found() {
        let app = test_app();
        let (status, body) = app.send(Method::GET, "/api/v1/nowhere", Some("u_alice"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert_eq!(body["error"]["message"], "Route not found: GET /api/v1/nowhere");

        let (status, body) = app
            .send(Method::DELETE, "/api/v1/maps/map_00000000", Some("u_alice"), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
