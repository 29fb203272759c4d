//! Router-level test harness: a throwaway database seeded with two members
//! (`u_alice`, `u_bob`) and a moderator (`u_mod`).

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use mental_maps_db::Database;

use crate::router;
use crate::state::{AppState, AppStateInner};

pub(crate) struct TestApp {
    pub router: Router,
    pub state: AppState,
    _dir: TempDir,
}

pub(crate) fn test_app() -> TestApp {
    let dir = TempDir::new().expect("temp dir");
    let db = Database::open_with_readers(&dir.path().join("api.db"), 2).expect("open db");
    db.upsert_user("u_alice", "member").unwrap();
    db.upsert_user("u_bob", "member").unwrap();
    db.upsert_user("u_mod", "moderator").unwrap();

    let state = AppStateInner::new(db);
    TestApp {
        router: router(state.clone()),
        state,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        self.dispatch(request).await
    }

    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        raw_body: &'static str,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.dispatch(builder.body(Body::from(raw_body)).unwrap()).await
    }

    pub async fn send_with_header(
        &self,
        method: Method,
        uri: &str,
        authorization: &str,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, authorization)
            .body(Body::empty())
            .unwrap();
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}
