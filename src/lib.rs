use std::error::Error;
use std::path::Path;

use axum::{Router, http::Method, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::handler::{AppState, healthcheck};

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod validate;
pub mod wishlist;

/// Builds the HTTP surface: health check, the wishlist API and, when a
/// frontend directory is given, the static site with `index.html` as fallback.
pub fn app(state: AppState, frontend: Option<&Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let mut router = Router::new()
        .route("/ping", get(healthcheck))
        .merge(wishlist::routes());

    if let Some(dir) = frontend {
        let index = ServeFile::new(dir.join("index.html"));
        router = router.fallback_service(ServeDir::new(dir).fallback(index));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::db::testing::open_temp;

    #[tokio::test]
    async fn ping_answers_pong() {
        let (_dir, db) = open_temp().await;
        let response = app(AppState { db }, None)
            .oneshot(Request::get("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Pong!");
        assert_eq!(json["status"], 200);
        assert!(json.get("data").is_none());
    }

    #[tokio::test]
    async fn frontend_falls_back_to_index() {
        let (_dir, db) = open_temp().await;
        let site = tempfile::tempdir().unwrap();
        std::fs::write(site.path().join("index.html"), "<main id=\"app\"></main>").unwrap();
        std::fs::create_dir(site.path().join("pages")).unwrap();
        std::fs::write(site.path().join("pages/home.html"), "<h1>Hjem</h1>").unwrap();

        let router = app(AppState { db }, Some(site.path()));

        let page = router
            .clone()
            .oneshot(Request::get("/pages/home.html").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(page.status(), StatusCode::OK);
        let body = to_bytes(page.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<h1>Hjem</h1>");

        let deep = router
            .oneshot(Request::get("/da/about").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = to_bytes(deep.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<main id=\"app\"></main>");
    }

    #[test]
    fn unpack_error_walks_sources() {
        let inner = std::io::Error::other("disk gone");
        let outer = anyhow::Error::new(inner).context("opening database");
        let err: &(dyn Error + Send + Sync + 'static) = outer.as_ref();
        assert_eq!(unpack_error(err), "opening database: disk gone");
    }
}
