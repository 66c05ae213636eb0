//! Ungated endpoints: health check and favicon

use axum::{
    Router,
    http::header,
    response::IntoResponse,
    routing::get,
};

use crate::AppState;

static FAVICON: &[u8] = include_bytes!("../../assets/favicon.ico");

pub fn health_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/favicon.ico", get(favicon))
}

/// GET /ping
async fn ping() -> &'static str {
    "PONG\n"
}

/// GET /favicon.ico
async fn favicon() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/x-icon")], FAVICON)
}
