//! Bundled API description.

use axum::{http::header, response::IntoResponse};

const OPENAPI_YAML: &str = include_str!("../../static/openapi.yml");

/// Handle `GET /openapi.yml`.
pub async fn openapi() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/yaml")], OPENAPI_YAML)
}
