//! Trail route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use trails_core::TrailId;

use super::json_body;
use crate::db::TrailRepository;
use crate::error::Result;
use crate::middleware::RequestContext;
use crate::models::{TrailDetails, TrailPatch};
use crate::services::TrailService;
use crate::state::AppState;

/// Handle `GET /trails`.
pub async fn list(State(state): State<AppState>, ctx: RequestContext) -> Result<impl IntoResponse> {
    let store = TrailRepository::new(state.pool());
    let trails = TrailService::new(&store).list(ctx.session()).await?;
    Ok(Json(trails))
}

/// Handle `GET /trails/{id}`.
pub async fn show(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<TrailId>,
) -> Result<impl IntoResponse> {
    let store = TrailRepository::new(state.pool());
    let trail = TrailService::new(&store).get(ctx.session(), id).await?;
    Ok(Json(trail))
}

/// Handle `POST /trails`.
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: std::result::Result<Json<TrailDetails>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let details = json_body(payload)?;
    let store = TrailRepository::new(state.pool());
    let trail = TrailService::new(&store)
        .create(ctx.session(), details)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Trail created successfully",
            "TrailID": trail.id,
        })),
    ))
}

/// Handle `PUT /trails/{id}`.
pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<TrailId>,
    payload: std::result::Result<Json<TrailPatch>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let patch = json_body(payload)?;
    let store = TrailRepository::new(state.pool());
    let trail = TrailService::new(&store)
        .update(ctx.session(), id, patch)
        .await?;

    Ok(Json(json!({
        "message": "Trail updated successfully",
        "trail": trail,
    })))
}

/// Handle `DELETE /trails/{id}`.
pub async fn delete(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<TrailId>,
) -> Result<impl IntoResponse> {
    let store = TrailRepository::new(state.pool());
    TrailService::new(&store).delete(ctx.session(), id).await?;
    Ok(Json(json!({
        "message": format!("Trail with ID {id} deleted successfully."),
    })))
}

/// Handle `GET /trails/{id}/log`.
pub async fn log(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<TrailId>,
) -> Result<impl IntoResponse> {
    let store = TrailRepository::new(state.pool());
    let entries = TrailService::new(&store).log(ctx.session(), id).await?;
    Ok(Json(entries))
}
