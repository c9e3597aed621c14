//! Location route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use trails_core::LocationId;

use super::json_body;
use crate::db::LocationRepository;
use crate::error::Result;
use crate::middleware::RequestContext;
use crate::models::NewLocation;
use crate::services::LocationService;
use crate::state::AppState;

/// Handle `GET /locations`.
pub async fn list(State(state): State<AppState>, ctx: RequestContext) -> Result<impl IntoResponse> {
    let store = LocationRepository::new(state.pool());
    let locations = LocationService::new(&store).list(ctx.session()).await?;
    Ok(Json(locations))
}

/// Handle `GET /locations/{id}`.
pub async fn show(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<LocationId>,
) -> Result<impl IntoResponse> {
    let store = LocationRepository::new(state.pool());
    let location = LocationService::new(&store).get(ctx.session(), id).await?;
    Ok(Json(location))
}

/// Handle `POST /locations`.
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: std::result::Result<Json<NewLocation>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let body = json_body(payload)?;
    let store = LocationRepository::new(state.pool());
    let location = LocationService::new(&store)
        .create(ctx.session(), body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Location created successfully",
            "LocationID": location.id,
        })),
    ))
}
