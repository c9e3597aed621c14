//! Comment route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use trails_core::{CommentId, TrailId};

use super::json_body;
use crate::db::{CommentRepository, UserRepository};
use crate::error::Result;
use crate::middleware::RequestContext;
use crate::models::{CommentPatch, NewComment};
use crate::services::CommentService;
use crate::state::AppState;

/// Handle `GET /comments`.
pub async fn list(State(state): State<AppState>, ctx: RequestContext) -> Result<impl IntoResponse> {
    let comments = CommentRepository::new(state.pool());
    let users = UserRepository::new(state.pool());
    let listed = CommentService::new(&comments, &users)
        .list(ctx.session())
        .await?;
    Ok(Json(listed))
}

/// Handle `GET /trails/{id}/comments`.
pub async fn list_for_trail(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(trail_id): Path<TrailId>,
) -> Result<impl IntoResponse> {
    let comments = CommentRepository::new(state.pool());
    let users = UserRepository::new(state.pool());
    let listed = CommentService::new(&comments, &users)
        .list_for_trail(ctx.session(), trail_id)
        .await?;
    Ok(Json(listed))
}

/// Handle `GET /comments/{id}`.
pub async fn show(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<CommentId>,
) -> Result<impl IntoResponse> {
    let comments = CommentRepository::new(state.pool());
    let users = UserRepository::new(state.pool());
    let comment = CommentService::new(&comments, &users)
        .get(ctx.session(), id)
        .await?;
    Ok(Json(comment))
}

/// Handle `POST /trails/{id}/comments`.
pub async fn create(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(trail_id): Path<TrailId>,
    payload: std::result::Result<Json<NewComment>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let body = json_body(payload)?;
    let comments = CommentRepository::new(state.pool());
    let users = UserRepository::new(state.pool());
    let comment = CommentService::new(&comments, &users)
        .create(ctx.session(), trail_id, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Comment created successfully",
            "CommentID": comment.id,
        })),
    ))
}

/// Handle `PUT /comments/{id}`.
pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<CommentId>,
    payload: std::result::Result<Json<CommentPatch>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let patch = json_body(payload)?;
    let comments = CommentRepository::new(state.pool());
    let users = UserRepository::new(state.pool());
    let comment = CommentService::new(&comments, &users)
        .edit(ctx.session(), id, patch)
        .await?;

    Ok(Json(json!({
        "message": "Comment updated successfully",
        "comment": comment,
    })))
}

/// Handle `DELETE /comments/{id}`.
pub async fn archive(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(id): Path<CommentId>,
) -> Result<impl IntoResponse> {
    let comments = CommentRepository::new(state.pool());
    let users = UserRepository::new(state.pool());
    CommentService::new(&comments, &users)
        .archive(ctx.session(), id)
        .await?;

    Ok(Json(json!({
        "message": format!("Comment with ID {id} archived successfully."),
    })))
}
