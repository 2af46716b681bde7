//! Action item endpoints
//!
//! POST /action-items, GET /action-items/meeting/:meeting_id,
//! PATCH /action-items/:id, DELETE /action-items/:id

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use meetwise_common::models::{ActionItem, CreateActionItem, DeleteConfirmation, UpdateActionItem};

use super::{auth::AuthContext, parse_id};
use crate::error::ApiResult;
use crate::{services, AppState};

/// POST /action-items
pub async fn create_action_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<CreateActionItem>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ActionItem>)> {
    let Json(body) = payload?;
    let item = services::action_items::create(&state.db, &ctx, body).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /action-items/meeting/:meeting_id
///
/// Newest first.
pub async fn list_action_items(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(meeting_id): Path<String>,
) -> ApiResult<Json<Vec<ActionItem>>> {
    let meeting_id = parse_id(&meeting_id, "Meeting")?;
    let items = services::action_items::list_for_meeting(&state.db, &ctx, meeting_id).await?;
    Ok(Json(items))
}

/// PATCH /action-items/:id
pub async fn update_action_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateActionItem>, JsonRejection>,
) -> ApiResult<Json<ActionItem>> {
    let id = parse_id(&id, "Action item")?;
    let Json(body) = payload?;
    let item = services::action_items::update(&state.db, &ctx, id, body).await?;
    Ok(Json(item))
}

/// DELETE /action-items/:id
pub async fn delete_action_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteConfirmation>> {
    let id = parse_id(&id, "Action item")?;
    let confirmation = services::action_items::delete(&state.db, &ctx, id).await?;
    Ok(Json(confirmation))
}

pub fn action_item_routes() -> Router<AppState> {
    Router::new()
        .route("/action-items", post(create_action_item))
        .route("/action-items/meeting/:meeting_id", get(list_action_items))
        .route(
            "/action-items/:id",
            patch(update_action_item).delete(delete_action_item),
        )
}
