//! Action-item operations
//!
//! Normalization happens here, once, before anything reaches the store:
//! descriptions are trimmed and validated and status/priority defaults are
//! filled in by `CreateActionItem::normalize`.

use meetwise_common::models::{
    ActionItem, CreateActionItem, DeleteConfirmation, UpdateActionItem,
};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::auth::AuthContext;
use crate::db;
use crate::error::ApiResult;

pub async fn create(pool: &SqlitePool, ctx: &AuthContext, body: CreateActionItem) -> ApiResult<ActionItem> {
    let new = body.normalize()?;
    let item = db::action_items::create(pool, new).await?;

    info!(
        subject = %ctx.subject,
        action_item_id = %item.id,
        meeting_id = %item.meeting_id,
        "Action item created"
    );
    Ok(item)
}

pub async fn list_for_meeting(
    pool: &SqlitePool,
    _ctx: &AuthContext,
    meeting_id: Uuid,
) -> ApiResult<Vec<ActionItem>> {
    Ok(db::action_items::list_for_meeting(pool, meeting_id).await?)
}

pub async fn update(
    pool: &SqlitePool,
    ctx: &AuthContext,
    id: Uuid,
    body: UpdateActionItem,
) -> ApiResult<ActionItem> {
    let changes = body.normalize()?;
    let item = db::action_items::update(pool, id, &changes).await?;

    info!(subject = %ctx.subject, action_item_id = %id, status = %item.status, "Action item updated");
    Ok(item)
}

pub async fn delete(pool: &SqlitePool, ctx: &AuthContext, id: Uuid) -> ApiResult<DeleteConfirmation> {
    match db::action_items::delete(pool, id).await {
        Ok(confirmation) => {
            info!(subject = %ctx.subject, action_item_id = %id, "Action item deleted");
            Ok(confirmation)
        }
        Err(e) => {
            warn!(subject = %ctx.subject, action_item_id = %id, "Delete failed: {}", e);
            Err(e.into())
        }
    }
}
