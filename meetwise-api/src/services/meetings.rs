//! Meeting operations and access rules
//!
//! Read access: the creator, any attendee, or anyone when the meeting is
//! both non-private and `PUBLIC`. Only the creator may update or delete.
//! In `RESTRICTED` rooms only the creator may invite.

use chrono::{DateTime, Utc};
use meetwise_common::db::get_setting_i64;
use meetwise_common::models::{
    Attendee, CreateMeeting, InviteUser, Meeting, RoomAccess, UpdateMeeting, User,
};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::api::auth::AuthContext;
use crate::db;
use crate::error::{ApiError, ApiResult};

/// Default for `GET /meetings/upcoming` when no `limit` is given
pub const DEFAULT_UPCOMING_LIMIT: i64 = 5;

fn meeting_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Meeting with ID \"{}\" not found", id))
}

async fn can_view(pool: &SqlitePool, meeting: &Meeting, user: &User) -> ApiResult<bool> {
    if meeting.creator_id == user.id {
        return Ok(true);
    }
    if db::meetings::is_attendee(pool, meeting.id, user.id).await? {
        return Ok(true);
    }
    Ok(!meeting.is_private && meeting.room_access == RoomAccess::Public)
}

/// Load a meeting the caller may read
pub async fn load_viewable(pool: &SqlitePool, ctx: &AuthContext, id: Uuid) -> ApiResult<Meeting> {
    let user = ctx.user()?;
    let meeting = db::meetings::get_meeting(pool, id)
        .await?
        .ok_or_else(|| meeting_not_found(id))?;

    if !can_view(pool, &meeting, user).await? {
        return Err(ApiError::Unauthorized(
            "You are not authorized to view this meeting.".to_string(),
        ));
    }
    Ok(meeting)
}

pub async fn create(pool: &SqlitePool, ctx: &AuthContext, body: CreateMeeting) -> ApiResult<Meeting> {
    let user = ctx.user()?;
    let new = body.normalize()?;
    let meeting = db::meetings::insert_meeting(pool, user.id, new).await?;

    info!(meeting_id = %meeting.id, creator = %user.id, "Meeting created");
    Ok(meeting)
}

pub async fn list(pool: &SqlitePool, ctx: &AuthContext) -> ApiResult<Vec<Meeting>> {
    let user = ctx.user()?;
    Ok(db::meetings::list_for_user(pool, user.id).await?)
}

/// Upcoming meetings of the caller; `limit` falls back to the
/// `upcoming_meetings_limit` setting
pub async fn upcoming(
    pool: &SqlitePool,
    ctx: &AuthContext,
    limit: Option<i64>,
    now: DateTime<Utc>,
) -> ApiResult<Vec<Meeting>> {
    let user = ctx.user()?;
    let limit = match limit {
        Some(limit) if limit > 0 => limit,
        Some(_) => return Err(ApiError::BadRequest("limit must be positive".to_string())),
        None => get_setting_i64(pool, "upcoming_meetings_limit", DEFAULT_UPCOMING_LIMIT).await?,
    };
    Ok(db::meetings::list_upcoming(pool, user.id, now, limit).await?)
}

pub async fn get(pool: &SqlitePool, ctx: &AuthContext, id: Uuid) -> ApiResult<Meeting> {
    load_viewable(pool, ctx, id).await
}

/// Add a registered user to the meeting by email
pub async fn invite(
    pool: &SqlitePool,
    ctx: &AuthContext,
    id: Uuid,
    body: InviteUser,
) -> ApiResult<Vec<Attendee>> {
    let meeting = load_viewable(pool, ctx, id).await?;
    let inviter = ctx.user()?;

    if meeting.creator_id != inviter.id && meeting.room_access == RoomAccess::Restricted {
        return Err(ApiError::Forbidden(
            "Only the meeting creator can invite users to this meeting.".to_string(),
        ));
    }

    let email = body.email.trim();
    let invitee = db::users::find_by_email(pool, email)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User with email \"{}\" not found.", email)))?;

    if db::meetings::is_attendee(pool, meeting.id, invitee.id).await? {
        return Err(ApiError::Conflict(
            "User is already an attendee of this meeting.".to_string(),
        ));
    }

    db::meetings::add_attendee(pool, meeting.id, invitee.id).await?;
    info!(meeting_id = %meeting.id, invitee = %invitee.id, "User invited");

    Ok(db::meetings::list_attendees(pool, meeting.id).await?)
}

pub async fn update(
    pool: &SqlitePool,
    ctx: &AuthContext,
    id: Uuid,
    body: UpdateMeeting,
) -> ApiResult<Meeting> {
    let mut meeting = load_viewable(pool, ctx, id).await?;
    if meeting.creator_id != ctx.user()?.id {
        return Err(ApiError::Forbidden(
            "Only the meeting creator can update meeting settings.".to_string(),
        ));
    }

    let changes = body.normalize()?;
    meeting.apply(&changes);
    db::meetings::save_meeting(pool, &mut meeting).await?;

    info!(meeting_id = %meeting.id, "Meeting updated");
    Ok(meeting)
}

/// Delete a meeting with its action items, dossier and practice sessions
pub async fn delete(pool: &SqlitePool, ctx: &AuthContext, id: Uuid) -> ApiResult<Meeting> {
    let meeting = load_viewable(pool, ctx, id).await?;
    if meeting.creator_id != ctx.user()?.id {
        return Err(ApiError::Forbidden(
            "Only the meeting creator can delete it.".to_string(),
        ));
    }

    db::meetings::delete_meeting(pool, id).await?;
    info!(meeting_id = %id, "Meeting deleted");
    Ok(meeting)
}

/// Attendee directory of a meeting
pub async fn attendees(pool: &SqlitePool, _ctx: &AuthContext, id: Uuid) -> ApiResult<Vec<Attendee>> {
    if !db::meetings::meeting_exists(pool, id).await? {
        return Err(meeting_not_found(id));
    }
    Ok(db::meetings::list_attendees(pool, id).await?)
}
