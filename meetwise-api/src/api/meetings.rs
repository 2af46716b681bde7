//! Meeting endpoints, including the attendee directory

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use meetwise_common::models::{Attendee, CreateMeeting, InviteUser, Meeting, UpdateMeeting};
use meetwise_common::time;
use serde::Deserialize;

use super::{auth::AuthContext, parse_id};
use crate::error::ApiResult;
use crate::{services, AppState};

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    pub limit: Option<i64>,
}

/// POST /meetings
pub async fn create_meeting(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<CreateMeeting>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Meeting>)> {
    let Json(body) = payload?;
    let meeting = services::meetings::create(&state.db, &ctx, body).await?;
    Ok((StatusCode::CREATED, Json(meeting)))
}

/// GET /meetings
pub async fn list_meetings(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Meeting>>> {
    Ok(Json(services::meetings::list(&state.db, &ctx).await?))
}

/// GET /meetings/upcoming?limit=N
pub async fn upcoming_meetings(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<UpcomingQuery>,
) -> ApiResult<Json<Vec<Meeting>>> {
    let meetings = services::meetings::upcoming(&state.db, &ctx, query.limit, time::now()).await?;
    Ok(Json(meetings))
}

/// GET /meetings/:id
pub async fn get_meeting(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Meeting>> {
    let id = parse_id(&id, "Meeting")?;
    Ok(Json(services::meetings::get(&state.db, &ctx, id).await?))
}

/// PATCH /meetings/:id
pub async fn update_meeting(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateMeeting>, JsonRejection>,
) -> ApiResult<Json<Meeting>> {
    let id = parse_id(&id, "Meeting")?;
    let Json(body) = payload?;
    Ok(Json(services::meetings::update(&state.db, &ctx, id, body).await?))
}

/// DELETE /meetings/:id
pub async fn delete_meeting(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Meeting>> {
    let id = parse_id(&id, "Meeting")?;
    Ok(Json(services::meetings::delete(&state.db, &ctx, id).await?))
}

/// POST /meetings/:id/invite
///
/// Returns the updated attendee list.
pub async fn invite_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<InviteUser>, JsonRejection>,
) -> ApiResult<Json<Vec<Attendee>>> {
    let id = parse_id(&id, "Meeting")?;
    let Json(body) = payload?;
    Ok(Json(services::meetings::invite(&state.db, &ctx, id, body).await?))
}

/// GET /meetings/:id/attendees
pub async fn list_attendees(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Attendee>>> {
    let id = parse_id(&id, "Meeting")?;
    Ok(Json(services::meetings::attendees(&state.db, &ctx, id).await?))
}

pub fn meeting_routes() -> Router<AppState> {
    Router::new()
        .route("/meetings", post(create_meeting).get(list_meetings))
        .route("/meetings/upcoming", get(upcoming_meetings))
        .route(
            "/meetings/:id",
            get(get_meeting).patch(update_meeting).delete(delete_meeting),
        )
        .route("/meetings/:id/invite", post(invite_user))
        .route("/meetings/:id/attendees", get(list_attendees))
}
