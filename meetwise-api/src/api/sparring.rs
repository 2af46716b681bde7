//! AI sparring partner endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{auth::AuthContext, parse_id};
use crate::error::ApiResult;
use crate::models::{DeliveryFeedback, PracticeInteraction};
use crate::services::sparring::{
    self, AnalyzeDelivery, CreatePracticeSession, PersonaPrompt, PersonaReply,
    PracticeSessionDetail, SaveInteraction,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpRequest {
    pub current_topic: String,
    #[serde(default)]
    pub user_response: String,
}

#[derive(Debug, Serialize)]
pub struct FollowUpResponse {
    pub questions: Vec<String>,
}

/// POST /ai-sparring/practice-session
pub async fn create_practice_session(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<CreatePracticeSession>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PracticeSessionDetail>)> {
    let Json(body) = payload?;
    let detail = sparring::create_session(&state.db, &ctx, body).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /ai-sparring/practice-session/:id
pub async fn get_practice_session(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<Json<PracticeSessionDetail>> {
    let id = parse_id(&id, "Practice session")?;
    Ok(Json(sparring::get_session(&state.db, &ctx, id).await?))
}

/// POST /ai-sparring/practice-session/:id/interaction
pub async fn save_interaction(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<SaveInteraction>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PracticeInteraction>)> {
    let id = parse_id(&id, "Practice session")?;
    let Json(body) = payload?;
    let interaction = sparring::save_interaction(&state.db, &ctx, id, body).await?;
    Ok((StatusCode::CREATED, Json(interaction)))
}

/// POST /ai-sparring/practice-session/:id/follow-up-questions
pub async fn follow_up_questions(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<FollowUpRequest>, JsonRejection>,
) -> ApiResult<Json<FollowUpResponse>> {
    let id = parse_id(&id, "Practice session")?;
    let Json(body) = payload?;
    let questions = sparring::follow_ups_for_session(
        &state.db,
        &ctx,
        id,
        &body.current_topic,
        &body.user_response,
    )
    .await?;
    Ok(Json(FollowUpResponse { questions }))
}

/// POST /ai-sparring/practice-session/:id/ai-response
pub async fn persona_response(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<PersonaPrompt>, JsonRejection>,
) -> ApiResult<Json<PersonaReply>> {
    let id = parse_id(&id, "Practice session")?;
    let Json(body) = payload?;
    Ok(Json(sparring::persona_response(&state.db, &ctx, id, body).await?))
}

/// POST /ai-sparring/practice-session/:id/analyze-delivery
pub async fn delivery_feedback(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<AnalyzeDelivery>, JsonRejection>,
) -> ApiResult<Json<DeliveryFeedback>> {
    let id = parse_id(&id, "Practice session")?;
    let Json(body) = payload?;
    Ok(Json(sparring::record_feedback(&state.db, &ctx, id, body).await?))
}

pub fn sparring_routes() -> Router<AppState> {
    Router::new()
        .route("/ai-sparring/practice-session", post(create_practice_session))
        .route("/ai-sparring/practice-session/:id", get(get_practice_session))
        .route(
            "/ai-sparring/practice-session/:id/interaction",
            post(save_interaction),
        )
        .route(
            "/ai-sparring/practice-session/:id/follow-up-questions",
            post(follow_up_questions),
        )
        .route(
            "/ai-sparring/practice-session/:id/ai-response",
            post(persona_response),
        )
        .route(
            "/ai-sparring/practice-session/:id/analyze-delivery",
            post(delivery_feedback),
        )
}
