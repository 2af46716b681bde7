//! Briefing dossier endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};

use super::{auth::AuthContext, parse_id};
use crate::error::ApiResult;
use crate::models::BriefingDossier;
use crate::{services, AppState};

/// GET /briefing-dossier/:meeting_id
///
/// Generates the dossier on first request.
pub async fn get_dossier(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(meeting_id): Path<String>,
) -> ApiResult<Json<BriefingDossier>> {
    let meeting_id = parse_id(&meeting_id, "Meeting")?;
    Ok(Json(
        services::briefing::get_or_generate(&state.db, &ctx, meeting_id).await?,
    ))
}

/// POST /briefing-dossier/:meeting_id/generate
pub async fn generate_dossier(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(meeting_id): Path<String>,
) -> ApiResult<Json<BriefingDossier>> {
    let meeting_id = parse_id(&meeting_id, "Meeting")?;
    Ok(Json(
        services::briefing::regenerate(&state.db, &ctx, meeting_id).await?,
    ))
}

pub fn briefing_routes() -> Router<AppState> {
    Router::new()
        .route("/briefing-dossier/:meeting_id", get(get_dossier))
        .route("/briefing-dossier/:meeting_id/generate", post(generate_dossier))
}
