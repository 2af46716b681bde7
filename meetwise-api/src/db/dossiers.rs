//! Briefing dossier persistence (one per meeting)

use meetwise_common::{time, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{from_json, parse_timestamp, to_json};
use crate::models::BriefingDossier;

pub async fn get_dossier(pool: &SqlitePool, meeting_id: Uuid) -> Result<Option<BriefingDossier>> {
    let row = sqlx::query(
        r#"
        SELECT attendee_profiles, relevant_documents, market_news, agenda_analysis,
               key_insights, recommendations, created_at, updated_at
        FROM briefing_dossiers
        WHERE meeting_id = ?
        "#,
    )
    .bind(meeting_id.to_string())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(BriefingDossier {
        meeting_id,
        attendee_profiles: from_json(&row.get::<String, _>("attendee_profiles"))?,
        relevant_documents: from_json(&row.get::<String, _>("relevant_documents"))?,
        market_news: from_json(&row.get::<String, _>("market_news"))?,
        agenda_analysis: from_json(&row.get::<String, _>("agenda_analysis"))?,
        key_insights: row.get("key_insights"),
        recommendations: row.get("recommendations"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    }))
}

/// Insert or replace the dossier of `dossier.meeting_id`
///
/// An existing row keeps its `created_at`; the returned dossier reflects the
/// stored timestamps.
pub async fn upsert_dossier(pool: &SqlitePool, dossier: &BriefingDossier) -> Result<BriefingDossier> {
    sqlx::query(
        r#"
        INSERT INTO briefing_dossiers (meeting_id, attendee_profiles, relevant_documents,
                                       market_news, agenda_analysis, key_insights,
                                       recommendations, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(meeting_id) DO UPDATE SET
            attendee_profiles = excluded.attendee_profiles,
            relevant_documents = excluded.relevant_documents,
            market_news = excluded.market_news,
            agenda_analysis = excluded.agenda_analysis,
            key_insights = excluded.key_insights,
            recommendations = excluded.recommendations,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(dossier.meeting_id.to_string())
    .bind(to_json(&dossier.attendee_profiles)?)
    .bind(to_json(&dossier.relevant_documents)?)
    .bind(to_json(&dossier.market_news)?)
    .bind(to_json(&dossier.agenda_analysis)?)
    .bind(&dossier.key_insights)
    .bind(&dossier.recommendations)
    .bind(time::to_storage(&dossier.created_at))
    .bind(time::to_storage(&dossier.updated_at))
    .execute(pool)
    .await?;

    let stored = get_dossier(pool, dossier.meeting_id).await?;
    Ok(stored.unwrap_or_else(|| dossier.clone()))
}
