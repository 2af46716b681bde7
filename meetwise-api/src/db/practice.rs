//! Practice session persistence: sessions, personas, interactions, feedback

use meetwise_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{from_json, parse_opt_uuid, parse_timestamp, parse_uuid, to_json};
use crate::models::{Difficulty, Persona, PracticeFeedback, PracticeInteraction, PracticeSession};

fn session_from_row(row: &SqliteRow) -> Result<PracticeSession> {
    let difficulty: String = row.get("difficulty");
    Ok(PracticeSession {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        meeting_id: parse_uuid(&row.get::<String, _>("meeting_id"))?,
        user_id: parse_uuid(&row.get::<String, _>("user_id"))?,
        title: row.get("title"),
        description: row.get("description"),
        user_role: row.get("user_role"),
        scenario: row.get("scenario"),
        difficulty: Difficulty::parse(&difficulty).unwrap_or(Difficulty::Beginner),
        duration: row.get::<i64, _>("duration").max(0) as u32,
        status: row.get("status"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
    })
}

fn persona_from_row(row: &SqliteRow) -> Result<Persona> {
    Ok(Persona {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        name: row.get("name"),
        role: row.get("role"),
        company: row.get("company"),
        personality: row.get("personality"),
        background: row.get("background"),
        expertise: row.get("expertise"),
        communication_style: row.get("communication_style"),
        typical_questions: from_json(&row.get::<String, _>("typical_questions"))?,
    })
}

fn interaction_from_row(row: &SqliteRow) -> Result<PracticeInteraction> {
    Ok(PracticeInteraction {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        practice_session_id: parse_uuid(&row.get::<String, _>("practice_session_id"))?,
        speaker: row.get("speaker"),
        message: row.get("message"),
        message_type: row.get("message_type"),
        persona_id: parse_opt_uuid(row.get("persona_id"))?,
        timestamp: parse_timestamp(&row.get::<String, _>("timestamp"))?,
    })
}

fn feedback_from_row(row: &SqliteRow) -> Result<PracticeFeedback> {
    Ok(PracticeFeedback {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        practice_session_id: parse_uuid(&row.get::<String, _>("practice_session_id"))?,
        kind: row.get("type"),
        category: row.get("category"),
        score: row.get("score"),
        feedback: row.get("feedback"),
        suggestions: from_json(&row.get::<String, _>("suggestions"))?,
        timestamp: parse_timestamp(&row.get::<String, _>("timestamp"))?,
    })
}

pub async fn insert_session(pool: &SqlitePool, session: &PracticeSession) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO practice_sessions (id, meeting_id, user_id, title, description, user_role,
                                       scenario, difficulty, duration, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(session.id.to_string())
    .bind(session.meeting_id.to_string())
    .bind(session.user_id.to_string())
    .bind(&session.title)
    .bind(&session.description)
    .bind(&session.user_role)
    .bind(&session.scenario)
    .bind(session.difficulty.as_str())
    .bind(session.duration as i64)
    .bind(&session.status)
    .bind(time::to_storage(&session.created_at))
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_session(pool: &SqlitePool, id: Uuid) -> Result<Option<PracticeSession>> {
    let row = sqlx::query(
        r#"
        SELECT id, meeting_id, user_id, title, description, user_role, scenario,
               difficulty, duration, status, created_at
        FROM practice_sessions
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(session_from_row).transpose()
}

pub async fn insert_persona(pool: &SqlitePool, persona: &Persona) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO personas (id, name, role, company, personality, background, expertise,
                              communication_style, typical_questions)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(persona.id.to_string())
    .bind(&persona.name)
    .bind(&persona.role)
    .bind(&persona.company)
    .bind(&persona.personality)
    .bind(&persona.background)
    .bind(&persona.expertise)
    .bind(&persona.communication_style)
    .bind(to_json(&persona.typical_questions)?)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn persona_exists(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM personas WHERE id = ?)")
        .bind(id.to_string())
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

pub async fn get_persona(pool: &SqlitePool, id: Uuid) -> Result<Option<Persona>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, role, company, personality, background, expertise,
               communication_style, typical_questions
        FROM personas
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(persona_from_row).transpose()
}

/// Personas that have spoken in a session, in order of first appearance
pub async fn personas_for_session(pool: &SqlitePool, session_id: Uuid) -> Result<Vec<Persona>> {
    let rows = sqlx::query(
        r#"
        SELECT p.id, p.name, p.role, p.company, p.personality, p.background, p.expertise,
               p.communication_style, p.typical_questions
        FROM personas p
        JOIN practice_interactions i ON i.persona_id = p.id
        WHERE i.practice_session_id = ?
        GROUP BY p.id
        ORDER BY MIN(i.rowid) ASC
        "#,
    )
    .bind(session_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(persona_from_row).collect()
}

pub async fn insert_interaction(pool: &SqlitePool, interaction: &PracticeInteraction) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO practice_interactions (id, practice_session_id, speaker, message,
                                           message_type, persona_id, timestamp)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(interaction.id.to_string())
    .bind(interaction.practice_session_id.to_string())
    .bind(&interaction.speaker)
    .bind(&interaction.message)
    .bind(&interaction.message_type)
    .bind(interaction.persona_id.map(|id| id.to_string()))
    .bind(time::to_storage(&interaction.timestamp))
    .execute(pool)
    .await?;

    Ok(())
}

/// Interactions of a session, oldest first
pub async fn list_interactions(pool: &SqlitePool, session_id: Uuid) -> Result<Vec<PracticeInteraction>> {
    let rows = sqlx::query(
        r#"
        SELECT id, practice_session_id, speaker, message, message_type, persona_id, timestamp
        FROM practice_interactions
        WHERE practice_session_id = ?
        ORDER BY timestamp ASC, rowid ASC
        "#,
    )
    .bind(session_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(interaction_from_row).collect()
}

/// Store a batch of feedback entries atomically
pub async fn insert_feedback(pool: &SqlitePool, entries: &[PracticeFeedback]) -> Result<()> {
    let mut tx = pool.begin().await?;

    for entry in entries {
        sqlx::query(
            r#"
            INSERT INTO practice_feedback (id, practice_session_id, type, category, score,
                                           feedback, suggestions, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.practice_session_id.to_string())
        .bind(&entry.kind)
        .bind(&entry.category)
        .bind(entry.score)
        .bind(&entry.feedback)
        .bind(to_json(&entry.suggestions)?)
        .bind(time::to_storage(&entry.timestamp))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Feedback entries of a session, newest first
pub async fn list_feedback(pool: &SqlitePool, session_id: Uuid) -> Result<Vec<PracticeFeedback>> {
    let rows = sqlx::query(
        r#"
        SELECT id, practice_session_id, type, category, score, feedback, suggestions, timestamp
        FROM practice_feedback
        WHERE practice_session_id = ?
        ORDER BY timestamp DESC, rowid ASC
        "#,
    )
    .bind(session_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(feedback_from_row).collect()
}
