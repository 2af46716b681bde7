//! Meetings and their attendee sets

use chrono::{DateTime, Utc};
use meetwise_common::models::{Attendee, Meeting, NewMeeting};
use meetwise_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{from_json, parse_opt_timestamp, parse_timestamp, parse_uuid, to_json};

const MEETING_COLUMNS: &str = "id, title, description, scheduled_at, is_private, room_access, \
     creator_id, agenda_items, created_at, updated_at";

fn meeting_from_row(row: &SqliteRow) -> Result<Meeting> {
    Ok(Meeting {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        title: row.get("title"),
        description: row.get("description"),
        scheduled_at: parse_opt_timestamp(row.get("scheduled_at"))?,
        is_private: row.get("is_private"),
        room_access: row.get::<String, _>("room_access").parse()?,
        creator_id: parse_uuid(&row.get::<String, _>("creator_id"))?,
        agenda_items: from_json(&row.get::<String, _>("agenda_items"))?,
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

/// Insert a meeting and enroll its creator as the first attendee
pub async fn insert_meeting(pool: &SqlitePool, creator_id: Uuid, new: NewMeeting) -> Result<Meeting> {
    let now = time::now();
    let meeting = Meeting {
        id: Uuid::new_v4(),
        title: new.title,
        description: new.description,
        scheduled_at: new.scheduled_at,
        is_private: new.is_private,
        room_access: new.room_access,
        creator_id,
        agenda_items: new.agenda_items,
        created_at: now,
        updated_at: now,
    };

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO meetings (id, title, description, scheduled_at, is_private, room_access,
                              creator_id, agenda_items, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(meeting.id.to_string())
    .bind(&meeting.title)
    .bind(&meeting.description)
    .bind(meeting.scheduled_at.as_ref().map(time::to_storage))
    .bind(meeting.is_private)
    .bind(meeting.room_access.as_str())
    .bind(creator_id.to_string())
    .bind(to_json(&meeting.agenda_items)?)
    .bind(time::to_storage(&now))
    .bind(time::to_storage(&now))
    .execute(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO meeting_attendees (meeting_id, user_id) VALUES (?, ?)")
        .bind(meeting.id.to_string())
        .bind(creator_id.to_string())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(meeting)
}

pub async fn get_meeting(pool: &SqlitePool, id: Uuid) -> Result<Option<Meeting>> {
    let row = sqlx::query(&format!("SELECT {} FROM meetings WHERE id = ?", MEETING_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(meeting_from_row).transpose()
}

pub async fn meeting_exists(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM meetings WHERE id = ?)")
        .bind(id.to_string())
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

pub async fn is_attendee(pool: &SqlitePool, meeting_id: Uuid, user_id: Uuid) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM meeting_attendees WHERE meeting_id = ? AND user_id = ?)",
    )
    .bind(meeting_id.to_string())
    .bind(user_id.to_string())
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

pub async fn add_attendee(pool: &SqlitePool, meeting_id: Uuid, user_id: Uuid) -> Result<()> {
    sqlx::query("INSERT INTO meeting_attendees (meeting_id, user_id) VALUES (?, ?)")
        .bind(meeting_id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Meetings the user attends: scheduled ones first (soonest first), then
/// unscheduled ones newest first
pub async fn list_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Meeting>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {}
        FROM meetings
        WHERE id IN (SELECT meeting_id FROM meeting_attendees WHERE user_id = ?)
        ORDER BY scheduled_at IS NULL, scheduled_at ASC, created_at DESC
        "#,
        MEETING_COLUMNS
    ))
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(meeting_from_row).collect()
}

/// Meetings the user attends scheduled at or after `now`, soonest first
pub async fn list_upcoming(
    pool: &SqlitePool,
    user_id: Uuid,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<Meeting>> {
    let rows = sqlx::query(&format!(
        r#"
        SELECT {}
        FROM meetings
        WHERE id IN (SELECT meeting_id FROM meeting_attendees WHERE user_id = ?)
          AND scheduled_at IS NOT NULL
          AND scheduled_at >= ?
        ORDER BY scheduled_at ASC
        LIMIT ?
        "#,
        MEETING_COLUMNS
    ))
    .bind(user_id.to_string())
    .bind(time::to_storage(&now))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(meeting_from_row).collect()
}

/// Persist every mutable field of `meeting`, bumping `updated_at`
pub async fn save_meeting(pool: &SqlitePool, meeting: &mut Meeting) -> Result<()> {
    meeting.updated_at = time::now();

    sqlx::query(
        r#"
        UPDATE meetings
        SET title = ?, description = ?, scheduled_at = ?, is_private = ?,
            room_access = ?, agenda_items = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&meeting.title)
    .bind(&meeting.description)
    .bind(meeting.scheduled_at.as_ref().map(time::to_storage))
    .bind(meeting.is_private)
    .bind(meeting.room_access.as_str())
    .bind(to_json(&meeting.agenda_items)?)
    .bind(time::to_storage(&meeting.updated_at))
    .bind(meeting.id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a meeting; action items, dossier and practice sessions cascade
pub async fn delete_meeting(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM meetings WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Attendee projection of a meeting's attendee set, ordered by name
pub async fn list_attendees(pool: &SqlitePool, meeting_id: Uuid) -> Result<Vec<Attendee>> {
    let rows = sqlx::query(
        r#"
        SELECT u.id, u.name, u.email
        FROM users u
        JOIN meeting_attendees ma ON ma.user_id = u.id
        WHERE ma.meeting_id = ?
        ORDER BY u.name ASC, u.email ASC
        "#,
    )
    .bind(meeting_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(Attendee {
                id: parse_uuid(&row.get::<String, _>("id"))?,
                name: row.get("name"),
                email: row.get("email"),
            })
        })
        .collect()
}
