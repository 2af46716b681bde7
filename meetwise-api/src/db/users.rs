//! User records
//!
//! Users are created by identity-provider webhooks and looked up by the
//! provider's subject (`external_id`) on every authenticated request.

use meetwise_common::models::User;
use meetwise_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};

const USER_COLUMNS: &str = "id, external_id, email, name, created_at";

/// User plus the optional profile fields used by briefings
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user: User,
    pub company: Option<String>,
    pub job_title: Option<String>,
}

pub(crate) fn user_from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: parse_uuid(&row.get::<String, _>("id"))?,
        external_id: row.get("external_id"),
        email: row.get("email"),
        name: row.get("name"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
    })
}

/// Insert a new user
pub async fn insert_user(pool: &SqlitePool, external_id: &str, email: &str, name: &str) -> Result<User> {
    let user = User {
        id: Uuid::new_v4(),
        external_id: external_id.to_string(),
        email: email.to_string(),
        name: name.to_string(),
        created_at: time::now(),
    };

    sqlx::query("INSERT INTO users (id, external_id, email, name, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(user.id.to_string())
        .bind(&user.external_id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(time::to_storage(&user.created_at))
        .execute(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_external_id(pool: &SqlitePool, external_id: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE external_id = ?", USER_COLUMNS))
        .bind(external_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
        .bind(email)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// Attendees of a meeting with their profile fields, ordered by name
pub async fn profiles_for_meeting(pool: &SqlitePool, meeting_id: Uuid) -> Result<Vec<UserProfile>> {
    let rows = sqlx::query(
        r#"
        SELECT u.id, u.external_id, u.email, u.name, u.created_at, u.company, u.job_title
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
            Ok(UserProfile {
                user: user_from_row(row)?,
                company: row.get("company"),
                job_title: row.get("job_title"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use meetwise_common::db::init_database_in_memory;

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let pool = init_database_in_memory().await.unwrap();
        let user = insert_user(&pool, "user_1", "ada@example.com", "Ada Lovelace")
            .await
            .unwrap();

        let by_subject = find_by_external_id(&pool, "user_1").await.unwrap();
        assert_eq!(by_subject.as_ref().map(|u| u.id), Some(user.id));

        let by_email = find_by_email(&pool, "ada@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.name), Some("Ada Lovelace".to_string()));

        assert!(find_by_external_id(&pool, "user_2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let pool = init_database_in_memory().await.unwrap();
        insert_user(&pool, "user_1", "ada@example.com", "Ada").await.unwrap();

        let result = insert_user(&pool, "user_2", "ada@example.com", "Other Ada").await;
        assert!(result.is_err());
    }
}
