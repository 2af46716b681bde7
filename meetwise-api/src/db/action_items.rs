//! Action-item backend store
//!
//! Authoritative persistence for Kanban cards. Every read resolves the
//! assignee and meeting associations with a join so responses always carry
//! `assignee` and `meeting`.

use meetwise_common::models::{
    ActionItem, Attendee, DeleteConfirmation, MeetingRef, NewActionItem, UpdateActionItem,
};
use meetwise_common::{time, Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::meetings::meeting_exists;
use super::{parse_date, parse_opt_uuid, parse_timestamp, parse_uuid};

const SELECT_ACTION_ITEM: &str = r#"
    SELECT a.id, a.description, a.status, a.priority, a.due_date, a.meeting_id,
           a.assignee_id, a.created_at, a.updated_at,
           u.id AS assignee_user_id, u.name AS assignee_name, u.email AS assignee_email,
           m.title AS meeting_title
    FROM action_items a
    JOIN meetings m ON m.id = a.meeting_id
    LEFT JOIN users u ON u.id = a.assignee_id
"#;

fn action_item_from_row(row: &SqliteRow) -> Result<ActionItem> {
    let id = parse_uuid(&row.get::<String, _>("id"))?;
    let meeting_id = parse_uuid(&row.get::<String, _>("meeting_id"))?;

    let assignee = match parse_opt_uuid(row.get("assignee_user_id"))? {
        Some(user_id) => Some(Attendee {
            id: user_id,
            name: row.get("assignee_name"),
            email: row.get("assignee_email"),
        }),
        None => None,
    };

    Ok(ActionItem {
        id,
        description: row.get("description"),
        status: row.get::<String, _>("status").parse()?,
        priority: row.get::<String, _>("priority").parse()?,
        due_date: parse_date(row.get("due_date"))?,
        meeting_id,
        assignee_id: parse_opt_uuid(row.get("assignee_id"))?,
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
        assignee,
        meeting: Some(MeetingRef {
            id: meeting_id,
            title: row.get("meeting_title"),
        }),
    })
}

/// Look up one action item with its associations
pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<ActionItem>> {
    let row = sqlx::query(&format!("{} WHERE a.id = ?", SELECT_ACTION_ITEM))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(action_item_from_row).transpose()
}

const MEETING_MISSING: &str =
    "Meeting not found. Cannot create action item for non-existent meeting.";

/// Persist a normalized action item
///
/// The meeting check is part of the INSERT and the read-back shares its
/// transaction, so a meeting deleted concurrently yields `NotFound`.
pub async fn create(pool: &SqlitePool, new: NewActionItem) -> Result<ActionItem> {
    let id = Uuid::new_v4();
    let now = time::to_storage(&time::now());
    let meeting_id = new.meeting_id.to_string();

    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO action_items (id, description, status, priority, due_date, meeting_id,
                                  assignee_id, created_at, updated_at)
        SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?
        WHERE EXISTS (SELECT 1 FROM meetings WHERE id = ?)
        "#,
    )
    .bind(id.to_string())
    .bind(&new.description)
    .bind(new.status.as_str())
    .bind(new.priority.as_str())
    .bind(new.due_date.map(|d| d.to_string()))
    .bind(&meeting_id)
    .bind(new.assignee_id.map(|u| u.to_string()))
    .bind(&now)
    .bind(&now)
    .bind(&meeting_id)
    .execute(&mut *tx)
    .await?;

    if inserted.rows_affected() == 0 {
        return Err(Error::NotFound(MEETING_MISSING.to_string()));
    }

    let row = sqlx::query(&format!("{} WHERE a.id = ?", SELECT_ACTION_ITEM))
        .bind(id.to_string())
        .fetch_one(&mut *tx)
        .await?;
    let item = action_item_from_row(&row)?;
    tx.commit().await?;

    debug!(action_item_id = %id, meeting_id = %new.meeting_id, "Action item created");
    Ok(item)
}

/// All action items of a meeting, newest first
///
/// Items created within the same timestamp keep insertion order, newest first.
pub async fn list_for_meeting(pool: &SqlitePool, meeting_id: Uuid) -> Result<Vec<ActionItem>> {
    if !meeting_exists(pool, meeting_id).await? {
        return Err(Error::NotFound("Meeting not found".to_string()));
    }

    let rows = sqlx::query(&format!(
        "{} WHERE a.meeting_id = ? ORDER BY a.created_at DESC, a.rowid DESC",
        SELECT_ACTION_ITEM
    ))
    .bind(meeting_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(action_item_from_row).collect()
}

/// Apply a normalized partial update and bump `updated_at`
pub async fn update(pool: &SqlitePool, id: Uuid, changes: &UpdateActionItem) -> Result<ActionItem> {
    let mut item = get(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound("Action item not found".to_string()))?;

    item.apply(changes);

    sqlx::query(
        r#"
        UPDATE action_items
        SET description = ?, status = ?, priority = ?, due_date = ?, assignee_id = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&item.description)
    .bind(item.status.as_str())
    .bind(item.priority.as_str())
    .bind(item.due_date.map(|d| d.to_string()))
    .bind(item.assignee_id.map(|u| u.to_string()))
    .bind(time::to_storage(&time::now()))
    .bind(id.to_string())
    .execute(pool)
    .await?;

    debug!(action_item_id = %id, status = %item.status, "Action item updated");

    // Re-read so the assignee association reflects a changed assignee_id
    get(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound("Action item not found".to_string()))
}

/// Delete an action item
pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<DeleteConfirmation> {
    let result = sqlx::query("DELETE FROM action_items WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("Action item not found".to_string()));
    }

    Ok(DeleteConfirmation {
        id,
        message: "Deleted".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::meetings::{delete_meeting, insert_meeting};
    use crate::db::users::insert_user;
    use chrono::NaiveDate;
    use meetwise_common::db::init_database_in_memory;
    use meetwise_common::models::{ActionItemStatus, CreateActionItem, CreateMeeting, Priority};

    async fn setup() -> (SqlitePool, Uuid, Uuid) {
        let pool = init_database_in_memory().await.unwrap();
        let user = insert_user(&pool, "u1", "ada@example.com", "Ada").await.unwrap();
        let meeting = insert_meeting(
            &pool,
            user.id,
            CreateMeeting {
                title: "Q4 Strategy Session".to_string(),
                ..Default::default()
            }
            .normalize()
            .unwrap(),
        )
        .await
        .unwrap();
        (pool, meeting.id, user.id)
    }

    fn draft(description: &str, meeting_id: Uuid) -> NewActionItem {
        CreateActionItem::new(description, meeting_id).normalize().unwrap()
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let (pool, meeting_id, _) = setup().await;

        let mut body = CreateActionItem::new("Draft slides", meeting_id);
        body.priority = Some(Priority::High);
        let created = create(&pool, body.normalize().unwrap()).await.unwrap();

        assert_eq!(created.status, ActionItemStatus::Todo);
        assert_eq!(created.priority, Priority::High);
        assert_eq!(created.meeting.as_ref().map(|m| m.title.as_str()), Some("Q4 Strategy Session"));

        let items = list_for_meeting(&pool, meeting_id).await.unwrap();
        assert_eq!(items, vec![created]);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let (pool, meeting_id, _) = setup().await;

        let first = create(&pool, draft("First", meeting_id)).await.unwrap();
        let second = create(&pool, draft("Second", meeting_id)).await.unwrap();
        let third = create(&pool, draft("Third", meeting_id)).await.unwrap();

        let ids: Vec<Uuid> = list_for_meeting(&pool, meeting_id)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
    }

    #[tokio::test]
    async fn test_create_for_missing_meeting() {
        let (pool, _, _) = setup().await;

        let err = create(&pool, draft("Orphan", Uuid::new_v4())).await.unwrap_err();
        match err {
            Error::NotFound(msg) => assert_eq!(
                msg,
                "Meeting not found. Cannot create action item for non-existent meeting."
            ),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_for_deleted_meeting() {
        let (pool, meeting_id, _) = setup().await;
        assert!(delete_meeting(&pool, meeting_id).await.unwrap());

        assert!(matches!(
            create(&pool, draft("Late", meeting_id)).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            list_for_meeting(&pool, meeting_id).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_for_unknown_meeting_writes_nothing() {
        let (pool, _, _) = setup().await;

        match create(&pool, draft("Orphan", Uuid::new_v4())).await {
            Err(Error::NotFound(msg)) => assert_eq!(msg, MEETING_MISSING),
            other => panic!("unexpected result: {:?}", other),
        }
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM action_items")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_status_update_leaves_other_fields() {
        let (pool, meeting_id, _) = setup().await;
        let mut body = CreateActionItem::new("Draft slides", meeting_id);
        body.priority = Some(Priority::High);
        body.due_date = NaiveDate::from_ymd_opt(2025, 3, 1);
        let created = create(&pool, body.normalize().unwrap()).await.unwrap();

        let updated = update(
            &pool,
            created.id,
            &UpdateActionItem::status_only(ActionItemStatus::Done),
        )
        .await
        .unwrap();

        assert_eq!(updated.status, ActionItemStatus::Done);
        assert_eq!(updated.description, created.description);
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.due_date, created.due_date);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_sequential_status_updates_keep_last() {
        let (pool, meeting_id, _) = setup().await;
        let created = create(&pool, draft("Ship", meeting_id)).await.unwrap();

        for status in [ActionItemStatus::InProgress, ActionItemStatus::Done] {
            update(&pool, created.id, &UpdateActionItem::status_only(status))
                .await
                .unwrap();
        }

        let items = list_for_meeting(&pool, meeting_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].status, ActionItemStatus::Done);
    }

    #[tokio::test]
    async fn test_assignee_resolution() {
        let (pool, meeting_id, user_id) = setup().await;

        let mut body = CreateActionItem::new("Assigned", meeting_id);
        body.assignee_id = Some(user_id);
        let assigned = create(&pool, body.normalize().unwrap()).await.unwrap();
        assert_eq!(assigned.assignee.as_ref().map(|a| a.name.as_str()), Some("Ada"));

        // Unknown assignee ids are kept but resolve to no assignee
        let ghost = Uuid::new_v4();
        let updated = update(
            &pool,
            assigned.id,
            &UpdateActionItem {
                assignee_id: Some(Some(ghost)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.assignee_id, Some(ghost));
        assert!(updated.assignee.is_none());

        let cleared = update(
            &pool,
            assigned.id,
            &UpdateActionItem {
                assignee_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(cleared.assignee_id, None);
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let (pool, _, _) = setup().await;
        let id = Uuid::new_v4();

        assert!(matches!(
            update(&pool, id, &UpdateActionItem::status_only(ActionItemStatus::Done)).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(delete(&pool, id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let (pool, meeting_id, _) = setup().await;
        let created = create(&pool, draft("Once", meeting_id)).await.unwrap();

        let confirmation = delete(&pool, created.id).await.unwrap();
        assert_eq!(confirmation.id, created.id);
        assert_eq!(confirmation.message, "Deleted");

        assert!(matches!(delete(&pool, created.id).await, Err(Error::NotFound(_))));
    }
}
