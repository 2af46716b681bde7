//! End-to-end: a sync session reconciling against a live meetwise-api
//!
//! The API runs on an ephemeral port over an in-memory database.

use std::sync::Arc;

use meetwise_api::{build_router, db, AppState};
use meetwise_common::api::auth::issue_token;
use meetwise_common::db::init_database_in_memory;
use meetwise_common::models::{ActionItemStatus, CreateActionItem, Priority};
use meetwise_common::time;
use meetwise_sync::{
    ActionItemBackend, DeleteOutcome, HttpBackend, LiveList, MoveOutcome, SharedDocument,
    StatusFilter, SyncError, SyncSession,
};
use serde_json::{json, Value};
use uuid::Uuid;

const SECRET: i64 = 987654321;

struct Server {
    base_url: String,
    token: String,
}

async fn start_server() -> Server {
    let pool = init_database_in_memory().await.unwrap();
    db::users::insert_user(&pool, "user_ada", "ada@example.com", "Ada Lovelace")
        .await
        .unwrap();

    let app = build_router(AppState::new(pool, SECRET));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Server {
        base_url: format!("http://{}", addr),
        token: issue_token("user_ada", time::now_millis() + 3_600_000, SECRET),
    }
}

async fn create_meeting(server: &Server, title: &str) -> Uuid {
    let response = reqwest::Client::new()
        .post(format!("{}/meetings", server.base_url))
        .bearer_auth(&server.token)
        .json(&json!({"title": title}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let meeting: Value = response.json().await.unwrap();
    meeting["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_session_round_trip_against_api() {
    let server = start_server().await;
    let meeting_id = create_meeting(&server, "Planning").await;

    let backend = Arc::new(HttpBackend::new(&server.base_url, &server.token).unwrap());
    let document = Arc::new(LiveList::new());
    let mut session = SyncSession::new(meeting_id, backend.clone(), document.clone());
    session.connect().unwrap();
    assert_eq!(session.hydrate().await.unwrap(), 0);

    let mut body = CreateActionItem::new("Draft slides", meeting_id);
    body.priority = Some(Priority::High);
    let added = session.add(body).await.unwrap();
    assert_eq!(added.status, ActionItemStatus::Todo);
    assert_eq!(added.priority, Priority::High);

    let outcome = session
        .move_status(added.id, ActionItemStatus::Done)
        .await
        .unwrap();
    assert!(matches!(outcome, MoveOutcome::Committed(ref m) if m.status == ActionItemStatus::Done));

    // Backend agrees with the document
    let listed = backend.list_for_meeting(meeting_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, ActionItemStatus::Done);
    assert_eq!(listed[0].description, "Draft slides");
    assert_eq!(listed[0].priority, Priority::High);

    // Hydrating again changes nothing
    let before = document.snapshot().await;
    assert_eq!(session.hydrate().await.unwrap(), 1);
    assert_eq!(document.snapshot().await, before);

    session.refresh_attendees().await.unwrap();
    let board = session.board(StatusFilter::All).await;
    assert_eq!(board.column(ActionItemStatus::Done).unwrap().cards.len(), 1);

    assert_eq!(session.delete(added.id).await.unwrap(), DeleteOutcome::Deleted);
    assert_eq!(
        session.delete(added.id).await.unwrap(),
        DeleteOutcome::AlreadyGone
    );
    assert!(document.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_backend_errors_are_classified() {
    let server = start_server().await;
    let backend = HttpBackend::new(&server.base_url, &server.token).unwrap();

    let err = backend.list_for_meeting(Uuid::new_v4()).await.unwrap_err();
    assert!(err.is_not_found());

    let err = backend.delete(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err, SyncError::NotFound("Action item not found".to_string()));

    let anonymous = HttpBackend::new(&server.base_url, "not-a-token").unwrap();
    let err = anonymous.list_for_meeting(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, SyncError::Unauthorized(_)));
}

#[tokio::test]
async fn test_add_to_deleted_meeting_surfaces_error() {
    let server = start_server().await;
    let meeting_id = create_meeting(&server, "Short lived").await;

    let backend = Arc::new(HttpBackend::new(&server.base_url, &server.token).unwrap());
    let document = Arc::new(LiveList::new());
    let mut session = SyncSession::new(meeting_id, backend, document.clone());
    session.connect().unwrap();
    session.hydrate().await.unwrap();

    let response = reqwest::Client::new()
        .delete(format!("{}/meetings/{}", server.base_url, meeting_id))
        .bearer_auth(&server.token)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let err = session
        .add(CreateActionItem::new("Too late", meeting_id))
        .await
        .unwrap_err();
    match err {
        SyncError::NotFound(message) => assert!(message.starts_with("Meeting not found")),
        other => panic!("expected NotFound, got {:?}", other),
    }
    assert!(document.snapshot().await.is_empty());
}
