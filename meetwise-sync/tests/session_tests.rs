//! Reconciliation tests against an in-memory backend
//!
//! The fake backend keeps records newest-first like the real one and can be
//! told to fail its next call.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use meetwise_common::models::{
    ActionItem, ActionItemStatus, Attendee, CreateActionItem, DeleteConfirmation, Priority,
    UpdateActionItem,
};
use meetwise_common::time;
use meetwise_sync::{
    ActionItemBackend, DeleteOutcome, DocumentEvent, LiveList, MoveOutcome, NoticeKind,
    SessionState, SharedDocument, StatusFilter, SyncError, SyncResult, SyncSession,
};
use uuid::Uuid;

#[derive(Default)]
struct FakeBackend {
    items: Mutex<Vec<ActionItem>>,
    attendees: Mutex<Vec<Attendee>>,
    fail_next: Mutex<Option<SyncError>>,
    stall_next: Mutex<Option<Duration>>,
    calls: Mutex<usize>,
}

impl FakeBackend {
    fn fail_next(&self, err: SyncError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    /// Make the next create sleep before touching any state
    fn stall_next(&self, delay: Duration) {
        *self.stall_next.lock().unwrap() = Some(delay);
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    fn check(&self) -> SyncResult<()> {
        *self.calls.lock().unwrap() += 1;
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Insert a record directly, as another client would
    fn seed(&self, meeting_id: Uuid, description: &str) -> ActionItem {
        let now = time::now();
        let item = ActionItem {
            id: Uuid::new_v4(),
            description: description.to_string(),
            status: ActionItemStatus::Todo,
            priority: Priority::Medium,
            due_date: None,
            meeting_id,
            assignee_id: None,
            created_at: now,
            updated_at: now,
            assignee: None,
            meeting: None,
        };
        self.items.lock().unwrap().insert(0, item.clone());
        item
    }

    fn remove(&self, id: Uuid) {
        self.items.lock().unwrap().retain(|item| item.id != id);
    }
}

fn not_found() -> SyncError {
    SyncError::NotFound("Action item not found".to_string())
}

#[async_trait]
impl ActionItemBackend for FakeBackend {
    async fn list_for_meeting(&self, meeting_id: Uuid) -> SyncResult<Vec<ActionItem>> {
        self.check()?;
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|item| item.meeting_id == meeting_id)
            .cloned()
            .collect())
    }

    async fn create(&self, body: &CreateActionItem) -> SyncResult<ActionItem> {
        let stall = self.stall_next.lock().unwrap().take();
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }
        self.check()?;
        let new = body.clone().normalize()?;
        let mut item = self.seed(new.meeting_id, &new.description);
        item.status = new.status;
        item.priority = new.priority;
        item.due_date = new.due_date;
        item.assignee_id = new.assignee_id;
        self.items.lock().unwrap()[0] = item.clone();
        Ok(item)
    }

    async fn update(&self, id: Uuid, changes: &UpdateActionItem) -> SyncResult<ActionItem> {
        self.check()?;
        let mut items = self.items.lock().unwrap();
        let item = items.iter_mut().find(|item| item.id == id).ok_or_else(not_found)?;
        item.apply(changes);
        item.updated_at = time::now();
        Ok(item.clone())
    }

    async fn delete(&self, id: Uuid) -> SyncResult<DeleteConfirmation> {
        self.check()?;
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Err(not_found());
        }
        Ok(DeleteConfirmation {
            id,
            message: "Deleted".to_string(),
        })
    }

    async fn attendees(&self, _meeting_id: Uuid) -> SyncResult<Vec<Attendee>> {
        self.check()?;
        Ok(self.attendees.lock().unwrap().clone())
    }
}

struct Fixture {
    meeting_id: Uuid,
    backend: Arc<FakeBackend>,
    document: Arc<LiveList>,
    session: SyncSession<FakeBackend, LiveList>,
}

async fn hydrated() -> Fixture {
    let meeting_id = Uuid::new_v4();
    let backend = Arc::new(FakeBackend::default());
    let document = Arc::new(LiveList::new());
    let mut session = SyncSession::new(meeting_id, backend.clone(), document.clone());
    session.connect().unwrap();
    session.hydrate().await.unwrap();
    Fixture {
        meeting_id,
        backend,
        document,
        session,
    }
}

#[tokio::test]
async fn test_mutations_before_hydration_not_ready() {
    let meeting_id = Uuid::new_v4();
    let backend = Arc::new(FakeBackend::default());
    let mut session = SyncSession::new(meeting_id, backend.clone(), Arc::new(LiveList::new()));

    let err = session
        .add(CreateActionItem::new("Too early", meeting_id))
        .await
        .unwrap_err();
    assert_eq!(err, SyncError::NotReady);

    session.connect().unwrap();
    assert_eq!(session.state(), SessionState::ConnectedEmpty);
    assert_eq!(session.delete(Uuid::new_v4()).await.unwrap_err(), SyncError::NotReady);
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_hydrate_is_full_replace_and_idempotent() {
    let mut fx = hydrated().await;
    let older = fx.backend.seed(fx.meeting_id, "older");
    let newer = fx.backend.seed(fx.meeting_id, "newer");

    assert_eq!(fx.session.hydrate().await.unwrap(), 2);
    let first = fx.document.snapshot().await;
    assert_eq!(fx.session.hydrate().await.unwrap(), 2);
    let second = fx.document.snapshot().await;

    assert_eq!(first, second);
    let ids: Vec<Uuid> = second.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
    assert_eq!(fx.session.state(), SessionState::Hydrated);
}

#[tokio::test]
async fn test_hydration_failure_leaves_document() {
    let mut fx = hydrated().await;
    fx.backend.seed(fx.meeting_id, "kept");
    fx.session.hydrate().await.unwrap();

    fx.backend.fail_next(SyncError::Server {
        status: 500,
        message: "boom".to_string(),
    });
    assert!(fx.session.hydrate().await.is_err());

    assert_eq!(fx.document.len().await, 1);
    assert_eq!(fx.session.state(), SessionState::Hydrated);
    assert!(fx.session.current_error().is_some());
}

#[tokio::test]
async fn test_add_appends_backend_record() {
    let mut fx = hydrated().await;
    let mut body = CreateActionItem::new("  Draft slides ", fx.meeting_id);
    body.priority = Some(Priority::High);

    let mirror = fx.session.add(body).await.unwrap();

    assert_eq!(mirror.description, "Draft slides");
    assert_eq!(mirror.status, ActionItemStatus::Todo);
    assert_eq!(mirror.priority, Priority::High);
    assert_eq!(fx.document.snapshot().await, vec![mirror]);
    assert_eq!(fx.session.state(), SessionState::Hydrated);
    assert!(fx
        .session
        .notices()
        .get(NoticeKind::Success, std::time::Instant::now())
        .is_some());
}

#[tokio::test]
async fn test_failed_add_leaves_document_untouched() {
    let mut fx = hydrated().await;
    fx.backend
        .fail_next(SyncError::NotFound("Meeting not found".to_string()));

    let err = fx
        .session
        .add(CreateActionItem::new("Orphan", fx.meeting_id))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(fx.document.is_empty().await);
    assert_eq!(fx.session.state(), SessionState::MutatingFailed);
    assert!(fx.session.current_error().is_some());

    // The session stays usable after a failed write
    fx.session
        .add(CreateActionItem::new("Retry by hand", fx.meeting_id))
        .await
        .unwrap();
    assert_eq!(fx.document.len().await, 1);
    assert!(fx.session.current_error().is_none());
}

#[tokio::test]
async fn test_blank_description_rejected_locally() {
    let mut fx = hydrated().await;
    let calls = fx.backend.calls();

    let err = fx
        .session
        .add(CreateActionItem::new("   ", fx.meeting_id))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Validation(_)));
    assert_eq!(fx.backend.calls(), calls);
}

#[tokio::test]
async fn test_move_status_patches_after_ack() {
    let mut fx = hydrated().await;
    let item = fx
        .session
        .add(CreateActionItem::new("Move me", fx.meeting_id))
        .await
        .unwrap();

    for status in [ActionItemStatus::InProgress, ActionItemStatus::Done] {
        let outcome = fx.session.move_status(item.id, status).await.unwrap();
        assert!(matches!(outcome, MoveOutcome::Committed(ref m) if m.status == status));
    }

    let snapshot = fx.document.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].status, ActionItemStatus::Done);
    assert_eq!(snapshot[0].description, "Move me");
}

#[tokio::test]
async fn test_rejected_move_keeps_card_in_place() {
    let mut fx = hydrated().await;
    let item = fx
        .session
        .add(CreateActionItem::new("Stuck", fx.meeting_id))
        .await
        .unwrap();

    fx.backend.fail_next(SyncError::Network("offline".to_string()));
    let outcome = fx
        .session
        .move_status(item.id, ActionItemStatus::Done)
        .await
        .unwrap();

    match outcome {
        MoveOutcome::Rejected {
            id, current_status, ..
        } => {
            assert_eq!(id, item.id);
            assert_eq!(current_status, Some(ActionItemStatus::Todo));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(fx.document.snapshot().await[0].status, ActionItemStatus::Todo);
}

#[tokio::test]
async fn test_move_to_same_column_skips_backend() {
    let mut fx = hydrated().await;
    let item = fx
        .session
        .add(CreateActionItem::new("Stay", fx.meeting_id))
        .await
        .unwrap();
    let calls = fx.backend.calls();

    let outcome = fx
        .session
        .move_status(item.id, ActionItemStatus::Todo)
        .await
        .unwrap();

    assert_eq!(outcome, MoveOutcome::Committed(item));
    assert_eq!(fx.backend.calls(), calls);
}

#[tokio::test]
async fn test_edit_copies_backend_record() {
    let mut fx = hydrated().await;
    let item = fx
        .session
        .add(CreateActionItem::new("Rough", fx.meeting_id))
        .await
        .unwrap();

    let changes = UpdateActionItem {
        description: Some("  Polished ".to_string()),
        priority: Some(Priority::Low),
        due_date: Some(chrono::NaiveDate::from_ymd_opt(2026, 12, 1)),
        ..Default::default()
    };
    let mirror = fx.session.edit(item.id, changes).await.unwrap();

    assert_eq!(mirror.description, "Polished");
    assert_eq!(mirror.priority, Priority::Low);
    assert_eq!(mirror.status, ActionItemStatus::Todo);
    assert_eq!(fx.document.snapshot().await, vec![mirror]);

    let err = fx
        .session
        .edit(item.id, UpdateActionItem::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Validation(_)));
}

#[tokio::test]
async fn test_delete_twice_is_not_fatal() {
    let mut fx = hydrated().await;
    let item = fx
        .session
        .add(CreateActionItem::new("Once", fx.meeting_id))
        .await
        .unwrap();

    assert_eq!(fx.session.delete(item.id).await.unwrap(), DeleteOutcome::Deleted);
    assert_eq!(
        fx.session.delete(item.id).await.unwrap(),
        DeleteOutcome::AlreadyGone
    );

    assert!(fx.document.is_empty().await);
    assert_eq!(fx.session.state(), SessionState::Hydrated);
    let warning = fx
        .session
        .notices()
        .get(NoticeKind::Warning, std::time::Instant::now())
        .map(|n| n.message.clone());
    assert_eq!(
        warning.as_deref(),
        Some("Action item not found in backend. Removed from UI.")
    );
}

#[tokio::test]
async fn test_delete_of_item_removed_elsewhere() {
    let mut fx = hydrated().await;
    let item = fx.backend.seed(fx.meeting_id, "Gone elsewhere");
    fx.session.hydrate().await.unwrap();
    fx.backend.remove(item.id);

    assert_eq!(
        fx.session.delete(item.id).await.unwrap(),
        DeleteOutcome::AlreadyGone
    );
    assert!(fx.document.is_empty().await);
}

#[tokio::test]
async fn test_failed_delete_keeps_item() {
    let mut fx = hydrated().await;
    let item = fx
        .session
        .add(CreateActionItem::new("Keep", fx.meeting_id))
        .await
        .unwrap();

    fx.backend
        .fail_next(SyncError::Forbidden("Access denied".to_string()));
    assert!(fx.session.delete(item.id).await.is_err());

    assert_eq!(fx.document.len().await, 1);
    assert_eq!(fx.session.state(), SessionState::MutatingFailed);
}

#[tokio::test]
async fn test_reset_resyncs_with_backend() {
    let mut fx = hydrated().await;
    fx.session
        .add(CreateActionItem::new("Local", fx.meeting_id))
        .await
        .unwrap();

    // Another client's write that this session never saw
    fx.backend.seed(fx.meeting_id, "Remote");

    assert_eq!(fx.session.reset().await.unwrap(), 2);
    let descriptions: Vec<String> = fx
        .document
        .snapshot()
        .await
        .into_iter()
        .map(|item| item.description)
        .collect();
    assert_eq!(descriptions, vec!["Remote", "Local"]);
}

#[tokio::test]
async fn test_second_client_observes_changes() {
    let mut fx = hydrated().await;
    let mut rx = fx.document.subscribe();

    let mirror = fx
        .session
        .add(CreateActionItem::new("Shared", fx.meeting_id))
        .await
        .unwrap();

    assert_eq!(rx.recv().await.unwrap(), DocumentEvent::Pushed(mirror));
}

#[tokio::test]
async fn test_board_uses_attendee_labels() {
    let mut fx = hydrated().await;
    let ada = Attendee {
        id: Uuid::new_v4(),
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
    };
    fx.backend.attendees.lock().unwrap().push(ada.clone());
    fx.session.refresh_attendees().await.unwrap();

    let mut body = CreateActionItem::new("Assigned", fx.meeting_id);
    body.assignee_id = Some(ada.id);
    fx.session.add(body).await.unwrap();
    fx.session
        .add(CreateActionItem::new("Nobody", fx.meeting_id))
        .await
        .unwrap();

    let board = fx.session.board(StatusFilter::All).await;
    let labels: Vec<&str> = board
        .column(ActionItemStatus::Todo)
        .unwrap()
        .cards
        .iter()
        .map(|card| card.assignee.as_str())
        .collect();
    assert_eq!(labels, vec!["Ada", "Unassigned"]);
}

#[tokio::test]
async fn test_abandoned_add_leaves_session_usable() {
    let mut fx = hydrated().await;
    fx.backend.seed(fx.meeting_id, "Existing");
    fx.backend.stall_next(Duration::from_secs(60));

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        fx.session.add(CreateActionItem::new("Never lands", fx.meeting_id)),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(fx.session.state(), SessionState::Hydrated);
    assert!(!fx.session.is_saving());
    assert!(fx.document.snapshot().await.is_empty());

    assert_eq!(fx.session.reset().await.unwrap(), 1);
    assert_eq!(fx.session.state(), SessionState::Hydrated);

    let added = fx
        .session
        .add(CreateActionItem::new("Lands", fx.meeting_id))
        .await
        .unwrap();
    assert_eq!(added.description, "Lands");
    assert_eq!(fx.document.len().await, 2);
}
