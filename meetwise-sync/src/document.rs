//! Shared document of a meeting room
//!
//! The live room holds two ordered lists: mirrored action items and the
//! agenda. Convergence between clients belongs to the real-time platform;
//! this crate only sees the document through [`SharedDocument`] and its
//! change events. [`LiveList`] is the in-process implementation: several
//! sessions holding the same `Arc<LiveList>` behave like clients in one room.

use async_trait::async_trait;
use chrono::NaiveDate;
use meetwise_common::models::{ActionItem, ActionItemStatus, AgendaItem, CreateActionItem, Priority};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

const EVENT_CAPACITY: usize = 100;

/// Action item as held in the shared document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirroredActionItem {
    pub id: Uuid,
    pub description: String,
    pub status: ActionItemStatus,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<Uuid>,
}

impl From<&ActionItem> for MirroredActionItem {
    fn from(item: &ActionItem) -> Self {
        Self {
            id: item.id,
            description: item.description.clone(),
            status: item.status,
            priority: item.priority,
            due_date: item.due_date,
            assignee_id: item.assignee_id,
        }
    }
}

impl MirroredActionItem {
    /// Mirror of a freshly created record
    ///
    /// Fields the response left empty fall back to what the client sent.
    pub fn from_created(item: &ActionItem, sent: &CreateActionItem) -> Self {
        let mut mirror = Self::from(item);
        if mirror.description.trim().is_empty() {
            mirror.description = sent.description.trim().to_string();
        }
        if mirror.due_date.is_none() {
            mirror.due_date = sent.due_date;
        }
        if mirror.assignee_id.is_none() {
            mirror.assignee_id = sent.assignee_id;
        }
        mirror
    }
}

/// Field-level change to one mirrored record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MirrorPatch {
    pub description: Option<String>,
    pub status: Option<ActionItemStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub assignee_id: Option<Option<Uuid>>,
}

impl MirrorPatch {
    pub fn status(status: ActionItemStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Every mirrored field set from an authoritative record
    pub fn from_record(item: &ActionItem) -> Self {
        Self {
            description: Some(item.description.clone()),
            status: Some(item.status),
            priority: Some(item.priority),
            due_date: Some(item.due_date),
            assignee_id: Some(item.assignee_id),
        }
    }

    pub fn apply(&self, item: &mut MirroredActionItem) {
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(status) = self.status {
            item.status = status;
        }
        if let Some(priority) = self.priority {
            item.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            item.due_date = due_date;
        }
        if let Some(assignee_id) = self.assignee_id {
            item.assignee_id = assignee_id;
        }
    }
}

/// Change observed on the shared document
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    Cleared,
    Pushed(MirroredActionItem),
    Patched(MirroredActionItem),
    Removed(Uuid),
}

/// Ordered list of mirrored action items shared by every client of a room
#[async_trait]
pub trait SharedDocument: Send + Sync {
    async fn snapshot(&self) -> Vec<MirroredActionItem>;

    async fn push(&self, item: MirroredActionItem);

    /// Remove every entry
    async fn clear(&self);

    /// Returns `false` when no entry had this id
    async fn remove_by_id(&self, id: Uuid) -> bool;

    /// Patch the entry with this id, returning its new value
    async fn patch_by_id(&self, id: Uuid, patch: &MirrorPatch) -> Option<MirroredActionItem>;

    fn subscribe(&self) -> broadcast::Receiver<DocumentEvent>;
}

/// In-process shared document
pub struct LiveList {
    items: RwLock<Vec<MirroredActionItem>>,
    agenda: RwLock<Vec<AgendaItem>>,
    events: broadcast::Sender<DocumentEvent>,
}

impl LiveList {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            items: RwLock::new(Vec::new()),
            agenda: RwLock::new(Vec::new()),
            events,
        }
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    pub async fn agenda(&self) -> Vec<AgendaItem> {
        self.agenda.read().await.clone()
    }

    pub async fn push_agenda(&self, item: AgendaItem) {
        self.agenda.write().await.push(item);
    }

    /// Remove an agenda entry by position
    pub async fn remove_agenda(&self, index: usize) -> Option<AgendaItem> {
        let mut agenda = self.agenda.write().await;
        (index < agenda.len()).then(|| agenda.remove(index))
    }

    fn emit(&self, event: DocumentEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Default for LiveList {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SharedDocument for LiveList {
    async fn snapshot(&self) -> Vec<MirroredActionItem> {
        self.items.read().await.clone()
    }

    async fn push(&self, item: MirroredActionItem) {
        debug!(id = %item.id, "Document push");
        self.items.write().await.push(item.clone());
        self.emit(DocumentEvent::Pushed(item));
    }

    async fn clear(&self) {
        self.items.write().await.clear();
        self.emit(DocumentEvent::Cleared);
    }

    async fn remove_by_id(&self, id: Uuid) -> bool {
        let removed = {
            let mut items = self.items.write().await;
            let before = items.len();
            items.retain(|item| item.id != id);
            items.len() != before
        };

        if removed {
            debug!(id = %id, "Document remove");
            self.emit(DocumentEvent::Removed(id));
        }
        removed
    }

    async fn patch_by_id(&self, id: Uuid, patch: &MirrorPatch) -> Option<MirroredActionItem> {
        let patched = {
            let mut items = self.items.write().await;
            let item = items.iter_mut().find(|item| item.id == id)?;
            patch.apply(item);
            item.clone()
        };

        debug!(id = %id, status = %patched.status, "Document patch");
        self.emit(DocumentEvent::Patched(patched.clone()));
        Some(patched)
    }

    fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mirror(description: &str) -> MirroredActionItem {
        MirroredActionItem {
            id: Uuid::new_v4(),
            description: description.to_string(),
            status: ActionItemStatus::Todo,
            priority: Priority::Medium,
            due_date: None,
            assignee_id: None,
        }
    }

    #[tokio::test]
    async fn test_push_preserves_order() {
        let doc = LiveList::new();
        let a = mirror("a");
        let b = mirror("b");
        doc.push(a.clone()).await;
        doc.push(b.clone()).await;

        assert_eq!(doc.snapshot().await, vec![a, b]);
    }

    #[tokio::test]
    async fn test_patch_and_remove() {
        let doc = LiveList::new();
        let item = mirror("write tests");
        doc.push(item.clone()).await;

        let patched = doc
            .patch_by_id(item.id, &MirrorPatch::status(ActionItemStatus::Done))
            .await
            .unwrap();
        assert_eq!(patched.status, ActionItemStatus::Done);
        assert_eq!(patched.description, "write tests");

        assert!(doc
            .patch_by_id(Uuid::new_v4(), &MirrorPatch::status(ActionItemStatus::Done))
            .await
            .is_none());

        assert!(doc.remove_by_id(item.id).await);
        assert!(!doc.remove_by_id(item.id).await);
        assert!(doc.is_empty().await);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let doc = LiveList::new();
        let mut rx = doc.subscribe();
        let item = mirror("observe me");

        doc.push(item.clone()).await;
        doc.clear().await;

        assert_eq!(rx.recv().await.unwrap(), DocumentEvent::Pushed(item));
        assert_eq!(rx.recv().await.unwrap(), DocumentEvent::Cleared);
    }

    #[test]
    fn test_patch_can_clear_optional_fields() {
        let mut item = mirror("due soon");
        item.due_date = NaiveDate::from_ymd_opt(2026, 1, 1);
        item.assignee_id = Some(Uuid::new_v4());

        let patch = MirrorPatch {
            due_date: Some(None),
            assignee_id: Some(None),
            ..Default::default()
        };
        patch.apply(&mut item);

        assert!(item.due_date.is_none());
        assert!(item.assignee_id.is_none());
    }

    #[tokio::test]
    async fn test_agenda_list() {
        let doc = LiveList::new();
        doc.push_agenda(AgendaItem {
            text: "Budget".to_string(),
            author: "Ada".to_string(),
        })
        .await;

        assert_eq!(doc.agenda().await.len(), 1);
        assert!(doc.remove_agenda(3).await.is_none());
        assert_eq!(doc.remove_agenda(0).await.map(|a| a.text), Some("Budget".to_string()));
    }
}
