//! Hydration and reconciliation for one client session
//!
//! ```text
//! Disconnected -> Connecting -> ConnectedEmpty -> Hydrating -> Hydrated
//!                                                    ^            |
//!                                                    |            v
//!                                  MutatingFailed <- Mutating -> Hydrated
//! ```
//!
//! Every mutation goes to the backend first and patches the shared document
//! only after the backend acknowledges it. Status moves are pessimistic: a
//! card changes column once the backend has accepted the new status, and a
//! rejected move leaves the document as it was. Hydration and reset are full
//! replaces: clear the document, then push every backend record in backend
//! order. Nothing here retries.

use std::sync::Arc;
use std::time::Instant;

use meetwise_common::models::{ActionItemStatus, CreateActionItem, UpdateActionItem};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::attendees::AttendeeDirectory;
use crate::backend::ActionItemBackend;
use crate::board::{Board, StatusFilter};
use crate::document::{MirrorPatch, MirroredActionItem, SharedDocument};
use crate::error::{SyncError, SyncResult};
use crate::notice::{NoticeBoard, NoticeKind};

const MSG_ADDED: &str = "Action item added";
const MSG_UPDATED: &str = "Action item updated";
const MSG_DELETED: &str = "Action item deleted";
const MSG_ALREADY_GONE: &str = "Action item not found in backend. Removed from UI.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    /// Room handshake in progress
    Connecting,
    /// Room joined, document not yet filled from the backend
    ConnectedEmpty,
    Hydrating,
    Hydrated,
    /// Backend write in flight
    Mutating,
    /// Last backend write failed; the document is unchanged
    MutatingFailed,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;

        if next == Disconnected {
            return true;
        }
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, ConnectedEmpty)
                | (ConnectedEmpty, Hydrating)
                | (Hydrating, Hydrated)
                | (Hydrating, ConnectedEmpty)
                | (Hydrating, MutatingFailed)
                | (Hydrated, Hydrating)
                | (Hydrated, Mutating)
                | (Hydrated, ConnectedEmpty)
                | (Mutating, Hydrated)
                | (Mutating, MutatingFailed)
                | (MutatingFailed, Hydrating)
                | (MutatingFailed, Mutating)
                | (MutatingFailed, ConnectedEmpty)
        )
    }

    /// Mutations are accepted
    pub fn is_ready(self) -> bool {
        matches!(self, SessionState::Hydrated | SessionState::MutatingFailed)
    }

    /// Room joined (hydrated or not)
    pub fn is_connected(self) -> bool {
        !matches!(self, SessionState::Disconnected | SessionState::Connecting)
    }
}

/// Result of a board drag
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// Backend accepted; the document now shows the new status
    Committed(MirroredActionItem),
    /// Backend refused; the card keeps `current_status`
    Rejected {
        id: Uuid,
        current_status: Option<ActionItemStatus>,
        error: SyncError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// Backend no longer had the item; it was removed locally anyway
    AlreadyGone,
}

/// Holds the session in `Mutating` for one backend call
///
/// If the caller's future is dropped before `finish`, the previous state is
/// put back so the session accepts mutations, hydration and reset again.
struct InFlight<'a> {
    state: &'a mut SessionState,
    previous: SessionState,
    meeting_id: Uuid,
    finished: bool,
}

impl<'a> InFlight<'a> {
    fn begin(state: &'a mut SessionState, meeting_id: Uuid) -> SyncResult<Self> {
        let previous = *state;
        if !previous.can_transition_to(SessionState::Mutating) {
            return Err(SyncError::InvalidTransition {
                from: previous,
                to: SessionState::Mutating,
            });
        }
        debug!(meeting_id = %meeting_id, from = ?previous, to = ?SessionState::Mutating, "Session transition");
        *state = SessionState::Mutating;
        Ok(Self {
            state,
            previous,
            meeting_id,
            finished: false,
        })
    }

    /// Backend answered; the caller settles the state from here
    fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(meeting_id = %self.meeting_id, restored = ?self.previous, "Backend write abandoned");
            *self.state = self.previous;
        }
    }
}

/// One client's view of a meeting's action items
pub struct SyncSession<B, D>
where
    B: ActionItemBackend,
    D: SharedDocument,
{
    meeting_id: Uuid,
    backend: Arc<B>,
    document: Arc<D>,
    state: SessionState,
    notices: NoticeBoard,
    attendees: AttendeeDirectory,
}

impl<B, D> SyncSession<B, D>
where
    B: ActionItemBackend,
    D: SharedDocument,
{
    pub fn new(meeting_id: Uuid, backend: Arc<B>, document: Arc<D>) -> Self {
        Self {
            meeting_id,
            backend,
            document,
            state: SessionState::Disconnected,
            notices: NoticeBoard::new(),
            attendees: AttendeeDirectory::default(),
        }
    }

    pub fn meeting_id(&self) -> Uuid {
        self.meeting_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// A backend write is in flight
    pub fn is_saving(&self) -> bool {
        self.state == SessionState::Mutating
    }

    pub fn document(&self) -> &Arc<D> {
        &self.document
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut NoticeBoard {
        &mut self.notices
    }

    pub fn attendees(&self) -> &AttendeeDirectory {
        &self.attendees
    }

    fn transition(&mut self, next: SessionState) -> SyncResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(SyncError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        debug!(meeting_id = %self.meeting_id, from = ?self.state, to = ?next, "Session transition");
        self.state = next;
        Ok(())
    }

    fn ensure_ready(&self) -> SyncResult<()> {
        if self.state.is_ready() {
            Ok(())
        } else {
            Err(SyncError::NotReady)
        }
    }

    fn fail(&mut self, message: &str, err: SyncError) -> SyncError {
        error!(meeting_id = %self.meeting_id, "{}: {}", message, err);
        self.notices
            .post(NoticeKind::Error, format!("{}: {}", message, err));
        // Only reachable from Mutating, where MutatingFailed is always allowed
        self.state = SessionState::MutatingFailed;
        err
    }

    fn succeed(&mut self, message: &str) -> SyncResult<()> {
        self.notices.clear(NoticeKind::Error);
        self.notices.post(NoticeKind::Success, message);
        self.transition(SessionState::Hydrated)
    }

    /// Join the room
    ///
    /// The in-process document needs no handshake, so Connecting is passed
    /// through immediately.
    pub fn connect(&mut self) -> SyncResult<()> {
        self.transition(SessionState::Connecting)?;
        self.transition(SessionState::ConnectedEmpty)?;
        info!(meeting_id = %self.meeting_id, "Session connected");
        Ok(())
    }

    pub fn disconnect(&mut self) {
        self.state = SessionState::Disconnected;
        info!(meeting_id = %self.meeting_id, "Session disconnected");
    }

    /// Replace the document with the backend's records
    ///
    /// Returns the number of records loaded. On failure the document is left
    /// untouched and the session returns to its previous state.
    pub async fn hydrate(&mut self) -> SyncResult<usize> {
        if !self.state.is_connected() || self.state == SessionState::Hydrating {
            return Err(SyncError::NotReady);
        }
        if self.state == SessionState::Mutating {
            return Err(SyncError::InvalidTransition {
                from: self.state,
                to: SessionState::Hydrating,
            });
        }

        let previous = self.state;
        self.transition(SessionState::Hydrating)?;

        let items = match self.backend.list_for_meeting(self.meeting_id).await {
            Ok(items) => items,
            Err(err) => {
                error!(meeting_id = %self.meeting_id, "Hydration failed: {}", err);
                self.notices
                    .post(NoticeKind::Error, format!("Failed to load action items: {}", err));
                self.transition(previous)?;
                return Err(err);
            }
        };

        self.document.clear().await;
        for item in &items {
            self.document.push(MirroredActionItem::from(item)).await;
        }

        self.transition(SessionState::Hydrated)?;
        info!(meeting_id = %self.meeting_id, count = items.len(), "Document hydrated");
        Ok(items.len())
    }

    /// Clear the document and hydrate again
    pub async fn reset(&mut self) -> SyncResult<usize> {
        if !self.state.is_connected() {
            return Err(SyncError::NotReady);
        }
        if self.state != SessionState::ConnectedEmpty {
            self.transition(SessionState::ConnectedEmpty)?;
        }

        self.document.clear().await;
        self.notices.clear_all();
        info!(meeting_id = %self.meeting_id, "Document reset");
        self.hydrate().await
    }

    /// Refresh the attendee directory used for assignee labels
    ///
    /// A failure keeps the previous directory.
    pub async fn refresh_attendees(&mut self) -> SyncResult<&AttendeeDirectory> {
        match AttendeeDirectory::load(self.backend.as_ref(), self.meeting_id).await {
            Ok(directory) => {
                self.attendees = directory;
                Ok(&self.attendees)
            }
            Err(err) => {
                warn!(meeting_id = %self.meeting_id, "Failed to load attendees: {}", err);
                Err(err)
            }
        }
    }

    /// Create an item and append its mirror
    pub async fn add(&mut self, body: CreateActionItem) -> SyncResult<MirroredActionItem> {
        self.ensure_ready()?;
        body.clone().normalize()?;

        let in_flight = InFlight::begin(&mut self.state, self.meeting_id)?;
        let result = self.backend.create(&body).await;
        in_flight.finish();
        match result {
            Ok(created) => {
                let mirror = MirroredActionItem::from_created(&created, &body);
                self.document.push(mirror.clone()).await;
                self.succeed(MSG_ADDED)?;
                info!(meeting_id = %self.meeting_id, id = %mirror.id, "Action item added");
                Ok(mirror)
            }
            Err(err) => Err(self.fail("Failed to add action item", err)),
        }
    }

    /// Move an item to another column once the backend has accepted it
    pub async fn move_status(&mut self, id: Uuid, status: ActionItemStatus) -> SyncResult<MoveOutcome> {
        self.ensure_ready()?;

        let current = self
            .document
            .snapshot()
            .await
            .into_iter()
            .find(|item| item.id == id);
        if let Some(current) = &current {
            if current.status == status {
                return Ok(MoveOutcome::Committed(current.clone()));
            }
        }

        let in_flight = InFlight::begin(&mut self.state, self.meeting_id)?;
        let result = self
            .backend
            .update(id, &UpdateActionItem::status_only(status))
            .await;
        in_flight.finish();
        match result {
            Ok(updated) => {
                let patched = self
                    .document
                    .patch_by_id(id, &MirrorPatch::status(updated.status))
                    .await
                    .unwrap_or_else(|| MirroredActionItem::from(&updated));
                self.succeed(MSG_UPDATED)?;
                Ok(MoveOutcome::Committed(patched))
            }
            Err(err) => {
                let error = self.fail("Failed to update status", err);
                Ok(MoveOutcome::Rejected {
                    id,
                    current_status: current.map(|item| item.status),
                    error,
                })
            }
        }
    }

    /// Apply a partial update and copy the backend's record into the mirror
    pub async fn edit(&mut self, id: Uuid, changes: UpdateActionItem) -> SyncResult<MirroredActionItem> {
        self.ensure_ready()?;
        let changes = changes.normalize()?;
        if changes.is_empty() {
            return Err(SyncError::Validation("No changes to save".to_string()));
        }

        let in_flight = InFlight::begin(&mut self.state, self.meeting_id)?;
        let result = self.backend.update(id, &changes).await;
        in_flight.finish();
        match result {
            Ok(updated) => {
                let mirror = match self
                    .document
                    .patch_by_id(id, &MirrorPatch::from_record(&updated))
                    .await
                {
                    Some(mirror) => mirror,
                    None => {
                        debug!(id = %id, "Edited item is not in the document");
                        MirroredActionItem::from(&updated)
                    }
                };
                self.succeed(MSG_UPDATED)?;
                Ok(mirror)
            }
            Err(err) => Err(self.fail("Failed to update action item", err)),
        }
    }

    /// Delete an item; a backend 404 still removes it locally
    pub async fn delete(&mut self, id: Uuid) -> SyncResult<DeleteOutcome> {
        self.ensure_ready()?;

        let in_flight = InFlight::begin(&mut self.state, self.meeting_id)?;
        let result = self.backend.delete(id).await;
        in_flight.finish();
        match result {
            Ok(_) => {
                self.document.remove_by_id(id).await;
                self.succeed(MSG_DELETED)?;
                Ok(DeleteOutcome::Deleted)
            }
            Err(err) if err.is_not_found() => {
                warn!(meeting_id = %self.meeting_id, id = %id, "Delete of missing item, removing locally");
                self.document.remove_by_id(id).await;
                self.notices.clear(NoticeKind::Error);
                self.notices.post(NoticeKind::Warning, MSG_ALREADY_GONE);
                self.transition(SessionState::Hydrated)?;
                Ok(DeleteOutcome::AlreadyGone)
            }
            Err(err) => Err(self.fail("Failed to delete action item", err)),
        }
    }

    /// Board projection of the current document
    pub async fn board(&self, filter: StatusFilter) -> Board {
        Board::project(&self.document.snapshot().await, &self.attendees, filter)
    }

    /// Error notice currently shown, if any
    pub fn current_error(&self) -> Option<String> {
        self.notices
            .get(NoticeKind::Error, Instant::now())
            .map(|notice| notice.message.clone())
    }
}
