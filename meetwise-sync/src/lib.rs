//! # meetwise-sync
//!
//! Client-side synchronization between the action-item REST backend and the
//! live shared document of a meeting room.
//!
//! - [`backend`]: the backend store as seen by a client ([`HttpBackend`])
//! - [`document`]: the shared document contract and the in-process [`LiveList`]
//! - [`session`]: per-session hydration and reconciliation ([`SyncSession`])
//! - [`attendees`]: assignee resolution for display
//! - [`board`]: three-column projection of the document
//! - [`notice`]: auto-clearing success/warning/error banners
//!
//! Every mutation writes to the backend first. The shared document is only
//! touched after the backend acknowledges, or during hydration/reset, which
//! always clear the document before refilling it.

pub mod attendees;
pub mod backend;
pub mod board;
pub mod document;
pub mod error;
pub mod notice;
pub mod session;

pub use attendees::AttendeeDirectory;
pub use backend::{ActionItemBackend, HttpBackend};
pub use board::{Board, BoardCard, BoardColumn, StatusFilter};
pub use document::{DocumentEvent, LiveList, MirrorPatch, MirroredActionItem, SharedDocument};
pub use error::{SyncError, SyncResult};
pub use notice::{Notice, NoticeBoard, NoticeKind};
pub use session::{DeleteOutcome, MoveOutcome, SessionState, SyncSession};
