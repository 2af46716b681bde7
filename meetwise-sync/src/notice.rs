//! Inline notices shown above the board
//!
//! One slot per kind. Success and warning notices expire after a fixed delay;
//! errors stay until replaced or cleared.

use std::time::{Duration, Instant};

const SUCCESS_TTL: Duration = Duration::from_millis(1500);
const WARNING_TTL: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
}

impl NoticeKind {
    /// Display lifetime, `None` for notices that persist
    pub fn ttl(&self) -> Option<Duration> {
        match self {
            NoticeKind::Success => Some(SUCCESS_TTL),
            NoticeKind::Warning => Some(WARNING_TTL),
            NoticeKind::Error => None,
        }
    }

    fn slot(&self) -> usize {
        match self {
            NoticeKind::Success => 0,
            NoticeKind::Warning => 1,
            NoticeKind::Error => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub expires_at: Option<Instant>,
}

impl Notice {
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoticeBoard {
    slots: [Option<Notice>; 3],
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.post_at(kind, message, Instant::now());
    }

    /// Post a notice as of `now`, replacing any notice of the same kind
    pub fn post_at(&mut self, kind: NoticeKind, message: impl Into<String>, now: Instant) {
        self.slots[kind.slot()] = Some(Notice {
            kind,
            message: message.into(),
            expires_at: kind.ttl().map(|ttl| now + ttl),
        });
    }

    pub fn clear(&mut self, kind: NoticeKind) {
        self.slots[kind.slot()] = None;
    }

    pub fn clear_all(&mut self) {
        self.slots = Default::default();
    }

    /// Current notice of a kind, ignoring expired ones
    pub fn get(&self, kind: NoticeKind, now: Instant) -> Option<&Notice> {
        self.slots[kind.slot()]
            .as_ref()
            .filter(|notice| !notice.is_expired(now))
    }

    /// Notices still visible at `now`, errors first
    pub fn active(&self, now: Instant) -> Vec<&Notice> {
        [NoticeKind::Error, NoticeKind::Warning, NoticeKind::Success]
            .iter()
            .filter_map(|kind| self.get(*kind, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_expires_after_delay() {
        let mut board = NoticeBoard::new();
        let t0 = Instant::now();
        board.post_at(NoticeKind::Success, "Action item added", t0);

        assert!(board.get(NoticeKind::Success, t0 + Duration::from_millis(1499)).is_some());
        assert!(board.get(NoticeKind::Success, t0 + Duration::from_millis(1500)).is_none());
    }

    #[test]
    fn test_warning_outlives_success() {
        let mut board = NoticeBoard::new();
        let t0 = Instant::now();
        board.post_at(NoticeKind::Success, "saved", t0);
        board.post_at(NoticeKind::Warning, "already removed", t0);

        let later = t0 + Duration::from_millis(1800);
        let active = board.active(later);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].kind, NoticeKind::Warning);
    }

    #[test]
    fn test_error_persists_until_cleared() {
        let mut board = NoticeBoard::new();
        let t0 = Instant::now();
        board.post_at(NoticeKind::Error, "Failed to add action item", t0);

        assert!(board.get(NoticeKind::Error, t0 + Duration::from_secs(3600)).is_some());
        board.clear(NoticeKind::Error);
        assert!(board.active(t0).is_empty());
    }

    #[test]
    fn test_newer_notice_replaces_same_kind() {
        let mut board = NoticeBoard::new();
        let t0 = Instant::now();
        board.post_at(NoticeKind::Error, "first", t0);
        board.post_at(NoticeKind::Error, "second", t0);

        assert_eq!(board.get(NoticeKind::Error, t0).map(|n| n.message.as_str()), Some("second"));
    }
}
