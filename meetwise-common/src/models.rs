//! Domain models shared by the API server and the sync client
//!
//! Wire format is camelCase JSON. Enum values travel as SCREAMING_SNAKE_CASE
//! strings (`"IN_PROGRESS"`, `"INVITE_ONLY"`).
//!
//! Defaults for optional write fields are applied in exactly one place:
//! [`CreateActionItem::normalize`] and [`CreateMeeting::normalize`]. Storage
//! code only ever sees fully populated records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{Error, Result};

// ========================================
// Enums
// ========================================

/// Kanban column of an action item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionItemStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl ActionItemStatus {
    /// Board column order
    pub const ALL: [ActionItemStatus; 3] = [
        ActionItemStatus::Todo,
        ActionItemStatus::InProgress,
        ActionItemStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionItemStatus::Todo => "TODO",
            ActionItemStatus::InProgress => "IN_PROGRESS",
            ActionItemStatus::Done => "DONE",
        }
    }

    /// Human-readable column label
    pub fn label(&self) -> &'static str {
        match self {
            ActionItemStatus::Todo => "To Do",
            ActionItemStatus::InProgress => "In Progress",
            ActionItemStatus::Done => "Done",
        }
    }
}

impl fmt::Display for ActionItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionItemStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "TODO" => Ok(ActionItemStatus::Todo),
            "IN_PROGRESS" => Ok(ActionItemStatus::InProgress),
            "DONE" => Ok(ActionItemStatus::Done),
            other => Err(Error::InvalidInput(format!("Unknown status: {}", other))),
        }
    }
}

/// Action item priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            other => Err(Error::InvalidInput(format!("Unknown priority: {}", other))),
        }
    }
}

/// Who may enter a meeting room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomAccess {
    #[default]
    InviteOnly,
    Public,
    Restricted,
}

impl RoomAccess {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomAccess::InviteOnly => "INVITE_ONLY",
            RoomAccess::Public => "PUBLIC",
            RoomAccess::Restricted => "RESTRICTED",
        }
    }
}

impl FromStr for RoomAccess {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "INVITE_ONLY" => Ok(RoomAccess::InviteOnly),
            "PUBLIC" => Ok(RoomAccess::Public),
            "RESTRICTED" => Ok(RoomAccess::Restricted),
            other => Err(Error::InvalidInput(format!("Unknown room access: {}", other))),
        }
    }
}

// ========================================
// Users and attendees
// ========================================

/// Identity-provider-linked user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    /// Subject identifier issued by the identity provider
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Attendee projection used for assignee resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for Attendee {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

// ========================================
// Action items
// ========================================

/// Meeting association embedded in action item responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingRef {
    pub id: Uuid,
    pub title: String,
}

/// Authoritative action item record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub id: Uuid,
    pub description: String,
    pub status: ActionItemStatus,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub meeting_id: Uuid,
    pub assignee_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Resolved assignee, `None` when unassigned or the user no longer exists
    #[serde(default)]
    pub assignee: Option<Attendee>,
    #[serde(default)]
    pub meeting: Option<MeetingRef>,
}

impl ActionItem {
    /// Apply a normalized partial update in place
    pub fn apply(&mut self, update: &UpdateActionItem) {
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        if let Some(assignee_id) = update.assignee_id {
            self.assignee_id = assignee_id;
        }
    }
}

/// Body of `POST /action-items`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActionItem {
    pub description: String,
    pub meeting_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ActionItemStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Uuid>,
}

impl CreateActionItem {
    pub fn new(description: impl Into<String>, meeting_id: Uuid) -> Self {
        Self {
            description: description.into(),
            meeting_id,
            status: None,
            priority: None,
            due_date: None,
            assignee_id: None,
        }
    }

    /// Validate and fill defaults, producing the record to persist
    pub fn normalize(self) -> Result<NewActionItem> {
        let description = normalize_description(&self.description)?;
        Ok(NewActionItem {
            description,
            meeting_id: self.meeting_id,
            status: self.status.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            due_date: self.due_date,
            assignee_id: self.assignee_id,
        })
    }
}

/// Fully populated action item ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewActionItem {
    pub description: String,
    pub meeting_id: Uuid,
    pub status: ActionItemStatus,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<Uuid>,
}

/// Body of `PATCH /action-items/:id`
///
/// Absent fields are left untouched. `dueDate` and `assigneeId` accept an
/// explicit `null` to clear the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActionItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ActionItemStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub assignee_id: Option<Option<Uuid>>,
}

impl UpdateActionItem {
    /// Update touching only the status (board drag)
    pub fn status_only(status: ActionItemStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.assignee_id.is_none()
    }

    /// Validate the fields present in the update
    pub fn normalize(mut self) -> Result<Self> {
        if let Some(description) = self.description.take() {
            self.description = Some(normalize_description(&description)?);
        }
        Ok(self)
    }
}

/// Response of `DELETE /action-items/:id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub id: Uuid,
    pub message: String,
}

fn normalize_description(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(
            "description must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`)
fn double_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ========================================
// Meetings
// ========================================

/// One agenda entry as stored on the meeting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaItem {
    pub text: String,
    #[serde(default)]
    pub author: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub is_private: bool,
    pub room_access: RoomAccess,
    pub creator_id: Uuid,
    pub agenda_items: Vec<AgendaItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    pub fn apply(&mut self, update: &UpdateMeeting) {
        if let Some(title) = &update.title {
            self.title = title.clone();
        }
        if let Some(description) = &update.description {
            self.description = description.clone();
        }
        if let Some(scheduled_at) = update.scheduled_at {
            self.scheduled_at = scheduled_at;
        }
        if let Some(is_private) = update.is_private {
            self.is_private = is_private;
        }
        if let Some(room_access) = update.room_access {
            self.room_access = room_access;
        }
        if let Some(agenda_items) = &update.agenda_items {
            self.agenda_items = agenda_items.clone();
        }
    }
}

/// Body of `POST /meetings`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeeting {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_access: Option<RoomAccess>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agenda_items: Option<Vec<AgendaItem>>,
}

impl CreateMeeting {
    pub fn normalize(self) -> Result<NewMeeting> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("title must not be empty".to_string()));
        }
        Ok(NewMeeting {
            title: title.to_string(),
            description: self.description,
            scheduled_at: self.scheduled_at,
            is_private: self.is_private.unwrap_or(true),
            room_access: self.room_access.unwrap_or_default(),
            agenda_items: self.agenda_items.unwrap_or_default(),
        })
    }
}

/// Fully populated meeting ready for insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeeting {
    pub title: String,
    pub description: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub is_private: bool,
    pub room_access: RoomAccess,
    pub agenda_items: Vec<AgendaItem>,
}

/// Body of `PATCH /meetings/:id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeeting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_access: Option<RoomAccess>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agenda_items: Option<Vec<AgendaItem>>,
}

impl UpdateMeeting {
    pub fn normalize(mut self) -> Result<Self> {
        if let Some(title) = self.title.take() {
            let trimmed = title.trim();
            if trimmed.is_empty() {
                return Err(Error::InvalidInput("title must not be empty".to_string()));
            }
            self.title = Some(trimmed.to_string());
        }
        Ok(self)
    }
}

/// Body of `POST /meetings/:id/invite`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteUser {
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_defaults_status_and_priority() {
        let meeting_id = Uuid::new_v4();
        let item = CreateActionItem::new("  Draft slides ", meeting_id)
            .normalize()
            .unwrap();

        assert_eq!(item.description, "Draft slides");
        assert_eq!(item.status, ActionItemStatus::Todo);
        assert_eq!(item.priority, Priority::Medium);
        assert_eq!(item.meeting_id, meeting_id);
    }

    #[test]
    fn test_create_keeps_explicit_values() {
        let mut create = CreateActionItem::new("Ship it", Uuid::new_v4());
        create.status = Some(ActionItemStatus::Done);
        create.priority = Some(Priority::High);

        let item = create.normalize().unwrap();
        assert_eq!(item.status, ActionItemStatus::Done);
        assert_eq!(item.priority, Priority::High);
    }

    #[test]
    fn test_blank_description_rejected() {
        let result = CreateActionItem::new("   ", Uuid::new_v4()).normalize();
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let update = UpdateActionItem {
            description: Some("".to_string()),
            ..Default::default()
        };
        assert!(update.normalize().is_err());
    }

    #[test]
    fn test_create_body_wire_format() {
        let meeting_id = Uuid::new_v4();
        let body: CreateActionItem = serde_json::from_value(json!({
            "description": "Draft slides",
            "meetingId": meeting_id,
            "priority": "HIGH",
            "dueDate": "2025-03-01"
        }))
        .unwrap();

        assert_eq!(body.priority, Some(Priority::High));
        assert_eq!(body.status, None);
        assert_eq!(body.due_date, NaiveDate::from_ymd_opt(2025, 3, 1));
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let absent: UpdateActionItem = serde_json::from_value(json!({"status": "DONE"})).unwrap();
        assert_eq!(absent.due_date, None);
        assert_eq!(absent.status, Some(ActionItemStatus::Done));

        let cleared: UpdateActionItem =
            serde_json::from_value(json!({"dueDate": null, "assigneeId": null})).unwrap();
        assert_eq!(cleared.due_date, Some(None));
        assert_eq!(cleared.assignee_id, Some(None));

        // Serializing back keeps the explicit null
        let value = serde_json::to_value(&cleared).unwrap();
        assert!(value["dueDate"].is_null());
        assert!(value.get("status").is_none());
    }

    #[test]
    fn test_apply_patches_only_present_fields() {
        let now = Utc::now();
        let mut item = ActionItem {
            id: Uuid::new_v4(),
            description: "Draft slides".to_string(),
            status: ActionItemStatus::Todo,
            priority: Priority::High,
            due_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            meeting_id: Uuid::new_v4(),
            assignee_id: None,
            created_at: now,
            updated_at: now,
            assignee: None,
            meeting: None,
        };

        item.apply(&UpdateActionItem::status_only(ActionItemStatus::Done));
        assert_eq!(item.status, ActionItemStatus::Done);
        assert_eq!(item.priority, Priority::High);
        assert_eq!(item.description, "Draft slides");

        item.apply(&UpdateActionItem {
            due_date: Some(None),
            ..Default::default()
        });
        assert_eq!(item.due_date, None);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(ActionItemStatus::InProgress).unwrap(),
            json!("IN_PROGRESS")
        );
        assert_eq!("DONE".parse::<ActionItemStatus>().unwrap(), ActionItemStatus::Done);
        assert!("done".parse::<ActionItemStatus>().is_err());
        assert_eq!(
            serde_json::to_value(RoomAccess::InviteOnly).unwrap(),
            json!("INVITE_ONLY")
        );
    }

    #[test]
    fn test_meeting_defaults() {
        let meeting = CreateMeeting {
            title: "Q4 Strategy Session".to_string(),
            ..Default::default()
        }
        .normalize()
        .unwrap();

        assert!(meeting.is_private);
        assert_eq!(meeting.room_access, RoomAccess::InviteOnly);
        assert!(meeting.agenda_items.is_empty());
    }
}
