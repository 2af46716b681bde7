//! Assignee resolution against a meeting's attendee directory

use std::collections::HashMap;

use meetwise_common::models::Attendee;
use uuid::Uuid;

use crate::backend::ActionItemBackend;
use crate::error::SyncResult;

const UNASSIGNED: &str = "Unassigned";

/// Cached attendee list of one meeting
#[derive(Debug, Clone, Default)]
pub struct AttendeeDirectory {
    attendees: Vec<Attendee>,
    by_id: HashMap<Uuid, usize>,
}

impl AttendeeDirectory {
    pub fn new(attendees: Vec<Attendee>) -> Self {
        let by_id = attendees
            .iter()
            .enumerate()
            .map(|(index, attendee)| (attendee.id, index))
            .collect();
        Self { attendees, by_id }
    }

    pub async fn load<B>(backend: &B, meeting_id: Uuid) -> SyncResult<Self>
    where
        B: ActionItemBackend + ?Sized,
    {
        Ok(Self::new(backend.attendees(meeting_id).await?))
    }

    pub fn get(&self, id: Uuid) -> Option<&Attendee> {
        self.by_id.get(&id).map(|&index| &self.attendees[index])
    }

    /// Display label of an assignee
    ///
    /// "Unassigned" for none; an id missing from the directory shows as itself.
    pub fn label(&self, assignee_id: Option<Uuid>) -> String {
        match assignee_id {
            None => UNASSIGNED.to_string(),
            Some(id) => self
                .get(id)
                .map(|attendee| attendee.name.clone())
                .unwrap_or_else(|| id.to_string()),
        }
    }

    /// Choices for an assignment dropdown, in directory order
    pub fn options(&self) -> &[Attendee] {
        &self.attendees
    }

    pub fn len(&self) -> usize {
        self.attendees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attendees.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let ada = Attendee {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        };
        let directory = AttendeeDirectory::new(vec![ada.clone()]);
        let stranger = Uuid::new_v4();

        assert_eq!(directory.label(Some(ada.id)), "Ada");
        assert_eq!(directory.label(None), "Unassigned");
        assert_eq!(directory.label(Some(stranger)), stranger.to_string());
        assert_eq!(directory.options().len(), 1);
    }
}
