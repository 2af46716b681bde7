//! Three-column board derived from the shared document

use meetwise_common::models::ActionItemStatus;

use crate::attendees::AttendeeDirectory;
use crate::document::MirroredActionItem;

/// Which columns to populate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ActionItemStatus),
}

impl StatusFilter {
    pub fn admits(&self, status: ActionItemStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(only) => *only == status,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardCard {
    pub item: MirroredActionItem,
    pub assignee: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoardColumn {
    pub status: ActionItemStatus,
    pub title: &'static str,
    pub cards: Vec<BoardCard>,
}

/// Board projection; columns in TODO, IN_PROGRESS, DONE order
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub columns: Vec<BoardColumn>,
}

impl Board {
    /// Project document items onto columns, keeping document order inside each
    pub fn project(
        items: &[MirroredActionItem],
        directory: &AttendeeDirectory,
        filter: StatusFilter,
    ) -> Self {
        let columns = ActionItemStatus::ALL
            .iter()
            .map(|&status| BoardColumn {
                status,
                title: status.label(),
                cards: if filter.admits(status) {
                    items
                        .iter()
                        .filter(|item| item.status == status)
                        .map(|item| BoardCard {
                            item: item.clone(),
                            assignee: directory.label(item.assignee_id),
                        })
                        .collect()
                } else {
                    Vec::new()
                },
            })
            .collect();

        Self { columns }
    }

    pub fn column(&self, status: ActionItemStatus) -> Option<&BoardColumn> {
        self.columns.iter().find(|column| column.status == status)
    }

    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|column| column.cards.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meetwise_common::models::{Attendee, Priority};
    use uuid::Uuid;

    fn item(description: &str, status: ActionItemStatus, assignee_id: Option<Uuid>) -> MirroredActionItem {
        MirroredActionItem {
            id: Uuid::new_v4(),
            description: description.to_string(),
            status,
            priority: Priority::Medium,
            due_date: None,
            assignee_id,
        }
    }

    #[test]
    fn test_columns_split_by_status() {
        let ada = Attendee {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        };
        let directory = AttendeeDirectory::new(vec![ada.clone()]);
        let items = vec![
            item("a", ActionItemStatus::Todo, Some(ada.id)),
            item("b", ActionItemStatus::Done, None),
            item("c", ActionItemStatus::Todo, None),
        ];

        let board = Board::project(&items, &directory, StatusFilter::All);

        let titles: Vec<&str> = board.columns.iter().map(|c| c.title).collect();
        assert_eq!(titles, vec!["To Do", "In Progress", "Done"]);

        let todo = board.column(ActionItemStatus::Todo).unwrap();
        let descriptions: Vec<&str> = todo.cards.iter().map(|c| c.item.description.as_str()).collect();
        assert_eq!(descriptions, vec!["a", "c"]);
        assert_eq!(todo.cards[0].assignee, "Ada");
        assert_eq!(todo.cards[1].assignee, "Unassigned");
        assert!(board.column(ActionItemStatus::InProgress).unwrap().cards.is_empty());
        assert_eq!(board.card_count(), 3);
    }

    #[test]
    fn test_filter_keeps_one_column() {
        let items = vec![
            item("a", ActionItemStatus::Todo, None),
            item("b", ActionItemStatus::Done, None),
        ];

        let board = Board::project(
            &items,
            &AttendeeDirectory::default(),
            StatusFilter::Only(ActionItemStatus::Done),
        );

        assert_eq!(board.columns.len(), 3);
        assert_eq!(board.card_count(), 1);
        assert_eq!(board.column(ActionItemStatus::Done).unwrap().cards[0].item.description, "b");
    }
}
