//! Structured intents produced by classification.
//!
//! The classifier turns a normalized utterance into an [`Intent`]. Every
//! action has its own variant with statically known optional slots; unknown
//! actions are rejected at the classification boundary.

mod classifier;

pub use classifier::LlmIntentClassifier;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::IntentError;

/// Address of a card as spoken: board, list and card title, each optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CardRef {
    pub board: Option<String>,
    pub list: Option<String>,
    pub title: Option<String>,
}

/// A classified voice command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Intent {
    AddCard {
        board: Option<String>,
        list: Option<String>,
        title: Option<String>,
        desc: Option<String>,
    },
    AddList {
        board: Option<String>,
        name: Option<String>,
    },
    RenameCard {
        card: CardRef,
        new_title: Option<String>,
    },
    RenameList {
        board: Option<String>,
        list: Option<String>,
        new_name: Option<String>,
    },
    MoveCard {
        card: CardRef,
        target_board: Option<String>,
        target_list: Option<String>,
    },
    DeleteCard {
        card: CardRef,
    },
    ArchiveCard {
        card: CardRef,
    },
    AddComment {
        card: CardRef,
        comment: Option<String>,
    },
    UpdateDesc {
        card: CardRef,
        desc: Option<String>,
    },
    AddDueDate {
        card: CardRef,
        due: Option<String>,
    },
    RemoveDueDate {
        card: CardRef,
    },
    AddLabel {
        card: CardRef,
        label: Option<String>,
    },
    RemoveLabel {
        card: CardRef,
        label: Option<String>,
    },
    AssignMember {
        card: CardRef,
        member: Option<String>,
    },
    RemoveMember {
        card: CardRef,
        member: Option<String>,
    },
    /// The classifier could not name an action.
    Unrecognized,
}

impl Intent {
    /// Wire name of the action.
    pub fn action(&self) -> &'static str {
        match self {
            Intent::AddCard { .. } => "add_card",
            Intent::AddList { .. } => "add_list",
            Intent::RenameCard { .. } => "rename_card",
            Intent::RenameList { .. } => "rename_list",
            Intent::MoveCard { .. } => "move_card",
            Intent::DeleteCard { .. } => "delete_card",
            Intent::ArchiveCard { .. } => "archive_card",
            Intent::AddComment { .. } => "add_comment",
            Intent::UpdateDesc { .. } => "update_desc",
            Intent::AddDueDate { .. } => "add_due_date",
            Intent::RemoveDueDate { .. } => "remove_due_date",
            Intent::AddLabel { .. } => "add_label",
            Intent::RemoveLabel { .. } => "remove_label",
            Intent::AssignMember { .. } => "assign_member",
            Intent::RemoveMember { .. } => "remove_member",
            Intent::Unrecognized => "unrecognized",
        }
    }
}

/// Boards and lists the classifier may use to spell names correctly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogContext {
    pub boards: Vec<String>,
    pub lists_per_board: Vec<(String, Vec<String>)>,
}

impl CatalogContext {
    pub fn is_empty(&self) -> bool {
        self.boards.is_empty() && self.lists_per_board.is_empty()
    }
}

/// Maps a normalized utterance to an intent.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(
        &self,
        utterance: &str,
        context: Option<&CatalogContext>,
    ) -> Result<Intent, IntentError>;
}
