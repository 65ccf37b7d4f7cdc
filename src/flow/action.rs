//! Fully resolved actions and their execution.

use chrono::NaiveDate;
use tracing::info;

use crate::catalog::Mutations;
use crate::error::TrelloError;

/// A committing write with every reference resolved to a catalog id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CreateCard {
        list_id: String,
        title: String,
        desc: String,
    },
    CreateList {
        board_id: String,
        name: String,
    },
    RenameCard {
        card_id: String,
        new_name: String,
    },
    RenameList {
        list_id: String,
        new_name: String,
    },
    MoveCard {
        card_id: String,
        target_list_id: String,
    },
    ArchiveCard {
        card_id: String,
    },
    DeleteCard {
        card_id: String,
    },
    AddComment {
        card_id: String,
        text: String,
    },
    UpdateDescription {
        card_id: String,
        text: String,
    },
    SetDueDate {
        card_id: String,
        due: Option<NaiveDate>,
    },
    AddLabel {
        card_id: String,
        label_id: String,
    },
    RemoveLabel {
        card_id: String,
        label_id: String,
    },
    AddMember {
        card_id: String,
        member_id: String,
    },
    RemoveMember {
        card_id: String,
        member_id: String,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::CreateCard { .. } => "create_card",
            Action::CreateList { .. } => "create_list",
            Action::RenameCard { .. } => "rename_card",
            Action::RenameList { .. } => "rename_list",
            Action::MoveCard { .. } => "move_card",
            Action::ArchiveCard { .. } => "archive_card",
            Action::DeleteCard { .. } => "delete_card",
            Action::AddComment { .. } => "add_comment",
            Action::UpdateDescription { .. } => "update_description",
            Action::SetDueDate { .. } => "set_due_date",
            Action::AddLabel { .. } => "add_label",
            Action::RemoveLabel { .. } => "remove_label",
            Action::AddMember { .. } => "add_member",
            Action::RemoveMember { .. } => "remove_member",
        }
    }

    /// Issue the single mutation call for this action.
    pub async fn execute(&self, mutations: &dyn Mutations) -> Result<(), TrelloError> {
        info!(action = self.name(), "Executing mutation");
        match self {
            Action::CreateCard {
                list_id,
                title,
                desc,
            } => mutations.create_card(list_id, title, desc).await,
            Action::CreateList { board_id, name } => mutations.create_list(board_id, name).await,
            Action::RenameCard { card_id, new_name } => {
                mutations.rename_card(card_id, new_name).await
            }
            Action::RenameList { list_id, new_name } => {
                mutations.rename_list(list_id, new_name).await
            }
            Action::MoveCard {
                card_id,
                target_list_id,
            } => mutations.move_card(card_id, target_list_id).await,
            Action::ArchiveCard { card_id } => mutations.archive_card(card_id).await,
            Action::DeleteCard { card_id } => mutations.delete_card(card_id).await,
            Action::AddComment { card_id, text } => mutations.add_comment(card_id, text).await,
            Action::UpdateDescription { card_id, text } => {
                mutations.update_description(card_id, text).await
            }
            Action::SetDueDate { card_id, due } => mutations.set_due_date(card_id, *due).await,
            Action::AddLabel { card_id, label_id } => mutations.add_label(card_id, label_id).await,
            Action::RemoveLabel { card_id, label_id } => {
                mutations.remove_label(card_id, label_id).await
            }
            Action::AddMember { card_id, member_id } => {
                mutations.add_member(card_id, member_id).await
            }
            Action::RemoveMember { card_id, member_id } => {
                mutations.remove_member(card_id, member_id).await
            }
        }
    }
}
