//! Catalog access and mutation traits.
//!
//! The flows never talk to Trello directly: reads go through [`Catalog`],
//! the single committing write of a flow goes through [`Mutations`]. Both are
//! implemented by [`crate::trello::TrelloClient`] and by in-memory fakes in
//! tests.

pub mod resolve;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TrelloError;

pub use resolve::{
    Resolution, resolve_board, resolve_card, resolve_label, resolve_list, resolve_member,
};

/// A board, list, card, label or member as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub id: String,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// Read access to the account's boards and their contents.
///
/// Results are fetched fresh on every call and never cached across turns.
#[async_trait]
pub trait Catalog: Send + Sync {
    // ── Structure ───────────────────────────────────────────────────

    /// All boards of the account.
    async fn list_boards(&self) -> Result<Vec<CatalogEntry>, TrelloError>;

    /// All open lists of a board.
    async fn list_lists(&self, board_id: &str) -> Result<Vec<CatalogEntry>, TrelloError>;

    /// All open cards of a list.
    async fn list_cards(&self, list_id: &str) -> Result<Vec<CatalogEntry>, TrelloError>;

    // ── Board metadata ──────────────────────────────────────────────

    /// Labels defined on a board. Unnamed labels carry their colour as name.
    async fn list_labels(&self, board_id: &str) -> Result<Vec<CatalogEntry>, TrelloError>;

    /// Members of a board, named by full name.
    async fn list_members(&self, board_id: &str) -> Result<Vec<CatalogEntry>, TrelloError>;
}

/// Committing writes. A flow issues exactly one of these per confirmed action.
#[async_trait]
pub trait Mutations: Send + Sync {
    // ── Flow actions ────────────────────────────────────────────────

    async fn create_card(&self, list_id: &str, title: &str, desc: &str)
    -> Result<(), TrelloError>;

    async fn create_list(&self, board_id: &str, name: &str) -> Result<(), TrelloError>;

    async fn rename_card(&self, card_id: &str, new_name: &str) -> Result<(), TrelloError>;

    async fn rename_list(&self, list_id: &str, new_name: &str) -> Result<(), TrelloError>;

    async fn move_card(&self, card_id: &str, target_list_id: &str) -> Result<(), TrelloError>;

    async fn archive_card(&self, card_id: &str) -> Result<(), TrelloError>;

    async fn delete_card(&self, card_id: &str) -> Result<(), TrelloError>;

    // ── Single-shot actions ─────────────────────────────────────────

    async fn add_comment(&self, card_id: &str, text: &str) -> Result<(), TrelloError>;

    async fn update_description(&self, card_id: &str, text: &str) -> Result<(), TrelloError>;

    /// Set or clear (`None`) the due date of a card.
    async fn set_due_date(&self, card_id: &str, due: Option<NaiveDate>)
    -> Result<(), TrelloError>;

    async fn add_label(&self, card_id: &str, label_id: &str) -> Result<(), TrelloError>;

    async fn remove_label(&self, card_id: &str, label_id: &str) -> Result<(), TrelloError>;

    async fn add_member(&self, card_id: &str, member_id: &str) -> Result<(), TrelloError>;

    async fn remove_member(&self, card_id: &str, member_id: &str) -> Result<(), TrelloError>;
}
