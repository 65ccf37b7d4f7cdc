//! Resolution of spoken names against the live catalog.

use tracing::debug;

use crate::catalog::{Catalog, CatalogEntry};
use crate::error::TrelloError;
use crate::matcher;

/// Outcome of resolving a spoken name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// One entry matched.
    Found(CatalogEntry),
    /// Several cards carry exactly the spoken name; the first one is taken.
    Ambiguous { entry: CatalogEntry, count: usize },
    NotFound,
}

impl Resolution {
    /// The chosen entry, if any.
    pub fn entry(&self) -> Option<&CatalogEntry> {
        match self {
            Resolution::Found(entry) | Resolution::Ambiguous { entry, .. } => Some(entry),
            Resolution::NotFound => None,
        }
    }
}

fn fuzzy(spoken: &str, candidates: &[CatalogEntry]) -> Resolution {
    match matcher::best_match_by(spoken, candidates, |e| e.name.as_str()) {
        Some(entry) => Resolution::Found(entry.clone()),
        None => Resolution::NotFound,
    }
}

/// Resolve a board name among all boards of the account.
pub async fn resolve_board(
    catalog: &dyn Catalog,
    spoken: &str,
) -> Result<Resolution, TrelloError> {
    let boards = catalog.list_boards().await?;
    let resolution = fuzzy(spoken, &boards);
    debug!(
        spoken,
        candidates = boards.len(),
        found = resolution.entry().is_some(),
        "Resolved board"
    );
    Ok(resolution)
}

/// Resolve a list name within a board.
pub async fn resolve_list(
    catalog: &dyn Catalog,
    board_id: &str,
    spoken: &str,
) -> Result<Resolution, TrelloError> {
    let lists = catalog.list_lists(board_id).await?;
    let resolution = fuzzy(spoken, &lists);
    debug!(
        board_id,
        spoken,
        candidates = lists.len(),
        found = resolution.entry().is_some(),
        "Resolved list"
    );
    Ok(resolution)
}

/// Resolve a card name within a list.
///
/// Exact (case-insensitive) name equality takes precedence; several exact
/// hits yield [`Resolution::Ambiguous`] with the first one chosen. Without an
/// exact hit the fuzzy matcher decides.
pub async fn resolve_card(
    catalog: &dyn Catalog,
    list_id: &str,
    spoken: &str,
) -> Result<Resolution, TrelloError> {
    let cards = catalog.list_cards(list_id).await?;
    let wanted = spoken.trim().to_lowercase();
    let exact: Vec<&CatalogEntry> = cards
        .iter()
        .filter(|c| !wanted.is_empty() && c.name.trim().to_lowercase() == wanted)
        .collect();

    let resolution = match exact.as_slice() {
        [] => fuzzy(spoken, &cards),
        [only] => Resolution::Found((*only).clone()),
        [first, ..] => Resolution::Ambiguous {
            entry: (*first).clone(),
            count: exact.len(),
        },
    };
    debug!(
        list_id,
        spoken,
        candidates = cards.len(),
        found = resolution.entry().is_some(),
        "Resolved card"
    );
    Ok(resolution)
}

/// Resolve a label name within a board.
pub async fn resolve_label(
    catalog: &dyn Catalog,
    board_id: &str,
    spoken: &str,
) -> Result<Resolution, TrelloError> {
    let labels = catalog.list_labels(board_id).await?;
    Ok(fuzzy(spoken, &labels))
}

/// Resolve a member name within a board.
pub async fn resolve_member(
    catalog: &dyn Catalog,
    board_id: &str,
    spoken: &str,
) -> Result<Resolution, TrelloError> {
    let members = catalog.list_members(board_id).await?;
    Ok(fuzzy(spoken, &members))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StubCatalog {
        boards: Vec<CatalogEntry>,
        lists: Vec<CatalogEntry>,
        cards: Vec<CatalogEntry>,
        fail: bool,
    }

    impl StubCatalog {
        fn new() -> Self {
            Self {
                boards: vec![
                    CatalogEntry::new("Arbeit", "b1"),
                    CatalogEntry::new("Haushalt ", "b2"),
                ],
                lists: vec![
                    CatalogEntry::new("Backlog", "l1"),
                    CatalogEntry::new("Done", "l2"),
                    CatalogEntry::new("To Do", "l3"),
                ],
                cards: vec![
                    CatalogEntry::new("Einkaufen", "c1"),
                    CatalogEntry::new("Putzen", "c2"),
                    CatalogEntry::new("einkaufen", "c3"),
                    CatalogEntry::new("Steuererklärung", "c4"),
                ],
                fail: false,
            }
        }

        fn check(&self) -> Result<(), TrelloError> {
            if self.fail {
                Err(TrelloError::Request {
                    operation: "Laden".into(),
                    reason: "offline".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl Catalog for StubCatalog {
        async fn list_boards(&self) -> Result<Vec<CatalogEntry>, TrelloError> {
            self.check()?;
            Ok(self.boards.clone())
        }
        async fn list_lists(&self, _board_id: &str) -> Result<Vec<CatalogEntry>, TrelloError> {
            self.check()?;
            Ok(self.lists.clone())
        }
        async fn list_cards(&self, _list_id: &str) -> Result<Vec<CatalogEntry>, TrelloError> {
            self.check()?;
            Ok(self.cards.clone())
        }
        async fn list_labels(&self, _board_id: &str) -> Result<Vec<CatalogEntry>, TrelloError> {
            self.check()?;
            Ok(vec![CatalogEntry::new("Dringend", "lab1")])
        }
        async fn list_members(&self, _board_id: &str) -> Result<Vec<CatalogEntry>, TrelloError> {
            self.check()?;
            Ok(vec![CatalogEntry::new("Anna Schmidt", "m1")])
        }
    }

    #[tokio::test]
    async fn board_with_trailing_space_resolves() {
        let catalog = StubCatalog::new();
        let resolution = resolve_board(&catalog, "Haushalt").await.unwrap();
        assert_eq!(resolution, Resolution::Found(CatalogEntry::new("Haushalt ", "b2")));
    }

    #[tokio::test]
    async fn garbled_list_resolves() {
        let catalog = StubCatalog::new();
        let resolution = resolve_list(&catalog, "b2", "bäcklog").await.unwrap();
        assert_eq!(resolution.entry().map(|e| e.id.as_str()), Some("l1"));
    }

    #[tokio::test]
    async fn unknown_board_is_not_found() {
        let catalog = StubCatalog::new();
        let resolution = resolve_board(&catalog, "Urlaubsplanung").await.unwrap();
        assert_eq!(resolution, Resolution::NotFound);
    }

    #[tokio::test]
    async fn duplicate_card_names_are_ambiguous() {
        let catalog = StubCatalog::new();
        let resolution = resolve_card(&catalog, "l1", "EINKAUFEN").await.unwrap();
        assert_eq!(
            resolution,
            Resolution::Ambiguous {
                entry: CatalogEntry::new("Einkaufen", "c1"),
                count: 2,
            }
        );
    }

    #[tokio::test]
    async fn single_exact_card_is_found() {
        let catalog = StubCatalog::new();
        let resolution = resolve_card(&catalog, "l1", "putzen").await.unwrap();
        assert_eq!(resolution, Resolution::Found(CatalogEntry::new("Putzen", "c2")));
    }

    #[tokio::test]
    async fn card_falls_back_to_fuzzy() {
        let catalog = StubCatalog::new();
        let resolution = resolve_card(&catalog, "l1", "steuer erklärung").await.unwrap();
        assert_eq!(resolution.entry().map(|e| e.id.as_str()), Some("c4"));
    }

    #[tokio::test]
    async fn labels_and_members_resolve() {
        let catalog = StubCatalog::new();
        let label = resolve_label(&catalog, "b1", "dringend").await.unwrap();
        assert_eq!(label.entry().map(|e| e.id.as_str()), Some("lab1"));
        let member = resolve_member(&catalog, "b1", "anna").await.unwrap();
        assert_eq!(member.entry().map(|e| e.id.as_str()), Some("m1"));
    }

    #[tokio::test]
    async fn catalog_errors_propagate() {
        let mut catalog = StubCatalog::new();
        catalog.fail = true;
        assert!(resolve_board(&catalog, "Arbeit").await.is_err());
        assert!(resolve_card(&catalog, "l1", "Putzen").await.is_err());
    }
}
