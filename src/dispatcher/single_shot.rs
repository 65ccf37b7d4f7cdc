//! Confirm-once execution for actions without a dedicated flow.
//!
//! The intent is restated as one sentence and confirmed with yes/no. After
//! that every name is resolved silently; anything missing or unknown ends the
//! action with a failure naming what was not found.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::catalog::{
    Catalog, CatalogEntry, Resolution, resolve_board, resolve_card, resolve_label, resolve_list,
    resolve_member,
};
use crate::error::TrelloError;
use crate::flow::{Action, FlowDeps};
use crate::intent::{CardRef, Intent};

/// Expected format of spoken due dates.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Why a single-shot action could not be prepared.
#[derive(Debug, thiserror::Error)]
pub enum ShotError {
    #[error("{0} fehlt")]
    Missing(&'static str),

    #[error("{what} '{name}' nicht gefunden")]
    NotFound { what: &'static str, name: String },

    #[error("{what}-Suche fehlgeschlagen: {source}")]
    Lookup {
        what: &'static str,
        #[source]
        source: TrelloError,
    },

    #[error("Ungültiges Datum '{0}', erwartet JJJJ-MM-TT")]
    InvalidDate(String),

    #[error("Aktion '{0}' ist nur im Dialog möglich")]
    NotSingleShot(&'static str),
}

fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("?")
}

fn card_phrase(card: &CardRef) -> String {
    format!(
        "'{}' in der Liste '{}' im Board '{}'",
        or_unknown(&card.title),
        or_unknown(&card.list),
        or_unknown(&card.board)
    )
}

/// Short name of the action for the context display.
pub fn title(intent: &Intent) -> &'static str {
    match intent {
        Intent::AddComment { .. } => "Kommentar hinzufügen",
        Intent::UpdateDesc { .. } => "Beschreibung ändern",
        Intent::AddDueDate { .. } => "Fälligkeitsdatum setzen",
        Intent::RemoveDueDate { .. } => "Fälligkeitsdatum entfernen",
        Intent::AddLabel { .. } => "Label hinzufügen",
        Intent::RemoveLabel { .. } => "Label entfernen",
        Intent::AssignMember { .. } => "Mitglied zuweisen",
        Intent::RemoveMember { .. } => "Mitglied entfernen",
        _ => "Aktion",
    }
}

/// Restate the intent as a yes/no question. Missing values read as "?".
pub fn confirmation_text(intent: &Intent) -> String {
    match intent {
        Intent::AddComment { card, comment } => format!(
            "Soll ich der Karte {} den Kommentar '{}' hinzufügen?",
            card_phrase(card),
            or_unknown(comment)
        ),
        Intent::UpdateDesc { card, desc } => format!(
            "Soll ich die Beschreibung der Karte {} auf '{}' setzen?",
            card_phrase(card),
            or_unknown(desc)
        ),
        Intent::AddDueDate { card, due } => format!(
            "Soll ich das Fälligkeitsdatum der Karte {} auf {} setzen?",
            card_phrase(card),
            or_unknown(due)
        ),
        Intent::RemoveDueDate { card } => format!(
            "Soll ich das Fälligkeitsdatum der Karte {} entfernen?",
            card_phrase(card)
        ),
        Intent::AddLabel { card, label } => format!(
            "Soll ich der Karte {} das Label '{}' hinzufügen?",
            card_phrase(card),
            or_unknown(label)
        ),
        Intent::RemoveLabel { card, label } => format!(
            "Soll ich das Label '{}' von der Karte {} entfernen?",
            or_unknown(label),
            card_phrase(card)
        ),
        Intent::AssignMember { card, member } => format!(
            "Soll ich '{}' der Karte {} zuweisen?",
            or_unknown(member),
            card_phrase(card)
        ),
        Intent::RemoveMember { card, member } => format!(
            "Soll ich '{}' von der Karte {} entfernen?",
            or_unknown(member),
            card_phrase(card)
        ),
        other => format!("Soll ich die Aktion '{}' ausführen?", other.action()),
    }
}

fn failure_prefix(intent: &Intent) -> &'static str {
    match intent {
        Intent::AddComment { .. } => "Fehler beim Hinzufügen des Kommentars",
        Intent::UpdateDesc { .. } => "Fehler beim Aktualisieren der Beschreibung",
        Intent::AddDueDate { .. } => "Fehler beim Setzen des Fälligkeitsdatums",
        Intent::RemoveDueDate { .. } => "Fehler beim Entfernen des Fälligkeitsdatums",
        Intent::AddLabel { .. } => "Fehler beim Hinzufügen des Labels",
        Intent::RemoveLabel { .. } => "Fehler beim Entfernen des Labels",
        Intent::AssignMember { .. } => "Fehler beim Zuweisen des Mitglieds",
        Intent::RemoveMember { .. } => "Fehler beim Entfernen des Mitglieds",
        _ => "Fehler beim Ausführen der Aktion",
    }
}

/// A prepared action plus the matched names for the success message.
struct Prepared {
    action: Action,
    card: String,
    item: String,
}

fn success_text(intent: &Intent, prepared: &Prepared) -> String {
    let Prepared { card, item, .. } = prepared;
    match intent {
        Intent::AddComment { .. } => format!("Kommentar zur Karte '{card}' hinzugefügt."),
        Intent::UpdateDesc { .. } => format!("Beschreibung der Karte '{card}' aktualisiert."),
        Intent::AddDueDate { .. } => {
            format!("Fälligkeitsdatum der Karte '{card}' auf {item} gesetzt.")
        }
        Intent::RemoveDueDate { .. } => format!("Fälligkeitsdatum der Karte '{card}' entfernt."),
        Intent::AddLabel { .. } => format!("Label '{item}' zur Karte '{card}' hinzugefügt."),
        Intent::RemoveLabel { .. } => format!("Label '{item}' von der Karte '{card}' entfernt."),
        Intent::AssignMember { .. } => format!("'{item}' der Karte '{card}' zugewiesen."),
        Intent::RemoveMember { .. } => format!("'{item}' von der Karte '{card}' entfernt."),
        _ => "Aktion ausgeführt.".to_string(),
    }
}

fn required<'a>(value: &'a Option<String>, what: &'static str) -> Result<&'a str, ShotError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ShotError::Missing(what))
}

fn found(
    result: Result<Resolution, TrelloError>,
    what: &'static str,
    name: &str,
) -> Result<CatalogEntry, ShotError> {
    match result {
        Ok(Resolution::Found(entry)) => Ok(entry),
        Ok(Resolution::Ambiguous { entry, count }) => {
            debug!(what, name, count, "Several exact matches, taking the first");
            Ok(entry)
        }
        Ok(Resolution::NotFound) => Err(ShotError::NotFound {
            what,
            name: name.to_string(),
        }),
        Err(source) => Err(ShotError::Lookup { what, source }),
    }
}

/// Resolve board and card of a card address.
async fn locate(
    card: &CardRef,
    catalog: &dyn Catalog,
) -> Result<(CatalogEntry, CatalogEntry), ShotError> {
    let board_name = required(&card.board, "Board")?;
    let list_name = required(&card.list, "Liste")?;
    let title = required(&card.title, "Karte")?;

    let board = found(resolve_board(catalog, board_name).await, "Board", board_name)?;
    let list = found(
        resolve_list(catalog, &board.id, list_name).await,
        "Liste",
        list_name,
    )?;
    let card = found(resolve_card(catalog, &list.id, title).await, "Karte", title)?;
    Ok((board, card))
}

fn parse_due(raw: &str) -> Result<NaiveDate, ShotError> {
    NaiveDate::parse_from_str(raw, DUE_DATE_FORMAT)
        .map_err(|_| ShotError::InvalidDate(raw.to_string()))
}

async fn prepare(intent: &Intent, catalog: &dyn Catalog) -> Result<Prepared, ShotError> {
    let prepared = match intent {
        Intent::AddComment { card, comment } => {
            let text = required(comment, "Kommentar")?.to_string();
            let (_, card) = locate(card, catalog).await?;
            Prepared {
                action: Action::AddComment {
                    card_id: card.id,
                    text,
                },
                card: card.name,
                item: String::new(),
            }
        }
        Intent::UpdateDesc { card, desc } => {
            let text = required(desc, "Beschreibung")?.to_string();
            let (_, card) = locate(card, catalog).await?;
            Prepared {
                action: Action::UpdateDescription {
                    card_id: card.id,
                    text,
                },
                card: card.name,
                item: String::new(),
            }
        }
        Intent::AddDueDate { card, due } => {
            let date = parse_due(required(due, "Fälligkeitsdatum")?)?;
            let (_, card) = locate(card, catalog).await?;
            Prepared {
                action: Action::SetDueDate {
                    card_id: card.id,
                    due: Some(date),
                },
                card: card.name,
                item: date.format(DUE_DATE_FORMAT).to_string(),
            }
        }
        Intent::RemoveDueDate { card } => {
            let (_, card) = locate(card, catalog).await?;
            Prepared {
                action: Action::SetDueDate {
                    card_id: card.id,
                    due: None,
                },
                card: card.name,
                item: String::new(),
            }
        }
        Intent::AddLabel { card, label } | Intent::RemoveLabel { card, label } => {
            let label_name = required(label, "Label")?;
            let (board, card) = locate(card, catalog).await?;
            let label = found(
                resolve_label(catalog, &board.id, label_name).await,
                "Label",
                label_name,
            )?;
            let action = if matches!(intent, Intent::AddLabel { .. }) {
                Action::AddLabel {
                    card_id: card.id,
                    label_id: label.id,
                }
            } else {
                Action::RemoveLabel {
                    card_id: card.id,
                    label_id: label.id,
                }
            };
            Prepared {
                action,
                card: card.name,
                item: label.name,
            }
        }
        Intent::AssignMember { card, member } | Intent::RemoveMember { card, member } => {
            let member_name = required(member, "Mitglied")?;
            let (board, card) = locate(card, catalog).await?;
            let member = found(
                resolve_member(catalog, &board.id, member_name).await,
                "Mitglied",
                member_name,
            )?;
            let action = if matches!(intent, Intent::AssignMember { .. }) {
                Action::AddMember {
                    card_id: card.id,
                    member_id: member.id,
                }
            } else {
                Action::RemoveMember {
                    card_id: card.id,
                    member_id: member.id,
                }
            };
            Prepared {
                action,
                card: card.name,
                item: member.name,
            }
        }
        other => return Err(ShotError::NotSingleShot(other.action())),
    };
    Ok(prepared)
}

/// Resolve and execute a confirmed single-shot intent.
///
/// Returns the outcome message and whether the mutation succeeded.
pub async fn execute(intent: &Intent, deps: &FlowDeps) -> (String, bool) {
    let prefix = failure_prefix(intent);
    let prepared = match prepare(intent, deps.catalog.as_ref()).await {
        Ok(prepared) => prepared,
        Err(e) => {
            warn!(action = intent.action(), error = %e, "Single-shot action not prepared");
            return (format!("{prefix}: {e}"), false);
        }
    };

    match prepared.action.execute(deps.mutations.as_ref()).await {
        Ok(()) => {
            info!(action = intent.action(), card = %prepared.card, "Single-shot action executed");
            (success_text(intent, &prepared), true)
        }
        Err(e) => {
            warn!(action = intent.action(), error = %e, "Single-shot action failed");
            (format!("{prefix}: {e}"), false)
        }
    }
}
