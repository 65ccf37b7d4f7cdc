//! Per-action flow definitions: slot order, questions and messages.
//!
//! Every flow shares the transition skeleton in [`crate::flow::engine`]; a
//! [`FlowKind`] only contributes which slots it collects, in which order, and
//! the German sentences it speaks along the way.

use std::collections::BTreeMap;

use crate::error::FlowError;
use crate::flow::action::Action;
use crate::flow::session::{FlowSession, Slot, Stage};
use crate::intent::{CardRef, Intent};

/// The actions that run a multi-turn dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    AddCard,
    AddList,
    RenameCard,
    RenameList,
    MoveCard,
    DeleteCard,
    ArchiveCard,
}

/// How a flow starts: its kind plus the slot values the classifier found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSeed {
    pub kind: FlowKind,
    pub hints: BTreeMap<Slot, String>,
    pub description: Option<String>,
}

impl FlowSeed {
    pub fn new(kind: FlowKind) -> Self {
        Self {
            kind,
            hints: BTreeMap::new(),
            description: None,
        }
    }

    fn hint(mut self, slot: Slot, value: &Option<String>) -> Self {
        if let Some(value) = value.as_ref().filter(|v| !v.trim().is_empty()) {
            self.hints.insert(slot, value.clone());
        }
        self
    }

    fn card(self, card: &CardRef) -> Self {
        self.hint(Slot::Board, &card.board)
            .hint(Slot::List, &card.list)
            .hint(Slot::Card, &card.title)
    }

    /// Seed for intents that have a dedicated flow; `None` otherwise.
    pub fn from_intent(intent: &Intent) -> Option<Self> {
        let seed = match intent {
            Intent::AddCard {
                board,
                list,
                title,
                desc,
            } => {
                let mut seed = FlowSeed::new(FlowKind::AddCard)
                    .hint(Slot::Board, board)
                    .hint(Slot::List, list)
                    .hint(Slot::Title, title);
                seed.description = desc.clone();
                seed
            }
            Intent::AddList { board, name } => FlowSeed::new(FlowKind::AddList)
                .hint(Slot::Board, board)
                .hint(Slot::NewName, name),
            Intent::RenameCard { card, new_title } => FlowSeed::new(FlowKind::RenameCard)
                .card(card)
                .hint(Slot::Title, new_title),
            Intent::RenameList {
                board,
                list,
                new_name,
            } => FlowSeed::new(FlowKind::RenameList)
                .hint(Slot::Board, board)
                .hint(Slot::List, list)
                .hint(Slot::NewName, new_name),
            Intent::MoveCard {
                card,
                target_board,
                target_list,
            } => FlowSeed::new(FlowKind::MoveCard)
                .card(card)
                .hint(Slot::TargetBoard, target_board)
                .hint(Slot::TargetList, target_list),
            Intent::DeleteCard { card } => FlowSeed::new(FlowKind::DeleteCard).card(card),
            Intent::ArchiveCard { card } => FlowSeed::new(FlowKind::ArchiveCard).card(card),
            _ => return None,
        };
        Some(seed)
    }
}

// ── Nouns ───────────────────────────────────────────────────────────

/// Grammatical forms of a catalog noun.
struct Noun {
    /// "Quell-" or "Ziel-" in the move flow.
    prefix: &'static str,
    /// "das" / "die".
    article: &'static str,
    singular: &'static str,
    plural: &'static str,
    /// "ein" / "eine".
    indefinite: &'static str,
    /// "Welches" / "Welche".
    which: &'static str,
    /// Compound for lookup errors ("Boardsuche").
    search: &'static str,
}

impl Noun {
    fn name(&self) -> String {
        format!("{}{}", self.prefix, self.singular)
    }

    fn with_article(&self) -> String {
        format!("{} {}", self.article, self.name())
    }

    fn capitalized_article(&self) -> &'static str {
        match self.article {
            "das" => "Das",
            _ => "Die",
        }
    }
}

const BOARD: Noun = Noun {
    prefix: "",
    article: "das",
    singular: "Board",
    plural: "Boards",
    indefinite: "ein",
    which: "Welches",
    search: "Boardsuche",
};

const LIST: Noun = Noun {
    prefix: "",
    article: "die",
    singular: "Liste",
    plural: "Listen",
    indefinite: "eine",
    which: "Welche",
    search: "Listensuche",
};

const CARD: Noun = Noun {
    prefix: "",
    article: "die",
    singular: "Karte",
    plural: "Karten",
    indefinite: "eine",
    which: "Welche",
    search: "Kartensuche",
};

impl FlowKind {
    /// Wire name of the originating action.
    pub fn action(self) -> &'static str {
        match self {
            FlowKind::AddCard => "add_card",
            FlowKind::AddList => "add_list",
            FlowKind::RenameCard => "rename_card",
            FlowKind::RenameList => "rename_list",
            FlowKind::MoveCard => "move_card",
            FlowKind::DeleteCard => "delete_card",
            FlowKind::ArchiveCard => "archive_card",
        }
    }

    /// Slots in the order they are collected.
    pub fn slots(self) -> &'static [Slot] {
        match self {
            FlowKind::AddCard => &[Slot::Board, Slot::List, Slot::Title],
            FlowKind::AddList => &[Slot::Board, Slot::NewName],
            FlowKind::RenameCard => &[Slot::Board, Slot::List, Slot::Card, Slot::Title],
            FlowKind::RenameList => &[Slot::Board, Slot::List, Slot::NewName],
            FlowKind::MoveCard => &[
                Slot::Board,
                Slot::List,
                Slot::Card,
                Slot::TargetBoard,
                Slot::TargetList,
            ],
            FlowKind::DeleteCard | FlowKind::ArchiveCard => &[Slot::Board, Slot::List, Slot::Card],
        }
    }

    /// First slot that is still empty.
    pub fn next_slot(self, session: &FlowSession) -> Option<Slot> {
        self.slots()
            .iter()
            .copied()
            .find(|slot| !session.is_filled(*slot))
    }

    fn noun(self, slot: Slot) -> Noun {
        let base = match slot {
            Slot::Board | Slot::TargetBoard => BOARD,
            Slot::List | Slot::TargetList => LIST,
            _ => CARD,
        };
        let prefix = match (self, slot) {
            (_, Slot::TargetBoard | Slot::TargetList) => "Ziel-",
            (FlowKind::MoveCard, Slot::Board | Slot::List) => "Quell-",
            _ => "",
        };
        Noun { prefix, ..base }
    }

    // ── Questions ───────────────────────────────────────────────────

    /// Question asking for a slot, with the capture hint.
    pub fn question(self, slot: Slot, session: &FlowSession) -> (String, String) {
        let board = session.name_of(Slot::Board);
        let list = session.name_of(Slot::List);
        let card = session.name_of(Slot::Card);
        let verb = self.card_verb();

        let question = match (self, slot) {
            (FlowKind::AddCard, Slot::Board) => {
                "In welchem Board soll die Karte erstellt werden?".to_string()
            }
            (FlowKind::AddList, Slot::Board) => {
                "In welchem Board soll die neue Liste erstellt werden?".to_string()
            }
            (FlowKind::RenameList, Slot::Board) => {
                "Auf welchem Board befindet sich die Liste, die du umbenennen möchtest?".to_string()
            }
            (FlowKind::MoveCard, Slot::Board) => {
                "Von welchem Board möchtest du eine Karte verschieben?".to_string()
            }
            (_, Slot::Board) => {
                format!("In welchem Board befindet sich die Karte, die du {verb} möchtest?")
            }
            (FlowKind::AddCard, Slot::List) => {
                format!("Okay, im Board '{board}'. In welcher Liste soll die Karte erstellt werden?")
            }
            (FlowKind::RenameList, Slot::List) => {
                format!("Welche Liste auf dem Board '{board}' möchtest du umbenennen?")
            }
            (FlowKind::MoveCard, Slot::List) => {
                format!("Aus welcher Liste im Board '{board}' soll die Karte verschoben werden?")
            }
            (_, Slot::List) => format!("In welcher Liste auf dem Board '{board}' ist die Karte?"),
            (FlowKind::RenameCard, Slot::Card) => {
                "Wie lautet der aktuelle Name der Karte, die du umbenennen möchtest?".to_string()
            }
            (_, Slot::Card) => format!("Wie heißt die Karte, die du {verb} möchtest?"),
            (_, Slot::TargetBoard) => format!(
                "Auf welches Board soll die Karte '{card}' verschoben werden? Du kannst auch 'dasselbe' sagen."
            ),
            (_, Slot::TargetList) => format!(
                "In welche Liste im Board '{}' soll die Karte verschoben werden?",
                session.name_of(Slot::TargetBoard)
            ),
            (FlowKind::RenameCard, Slot::Title) => {
                format!("Wie soll die Karte '{card}' neu heißen?")
            }
            (_, Slot::Title) => format!("Okay, in Liste '{list}'. Wie soll die Karte heißen?"),
            (FlowKind::RenameList, Slot::NewName) => {
                format!("Wie soll die Liste '{list}' neu heißen?")
            }
            (_, Slot::NewName) => {
                format!("Okay, im Board '{board}'. Wie soll die neue Liste heißen?")
            }
        };
        (question, self.hint(slot))
    }

    /// Capture hint shown while waiting for a slot.
    pub fn hint(self, slot: Slot) -> String {
        match (self, slot) {
            (FlowKind::RenameCard, Slot::Card) => "Bitte nenne den aktuellen Kartennamen".into(),
            (_, Slot::Card) => "Bitte nenne den Kartennamen".into(),
            (FlowKind::RenameCard, Slot::Title) => "Bitte nenne den neuen Kartennamen".into(),
            (_, Slot::Title) => "Bitte nenne den Titel der Karte".into(),
            (FlowKind::RenameList, Slot::NewName) => "Bitte nenne den neuen Listennamen".into(),
            (_, Slot::NewName) => "Bitte nenne den Namen der neuen Liste".into(),
            _ => format!("Bitte nenne {}", self.noun(slot).with_article()),
        }
    }

    fn card_verb(self) -> &'static str {
        match self {
            FlowKind::RenameCard => "umbenennen",
            FlowKind::MoveCard => "verschieben",
            FlowKind::DeleteCard => "löschen",
            FlowKind::ArchiveCard => "archivieren",
            FlowKind::AddCard | FlowKind::AddList | FlowKind::RenameList => "bearbeiten",
        }
    }

    // ── Not-found recovery ──────────────────────────────────────────

    /// "X was not found, should I list candidates?"
    pub fn not_found_text(self, slot: Slot, spoken: &str, session: &FlowSession) -> String {
        let noun = self.noun(slot);
        let found = match slot {
            Slot::Card => format!(
                "Ich konnte keine Karte mit dem Namen '{spoken}' in der Liste '{}' finden.",
                session.name_of(Slot::List)
            ),
            Slot::List | Slot::TargetList => format!(
                "{} {} '{spoken}' im Board '{}' wurde nicht gefunden.",
                noun.capitalized_article(),
                noun.name(),
                session.name_of(parent_or(slot)),
            ),
            _ => format!(
                "{} {} '{spoken}' wurde nicht gefunden.",
                noun.capitalized_article(),
                noun.name()
            ),
        };
        format!("{found} Soll ich dir mögliche {} nennen?", noun.plural)
    }

    /// Candidate listing after the user asked for suggestions.
    pub fn suggestions_text(self, slot: Slot, names: &[String], session: &FlowSession) -> String {
        let noun = self.noun(slot);
        let scope = match slot {
            Slot::List | Slot::TargetList => {
                format!(" im Board '{}'", session.name_of(parent_or(slot)))
            }
            Slot::Card => format!(" in der Liste '{}'", session.name_of(Slot::List)),
            _ => String::new(),
        };
        if names.is_empty() {
            format!(
                "Ich konnte keine {}{scope} finden. Bitte nenne {} {}.",
                noun.plural, noun.indefinite, noun.singular
            )
        } else {
            format!(
                "Mögliche {}{scope} sind: {}. {} {} meinst du?",
                noun.plural,
                names.join(", "),
                noun.which,
                noun.singular
            )
        }
    }

    /// Candidates could not be loaded.
    pub fn suggestions_error_text(self, slot: Slot) -> String {
        let noun = self.noun(slot);
        format!(
            "Fehler beim Laden der {}. Bitte nenne {}.",
            noun.plural,
            noun.with_article()
        )
    }

    /// The user declined the candidate listing; ask again.
    pub fn retry_text(self, slot: Slot) -> (String, String) {
        let noun = self.noun(slot);
        (
            format!("Okay. Bitte wiederhole den Namen für {}.", noun.with_article()),
            format!("Bitte nenne den Namen für {}.", noun.with_article()),
        )
    }

    /// Lookup failed with a catalog error.
    pub fn lookup_error_text(self, slot: Slot, error: &str) -> String {
        let noun = self.noun(slot);
        format!(
            "Fehler bei der {}{}: {error}. Bitte erneut versuchen.",
            noun.prefix, noun.search
        )
    }

    /// Several cards share the spoken name; the first is taken.
    pub fn ambiguous_text(self, spoken: &str, chosen: &str, count: usize) -> String {
        format!(
            "Ich habe {count} Karten namens '{spoken}' gefunden und wähle die erste: '{chosen}'."
        )
    }

    // ── Context ─────────────────────────────────────────────────────

    /// Action title for the context display.
    pub fn title(self) -> &'static str {
        match self {
            FlowKind::AddCard => "Karte erstellen",
            FlowKind::AddList => "Liste erstellen",
            FlowKind::RenameCard => "Karte umbenennen",
            FlowKind::RenameList => "Liste umbenennen",
            FlowKind::MoveCard => "Karte verschieben",
            FlowKind::DeleteCard => "Karte löschen",
            FlowKind::ArchiveCard => "Karte archivieren",
        }
    }

    fn slot_label(self, slot: Slot) -> &'static str {
        match (self, slot) {
            (FlowKind::MoveCard, Slot::Board) => "Von Board",
            (FlowKind::MoveCard, Slot::List) => "Von Liste",
            (FlowKind::AddCard, Slot::List) => "Zielliste",
            (FlowKind::RenameCard, Slot::Card) => "Alte Karte",
            (FlowKind::AddCard, Slot::Title) => "Kartentitel",
            (FlowKind::AddList, Slot::NewName) => "Neuer Listenname",
            (_, Slot::Board) => "Board",
            (_, Slot::List) => "Liste",
            (_, Slot::Card) => "Karte",
            (_, Slot::TargetBoard) => "Nach Board",
            (_, Slot::TargetList) => "Nach Liste",
            (_, Slot::Title | Slot::NewName) => "Neuer Name",
        }
    }

    fn next_step(self, stage: Stage) -> String {
        match stage {
            Stage::Idle => String::new(),
            Stage::Awaiting(slot @ (Slot::Title | Slot::NewName)) => {
                format!("{}?", self.slot_label(slot))
            }
            Stage::Awaiting(Slot::TargetBoard) => "Ziel-Board? (oder 'dasselbe')".into(),
            Stage::Awaiting(slot) => format!("{}?", self.noun(slot).name()),
            Stage::ConfirmNotFound(slot) => format!(
                "{} nicht gefunden, Vorschläge? (Ja/Nein)",
                self.noun(slot).name()
            ),
            Stage::ConfirmAction => format!("{} bestätigen? (Ja/Nein)", self.title()),
        }
    }

    /// Multi-line status: action, one line per filled slot, next step.
    pub fn context_text(self, session: &FlowSession) -> String {
        if !session.is_active() {
            return String::new();
        }
        let mut text = format!("Aktion: {}", self.title());
        for slot in self.slots() {
            let value = match session.resolved(*slot) {
                Some(entry) => Some(entry.name.as_str()),
                None => session.value(*slot),
            };
            if let Some(value) = value {
                text.push_str(&format!("\n{}: {value}", self.slot_label(*slot)));
            }
        }
        if let Some(desc) = session.description.as_deref() {
            text.push_str(&format!("\nBeschreibung: {desc}"));
        }
        let next = self.next_step(session.stage);
        if !next.is_empty() {
            text.push_str(&format!("\nNächster Schritt: {next}"));
        }
        text
    }

    // ── Confirmation and outcome ────────────────────────────────────

    /// Full restatement of the action, asked as a yes/no question.
    pub fn confirmation_text(self, session: &FlowSession) -> Result<String, FlowError> {
        let board = resolved_name(session, Slot::Board)?;
        let text = match self {
            FlowKind::AddCard => {
                let desc = session
                    .description
                    .as_deref()
                    .map(|d| format!(" und der Beschreibung '{d}'"))
                    .unwrap_or_default();
                format!(
                    "Ich werde eine neue Karte mit dem Titel '{}'{desc} in der Liste '{}' im Board '{board}' erstellen. Möchtest du das tun?",
                    value(session, Slot::Title)?,
                    resolved_name(session, Slot::List)?,
                )
            }
            FlowKind::AddList => format!(
                "Ich werde eine neue Liste mit dem Namen '{}' im Board '{board}' erstellen. Ist das richtig?",
                value(session, Slot::NewName)?
            ),
            FlowKind::RenameCard => format!(
                "Soll die Karte '{}' in '{}' umbenannt werden (Liste: '{}', Board: '{board}')?",
                resolved_name(session, Slot::Card)?,
                value(session, Slot::Title)?,
                resolved_name(session, Slot::List)?,
            ),
            FlowKind::RenameList => format!(
                "Soll die Liste '{}' wirklich in '{}' umbenannt werden (Board: '{board}')?",
                resolved_name(session, Slot::List)?,
                value(session, Slot::NewName)?,
            ),
            FlowKind::MoveCard => format!(
                "Soll die Karte '{}' von Liste '{}' (Board '{board}') nach Liste '{}' (Board '{}') verschoben werden?",
                resolved_name(session, Slot::Card)?,
                resolved_name(session, Slot::List)?,
                resolved_name(session, Slot::TargetList)?,
                resolved_name(session, Slot::TargetBoard)?,
            ),
            FlowKind::DeleteCard => format!(
                "Soll die Karte '{}' wirklich endgültig gelöscht werden (Liste: '{}', Board: '{board}')? Diese Aktion kann nicht rückgängig gemacht werden.",
                resolved_name(session, Slot::Card)?,
                resolved_name(session, Slot::List)?,
            ),
            FlowKind::ArchiveCard => format!(
                "Soll die Karte '{}' archiviert werden (Liste: '{}', Board: '{board}')?",
                resolved_name(session, Slot::Card)?,
                resolved_name(session, Slot::List)?,
            ),
        };
        Ok(text)
    }

    /// The single mutation this flow commits.
    pub fn build_action(self, session: &FlowSession) -> Result<Action, FlowError> {
        let action = match self {
            FlowKind::AddCard => Action::CreateCard {
                list_id: resolved_id(session, Slot::List)?,
                title: value(session, Slot::Title)?.to_string(),
                desc: session.description.clone().unwrap_or_default(),
            },
            FlowKind::AddList => Action::CreateList {
                board_id: resolved_id(session, Slot::Board)?,
                name: value(session, Slot::NewName)?.to_string(),
            },
            FlowKind::RenameCard => Action::RenameCard {
                card_id: resolved_id(session, Slot::Card)?,
                new_name: value(session, Slot::Title)?.to_string(),
            },
            FlowKind::RenameList => Action::RenameList {
                list_id: resolved_id(session, Slot::List)?,
                new_name: value(session, Slot::NewName)?.to_string(),
            },
            FlowKind::MoveCard => Action::MoveCard {
                card_id: resolved_id(session, Slot::Card)?,
                target_list_id: resolved_id(session, Slot::TargetList)?,
            },
            FlowKind::DeleteCard => Action::DeleteCard {
                card_id: resolved_id(session, Slot::Card)?,
            },
            FlowKind::ArchiveCard => Action::ArchiveCard {
                card_id: resolved_id(session, Slot::Card)?,
            },
        };
        Ok(action)
    }

    /// Outcome message after a successful mutation.
    pub fn success_text(self, session: &FlowSession) -> String {
        let board = session.name_of(Slot::Board);
        let list = session.name_of(Slot::List);
        let card = session.name_of(Slot::Card);
        match self {
            FlowKind::AddCard => format!(
                "Karte '{}' in Liste '{list}' im Board '{board}' erstellt.",
                session.value(Slot::Title).unwrap_or_default()
            ),
            FlowKind::AddList => format!(
                "Liste '{}' wurde im Board '{board}' erstellt.",
                session.value(Slot::NewName).unwrap_or_default()
            ),
            FlowKind::RenameCard => format!(
                "Karte '{card}' wurde erfolgreich in '{}' umbenannt.",
                session.value(Slot::Title).unwrap_or_default()
            ),
            FlowKind::RenameList => format!(
                "Liste '{list}' wurde erfolgreich in '{}' umbenannt.",
                session.value(Slot::NewName).unwrap_or_default()
            ),
            FlowKind::MoveCard => format!(
                "Karte '{card}' wurde erfolgreich nach Liste '{}' (Board '{}') verschoben.",
                session.name_of(Slot::TargetList),
                session.name_of(Slot::TargetBoard)
            ),
            FlowKind::DeleteCard => format!("Karte '{card}' wurde erfolgreich gelöscht."),
            FlowKind::ArchiveCard => format!("Karte '{card}' wurde erfolgreich archiviert."),
        }
    }

    /// Prefix of the outcome message when the mutation fails.
    pub fn failure_prefix(self) -> &'static str {
        match self {
            FlowKind::AddCard => "Fehler beim Erstellen der Karte",
            FlowKind::AddList => "Fehler beim Erstellen der Liste",
            FlowKind::RenameCard => "Fehler beim Umbenennen der Karte",
            FlowKind::RenameList => "Fehler beim Umbenennen der Liste",
            FlowKind::MoveCard => "Fehler beim Verschieben der Karte",
            FlowKind::DeleteCard => "Fehler beim Löschen der Karte",
            FlowKind::ArchiveCard => "Fehler beim Archivieren der Karte",
        }
    }

    /// Spoken reply and outcome message when the final confirmation is declined.
    pub fn declined_texts(self) -> (&'static str, &'static str) {
        match self {
            FlowKind::AddCard => ("Okay, Karte nicht erstellt.", "Karten-Erstellung abgebrochen."),
            FlowKind::AddList => ("Okay, Liste nicht erstellt.", "Listenerstellung abgebrochen."),
            FlowKind::RenameCard => {
                ("Okay, Karte nicht umbenannt.", "Kartenumbenennung abgebrochen.")
            }
            FlowKind::RenameList => {
                ("Okay, Liste nicht umbenannt.", "Listenumbenennung abgebrochen.")
            }
            FlowKind::MoveCard => ("Okay, Karte nicht verschoben.", "Verschiebung abgebrochen."),
            FlowKind::DeleteCard => ("Okay, Karte nicht gelöscht.", "Löschen abgebrochen."),
            FlowKind::ArchiveCard => ("Okay, Karte nicht archiviert.", "Archivieren abgebrochen."),
        }
    }
}

fn parent_or(slot: Slot) -> Slot {
    slot.parent().unwrap_or(slot)
}

fn resolved_name(session: &FlowSession, slot: Slot) -> Result<&str, FlowError> {
    session
        .resolved(slot)
        .map(|e| e.name.as_str())
        .ok_or(FlowError::MissingReference(slot.label()))
}

fn resolved_id(session: &FlowSession, slot: Slot) -> Result<String, FlowError> {
    session
        .resolved(slot)
        .map(|e| e.id.clone())
        .ok_or(FlowError::MissingReference(slot.label()))
}

fn value(session: &FlowSession, slot: Slot) -> Result<&str, FlowError> {
    session
        .value(slot)
        .ok_or(FlowError::MissingValue(slot.label()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;

    fn add_card_session() -> FlowSession {
        let mut session = FlowSession::default();
        session.begin(BTreeMap::new(), None);
        session.stage = Stage::ConfirmAction;
        session.resolve(Slot::Board, CatalogEntry::new("Haushalt ", "b2"));
        session.resolve(Slot::List, CatalogEntry::new("Backlog", "l1"));
        session.set_value(Slot::Title, "Einkaufen".into());
        session
    }

    #[test]
    fn seeds_from_intent() {
        let intent = Intent::MoveCard {
            card: CardRef {
                board: Some("Arbeit".into()),
                list: None,
                title: Some("Bericht".into()),
            },
            target_board: None,
            target_list: Some("Done".into()),
        };
        let seed = FlowSeed::from_intent(&intent).unwrap();
        assert_eq!(seed.kind, FlowKind::MoveCard);
        assert_eq!(seed.hints.len(), 3);
        assert_eq!(seed.hints.get(&Slot::Card).map(String::as_str), Some("Bericht"));
        assert!(!seed.hints.contains_key(&Slot::List));
    }

    #[test]
    fn flowless_intents_have_no_seed() {
        let intent = Intent::AddComment {
            card: CardRef::default(),
            comment: Some("Hallo".into()),
        };
        assert!(FlowSeed::from_intent(&intent).is_none());
        assert!(FlowSeed::from_intent(&Intent::Unrecognized).is_none());
    }

    #[test]
    fn add_card_seed_carries_description() {
        let intent = Intent::AddCard {
            board: Some("Haushalt".into()),
            list: Some("Backlog".into()),
            title: Some("Einkaufen".into()),
            desc: Some("Milch und Brot".into()),
        };
        let seed = FlowSeed::from_intent(&intent).unwrap();
        assert_eq!(seed.description.as_deref(), Some("Milch und Brot"));
        assert_eq!(seed.hints.len(), 3);
    }

    #[test]
    fn next_slot_follows_dependency_order() {
        let mut session = FlowSession::default();
        session.begin(BTreeMap::new(), None);
        assert_eq!(FlowKind::RenameCard.next_slot(&session), Some(Slot::Board));
        session.resolve(Slot::Board, CatalogEntry::new("Arbeit", "b1"));
        session.resolve(Slot::List, CatalogEntry::new("To Do", "l3"));
        assert_eq!(FlowKind::RenameCard.next_slot(&session), Some(Slot::Card));
        session.resolve(Slot::Card, CatalogEntry::new("Bericht", "c9"));
        assert_eq!(FlowKind::RenameCard.next_slot(&session), Some(Slot::Title));
        session.set_value(Slot::Title, "Abschlussbericht".into());
        assert_eq!(FlowKind::RenameCard.next_slot(&session), None);
    }

    #[test]
    fn confirmation_restates_every_name() {
        let session = add_card_session();
        let text = FlowKind::AddCard.confirmation_text(&session).unwrap();
        assert!(text.contains("'Einkaufen'"));
        assert!(text.contains("'Backlog'"));
        assert!(text.contains("'Haushalt '"));
    }

    #[test]
    fn build_action_uses_resolved_ids() {
        let session = add_card_session();
        assert_eq!(
            FlowKind::AddCard.build_action(&session).unwrap(),
            Action::CreateCard {
                list_id: "l1".into(),
                title: "Einkaufen".into(),
                desc: String::new(),
            }
        );
    }

    #[test]
    fn missing_reference_is_an_internal_error() {
        let mut session = FlowSession::default();
        session.begin(BTreeMap::new(), None);
        session.resolve(Slot::Board, CatalogEntry::new("Arbeit", "b1"));
        let err = FlowKind::DeleteCard.build_action(&session).unwrap_err();
        assert_eq!(err.to_string(), "Karten ID fehlt");
    }

    #[test]
    fn move_flow_uses_source_and_target_nouns() {
        let mut session = FlowSession::default();
        session.begin(BTreeMap::new(), None);
        assert_eq!(
            FlowKind::MoveCard.not_found_text(Slot::Board, "Garten", &session),
            "Das Quell-Board 'Garten' wurde nicht gefunden. Soll ich dir mögliche Boards nennen?"
        );
        assert_eq!(FlowKind::MoveCard.hint(Slot::TargetList), "Bitte nenne die Ziel-Liste");
        assert_eq!(
            FlowKind::MoveCard.lookup_error_text(Slot::List, "offline"),
            "Fehler bei der Quell-Listensuche: offline. Bitte erneut versuchen."
        );
    }

    #[test]
    fn suggestions_name_the_scope() {
        let mut session = FlowSession::default();
        session.begin(BTreeMap::new(), None);
        session.resolve(Slot::Board, CatalogEntry::new("Haushalt", "b2"));
        let names = vec!["Backlog".to_string(), "Done".to_string()];
        assert_eq!(
            FlowKind::AddCard.suggestions_text(Slot::List, &names, &session),
            "Mögliche Listen im Board 'Haushalt' sind: Backlog, Done. Welche Liste meinst du?"
        );
        assert_eq!(
            FlowKind::AddCard.suggestions_text(Slot::Board, &[], &session),
            "Ich konnte keine Boards finden. Bitte nenne ein Board."
        );
    }

    #[test]
    fn context_lists_filled_slots_and_next_step() {
        let mut session = add_card_session();
        session.description = Some("Milch".into());
        let text = FlowKind::AddCard.context_text(&session);
        assert_eq!(
            text,
            "Aktion: Karte erstellen\nBoard: Haushalt \nZielliste: Backlog\nKartentitel: Einkaufen\nBeschreibung: Milch\nNächster Schritt: Karte erstellen bestätigen? (Ja/Nein)"
        );

        session.stage = Stage::Awaiting(Slot::Board);
        assert!(FlowKind::AddCard.context_text(&session).ends_with("Nächster Schritt: Board?"));

        session.reset();
        assert_eq!(FlowKind::AddCard.context_text(&session), "");
    }
}
