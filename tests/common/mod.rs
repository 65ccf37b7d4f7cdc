//! Shared fakes for the dialogue scenario tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use trello_voice::catalog::{Catalog, CatalogEntry, Mutations};
use trello_voice::config::DialogConfig;
use trello_voice::dispatcher::Dispatcher;
use trello_voice::error::{IntentError, TrelloError, VoiceError};
use trello_voice::flow::FlowDeps;
use trello_voice::intent::{CardRef, CatalogContext, Intent, IntentClassifier};
use trello_voice::voice::VoiceIo;

// ── Trello ──────────────────────────────────────────────────────────

/// In-memory catalog that records every mutation call.
#[derive(Default)]
pub struct FakeTrello {
    boards: Vec<CatalogEntry>,
    lists: HashMap<String, Vec<CatalogEntry>>,
    cards: HashMap<String, Vec<CatalogEntry>>,
    labels: HashMap<String, Vec<CatalogEntry>>,
    members: HashMap<String, Vec<CatalogEntry>>,
    calls: Mutex<Vec<String>>,
    fail_mutations: bool,
    fail_lookups: bool,
}

impl FakeTrello {
    pub fn new() -> Self {
        Self::default()
    }

    /// Boards "Haushalt" (b1) and "Arbeit" (b2). Haushalt has the lists
    /// "Backlog" (l1) and "Erledigt" (l2); Backlog holds "Putzen" (c1).
    pub fn household() -> Self {
        Self::new()
            .board("Haushalt", "b1")
            .board("Arbeit", "b2")
            .list("b1", "Backlog", "l1")
            .list("b1", "Erledigt", "l2")
            .list("b2", "To Do", "l3")
            .card("l1", "Putzen", "c1")
            .label("b1", "Dringend", "lab1")
            .member("b1", "Anna Schmidt", "m1")
    }

    pub fn board(mut self, name: &str, id: &str) -> Self {
        self.boards.push(CatalogEntry::new(name, id));
        self
    }

    pub fn list(mut self, board_id: &str, name: &str, id: &str) -> Self {
        self.lists
            .entry(board_id.to_string())
            .or_default()
            .push(CatalogEntry::new(name, id));
        self
    }

    pub fn card(mut self, list_id: &str, name: &str, id: &str) -> Self {
        self.cards
            .entry(list_id.to_string())
            .or_default()
            .push(CatalogEntry::new(name, id));
        self
    }

    pub fn label(mut self, board_id: &str, name: &str, id: &str) -> Self {
        self.labels
            .entry(board_id.to_string())
            .or_default()
            .push(CatalogEntry::new(name, id));
        self
    }

    pub fn member(mut self, board_id: &str, name: &str, id: &str) -> Self {
        self.members
            .entry(board_id.to_string())
            .or_default()
            .push(CatalogEntry::new(name, id));
        self
    }

    pub fn failing_mutations(mut self) -> Self {
        self.fail_mutations = true;
        self
    }

    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    /// Mutation calls in order, e.g. `"create_card l1 Einkaufen"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn lookup(
        &self,
        map: &HashMap<String, Vec<CatalogEntry>>,
        key: &str,
    ) -> Result<Vec<CatalogEntry>, TrelloError> {
        if self.fail_lookups {
            return Err(TrelloError::Request {
                operation: "Katalog laden".into(),
                reason: "Netzwerk nicht erreichbar".into(),
            });
        }
        Ok(map.get(key).cloned().unwrap_or_default())
    }

    fn record(&self, call: String) -> Result<(), TrelloError> {
        self.calls.lock().unwrap().push(call);
        if self.fail_mutations {
            return Err(TrelloError::Status {
                operation: "Trello".into(),
                status: 500,
                body: "kaputt".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for FakeTrello {
    async fn list_boards(&self) -> Result<Vec<CatalogEntry>, TrelloError> {
        if self.fail_lookups {
            return self.lookup(&HashMap::new(), "");
        }
        Ok(self.boards.clone())
    }

    async fn list_lists(&self, board_id: &str) -> Result<Vec<CatalogEntry>, TrelloError> {
        self.lookup(&self.lists, board_id)
    }

    async fn list_cards(&self, list_id: &str) -> Result<Vec<CatalogEntry>, TrelloError> {
        self.lookup(&self.cards, list_id)
    }

    async fn list_labels(&self, board_id: &str) -> Result<Vec<CatalogEntry>, TrelloError> {
        self.lookup(&self.labels, board_id)
    }

    async fn list_members(&self, board_id: &str) -> Result<Vec<CatalogEntry>, TrelloError> {
        self.lookup(&self.members, board_id)
    }
}

#[async_trait]
impl Mutations for FakeTrello {
    async fn create_card(
        &self,
        list_id: &str,
        title: &str,
        desc: &str,
    ) -> Result<(), TrelloError> {
        if desc.is_empty() {
            self.record(format!("create_card {list_id} {title}"))
        } else {
            self.record(format!("create_card {list_id} {title} / {desc}"))
        }
    }

    async fn create_list(&self, board_id: &str, name: &str) -> Result<(), TrelloError> {
        self.record(format!("create_list {board_id} {name}"))
    }

    async fn rename_card(&self, card_id: &str, new_name: &str) -> Result<(), TrelloError> {
        self.record(format!("rename_card {card_id} {new_name}"))
    }

    async fn rename_list(&self, list_id: &str, new_name: &str) -> Result<(), TrelloError> {
        self.record(format!("rename_list {list_id} {new_name}"))
    }

    async fn move_card(&self, card_id: &str, target_list_id: &str) -> Result<(), TrelloError> {
        self.record(format!("move_card {card_id} {target_list_id}"))
    }

    async fn archive_card(&self, card_id: &str) -> Result<(), TrelloError> {
        self.record(format!("archive_card {card_id}"))
    }

    async fn delete_card(&self, card_id: &str) -> Result<(), TrelloError> {
        self.record(format!("delete_card {card_id}"))
    }

    async fn add_comment(&self, card_id: &str, text: &str) -> Result<(), TrelloError> {
        self.record(format!("add_comment {card_id} {text}"))
    }

    async fn update_description(&self, card_id: &str, text: &str) -> Result<(), TrelloError> {
        self.record(format!("update_description {card_id} {text}"))
    }

    async fn set_due_date(
        &self,
        card_id: &str,
        due: Option<NaiveDate>,
    ) -> Result<(), TrelloError> {
        match due {
            Some(date) => self.record(format!("set_due_date {card_id} {date}")),
            None => self.record(format!("set_due_date {card_id} none")),
        }
    }

    async fn add_label(&self, card_id: &str, label_id: &str) -> Result<(), TrelloError> {
        self.record(format!("add_label {card_id} {label_id}"))
    }

    async fn remove_label(&self, card_id: &str, label_id: &str) -> Result<(), TrelloError> {
        self.record(format!("remove_label {card_id} {label_id}"))
    }

    async fn add_member(&self, card_id: &str, member_id: &str) -> Result<(), TrelloError> {
        self.record(format!("add_member {card_id} {member_id}"))
    }

    async fn remove_member(&self, card_id: &str, member_id: &str) -> Result<(), TrelloError> {
        self.record(format!("remove_member {card_id} {member_id}"))
    }
}

// ── Classifier ──────────────────────────────────────────────────────

/// Returns queued results in order; `Unrecognized` once the queue is empty.
#[derive(Default)]
pub struct ScriptedClassifier {
    results: Mutex<VecDeque<Result<Intent, IntentError>>>,
    utterances: Mutex<Vec<String>>,
    contexts: Mutex<Vec<Option<CatalogContext>>>,
}

impl ScriptedClassifier {
    pub fn new(results: Vec<Result<Intent, IntentError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            ..Self::default()
        }
    }

    pub fn returning(intent: Intent) -> Self {
        Self::new(vec![Ok(intent)])
    }

    /// Utterances the classifier was asked about.
    pub fn utterances(&self) -> Vec<String> {
        self.utterances.lock().unwrap().clone()
    }

    pub fn contexts(&self) -> Vec<Option<CatalogContext>> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl IntentClassifier for ScriptedClassifier {
    async fn classify(
        &self,
        utterance: &str,
        context: Option<&CatalogContext>,
    ) -> Result<Intent, IntentError> {
        self.utterances.lock().unwrap().push(utterance.to_string());
        self.contexts.lock().unwrap().push(context.cloned());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Intent::Unrecognized))
    }
}

// ── Voice ───────────────────────────────────────────────────────────

/// Everything the dialogue said or asked for, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceCall {
    Prompt(String),
    Request(String),
    Context(String),
    Outcome(String, bool),
}

#[derive(Default)]
pub struct RecordingVoice {
    calls: Mutex<Vec<VoiceCall>>,
}

impl RecordingVoice {
    pub fn calls(&self) -> Vec<VoiceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                VoiceCall::Prompt(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn requests(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                VoiceCall::Request(hint) => Some(hint),
                _ => None,
            })
            .collect()
    }

    pub fn outcomes(&self) -> Vec<(String, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                VoiceCall::Outcome(message, success) => Some((message, success)),
                _ => None,
            })
            .collect()
    }

    pub fn last_prompt(&self) -> String {
        self.prompts().pop().unwrap_or_default()
    }

    pub fn last_context(&self) -> String {
        self.calls()
            .into_iter()
            .rev()
            .find_map(|c| match c {
                VoiceCall::Context(text) => Some(text),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl VoiceIo for RecordingVoice {
    async fn prompt_user(&self, text: &str) -> Result<(), VoiceError> {
        self.calls
            .lock()
            .unwrap()
            .push(VoiceCall::Prompt(text.to_string()));
        Ok(())
    }

    async fn request_utterance(&self, hint: &str) -> Result<(), VoiceError> {
        self.calls
            .lock()
            .unwrap()
            .push(VoiceCall::Request(hint.to_string()));
        Ok(())
    }

    fn publish_context(&self, text: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(VoiceCall::Context(text.to_string()));
    }

    async fn report_outcome(&self, message: &str, success: bool) -> Result<(), VoiceError> {
        self.calls
            .lock()
            .unwrap()
            .push(VoiceCall::Outcome(message.to_string(), success));
        Ok(())
    }
}

// ── Harness ─────────────────────────────────────────────────────────

pub struct Harness {
    pub dispatcher: Dispatcher,
    pub trello: Arc<FakeTrello>,
    pub classifier: Arc<ScriptedClassifier>,
    pub voice: Arc<RecordingVoice>,
}

pub fn harness(trello: FakeTrello, classifier: ScriptedClassifier) -> Harness {
    harness_with(trello, classifier, DialogConfig::default())
}

pub fn harness_with(
    trello: FakeTrello,
    classifier: ScriptedClassifier,
    settings: DialogConfig,
) -> Harness {
    let trello = Arc::new(trello);
    let classifier = Arc::new(classifier);
    let voice = Arc::new(RecordingVoice::default());
    let deps = FlowDeps {
        catalog: trello.clone(),
        mutations: trello.clone(),
        voice: voice.clone(),
        settings,
    };
    Harness {
        dispatcher: Dispatcher::new(deps, classifier.clone()),
        trello,
        classifier,
        voice,
    }
}

pub fn card_ref(board: &str, list: &str, title: &str) -> CardRef {
    CardRef {
        board: Some(board.into()),
        list: Some(list.into()),
        title: Some(title.into()),
    }
}
