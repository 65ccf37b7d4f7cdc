//! The shared transition skeleton every flow runs on.
//!
//! A flow walks its slots in order. For each slot it first consumes a pending
//! classifier hint, and only asks the user when no hint is left, so a fully
//! specified command reaches the final confirmation without a single question.
//! Lookup failures re-ask the same slot; only the final mutation is terminal.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::catalog::{
    Catalog, CatalogEntry, Mutations, Resolution, resolve_board, resolve_card, resolve_list,
};
use crate::config::DialogConfig;
use crate::error::{FlowError, TrelloError};
use crate::flow::kind::{FlowKind, FlowSeed};
use crate::flow::session::{FlowSession, SessionSnapshot, Slot, Stage};
use crate::normalize::is_affirmative;
use crate::voice::VoiceIo;

/// Capture hint for every yes/no question.
pub const YES_NO_HINT: &str = "Ja oder Nein?";

/// Answers that reuse the source board as move target.
const SAME_BOARD: &[&str] = &["dasselbe", "das selbe", "dasselbe board", "das selbe board"];

/// Collaborators a flow talks to.
#[derive(Clone)]
pub struct FlowDeps {
    pub catalog: Arc<dyn Catalog>,
    pub mutations: Arc<dyn Mutations>,
    pub voice: Arc<dyn VoiceIo>,
    pub settings: DialogConfig,
}

/// Whether a flow still needs input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    Active,
    Finished { success: bool },
}

/// Result of feeding one value into a slot.
enum Step {
    /// The slot is filled; move on.
    Advanced,
    /// A question was asked; wait for the next utterance.
    Waiting,
    /// The flow ended.
    Finished(bool),
}

/// One running dialogue.
#[derive(Debug)]
pub struct Flow {
    kind: FlowKind,
    session: FlowSession,
}

impl Flow {
    /// Begin a flow and run it until it needs user input.
    pub async fn start(seed: FlowSeed, deps: &FlowDeps) -> (Self, FlowStatus) {
        let mut flow = Self {
            kind: seed.kind,
            session: FlowSession::default(),
        };
        flow.session.begin(seed.hints, seed.description);
        info!(
            session_id = ?flow.session.id,
            action = flow.kind.action(),
            "Flow started"
        );
        let status = flow.proceed(deps).await;
        (flow, status)
    }

    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    pub fn context_text(&self) -> String {
        self.kind.context_text(&self.session)
    }

    /// Capture hint for the input the flow currently waits for.
    pub fn current_hint(&self) -> String {
        match self.session.stage {
            Stage::Awaiting(slot) => self.kind.hint(slot),
            _ => YES_NO_HINT.to_string(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session
            .snapshot(Some(self.kind.action()), &self.context_text())
    }

    /// Route one normalized utterance into the current stage.
    pub async fn handle_spoken_input(&mut self, input: &str, deps: &FlowDeps) -> FlowStatus {
        debug!(
            session_id = ?self.session.id,
            stage = %self.session.stage,
            input,
            "Flow input"
        );
        match self.session.stage {
            Stage::Idle => {
                warn!(action = self.kind.action(), "Input for an idle flow ignored");
                FlowStatus::Finished { success: false }
            }
            Stage::Awaiting(slot) => match self.accept(slot, input, deps).await {
                Step::Advanced => self.proceed(deps).await,
                Step::Waiting => FlowStatus::Active,
                Step::Finished(success) => FlowStatus::Finished { success },
            },
            Stage::ConfirmNotFound(slot) => {
                let step = if is_affirmative(input) {
                    self.suggest(slot, deps).await
                } else {
                    self.retry(slot, deps).await;
                    Step::Waiting
                };
                match step {
                    Step::Finished(success) => FlowStatus::Finished { success },
                    _ => FlowStatus::Active,
                }
            }
            Stage::ConfirmAction => self.confirm_or_decline(input, deps).await,
        }
    }

    /// User-requested cancellation of the running flow.
    pub async fn cancel(&mut self, deps: &FlowDeps) {
        info!(session_id = ?self.session.id, stage = %self.session.stage, "Flow cancelled");
        report(deps, "Vorgang abgebrochen.", false).await;
        self.finish(deps);
    }

    /// Drop the session silently.
    pub fn reset(&mut self) {
        self.session.reset();
    }

    // ── Transitions ─────────────────────────────────────────────────

    fn transition(&mut self, stage: Stage, deps: &FlowDeps) {
        debug!(
            session_id = ?self.session.id,
            action = self.kind.action(),
            from = %self.session.stage,
            to = %stage,
            "Flow transition"
        );
        self.session.stage = stage;
        self.publish(deps);
    }

    fn publish(&self, deps: &FlowDeps) {
        deps.voice.publish_context(&self.context_text());
    }

    fn finish(&mut self, deps: &FlowDeps) {
        self.session.reset();
        self.publish(deps);
    }

    /// Fill slots from hints until a question has to be asked, then ask it;
    /// with every slot filled, ask for the final confirmation.
    async fn proceed(&mut self, deps: &FlowDeps) -> FlowStatus {
        while let Some(slot) = self.kind.next_slot(&self.session) {
            self.transition(Stage::Awaiting(slot), deps);
            let Some(hint) = self.session.take_hint(slot) else {
                let (question, capture) = self.kind.question(slot, &self.session);
                ask(deps, &question, &capture).await;
                return FlowStatus::Active;
            };
            debug!(?slot, hint = %hint, "Using classifier hint");
            match self.accept(slot, &hint, deps).await {
                Step::Advanced => continue,
                Step::Waiting => return FlowStatus::Active,
                Step::Finished(success) => return FlowStatus::Finished { success },
            }
        }
        self.ask_confirmation(deps).await
    }

    async fn ask_confirmation(&mut self, deps: &FlowDeps) -> FlowStatus {
        match self.kind.confirmation_text(&self.session) {
            Ok(text) => {
                self.transition(Stage::ConfirmAction, deps);
                ask(deps, &text, YES_NO_HINT).await;
                FlowStatus::Active
            }
            Err(e) => {
                self.fail_internal(e, deps).await;
                FlowStatus::Finished { success: false }
            }
        }
    }

    async fn fail_internal(&mut self, err: FlowError, deps: &FlowDeps) {
        error!(
            session_id = ?self.session.id,
            action = self.kind.action(),
            stage = %self.session.stage,
            error = %err,
            "Flow invariant violated"
        );
        report(deps, &format!("Interner Fehler: {err}."), false).await;
        self.finish(deps);
    }

    // ── Slot filling ────────────────────────────────────────────────

    async fn accept(&mut self, slot: Slot, input: &str, deps: &FlowDeps) -> Step {
        if slot.is_reference() {
            self.accept_reference(slot, input, deps).await
        } else {
            self.accept_value(slot, input, deps).await
        }
    }

    async fn accept_value(&mut self, slot: Slot, input: &str, deps: &FlowDeps) -> Step {
        let value = input.trim();
        if value.is_empty() {
            let (question, capture) = self.kind.question(slot, &self.session);
            ask(deps, &format!("Der Name darf nicht leer sein. {question}"), &capture).await;
            return Step::Waiting;
        }
        self.session.set_value(slot, value.to_string());
        self.publish(deps);
        Step::Advanced
    }

    /// Id of the reference a lookup for `slot` is scoped to.
    fn parent_id(&self, slot: Slot) -> Result<Option<String>, FlowError> {
        match slot.parent() {
            None => Ok(None),
            Some(parent) => self
                .session
                .resolved(parent)
                .map(|e| Some(e.id.clone()))
                .ok_or(FlowError::MissingReference(parent.label())),
        }
    }

    async fn lookup(
        &self,
        slot: Slot,
        input: &str,
        deps: &FlowDeps,
    ) -> Result<Result<Resolution, TrelloError>, FlowError> {
        let parent_id = self.parent_id(slot)?.unwrap_or_default();
        let catalog = deps.catalog.as_ref();
        let result = match slot {
            Slot::Board | Slot::TargetBoard => resolve_board(catalog, input).await,
            Slot::List | Slot::TargetList => resolve_list(catalog, &parent_id, input).await,
            _ => resolve_card(catalog, &parent_id, input).await,
        };
        Ok(result)
    }

    async fn accept_reference(&mut self, slot: Slot, input: &str, deps: &FlowDeps) -> Step {
        if slot == Slot::TargetBoard && is_same_board(input) {
            let Some(source) = self.session.resolved(Slot::Board).cloned() else {
                self.fail_internal(FlowError::MissingReference(Slot::Board.label()), deps)
                    .await;
                return Step::Finished(false);
            };
            self.store(slot, source, deps);
            return Step::Advanced;
        }

        let result = match self.lookup(slot, input, deps).await {
            Ok(result) => result,
            Err(e) => {
                self.fail_internal(e, deps).await;
                return Step::Finished(false);
            }
        };

        match result {
            Ok(Resolution::Found(entry)) => {
                self.store(slot, entry, deps);
                Step::Advanced
            }
            Ok(Resolution::Ambiguous { entry, count }) => {
                say(deps, &self.kind.ambiguous_text(input, &entry.name, count)).await;
                self.store(slot, entry, deps);
                Step::Advanced
            }
            Ok(Resolution::NotFound) => {
                info!(session_id = ?self.session.id, ?slot, spoken = input, "Name not found");
                self.transition(Stage::ConfirmNotFound(slot), deps);
                let text = self.kind.not_found_text(slot, input, &self.session);
                ask(deps, &text, YES_NO_HINT).await;
                Step::Waiting
            }
            Err(e) => {
                warn!(session_id = ?self.session.id, ?slot, error = %e, "Catalog lookup failed");
                let text = self.kind.lookup_error_text(slot, &e.to_string());
                ask(deps, &text, &self.kind.hint(slot)).await;
                Step::Waiting
            }
        }
    }

    fn store(&mut self, slot: Slot, entry: CatalogEntry, deps: &FlowDeps) {
        info!(
            session_id = ?self.session.id,
            ?slot,
            name = %entry.name,
            id = %entry.id,
            "Reference resolved"
        );
        self.session.resolve(slot, entry);
        self.publish(deps);
    }

    // ── Not-found recovery ──────────────────────────────────────────

    /// Read out up to `suggestion_limit` candidates, then wait for the name.
    async fn suggest(&mut self, slot: Slot, deps: &FlowDeps) -> Step {
        let parent_id = match self.parent_id(slot) {
            Ok(id) => id.unwrap_or_default(),
            Err(e) => {
                self.fail_internal(e, deps).await;
                return Step::Finished(false);
            }
        };
        let catalog = deps.catalog.as_ref();
        let candidates = match slot {
            Slot::Board | Slot::TargetBoard => catalog.list_boards().await,
            Slot::List | Slot::TargetList => catalog.list_lists(&parent_id).await,
            _ => catalog.list_cards(&parent_id).await,
        };

        self.transition(Stage::Awaiting(slot), deps);
        let text = match candidates {
            Ok(entries) => {
                let names: Vec<String> = entries
                    .into_iter()
                    .map(|e| e.name)
                    .filter(|name| !name.trim().is_empty())
                    .take(deps.settings.suggestion_limit)
                    .collect();
                self.kind.suggestions_text(slot, &names, &self.session)
            }
            Err(e) => {
                warn!(?slot, error = %e, "Loading suggestions failed");
                self.kind.suggestions_error_text(slot)
            }
        };
        ask(deps, &text, &self.kind.hint(slot)).await;
        Step::Waiting
    }

    /// The user declined suggestions: ask for the same name again.
    async fn retry(&mut self, slot: Slot, deps: &FlowDeps) {
        self.transition(Stage::Awaiting(slot), deps);
        let (text, capture) = self.kind.retry_text(slot);
        ask(deps, &text, &capture).await;
    }

    // ── Final confirmation ──────────────────────────────────────────

    async fn confirm_or_decline(&mut self, input: &str, deps: &FlowDeps) -> FlowStatus {
        if !is_affirmative(input) {
            let (spoken, outcome) = self.kind.declined_texts();
            info!(session_id = ?self.session.id, action = self.kind.action(), "Action declined");
            say(deps, spoken).await;
            report(deps, outcome, false).await;
            self.finish(deps);
            return FlowStatus::Finished { success: false };
        }

        let action = match self.kind.build_action(&self.session) {
            Ok(action) => action,
            Err(e) => {
                self.fail_internal(e, deps).await;
                return FlowStatus::Finished { success: false };
            }
        };

        let success = match action.execute(deps.mutations.as_ref()).await {
            Ok(()) => {
                info!(session_id = ?self.session.id, action = action.name(), "Action executed");
                report(deps, &self.kind.success_text(&self.session), true).await;
                true
            }
            Err(e) => {
                warn!(
                    session_id = ?self.session.id,
                    action = action.name(),
                    error = %e,
                    "Action failed"
                );
                let message = format!("{}: {e}", self.kind.failure_prefix());
                report(deps, &message, false).await;
                false
            }
        };
        self.finish(deps);
        FlowStatus::Finished { success }
    }
}

fn is_same_board(input: &str) -> bool {
    let input = input.trim().to_lowercase();
    SAME_BOARD.iter().any(|phrase| input == *phrase)
}

// ── Voice helpers ───────────────────────────────────────────────────

/// Speak `text`, then open the microphone with `capture` as hint.
pub(crate) async fn ask(deps: &FlowDeps, text: &str, capture: &str) {
    say(deps, text).await;
    if let Err(e) = deps.voice.request_utterance(capture).await {
        warn!(error = %e, "Failed to request utterance");
    }
}

pub(crate) async fn say(deps: &FlowDeps, text: &str) {
    if let Err(e) = deps.voice.prompt_user(text).await {
        warn!(error = %e, "Failed to speak prompt");
    }
}

pub(crate) async fn report(deps: &FlowDeps, message: &str, success: bool) {
    if let Err(e) = deps.voice.report_outcome(message, success).await {
        warn!(error = %e, "Failed to report outcome");
    }
}
