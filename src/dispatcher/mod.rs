//! Routes every utterance to the active flow or to intent classification.
//!
//! The dispatcher owns at most one running dialogue. While a flow is active,
//! utterances go straight to it; otherwise they are classified and either
//! start a flow or a single-shot confirmation. Observers follow the dialogue
//! through a read-only [`SessionSnapshot`] subscription.

pub mod single_shot;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::flow::engine::{ask, report, say};
use crate::flow::{Flow, FlowDeps, FlowSeed, FlowStatus, SessionSnapshot};
use crate::intent::{CatalogContext, Intent, IntentClassifier};
use crate::normalize::{SpeechNormalizer, is_affirmative, is_cancel};

/// Capture hint while idle. The voice surface requests it whenever the
/// dispatcher is not active.
pub const IDLE_HINT: &str = "Was möchtest du tun?";

const SINGLE_SHOT_HINT: &str = "Bitte mit Ja oder Nein antworten";

/// What the dispatcher is currently doing.
#[derive(Debug, Default)]
enum Mode {
    #[default]
    Idle,
    Flow(Flow),
    /// A flow-less intent was restated; waiting for yes/no.
    AwaitingConfirmation(Intent),
}

/// Single owner of the dialogue state.
pub struct Dispatcher {
    deps: FlowDeps,
    classifier: Arc<dyn IntentClassifier>,
    normalizer: SpeechNormalizer,
    mode: Mode,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl Dispatcher {
    pub fn new(deps: FlowDeps, classifier: Arc<dyn IntentClassifier>) -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::idle());
        Self {
            deps,
            classifier,
            normalizer: SpeechNormalizer::new(),
            mode: Mode::Idle,
            snapshot_tx,
        }
    }

    /// Subscribe to snapshots published after every event.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Whether a flow or a single-shot confirmation is pending.
    pub fn is_active(&self) -> bool {
        !matches!(self.mode, Mode::Idle)
    }

    /// Handle one recognized utterance to completion.
    pub async fn on_utterance(&mut self, raw: &str) {
        let text = self.normalizer.normalize(raw);
        if text.is_empty() {
            self.on_recognition_error().await;
            return;
        }

        let mode = std::mem::take(&mut self.mode);
        self.mode = match mode {
            Mode::Flow(mut flow) => {
                if is_cancel(&text) {
                    flow.cancel(&self.deps).await;
                    Mode::Idle
                } else {
                    match flow.handle_spoken_input(&text, &self.deps).await {
                        FlowStatus::Active => Mode::Flow(flow),
                        FlowStatus::Finished { success } => {
                            info!(action = flow.kind().action(), success, "Flow finished");
                            Mode::Idle
                        }
                    }
                }
            }
            Mode::AwaitingConfirmation(intent) => {
                self.confirm_single_shot(&intent, &text).await;
                Mode::Idle
            }
            Mode::Idle => self.classify(&text).await,
        };
        self.publish_snapshot();
    }

    /// Speech capture produced nothing usable.
    pub async fn on_recognition_error(&mut self) {
        let hint = match &self.mode {
            Mode::Idle => None,
            Mode::Flow(flow) => Some(flow.current_hint()),
            Mode::AwaitingConfirmation(_) => Some(SINGLE_SHOT_HINT.to_string()),
        };
        warn!(active = hint.is_some(), "Speech recognition failed");
        match hint {
            Some(hint) => {
                ask(
                    &self.deps,
                    "Spracheingabe fehlgeschlagen. Bitte erneut versuchen oder 'Abbrechen' sagen.",
                    &hint,
                )
                .await;
            }
            None => say(&self.deps, "Spracheingabe fehlgeschlagen.").await,
        }
    }

    /// Drop any running dialogue without touching Trello.
    pub fn reset(&mut self) {
        if let Mode::Flow(flow) = &mut self.mode {
            flow.reset();
        }
        self.mode = Mode::Idle;
        self.deps.voice.publish_context("");
        self.publish_snapshot();
        info!("Dialogue reset");
    }

    // ── Idle ────────────────────────────────────────────────────────

    async fn classify(&self, text: &str) -> Mode {
        let context = if self.deps.settings.classifier_context {
            self.catalog_context().await
        } else {
            None
        };

        let intent = match self.classifier.classify(text, context.as_ref()).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!(error = %e, "Classification failed");
                report(
                    &self.deps,
                    &format!("Fehler bei der Anfrage an die KI: {e}"),
                    false,
                )
                .await;
                return Mode::Idle;
            }
        };
        info!(action = intent.action(), "Intent classified");

        if matches!(intent, Intent::Unrecognized) {
            say(&self.deps, "Ich habe die Aktion nicht verstanden.").await;
            return Mode::Idle;
        }

        if let Some(seed) = FlowSeed::from_intent(&intent) {
            let (flow, status) = Flow::start(seed, &self.deps).await;
            return match status {
                FlowStatus::Active => Mode::Flow(flow),
                FlowStatus::Finished { .. } => Mode::Idle,
            };
        }

        self.deps.voice.publish_context(&format!(
            "Aktion: {}\nNächster Schritt: Bestätigen? (Ja/Nein)",
            single_shot::title(&intent)
        ));
        ask(
            &self.deps,
            &single_shot::confirmation_text(&intent),
            SINGLE_SHOT_HINT,
        )
        .await;
        Mode::AwaitingConfirmation(intent)
    }

    /// Board and list names for the classifier. Best effort.
    async fn catalog_context(&self) -> Option<CatalogContext> {
        let boards = match self.deps.catalog.list_boards().await {
            Ok(boards) => boards,
            Err(e) => {
                warn!(error = %e, "Loading boards for classifier context failed");
                return None;
            }
        };

        let mut context = CatalogContext::default();
        for board in boards {
            match self.deps.catalog.list_lists(&board.id).await {
                Ok(lists) => context.lists_per_board.push((
                    board.name.clone(),
                    lists.into_iter().map(|l| l.name).collect(),
                )),
                Err(e) => warn!(board = %board.name, error = %e, "Loading lists failed"),
            }
            context.boards.push(board.name);
        }
        debug!(boards = context.boards.len(), "Catalog context built");
        (!context.is_empty()).then_some(context)
    }

    // ── Single shot ─────────────────────────────────────────────────

    async fn confirm_single_shot(&self, intent: &Intent, text: &str) {
        if !is_affirmative(text) {
            info!(action = intent.action(), "Single-shot action declined");
            say(&self.deps, "Okay, Aktion abgebrochen.").await;
            report(&self.deps, "Aktion abgebrochen.", false).await;
        } else {
            let (message, success) = single_shot::execute(intent, &self.deps).await;
            report(&self.deps, &message, success).await;
        }
        self.deps.voice.publish_context("");
    }

    // ── Snapshot ────────────────────────────────────────────────────

    fn snapshot(&self) -> SessionSnapshot {
        match &self.mode {
            Mode::Idle => SessionSnapshot::idle(),
            Mode::Flow(flow) => flow.snapshot(),
            Mode::AwaitingConfirmation(intent) => SessionSnapshot {
                active: true,
                action: Some(intent.action().to_string()),
                stage: "ConfirmAction".to_string(),
                context: format!("Aktion: {}", single_shot::title(intent)),
                ..SessionSnapshot::idle()
            },
        }
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }
}
