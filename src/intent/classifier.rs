//! LLM-backed intent classification.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::IntentError;
use crate::intent::{CardRef, CatalogContext, Intent, IntentClassifier};
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};

/// Max tokens for the classification call.
const CLASSIFY_MAX_TOKENS: u32 = 1000;

/// Temperature for classification.
const CLASSIFY_TEMPERATURE: f32 = 0.3;

/// Classifies utterances with a chat-completion model.
pub struct LlmIntentClassifier {
    llm: Arc<dyn LlmProvider>,
}

impl LlmIntentClassifier {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(
        &self,
        utterance: &str,
        context: Option<&CatalogContext>,
    ) -> Result<Intent, IntentError> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return Err(IntentError::EmptyUtterance);
        }

        let request = CompletionRequest::new(vec![
            ChatMessage::system(build_system_prompt(context)),
            ChatMessage::user(format!("Sprachbefehl: {utterance}")),
        ])
        .with_temperature(CLASSIFY_TEMPERATURE)
        .with_max_tokens(CLASSIFY_MAX_TOKENS);

        let response = self.llm.complete(request).await?;
        debug!(
            model = self.llm.model_name(),
            raw_response = %response.content,
            "Classifier responded"
        );

        let intent = parse_intent(&response.content).inspect_err(|e| {
            warn!(raw_response = %response.content, error = %e, "Failed to parse intent");
        })?;
        info!(action = intent.action(), "Utterance classified");
        Ok(intent)
    }
}

// ── Prompt construction ─────────────────────────────────────────────

/// Build the classification system prompt, optionally listing the catalog.
fn build_system_prompt(context: Option<&CatalogContext>) -> String {
    let mut prompt = String::from(
        "Du bist ein Trello-Sprachassistent.\n\
         Deine Aufgabe ist es, den nachfolgenden Sprachbefehl zu analysieren und \
         ausschließlich ein gültiges JSON-Objekt zurückzugeben, ohne Kommentar, \
         ohne Erklärung und ohne Markdown.\n\n\
         JSON-Format (nur Felder die erkannt wurden, Rest leer lassen):\n\
         {\n\
           \"action\": \"add_card | add_list | rename_card | rename_list | move_card | \
         delete_card | archive_card | add_comment | update_desc | add_due_date | \
         remove_due_date | add_label | remove_label | assign_member | remove_member\",\n\
           \"board\": \"Boardname\",\n\
           \"list\": \"Listenname\",\n\
           \"title\": \"Kartentitel\",\n\
           \"desc\": \"Beschreibung\",\n\
           \"comment\": \"Kommentartext\",\n\
           \"label\": \"Bezeichnung\",\n\
           \"member\": \"Mitgliedsname\",\n\
           \"due\": \"YYYY-MM-DD\",\n\
           \"target_board\": \"Ziel-Boardname\",\n\
           \"target_list\": \"Ziel-Listenname\",\n\
           \"new_title\": \"Neuer Kartentitel\",\n\
           \"new_name\": \"Neuer Listenname\"\n\
         }\n\n\
         Regeln:\n\
         - Bei add_list steht der Name der neuen Liste in \"list\".\n\
         - Bei rename_card steht der alte Titel in \"title\", der neue in \"new_title\".\n\
         - Bei rename_list steht der alte Name in \"list\", der neue in \"new_name\".\n\
         - Wenn keine Aktion erkennbar ist, lass \"action\" leer.",
    );

    if let Some(context) = context.filter(|c| !c.is_empty()) {
        if !context.boards.is_empty() {
            prompt.push_str(&format!(
                "\n\nVerfügbare Boards: {}",
                context.boards.join(", ")
            ));
        }
        if !context.lists_per_board.is_empty() {
            prompt.push_str("\nListen pro Board:");
            for (board, lists) in &context.lists_per_board {
                prompt.push_str(&format!("\n- {board}: {}", lists.join(", ")));
            }
        }
    }
    prompt
}

// ── Response parsing ────────────────────────────────────────────────

/// Classifier response structure. Every slot is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawIntent {
    action: Option<String>,
    board: Option<String>,
    #[serde(alias = "list_name")]
    list: Option<String>,
    title: Option<String>,
    desc: Option<String>,
    comment: Option<String>,
    label: Option<String>,
    member: Option<String>,
    due: Option<String>,
    target_board: Option<String>,
    target_list: Option<String>,
    new_title: Option<String>,
    #[serde(alias = "new_list_name")]
    new_name: Option<String>,
}

/// Blank slot values count as absent.
fn slot(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl RawIntent {
    fn card_ref(&mut self) -> CardRef {
        CardRef {
            board: slot(self.board.take()),
            list: slot(self.list.take()),
            title: slot(self.title.take()),
        }
    }

    fn into_intent(mut self) -> Result<Intent, IntentError> {
        let Some(action) = slot(self.action.take()) else {
            return Ok(Intent::Unrecognized);
        };

        let intent = match action.to_lowercase().as_str() {
            "add_card" => Intent::AddCard {
                board: slot(self.board),
                list: slot(self.list),
                title: slot(self.title),
                desc: slot(self.desc),
            },
            "add_list" => Intent::AddList {
                board: slot(self.board),
                name: slot(self.list).or_else(|| slot(self.new_name)),
            },
            "rename_card" => Intent::RenameCard {
                new_title: slot(self.new_title.take()),
                card: self.card_ref(),
            },
            "rename_list" => Intent::RenameList {
                board: slot(self.board),
                list: slot(self.list),
                new_name: slot(self.new_name),
            },
            "move_card" => Intent::MoveCard {
                target_board: slot(self.target_board.take()),
                target_list: slot(self.target_list.take()),
                card: self.card_ref(),
            },
            "delete_card" => Intent::DeleteCard {
                card: self.card_ref(),
            },
            "archive_card" => Intent::ArchiveCard {
                card: self.card_ref(),
            },
            "add_comment" => Intent::AddComment {
                comment: slot(self.comment.take()),
                card: self.card_ref(),
            },
            "update_desc" => Intent::UpdateDesc {
                desc: slot(self.desc.take()),
                card: self.card_ref(),
            },
            "add_due_date" => Intent::AddDueDate {
                due: slot(self.due.take()),
                card: self.card_ref(),
            },
            "remove_due_date" => Intent::RemoveDueDate {
                card: self.card_ref(),
            },
            "add_label" => Intent::AddLabel {
                label: slot(self.label.take()),
                card: self.card_ref(),
            },
            "remove_label" => Intent::RemoveLabel {
                label: slot(self.label.take()),
                card: self.card_ref(),
            },
            "assign_member" => Intent::AssignMember {
                member: slot(self.member.take()),
                card: self.card_ref(),
            },
            "remove_member" => Intent::RemoveMember {
                member: slot(self.member.take()),
                card: self.card_ref(),
            },
            _ => return Err(IntentError::UnknownAction(action)),
        };
        Ok(intent)
    }
}

/// Parse the classifier response into an `Intent`.
fn parse_intent(raw: &str) -> Result<Intent, IntentError> {
    let parsed: RawIntent = serde_json::from_str(extract_json_object(raw))
        .map_err(|e| IntentError::Parse(format!("JSON parse error: {e}")))?;
    parsed.into_intent()
}

/// Slice the JSON object out of a classifier reply. Models wrap it in code
/// fences or talk around it, before and after.
fn extract_json_object(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return trimmed;
    }

    let body = fenced_body(trimmed).unwrap_or(trimmed);
    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if end > start => &body[start..=end],
        _ => body,
    }
}

/// Content of the first code fence, without its language tag.
fn fenced_body(text: &str) -> Option<&str> {
    let (_, after) = text.split_once("```")?;
    let (inner, _) = after.split_once("```")?;
    Some(inner.trim_start_matches(|c: char| c.is_ascii_alphabetic()).trim())
}
