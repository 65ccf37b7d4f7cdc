//! Speech input/output abstraction.
//!
//! The dialogue core only needs four capabilities from its surroundings:
//! speak a prompt (returning once playback is done), ask the capture side for
//! the next utterance, publish a status line for display and report the final
//! outcome of an action. Captured input arrives as a stream of
//! [`VoiceEvent`]s.

pub mod cli;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::VoiceError;

pub use cli::CliVoice;

/// Something the capture side delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceEvent {
    /// A recognized utterance (raw transcript).
    Utterance(String),
    /// Recognition produced nothing usable.
    RecognitionFailed,
    /// External reset of the dialogue.
    Reset,
    /// The user ended the session.
    Quit,
}

/// Stream of captured voice events.
pub type VoiceEventStream = Pin<Box<dyn Stream<Item = VoiceEvent> + Send>>;

/// Speech output and capture control.
#[async_trait]
pub trait VoiceIo: Send + Sync {
    /// Speak `text`. Returns after playback has completed.
    async fn prompt_user(&self, text: &str) -> Result<(), VoiceError>;

    /// Start capturing the next utterance, showing `hint` to the user.
    async fn request_utterance(&self, hint: &str) -> Result<(), VoiceError>;

    /// Best-effort status text for display. Empty clears it.
    fn publish_context(&self, text: &str);

    /// Final result of a completed or aborted action.
    async fn report_outcome(&self, message: &str, success: bool) -> Result<(), VoiceError>;
}
