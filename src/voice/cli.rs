//! Terminal stand-in for speech capture and playback.
//!
//! Each stdin line is one utterance. Prompts go to stdout, context updates to
//! stderr. An empty line counts as a failed recognition.

use std::io::Write;

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::VoiceError;
use crate::voice::{VoiceEvent, VoiceEventStream, VoiceIo};

/// Stdin/stdout voice surface.
#[derive(Debug, Default)]
pub struct CliVoice;

impl CliVoice {
    pub fn new() -> Self {
        Self
    }

    /// Start reading stdin in the background.
    pub fn start(&self) -> VoiceEventStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let reader = BufReader::new(tokio::io::stdin());
            let mut lines = reader.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let event = parse_line(&line);
                        let quit = event == VoiceEvent::Quit;
                        if tx.send(event).is_err() || quit {
                            break;
                        }
                    }
                    Ok(None) => {
                        let _ = tx.send(VoiceEvent::Quit);
                        break;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Error reading stdin");
                        let _ = tx.send(VoiceEvent::Quit);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });

        Box::pin(stream)
    }
}

/// Map one input line to a voice event.
fn parse_line(line: &str) -> VoiceEvent {
    match line.trim() {
        "" => VoiceEvent::RecognitionFailed,
        "/reset" => VoiceEvent::Reset,
        "/quit" => VoiceEvent::Quit,
        text => VoiceEvent::Utterance(text.to_string()),
    }
}

#[async_trait]
impl VoiceIo for CliVoice {
    async fn prompt_user(&self, text: &str) -> Result<(), VoiceError> {
        println!("🔊 {text}");
        Ok(())
    }

    async fn request_utterance(&self, hint: &str) -> Result<(), VoiceError> {
        print!("🎤 {hint}\n> ");
        std::io::stdout().flush()?;
        Ok(())
    }

    fn publish_context(&self, text: &str) {
        if !text.is_empty() {
            eprintln!("💬 {}", text.replace('\n', " | "));
        }
    }

    async fn report_outcome(&self, message: &str, success: bool) -> Result<(), VoiceError> {
        if success {
            println!("✅ {message}");
        } else {
            println!("❌ {message}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_map_to_events() {
        assert_eq!(parse_line("  "), VoiceEvent::RecognitionFailed);
        assert_eq!(parse_line("/reset"), VoiceEvent::Reset);
        assert_eq!(parse_line(" /quit "), VoiceEvent::Quit);
        assert_eq!(
            parse_line("Lösche Karte Putzen"),
            VoiceEvent::Utterance("Lösche Karte Putzen".into())
        );
    }
}
