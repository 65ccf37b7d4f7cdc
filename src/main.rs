use std::sync::Arc;

use futures::StreamExt;

use trello_voice::config::AppConfig;
use trello_voice::dispatcher::{Dispatcher, IDLE_HINT};
use trello_voice::error::Result;
use trello_voice::flow::FlowDeps;
use trello_voice::intent::LlmIntentClassifier;
use trello_voice::llm::create_provider;
use trello_voice::trello::TrelloClient;
use trello_voice::voice::{CliVoice, VoiceEvent, VoiceIo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the dialogue
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;
    run(config).await?;
    Ok(())
}

/// Wire the collaborators and drive the dialogue until the surface quits.
async fn run(config: AppConfig) -> Result<()> {
    eprintln!("🎙️ Trello Voice v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Trello: {}", config.trello.base_url);
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   One utterance per line. /reset to start over, /quit to exit.\n");

    // ── Collaborators ───────────────────────────────────────────────────
    let trello = Arc::new(TrelloClient::new(&config.trello)?);
    let llm = create_provider(&config.llm)?;
    let classifier = Arc::new(LlmIntentClassifier::new(llm));
    let voice = Arc::new(CliVoice::new());

    let deps = FlowDeps {
        catalog: trello.clone(),
        mutations: trello,
        voice: voice.clone(),
        settings: config.dialog.clone(),
    };
    let mut dispatcher = Dispatcher::new(deps, classifier);

    // ── Dialogue loop ───────────────────────────────────────────────────
    let mut events = voice.start();
    voice.request_utterance(IDLE_HINT).await?;

    while let Some(event) = events.next().await {
        match event {
            VoiceEvent::Utterance(text) => dispatcher.on_utterance(&text).await,
            VoiceEvent::RecognitionFailed => dispatcher.on_recognition_error().await,
            VoiceEvent::Reset => dispatcher.reset(),
            VoiceEvent::Quit => break,
        }
        // Flows request their own input; idle prompting belongs to the surface
        if !dispatcher.is_active() {
            voice.request_utterance(IDLE_HINT).await?;
        }
    }

    eprintln!("Goodbye!");
    Ok(())
}
