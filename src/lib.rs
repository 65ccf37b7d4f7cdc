//! Trello voice assistant: German voice commands to Trello mutations.

pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod flow;
pub mod intent;
pub mod llm;
pub mod matcher;
pub mod normalize;
pub mod trello;
pub mod voice;
