//! Speech normalizer.
//!
//! Cleans up a raw speech-recognition transcript before it reaches the
//! classifier or an active flow: trims, lower-cases, collapses whitespace and
//! applies an ordered table of whole-word corrections for the words the
//! recognizer habitually gets wrong ("trott" for "Trello", "beck blog" for
//! "Backlog").
//!
//! Rules are applied in table order. Command phrases come before the single
//! word casing rules so that "mach ne karte" is rewritten as a whole.

use regex::Regex;
use tracing::{debug, warn};

/// Words that cancel the active flow when spoken on their own.
const CANCEL_WORDS: &[&str] = &["abbrechen", "stopp"];

/// Correction table: (case-insensitive whole-word pattern, replacement).
const CORRECTIONS: &[(&str, &str)] = &[
    // Command phrases
    (r"erstell mir ne karte", "erstelle Karte"),
    (r"mach ne karte", "erstelle Karte"),
    (r"erstelle karte", "erstelle Karte"),
    (r"neue karte", "neue Karte"),
    (r"erstelle liste", "erstelle Liste"),
    (r"neue liste", "neue Liste"),
    // Board phrases
    (r"import", "im Board"),
    (r"imboard", "im Board"),
    (r"im board", "im Board"),
    (r"auf dem board", "im Board"),
    (r"auf board", "im Board"),
    (r"in board", "im Board"),
    // List phrases
    (r"auf der liste", "in der Liste"),
    (r"in der liste", "in der Liste"),
    (r"in liste", "in Liste"),
    // Column names
    (r"to do", "To Do"),
    (r"to-do", "To Do"),
    (r"todo", "To Do"),
    (r"tu du", "To Do"),
    (r"beck blog", "Backlog"),
    (r"beck lock", "Backlog"),
    (r"backlog", "Backlog"),
    (r"done", "Done"),
    (r"fertig", "Done"),
    // Product name
    (r"trott", "Trello"),
    (r"trailer", "Trello"),
    (r"drello", "Trello"),
    // Vocabulary casing
    (r"card", "Karte"),
    (r"karte", "Karte"),
    (r"liste", "Liste"),
    (r"board", "Board"),
    (r"kommentar", "Kommentar"),
];

/// A single compiled correction.
#[derive(Debug, Clone)]
struct Correction {
    regex: Regex,
    replacement: &'static str,
}

/// Normalizes raw transcripts with the correction table.
#[derive(Debug, Clone)]
pub struct SpeechNormalizer {
    corrections: Vec<Correction>,
    whitespace: Option<Regex>,
}

impl Default for SpeechNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechNormalizer {
    /// Compile the default correction table.
    pub fn new() -> Self {
        let corrections = CORRECTIONS
            .iter()
            .filter_map(|&(pattern, replacement)| {
                match Regex::new(&format!(r"(?i)\b{pattern}\b")) {
                    Ok(regex) => Some(Correction { regex, replacement }),
                    Err(e) => {
                        warn!(pattern, error = %e, "Skipping invalid correction rule");
                        None
                    }
                }
            })
            .collect();
        Self {
            corrections,
            whitespace: Regex::new(r"\s+").ok(),
        }
    }

    /// Normalize a transcript.
    pub fn normalize(&self, raw: &str) -> String {
        let lowered = raw.trim().to_lowercase();
        let mut text = match &self.whitespace {
            Some(ws) => ws.replace_all(&lowered, " ").into_owned(),
            None => lowered,
        };
        for correction in &self.corrections {
            if correction.regex.is_match(&text) {
                text = correction
                    .regex
                    .replace_all(&text, correction.replacement)
                    .into_owned();
            }
        }
        if text != raw {
            debug!(raw, normalized = %text, "Normalized utterance");
        }
        text
    }
}

/// "ja" anywhere in the utterance counts as yes; everything else is no.
pub fn is_affirmative(text: &str) -> bool {
    text.to_lowercase().contains("ja")
}

/// Explicit request to drop the active flow.
pub fn is_cancel(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    CANCEL_WORDS.iter().any(|word| text == *word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_trims_and_collapses() {
        let n = SpeechNormalizer::new();
        assert_eq!(n.normalize("  Hallo   Welt \t"), "hallo welt");
    }

    #[test]
    fn board_phrases_are_unified() {
        let n = SpeechNormalizer::new();
        assert_eq!(
            n.normalize("Erstelle eine Karte Einkaufen import Haushalt"),
            "erstelle eine Karte einkaufen im Board haushalt"
        );
        assert_eq!(n.normalize("auf dem board arbeit"), "im Board arbeit");
        assert_eq!(n.normalize("auf der liste backlog"), "in der Liste Backlog");
    }

    #[test]
    fn column_names_are_canonical() {
        let n = SpeechNormalizer::new();
        assert_eq!(n.normalize("in liste tu du"), "in Liste To Do");
        assert_eq!(n.normalize("todo"), "To Do");
        assert_eq!(n.normalize("beck blog"), "Backlog");
        assert_eq!(n.normalize("fertig"), "Done");
    }

    #[test]
    fn product_name_is_repaired() {
        let n = SpeechNormalizer::new();
        assert_eq!(n.normalize("öffne trott"), "öffne Trello");
        assert_eq!(n.normalize("Drello"), "Trello");
    }

    #[test]
    fn command_phrases_are_rewritten() {
        let n = SpeechNormalizer::new();
        assert_eq!(n.normalize("mach ne karte"), "erstelle Karte");
        assert_eq!(n.normalize("erstell mir ne Karte"), "erstelle Karte");
    }

    #[test]
    fn partial_words_are_left_alone() {
        let n = SpeechNormalizer::new();
        assert_eq!(n.normalize("kartenspiel"), "kartenspiel");
        assert_eq!(n.normalize("importieren"), "importieren");
        assert_eq!(n.normalize("dann"), "dann");
    }

    #[test]
    fn affirmative_is_substring_check() {
        assert!(is_affirmative("Ja"));
        assert!(is_affirmative("ja klar"));
        assert!(is_affirmative("na JA"));
        assert!(!is_affirmative("nein"));
        assert!(!is_affirmative(""));
    }

    #[test]
    fn cancel_requires_exact_word() {
        assert!(is_cancel("abbrechen"));
        assert!(is_cancel(" Stopp "));
        assert!(!is_cancel("nicht abbrechen"));
        assert!(!is_cancel("stop"));
    }
}
