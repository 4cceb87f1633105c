//! Deterministic fallbacks for every LLM touchpoint.
//!
//! The legacy regex parser recognizes the small command vocabulary the
//! original text interface shipped with; the fallback narrator renders the
//! scene payload as plain prose. Neither can fail.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use world_core::{Action, Direction, Intent, TrivialKind};

use super::{GameContext, IntentParser, NarrationError, Narrator, ParserError};

static TAKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:take|pick up|grab)\s+(?:the\s+)?(.+)$").unwrap());
static DROP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^drop\s+(?:the\s+)?(.+)$").unwrap());
static MOVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:go|move|walk|head)\s+(\w+)$").unwrap());
static LOOK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^look(?:\s+around)?$").unwrap());

/// The legacy regex parser: `look`, `take X`, `drop X`, `move <dir>`.
///
/// Anything else parses to a noop so the turn still advances.
pub struct LegacyParser;

impl LegacyParser {
    /// Synchronous parse used both by the trait impl and directly by the
    /// orchestrator when the semantic parser degrades.
    pub fn parse(text: &str) -> Intent {
        let trimmed = text.trim();

        if LOOK_RE.is_match(trimmed) {
            return Intent {
                primary: Action::Trivial {
                    kind: TrivialKind::Look,
                },
                secondary: Vec::new(),
                compound: false,
                confidence: 1.0,
            };
        }
        if let Some(caps) = TAKE_RE.captures(trimmed) {
            return Intent {
                primary: Action::Take {
                    target: caps[1].trim().to_string(),
                },
                secondary: Vec::new(),
                compound: false,
                confidence: 1.0,
            };
        }
        if let Some(caps) = DROP_RE.captures(trimmed) {
            return Intent {
                primary: Action::Drop {
                    target: caps[1].trim().to_string(),
                },
                secondary: Vec::new(),
                compound: false,
                confidence: 1.0,
            };
        }
        let dir_token = MOVE_RE
            .captures(trimmed)
            .map(|caps| caps[1].to_string())
            .or_else(|| {
                Direction::canonicalize(trimmed).map(|d| d.to_string())
            });
        if let Some(dir) = dir_token
            && Direction::canonicalize(&dir).is_some()
        {
            return Intent {
                primary: Action::Move { dir },
                secondary: Vec::new(),
                compound: false,
                confidence: 1.0,
            };
        }

        Intent::noop()
    }
}

#[async_trait]
impl IntentParser for LegacyParser {
    async fn normalize(&self, text: &str, _ctx: &GameContext) -> Result<Intent, ParserError> {
        if text.trim().is_empty() {
            return Err(ParserError::EmptyInput);
        }
        Ok(Self::parse(text))
    }
}

/// Renders the scene payload directly, without a model.
pub struct FallbackNarrator;

impl FallbackNarrator {
    /// Deterministic prose from a scene payload.
    pub fn render(scene: &Value) -> String {
        let mut lines = Vec::new();
        if let Some(desc) = scene.get("description").and_then(Value::as_str) {
            lines.push(desc.to_string());
        } else if let Some(location) = scene.get("location").and_then(Value::as_str) {
            lines.push(format!("You are at {location}."));
        }
        if let Some(results) = scene.get("results").and_then(Value::as_array) {
            for result in results.iter().filter_map(Value::as_str) {
                lines.push(format!("You {result}."));
            }
        }
        if let Some(npcs) = scene.get("present_npcs").and_then(Value::as_array)
            && !npcs.is_empty()
        {
            let names: Vec<&str> = npcs.iter().filter_map(Value::as_str).collect();
            lines.push(format!("Nearby: {}.", names.join(", ")));
        }
        if lines.is_empty() {
            lines.push("The moment passes quietly.".to_string());
        }
        lines.join(" ")
    }
}

#[async_trait]
impl Narrator for FallbackNarrator {
    async fn narrate(&self, scene: &Value) -> Result<String, NarrationError> {
        Ok(Self::render(scene))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recognizes_the_legacy_vocabulary() {
        assert_eq!(
            LegacyParser::parse("take the rusty dagger").primary,
            Action::Take { target: "rusty dagger".into() }
        );
        assert_eq!(
            LegacyParser::parse("drop dagger").primary,
            Action::Drop { target: "dagger".into() }
        );
        assert_eq!(
            LegacyParser::parse("go north").primary,
            Action::Move { dir: "north".into() }
        );
        assert_eq!(
            LegacyParser::parse("n").primary,
            Action::Move { dir: "north".into() }
        );
        assert_eq!(
            LegacyParser::parse("Look around").primary,
            Action::Trivial { kind: TrivialKind::Look }
        );
    }

    #[test]
    fn unknown_text_parses_to_noop() {
        assert_eq!(LegacyParser::parse("sing a sea shanty").primary, Action::Noop);
        assert_eq!(LegacyParser::parse("go sideways").primary, Action::Noop);
    }

    #[test]
    fn fallback_narration_uses_scene_fields() {
        let scene = json!({
            "description": "A shingle beach raked by salt wind.",
            "results": ["moved north"],
            "present_npcs": ["fisher"],
        });
        let text = FallbackNarrator::render(&scene);
        assert!(text.contains("shingle beach"));
        assert!(text.contains("You moved north."));
        assert!(text.contains("fisher"));
    }
}
