//! Session and response-classification engine for turtle-soup (海龟汤)
//! lateral-thinking puzzles.
//!
//! A host document supplies a public scenario and a hidden resolution. The
//! player asks yes/no questions and eventually proposes a resolution; an
//! LLM oracle reached through an OpenAI-compatible chat completions endpoint
//! (by default [OpenRouter](https://openrouter.ai/)) answers each question
//! or judges each proposed resolution. This crate owns everything between a
//! UI event and the resulting state change: parsing puzzles, building
//! prompts, talking to the oracle, classifying its replies, and persisting a
//! resumable session.
//!
//! # Getting started
//!
//! ```ignore
//! use haigui::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let config = GameConfig::default();
//!     let api_key = std::env::var("OPENROUTER_KEY").map_err(|_| "OPENROUTER_KEY not set")?;
//!
//!     let game = Game::new(
//!         config.build_oracle(api_key).map_err(|e| e.to_string())?,
//!         config.build_store(),
//!         config.build_library().map_err(|e| e.to_string())?,
//!     )
//!     .with_prompt_context(config.prompt_context)
//!     .with_event_handler(LoggingHandler);
//!
//!     game.start(None).await.map_err(|e| e.to_string())?;
//!     let outcome = game.submit("他是被杀的吗").await.map_err(|e| e.to_string())?;
//!     println!("{}", outcome.display_text());
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`puzzle`] | Two-marker document parser, [`Puzzle`](puzzle::Puzzle), puzzle libraries (directory / HTTP) |
//! | [`label`] | Closed label vocabulary and the delimiter protocol |
//! | [`classify`] | Oracle reply → [`Answer`](label::Answer) classification |
//! | [`prompt`] | Hint / question / resolution-check prompt assembly |
//! | [`oracle`] | [`Oracle`](oracle::Oracle) trait and the OpenRouter client |
//! | [`session`] | [`Session`](session::Session), clues, persisted record, stores |
//! | [`game`] | Turn state machine, one-slot gate, display events, [`Game`](game::Game) controller |
//! | [`config`] | [`GameConfig`](config::GameConfig) defaults and builders |

pub mod classify;
pub mod config;
pub mod game;
pub mod label;
pub mod oracle;
pub mod prelude;
pub mod prompt;
pub mod puzzle;
pub mod session;

use serde::{Deserialize, Serialize};

// ── Constants ──────────────────────────────────────────────────────

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Default oracle model.
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3-0324";

/// Default sampling temperature for every oracle call.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Application title sent in the `X-Title` header.
pub const APP_TITLE: &str = "海龟汤AI助手";

// ── Message types ──────────────────────────────────────────────────

/// Role of a message in an oracle request.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
        }
    }
}

/// A role-tagged turn sent to the oracle.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors() {
        let sys = Message::system("hello");
        assert_eq!(sys.role, MessageRole::System);
        assert_eq!(sys.content, "hello");

        let user = Message::user("world");
        assert_eq!(user.role, MessageRole::User);
    }

    #[test]
    fn message_serializes_with_lowercase_role() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
        assert_eq!(MessageRole::System.to_string(), "system");
    }
}
