//! Convenience re-exports for embedding the game.
//!
//! ```ignore
//! use haigui::prelude::*;
//! ```

pub use crate::{Message, MessageRole};

pub use crate::classify::{Classification, classify};
pub use crate::config::{GameConfig, PuzzleSource, api_key_from_env};
pub use crate::game::{
    CompositeEventHandler, ControllerState, EventHandler, FnEventHandler, Game, GameError,
    GameEvent, Intent, LoggingHandler, NoopHandler, Start, TurnOutcome,
};
pub use crate::label::{ANSWER_LABELS, Answer, Label, LabelSet, VERDICT_LABELS};
pub use crate::oracle::{OpenRouterOracle, Oracle, OracleConfig, OracleError, OracleFuture};
pub use crate::prompt::{OraclePrompt, PromptBuilder, PromptContext, PromptKind};
pub use crate::puzzle::{DirLibrary, HttpLibrary, Puzzle, PuzzleLibrary};
pub use crate::session::{Clue, FileStore, MemoryStore, Session, SessionStore};
