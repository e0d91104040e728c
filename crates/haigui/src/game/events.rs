//! Display events emitted by the [`Game`](super::Game) controller.
//!
//! The core never renders anything. Front-ends implement [`EventHandler`]
//! and turn [`GameEvent`]s into terminal lines, WebSocket frames, or log
//! records.
//!
//! | Handler | Use case |
//! |---------|----------|
//! | [`NoopHandler`] | Tests, headless embedding |
//! | [`LoggingHandler`] | Structured logging via `tracing` |
//! | [`FnEventHandler`] | Quick closures |
//! | [`CompositeEventHandler`] | Several handlers in order |

use tracing::{debug, info, warn};

use crate::label::Answer;
use crate::oracle::OracleError;
use crate::prompt::PromptKind;
use crate::puzzle::Puzzle;
use crate::session::Session;

/// Relabel shown next to a pending question or resolution attempt.
pub const WAITING_TEXT: &str = "等待中...";

/// Relabel shown while a hint is being fetched.
pub const HINT_WAITING_TEXT: &str = "获取提示中...";

/// Prefix shown before a disclosed resolution.
pub const DISCLOSURE_PREFIX: &str = "谜底：";

/// Banner shown when a proposed resolution is judged fully correct.
pub const SOLVED_BANNER: &str = "完全正确！！！";

/// Something a front-end may want to show.
#[derive(Debug)]
pub enum GameEvent<'a> {
    /// A puzzle was loaded and the session reset.
    PuzzleLoaded { puzzle: &'a Puzzle },
    /// A saved session was restored on start.
    SessionRestored { session: &'a Session },
    /// Loading a puzzle failed; the previous session is untouched.
    LoadFailed { error: &'a str },
    /// Input is locked until the matching [`GameEvent::InputReleased`].
    InputLocked,
    /// The pending input is waiting on the oracle.
    Waiting { kind: PromptKind, pending: &'a str },
    /// A question was answered and recorded as a clue.
    Answered {
        question: &'a str,
        answer: &'a Answer,
        raw: &'a str,
    },
    /// A proposed resolution was judged.
    Judged {
        attempt: &'a str,
        verdict: &'a Answer,
        raw: &'a str,
    },
    /// The resolution is shown. `solved` is true when a verdict earned it.
    Disclosure { resolution: &'a str, solved: bool },
    /// Free-text hint from the oracle.
    Hint { text: &'a str },
    /// The oracle exchange failed; the session is unchanged.
    TurnFailed {
        kind: PromptKind,
        error: &'a OracleError,
    },
    /// Input is unlocked again. Always follows [`GameEvent::InputLocked`].
    InputReleased,
}

/// Observer for [`GameEvent`]s.
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: &GameEvent<'_>) {
        let _ = event;
    }
}

impl<H: EventHandler + ?Sized> EventHandler for std::sync::Arc<H> {
    fn on_event(&self, event: &GameEvent<'_>) {
        (**self).on_event(event)
    }
}

/// Ignores every event.
pub struct NoopHandler;
impl EventHandler for NoopHandler {}

/// An event handler backed by a closure.
///
/// ```ignore
/// let handler = FnEventHandler::new(|event| {
///     if let GameEvent::Hint { text } = event {
///         println!("{text}");
///     }
/// });
/// ```
pub struct FnEventHandler<F>(F)
where
    F: Fn(&GameEvent<'_>) + Send + Sync;

impl<F> FnEventHandler<F>
where
    F: Fn(&GameEvent<'_>) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventHandler for FnEventHandler<F>
where
    F: Fn(&GameEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &GameEvent<'_>) {
        (self.0)(event)
    }
}

/// Dispatches each event to several handlers in registration order.
///
/// ```ignore
/// let handler = CompositeEventHandler::new()
///     .with(LoggingHandler)
///     .with_opt(broadcast);
/// ```
pub struct CompositeEventHandler {
    handlers: Vec<Box<dyn EventHandler>>,
}

impl CompositeEventHandler {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn with(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    /// Add `handler` only when `condition` holds.
    pub fn with_if(self, condition: bool, handler: impl EventHandler + 'static) -> Self {
        if condition { self.with(handler) } else { self }
    }

    /// Add a handler from an `Option`. `None` is a no-op.
    pub fn with_opt(self, handler: Option<impl EventHandler + 'static>) -> Self {
        match handler {
            Some(h) => self.with(h),
            None => self,
        }
    }
}

impl Default for CompositeEventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for CompositeEventHandler {
    fn on_event(&self, event: &GameEvent<'_>) {
        for handler in &self.handlers {
            handler.on_event(event);
        }
    }
}

/// Logs events via `tracing`.
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn on_event(&self, event: &GameEvent<'_>) {
        match event {
            GameEvent::PuzzleLoaded { puzzle } => {
                info!("Loaded puzzle {} ({} chars)", puzzle.id, puzzle.scenario.chars().count());
            }
            GameEvent::SessionRestored { session } => {
                info!(
                    "Restored session: puzzle={}, clues={}",
                    session.puzzle.as_ref().map_or("-", |p| p.id.as_str()),
                    session.clues.len()
                );
            }
            GameEvent::LoadFailed { error } => {
                warn!("Puzzle load failed: {error}");
            }
            GameEvent::InputLocked => debug!("Input locked"),
            GameEvent::Waiting { kind, pending } => {
                debug!("Awaiting oracle ({kind:?}): {} chars", pending.chars().count());
            }
            GameEvent::Answered { question, answer, .. } => match answer {
                Answer::Label(label) => info!("Q: {question} → {label}"),
                Answer::Unclassified(raw) => {
                    let preview: String = raw.chars().take(80).collect();
                    warn!("Q: {question} → unclassified reply: {preview}");
                }
            },
            GameEvent::Judged { verdict, .. } => match verdict {
                Answer::Label(label) => info!("Resolution judged: {label}"),
                Answer::Unclassified(_) => warn!("Resolution verdict unclassified"),
            },
            GameEvent::Disclosure { solved, .. } => {
                info!("Resolution disclosed (solved={solved})");
            }
            GameEvent::Hint { text } => debug!("Hint: {} chars", text.chars().count()),
            GameEvent::TurnFailed { kind, error } => warn!("{kind:?} failed: {error}"),
            GameEvent::InputReleased => debug!("Input released"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl EventHandler for Recorder {
        fn on_event(&self, event: &GameEvent<'_>) {
            let name = format!("{event:?}");
            let name = name.split([' ', '{']).next().unwrap_or_default().to_string();
            self.0.lock().unwrap().push(name);
        }
    }

    #[test]
    fn composite_dispatches_to_every_handler_in_order() {
        let a = Recorder::default();
        let b = Recorder::default();
        let handler = CompositeEventHandler::new()
            .with(a.clone())
            .with_if(false, NoopHandler)
            .with_opt(Some(b.clone()))
            .with(LoggingHandler);
        handler.on_event(&GameEvent::InputLocked);
        handler.on_event(&GameEvent::InputReleased);
        assert_eq!(*a.0.lock().unwrap(), ["InputLocked", "InputReleased"]);
        assert_eq!(*b.0.lock().unwrap(), ["InputLocked", "InputReleased"]);
    }

    #[test]
    fn fn_handler_sees_payload() {
        let seen = Arc::new(Mutex::new(String::new()));
        let sink = seen.clone();
        let handler = FnEventHandler::new(move |event| {
            if let GameEvent::Hint { text } = event {
                sink.lock().unwrap().push_str(text);
            }
        });
        handler.on_event(&GameEvent::Hint { text: "想想天气" });
        handler.on_event(&GameEvent::InputReleased);
        assert_eq!(*seen.lock().unwrap(), "想想天气");
    }
}
