use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use super::events::{EventHandler, GameEvent, NoopHandler};
use super::gate::{TurnGate, TurnPermit};
use super::intent::Intent;
use super::turn::{self, ControllerState, TurnKind, TurnOutcome};
use super::GameError;
use crate::oracle::Oracle;
use crate::prompt::{HINT_REQUEST, PromptBuilder, PromptContext, PromptKind};
use crate::puzzle::{Puzzle, PuzzleLibrary, pick_random};
use crate::session::{self, Session, SessionStore};

/// How [`Game::start`] obtained its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Start {
    /// The navigation parameter named a puzzle; saved state was discarded.
    Navigated,
    /// A saved session with a puzzle was restored.
    Restored,
    /// Nothing usable was saved; a random puzzle was loaded.
    Random,
}

/// The single-player game controller.
///
/// Owns the session exclusively. Oracle exchanges and puzzle loads pass
/// through a one-slot [`TurnGate`]: a call made while another is in flight
/// fails with [`GameError::Busy`] and sends nothing.
pub struct Game {
    oracle: Box<dyn Oracle>,
    store: Box<dyn SessionStore>,
    library: Box<dyn PuzzleLibrary>,
    prompts: PromptBuilder,
    events: Arc<dyn EventHandler>,
    gate: TurnGate,
    session: Mutex<Session>,
}

impl Game {
    pub fn new(
        oracle: impl Oracle + 'static,
        store: impl SessionStore + 'static,
        library: impl PuzzleLibrary + 'static,
    ) -> Self {
        Self {
            oracle: Box::new(oracle),
            store: Box::new(store),
            library: Box::new(library),
            prompts: PromptBuilder::default(),
            events: Arc::new(NoopHandler),
            gate: TurnGate::new(),
            session: Mutex::new(Session::default()),
        }
    }

    pub fn with_prompt_context(mut self, context: PromptContext) -> Self {
        self.prompts = PromptBuilder::new(context);
        self
    }

    pub fn with_event_handler(mut self, handler: impl EventHandler + 'static) -> Self {
        self.events = Arc::new(handler);
        self
    }

    pub fn prompt_context(&self) -> PromptContext {
        self.prompts.context()
    }

    pub fn state(&self) -> ControllerState {
        self.gate.state()
    }

    /// A copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.session().clone()
    }

    /// Enter the game.
    ///
    /// Passes through the gate like any other load. With a navigation
    /// parameter the saved state is discarded and that puzzle loaded.
    /// Without one the saved session is restored; when there is none, or
    /// it has no puzzle, a random puzzle is loaded.
    pub async fn start(&self, navigation: Option<&str>) -> Result<Start, GameError> {
        let _permit = self.enter(None)?;
        if let Some(file_name) = navigation {
            if let Err(e) = self.store.clear() {
                warn!("Failed to clear saved session: {e}");
            }
            *self.session() = Session::default();
            self.load(file_name).await?;
            return Ok(Start::Navigated);
        }

        match self.restore() {
            Some(session) if session.puzzle.is_some() => Ok(Start::Restored),
            _ => {
                self.load_random().await?;
                Ok(Start::Random)
            }
        }
    }

    /// Load `file_name` from the library and start a fresh session on it.
    pub async fn open_puzzle(&self, file_name: &str) -> Result<Puzzle, GameError> {
        let _permit = self.enter(None)?;
        self.load(file_name).await
    }

    /// Load a uniformly random puzzle from the library.
    pub async fn open_random(&self) -> Result<Puzzle, GameError> {
        let _permit = self.enter(None)?;
        self.load_random().await
    }

    /// Run one player turn: a question or a `汤底` resolution attempt.
    pub async fn submit(&self, input: &str) -> Result<TurnOutcome, GameError> {
        let intent = Intent::of(input);
        if intent.text().is_empty() {
            return Err(GameError::EmptyInput);
        }
        let kind = TurnKind::from(&intent).prompt_kind();

        let mut permit = self.enter(Some(kind))?;
        let pending = turn::begin_turn(&self.session(), input, &self.prompts)?;
        permit.lock_input(self.events.clone());
        self.events.on_event(&GameEvent::Waiting {
            kind,
            pending: &pending.text,
        });

        let reply = match self.oracle.send(&pending.prompt).await {
            Ok(reply) => reply,
            Err(error) => {
                self.events.on_event(&GameEvent::TurnFailed { kind, error: &error });
                return Err(error.into());
            }
        };

        let outcome = {
            let mut guard = self.session();
            let (next, outcome) = turn::complete_turn(std::mem::take(&mut *guard), &pending, &reply);
            *guard = next;
            self.persist(&guard);
            outcome
        };

        self.emit_outcome(&outcome);
        Ok(outcome)
    }

    /// Ask the oracle for a non-revealing hint.
    pub async fn hint(&self) -> Result<String, GameError> {
        let mut permit = self.enter(Some(PromptKind::Hint))?;
        let prompt = {
            let session = self.session();
            let puzzle = session.puzzle.as_ref().ok_or(GameError::NoPuzzle)?;
            self.prompts.build(PromptKind::Hint, puzzle, "")
        };
        permit.lock_input(self.events.clone());
        self.events.on_event(&GameEvent::Waiting {
            kind: PromptKind::Hint,
            pending: HINT_REQUEST,
        });

        match self.oracle.send(&prompt).await {
            Ok(text) => {
                self.events.on_event(&GameEvent::Hint { text: &text });
                self.persist(&self.session());
                Ok(text)
            }
            Err(error) => {
                self.events.on_event(&GameEvent::TurnFailed {
                    kind: PromptKind::Hint,
                    error: &error,
                });
                Err(error.into())
            }
        }
    }

    /// Disclose the resolution of the current puzzle.
    pub fn reveal(&self) -> Result<String, GameError> {
        let session = self.session();
        let resolution = turn::disclose(&session).ok_or(GameError::NoPuzzle)?;
        self.events.on_event(&GameEvent::Disclosure {
            resolution: &resolution,
            solved: false,
        });
        self.persist(&session);
        Ok(resolution)
    }

    /// Replace the opaque front-end transcript and persist it.
    pub fn set_transcript(&self, transcript: impl Into<String>) {
        let mut session = self.session();
        session.transcript = transcript.into();
        self.persist(&session);
    }

    // ── internals ──────────────────────────────────────────────────

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn enter(&self, kind: Option<PromptKind>) -> Result<TurnPermit, GameError> {
        self.gate.try_enter(kind).ok_or_else(|| {
            debug!("Rejected {kind:?}: request in flight");
            GameError::Busy
        })
    }

    /// Replace the in-memory session with the saved one. Caller holds a permit.
    fn restore(&self) -> Option<Session> {
        let restored = session::load(self.store.as_ref())?;
        *self.session() = restored.clone();
        self.events.on_event(&GameEvent::SessionRestored { session: &restored });
        Some(restored)
    }

    async fn load_random(&self) -> Result<Puzzle, GameError> {
        let file_name = match pick_random(self.library.as_ref()).await {
            Ok(name) => name,
            Err(e) => return Err(self.load_failed(e.into())),
        };
        debug!("Picked random puzzle {file_name}");
        self.load(&file_name).await
    }

    /// Fetch and parse under an already-held permit. The session only
    /// changes once the document parsed.
    async fn load(&self, file_name: &str) -> Result<Puzzle, GameError> {
        let raw = match self.library.fetch(file_name).await {
            Ok(raw) => raw,
            Err(e) => return Err(self.load_failed(e.into())),
        };
        let puzzle = match Puzzle::from_document(file_name, raw) {
            Ok(puzzle) => puzzle,
            Err(e) => return Err(self.load_failed(e.into())),
        };

        {
            let mut session = self.session();
            *session = Session::reset(puzzle.clone());
            self.persist(&session);
        }
        info!("Puzzle {} ready", puzzle.id);
        self.events.on_event(&GameEvent::PuzzleLoaded { puzzle: &puzzle });
        Ok(puzzle)
    }

    fn load_failed(&self, error: GameError) -> GameError {
        self.events.on_event(&GameEvent::LoadFailed {
            error: &error.to_string(),
        });
        error
    }

    fn persist(&self, session: &Session) {
        if let Err(e) = session::save(self.store.as_ref(), session) {
            warn!("Failed to save session: {e}");
        }
    }

    fn emit_outcome(&self, outcome: &TurnOutcome) {
        match outcome {
            TurnOutcome::Answered {
                question,
                classification,
            } => self.events.on_event(&GameEvent::Answered {
                question,
                answer: &classification.answer,
                raw: &classification.raw,
            }),
            TurnOutcome::Judged {
                attempt,
                classification,
                disclosure,
            } => {
                self.events.on_event(&GameEvent::Judged {
                    attempt,
                    verdict: &classification.answer,
                    raw: &classification.raw,
                });
                if let Some(resolution) = disclosure {
                    self.events.on_event(&GameEvent::Disclosure {
                        resolution,
                        solved: true,
                    });
                }
            }
        }
    }
}
