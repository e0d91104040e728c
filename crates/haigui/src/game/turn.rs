//! The pure half of a turn.
//!
//! [`begin_turn`] validates input against the session and builds the oracle
//! prompt; [`complete_turn`] folds the oracle's reply back into the session.
//! Neither touches the network, the store, or the gate, so both are plain
//! functions over values.

use tracing::warn;

use super::GameError;
use super::intent::Intent;
use crate::classify::{Classification, classify};
use crate::label::{ANSWER_LABELS, Answer, Label, LabelSet, VERDICT_LABELS};
use crate::prompt::{OraclePrompt, PromptBuilder, PromptKind};
use crate::session::{Clue, Session};

/// Where the controller is in its turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    #[default]
    Idle,
    /// One oracle exchange is outstanding.
    AwaitingOracle { kind: PromptKind },
}

/// The two kinds of player turn. Hints are not turns: they leave the
/// session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    Question,
    Resolution,
}

impl TurnKind {
    pub fn prompt_kind(self) -> PromptKind {
        match self {
            TurnKind::Question => PromptKind::Question,
            TurnKind::Resolution => PromptKind::ResolutionCheck,
        }
    }

    fn expected_labels(self) -> LabelSet {
        match self {
            TurnKind::Question => ANSWER_LABELS,
            TurnKind::Resolution => VERDICT_LABELS,
        }
    }
}

impl From<&Intent<'_>> for TurnKind {
    fn from(intent: &Intent<'_>) -> Self {
        match intent {
            Intent::Question(_) => TurnKind::Question,
            Intent::Resolution(_) => TurnKind::Resolution,
        }
    }
}

/// A validated turn waiting on the oracle. Only [`begin_turn`] builds one.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    /// Question text, or the resolution attempt without its prefix.
    pub text: String,
    pub prompt: OraclePrompt,
    kind: TurnKind,
}

impl PendingTurn {
    pub fn kind(&self) -> TurnKind {
        self.kind
    }
}

/// What a completed turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A question was answered and appended as a clue.
    Answered {
        question: String,
        classification: Classification,
    },
    /// A resolution attempt was judged. `disclosure` holds the resolution
    /// text when the verdict was fully correct.
    Judged {
        attempt: String,
        classification: Classification,
        disclosure: Option<String>,
    },
}

impl TurnOutcome {
    pub fn classification(&self) -> &Classification {
        match self {
            TurnOutcome::Answered { classification, .. }
            | TurnOutcome::Judged { classification, .. } => classification,
        }
    }

    pub fn answer(&self) -> &Answer {
        &self.classification().answer
    }

    /// The label token, or the raw reply when unclassified.
    pub fn display_text(&self) -> &str {
        self.answer().display_text()
    }

    pub fn disclosure(&self) -> Option<&str> {
        match self {
            TurnOutcome::Judged { disclosure, .. } => disclosure.as_deref(),
            TurnOutcome::Answered { .. } => None,
        }
    }
}

/// Validate `input` against `session` and build the prompt for it.
pub fn begin_turn(
    session: &Session,
    input: &str,
    builder: &PromptBuilder,
) -> Result<PendingTurn, GameError> {
    let intent = Intent::of(input);
    if intent.text().is_empty() {
        return Err(GameError::EmptyInput);
    }
    let puzzle = session.puzzle.as_ref().ok_or(GameError::NoPuzzle)?;
    let kind = TurnKind::from(&intent);
    Ok(PendingTurn {
        text: intent.text().to_string(),
        prompt: builder.build(kind.prompt_kind(), puzzle, intent.text()),
        kind,
    })
}

/// Classify `reply` and apply it to `session`.
///
/// Questions always append a clue, classified or not. Resolution checks never
/// do; a fully-correct verdict re-derives the resolution for disclosure.
pub fn complete_turn(session: Session, pending: &PendingTurn, reply: &str) -> (Session, TurnOutcome) {
    let classification = classify(reply, pending.kind().expected_labels());
    if classification.tokens_seen > 1 {
        warn!(
            "Oracle reply carried {} delimited tokens, using the first",
            classification.tokens_seen
        );
    }

    match pending.kind() {
        TurnKind::Resolution => {
            let disclosure = if classification.answer == Answer::Label(Label::FullyCorrect) {
                disclose(&session)
            } else {
                None
            };
            let outcome = TurnOutcome::Judged {
                attempt: pending.text.clone(),
                classification,
                disclosure,
            };
            (session, outcome)
        }
        TurnKind::Question => {
            let clue = Clue::new(pending.text.clone(), classification.answer.clone());
            let outcome = TurnOutcome::Answered {
                question: pending.text.clone(),
                classification,
            };
            (session.append_clue(clue), outcome)
        }
    }
}

/// Re-derive the resolution of the session's puzzle.
pub fn disclose(session: &Session) -> Option<String> {
    let puzzle = session.puzzle.as_ref()?;
    match puzzle.resolution() {
        Ok(resolution) => Some(resolution),
        Err(e) => {
            warn!("Cannot re-derive resolution for {}: {e}", puzzle.id);
            None
        }
    }
}
