//! Turn controller.
//!
//! A turn runs `Idle → AwaitingOracle → Idle`:
//!
//! 1. [`Intent`] splits questions from resolution attempts.
//! 2. [`begin_turn`] builds the prompt.
//! 3. The [`TurnGate`] admits one exchange at a time and emits the
//!    input-lock/release pair around it.
//! 4. [`complete_turn`] classifies the reply and updates the session.
//! 5. [`Game`] persists the session and emits display events.
//!
//! The pure steps live in [`turn`]; [`Game`] is the async wrapper that owns
//! the oracle, the store, the puzzle library, and the session.

pub mod controller;
pub mod events;
pub mod gate;
pub mod intent;
pub mod turn;

use thiserror::Error;

use crate::oracle::OracleError;
use crate::puzzle::{LibraryError, ParseError};

pub use controller::{Game, Start};
pub use events::{
    CompositeEventHandler, EventHandler, FnEventHandler, GameEvent, LoggingHandler, NoopHandler,
};
pub use gate::{TurnGate, TurnPermit};
pub use intent::Intent;
pub use turn::{ControllerState, PendingTurn, TurnKind, TurnOutcome, begin_turn, complete_turn};

/// Why a game operation did not happen.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("no puzzle is loaded")]
    NoPuzzle,
    #[error("another request is still in flight")]
    Busy,
    #[error("input is empty")]
    EmptyInput,
    #[error("invalid puzzle document: {0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Oracle(#[from] OracleError),
    #[error("{0}")]
    Library(#[from] LibraryError),
}
