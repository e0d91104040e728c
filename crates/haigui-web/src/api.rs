//! REST API endpoint handlers.
//!
//! Every game action is available here with request/response semantics.
//! The same actions also emit [`WsMessage`]s through the game's event
//! handler, so WebSocket clients observe REST-driven turns too.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use haigui::game::{Game, GameError, TurnOutcome};
use haigui::label::Label;
use haigui::puzzle::LibraryError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::snapshot::GameSnapshot;

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub game: Arc<Game>,
}

/// A [`GameError`] rendered as `{"error": "..."}` with a matching status.
pub struct ApiError(pub GameError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GameError::Busy => StatusCode::CONFLICT,
            GameError::NoPuzzle | GameError::EmptyInput => StatusCode::BAD_REQUEST,
            GameError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GameError::Oracle(_) => StatusCode::BAD_GATEWAY,
            GameError::Library(LibraryError::NotFound(_)) => StatusCode::NOT_FOUND,
            GameError::Library(LibraryError::InvalidName(_)) => StatusCode::BAD_REQUEST,
            GameError::Library(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<GameError> for ApiError {
    fn from(e: GameError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        debug!("API error {status}: {}", self.0);
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// GET /api/state — Full game snapshot.
pub async fn get_state(State(app): State<AppState>) -> Json<GameSnapshot> {
    Json(GameSnapshot::from_game(&app.game))
}

/// Request body for POST /api/puzzle.
#[derive(Deserialize, Default)]
pub struct PuzzleRequest {
    /// File name to load; a random puzzle when absent.
    #[serde(default)]
    pub puzzle: Option<String>,
}

/// POST /api/puzzle — Start a fresh session on a named or random puzzle.
pub async fn post_puzzle(
    State(app): State<AppState>,
    Json(body): Json<PuzzleRequest>,
) -> Result<Json<GameSnapshot>, ApiError> {
    match body.puzzle.as_deref() {
        Some(name) => app.game.open_puzzle(name).await?,
        None => app.game.open_random().await?,
    };
    Ok(Json(GameSnapshot::from_game(&app.game)))
}

/// Request body for POST /api/turn.
#[derive(Deserialize)]
pub struct TurnRequest {
    pub text: String,
}

/// Response body for POST /api/turn.
#[derive(Serialize, Debug)]
pub struct TurnResponse {
    /// `"question"` or `"resolution"`.
    pub kind: &'static str,
    /// Label token, or the raw reply when unclassified.
    pub answer: String,
    pub label: Option<Label>,
    /// The oracle's full reply.
    pub raw: String,
    /// Resolution text after a fully-correct verdict.
    pub disclosure: Option<String>,
}

impl From<&TurnOutcome> for TurnResponse {
    fn from(outcome: &TurnOutcome) -> Self {
        Self {
            kind: match outcome {
                TurnOutcome::Answered { .. } => "question",
                TurnOutcome::Judged { .. } => "resolution",
            },
            answer: outcome.display_text().to_string(),
            label: outcome.answer().label(),
            raw: outcome.classification().raw.clone(),
            disclosure: outcome.disclosure().map(str::to_string),
        }
    }
}

/// POST /api/turn — Ask a question or propose a `汤底` resolution.
///
/// 409 while another request is in flight, 502 when the oracle fails, 400
/// without a puzzle or with empty input.
pub async fn post_turn(
    State(app): State<AppState>,
    Json(body): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let outcome = app.game.submit(&body.text).await?;
    Ok(Json(TurnResponse::from(&outcome)))
}

#[derive(Serialize)]
pub struct HintResponse {
    pub hint: String,
}

/// POST /api/hint — Fetch a non-revealing hint.
pub async fn post_hint(State(app): State<AppState>) -> Result<Json<HintResponse>, ApiError> {
    let hint = app.game.hint().await?;
    Ok(Json(HintResponse { hint }))
}

#[derive(Serialize)]
pub struct RevealResponse {
    pub resolution: String,
}

/// POST /api/reveal — Disclose the resolution.
pub async fn post_reveal(State(app): State<AppState>) -> Result<Json<RevealResponse>, ApiError> {
    let resolution = app.game.reveal()?;
    Ok(Json(RevealResponse { resolution }))
}

/// Request body for PUT /api/transcript.
#[derive(Deserialize)]
pub struct TranscriptRequest {
    #[serde(rename = "chatHistory")]
    pub chat_history: String,
}

/// PUT /api/transcript — Store the client's opaque transcript snapshot.
pub async fn put_transcript(
    State(app): State<AppState>,
    Json(body): Json<TranscriptRequest>,
) -> StatusCode {
    app.game.set_transcript(body.chat_history);
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use haigui::oracle::OracleError;

    #[test]
    fn puzzle_request_allows_missing_name() {
        let req: PuzzleRequest = serde_json::from_str("{}").unwrap();
        assert!(req.puzzle.is_none());
        let req: PuzzleRequest = serde_json::from_str(r#"{"puzzle":"a.md"}"#).unwrap();
        assert_eq!(req.puzzle.as_deref(), Some("a.md"));
    }

    #[test]
    fn transcript_request_uses_wire_name() {
        let req: TranscriptRequest = serde_json::from_str(r#"{"chatHistory":"<p/>"}"#).unwrap();
        assert_eq!(req.chat_history, "<p/>");
    }

    #[test]
    fn errors_map_to_statuses() {
        let status = |e: GameError| ApiError(e).status();
        assert_eq!(status(GameError::Busy), StatusCode::CONFLICT);
        assert_eq!(status(GameError::NoPuzzle), StatusCode::BAD_REQUEST);
        assert_eq!(status(GameError::EmptyInput), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(GameError::Oracle(OracleError::Transport("dns".into()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(GameError::Library(LibraryError::NotFound("x.md".into()))),
            StatusCode::NOT_FOUND
        );
    }
}
