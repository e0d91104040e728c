//! Serializable projection of a game for WebSocket and REST transport.
//!
//! [`Session`] holds the raw puzzle document, which includes the resolution.
//! [`GameSnapshot`] exposes only what a player may see: the puzzle id, file
//! name, and scenario, plus the clue log and the opaque transcript.

use haigui::game::{ControllerState, Game};
use haigui::label::Label;
use haigui::session::Session;
use serde::Serialize;

/// Serializable view of a [`Game`].
#[derive(Debug, Clone, Serialize)]
pub struct GameSnapshot {
    /// `"idle"` or `"awaiting_oracle"`.
    pub state: &'static str,
    pub puzzle: Option<PuzzleView>,
    pub clues: Vec<ClueView>,
    #[serde(rename = "chatHistory")]
    pub chat_history: String,
}

/// The public part of a loaded puzzle.
#[derive(Debug, Clone, Serialize)]
pub struct PuzzleView {
    pub id: String,
    pub file: String,
    pub scenario: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClueView {
    pub question: String,
    /// Label token, or the raw reply when unclassified.
    pub answer: String,
    pub label: Option<Label>,
}

impl GameSnapshot {
    pub fn from_game(game: &Game) -> Self {
        Self::from_parts(game.state(), &game.snapshot())
    }

    pub fn from_parts(state: ControllerState, session: &Session) -> Self {
        Self {
            state: match state {
                ControllerState::Idle => "idle",
                ControllerState::AwaitingOracle { .. } => "awaiting_oracle",
            },
            puzzle: session.puzzle.as_ref().map(|p| PuzzleView {
                id: p.id.clone(),
                file: p.file_name.clone(),
                scenario: p.scenario.clone(),
            }),
            clues: session
                .clues
                .iter()
                .map(|c| ClueView {
                    question: c.question.clone(),
                    answer: c.answer.display_text().to_string(),
                    label: c.answer.label(),
                })
                .collect(),
            chat_history: session.transcript.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haigui::label::Answer;
    use haigui::prompt::PromptKind;
    use haigui::puzzle::Puzzle;
    use haigui::session::Clue;

    #[test]
    fn empty_session_snapshot() {
        let snap = GameSnapshot::from_parts(ControllerState::Idle, &Session::default());
        let json = snap.to_json();
        assert_eq!(json["state"], "idle");
        assert!(json["puzzle"].is_null());
        assert_eq!(json["clues"], serde_json::json!([]));
        assert_eq!(json["chatHistory"], "");
    }

    #[test]
    fn snapshot_hides_resolution() {
        let puzzle =
            Puzzle::from_document("choke.md", "### 汤面\nA man dies.\n### 汤底\nHe choked.").unwrap();
        let session = Session::reset(puzzle)
            .append_clue(Clue::new("q1", Label::No))
            .append_clue(Clue::new("q2", Answer::Unclassified("嗯".into())));
        let snap = GameSnapshot::from_parts(
            ControllerState::AwaitingOracle {
                kind: PromptKind::Question,
            },
            &session,
        );
        let text = serde_json::to_string(&snap).unwrap();
        assert!(!text.contains("He choked."));

        let json = snap.to_json();
        assert_eq!(json["state"], "awaiting_oracle");
        assert_eq!(json["puzzle"]["id"], "choke");
        assert_eq!(json["puzzle"]["scenario"], "A man dies.");
        assert_eq!(json["clues"][0]["label"], "NO");
        assert_eq!(json["clues"][1]["answer"], "嗯");
        assert!(json["clues"][1]["label"].is_null());
    }
}
