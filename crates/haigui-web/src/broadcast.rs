//! [`EventHandler`] that converts game events into WebSocket messages.
//!
//! [`WebBroadcastHandler`] turns each [`GameEvent`] into an owned
//! [`WsMessage`] and sends it to every connected client through a
//! `tokio::sync::broadcast` channel.

use haigui::game::{EventHandler, GameEvent};
use haigui::label::Label;
use haigui::prompt::PromptKind;
use serde::Serialize;
use tokio::sync::broadcast;

/// A message sent from the server to WebSocket clients.
///
/// Discriminated on the `type` field when serialized to JSON.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Full game snapshot (sent on connect and after a lag).
    Snapshot { data: serde_json::Value },
    PuzzleLoaded {
        id: String,
        file: String,
        scenario: String,
    },
    SessionRestored { clues: usize },
    LoadFailed { error: String },
    InputLocked,
    /// The pending input is waiting on the oracle.
    Waiting { kind: PromptKind, pending: String },
    Answered {
        question: String,
        answer: String,
        label: Option<Label>,
    },
    Judged {
        attempt: String,
        verdict: String,
        label: Option<Label>,
    },
    Disclosure { resolution: String, solved: bool },
    Hint { text: String },
    TurnFailed { kind: PromptKind, error: String },
    InputReleased,
    /// A client request was refused (busy, no puzzle, empty input).
    Rejected { error: String },
}

impl WsMessage {
    /// Owned wire form of a game event.
    pub fn from_event(event: &GameEvent<'_>) -> Self {
        match event {
            GameEvent::PuzzleLoaded { puzzle } => WsMessage::PuzzleLoaded {
                id: puzzle.id.clone(),
                file: puzzle.file_name.clone(),
                scenario: puzzle.scenario.clone(),
            },
            GameEvent::SessionRestored { session } => WsMessage::SessionRestored {
                clues: session.clues.len(),
            },
            GameEvent::LoadFailed { error } => WsMessage::LoadFailed {
                error: error.to_string(),
            },
            GameEvent::InputLocked => WsMessage::InputLocked,
            GameEvent::Waiting { kind, pending } => WsMessage::Waiting {
                kind: *kind,
                pending: pending.to_string(),
            },
            GameEvent::Answered {
                question, answer, ..
            } => WsMessage::Answered {
                question: question.to_string(),
                answer: answer.display_text().to_string(),
                label: answer.label(),
            },
            GameEvent::Judged {
                attempt, verdict, ..
            } => WsMessage::Judged {
                attempt: attempt.to_string(),
                verdict: verdict.display_text().to_string(),
                label: verdict.label(),
            },
            GameEvent::Disclosure { resolution, solved } => WsMessage::Disclosure {
                resolution: resolution.to_string(),
                solved: *solved,
            },
            GameEvent::Hint { text } => WsMessage::Hint {
                text: text.to_string(),
            },
            GameEvent::TurnFailed { kind, error } => WsMessage::TurnFailed {
                kind: *kind,
                error: error.to_string(),
            },
            GameEvent::InputReleased => WsMessage::InputReleased,
        }
    }
}

/// Event handler that broadcasts game events to WebSocket clients.
///
/// ```ignore
/// let handler = CompositeEventHandler::new()
///     .with(LoggingHandler)
///     .with(WebBroadcastHandler::new(ws_tx.clone()));
/// ```
pub struct WebBroadcastHandler {
    sender: broadcast::Sender<WsMessage>,
}

impl WebBroadcastHandler {
    pub fn new(sender: broadcast::Sender<WsMessage>) -> Self {
        Self { sender }
    }
}

impl EventHandler for WebBroadcastHandler {
    fn on_event(&self, event: &GameEvent<'_>) {
        // No subscribers is fine.
        let _ = self.sender.send(WsMessage::from_event(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haigui::label::Answer;
    use haigui::oracle::OracleError;

    #[test]
    fn ws_message_serializes_with_type_tag() {
        let msg = WsMessage::Waiting {
            kind: PromptKind::ResolutionCheck,
            pending: "他噎死了".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "waiting");
        assert_eq!(json["kind"], "resolution_check");
        assert_eq!(json["pending"], "他噎死了");
    }

    #[test]
    fn answered_carries_label_and_display_text() {
        let answer = Answer::Label(Label::Both);
        let msg = WsMessage::from_event(&GameEvent::Answered {
            question: "q",
            answer: &answer,
            raw: "...{是也不是}",
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "answered");
        assert_eq!(json["answer"], "是也不是");
        assert_eq!(json["label"], "BOTH");
    }

    #[test]
    fn unit_variants_serialize_as_bare_type() {
        let json = serde_json::to_value(WsMessage::InputReleased).unwrap();
        assert_eq!(json, serde_json::json!({"type": "input_released"}));
    }

    #[test]
    fn handler_broadcasts_to_subscribers() {
        let (sender, mut rx) = broadcast::channel(16);
        let handler = WebBroadcastHandler::new(sender);
        let error = OracleError::Status {
            code: 429,
            body: String::new(),
        };
        handler.on_event(&GameEvent::TurnFailed {
            kind: PromptKind::Hint,
            error: &error,
        });
        match rx.try_recv().unwrap() {
            WsMessage::TurnFailed { kind, error } => {
                assert_eq!(kind, PromptKind::Hint);
                assert!(error.contains("429"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn handler_without_subscribers_does_not_panic() {
        let (sender, _) = broadcast::channel(1);
        drop(sender.subscribe());
        WebBroadcastHandler::new(sender).on_event(&GameEvent::InputLocked);
    }
}
