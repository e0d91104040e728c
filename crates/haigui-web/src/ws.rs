//! WebSocket upgrade handler and message dispatch.
//!
//! Each connected client receives:
//! 1. A full [`GameSnapshot`] on connect.
//! 2. Incremental [`WsMessage`] updates as game events fire.
//!
//! Clients can send JSON messages back to drive the game (turns, hints,
//! reveal, transcript updates).

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt, stream::SplitSink};
use haigui::game::{Game, GameError};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::broadcast::WsMessage;
use crate::snapshot::GameSnapshot;

/// Shared state for WebSocket handlers.
#[derive(Clone)]
pub struct WsState {
    pub game: Arc<Game>,
    pub broadcast_tx: broadcast::Sender<WsMessage>,
}

/// A message received from a WebSocket client.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Turn { text: String },
    Hint,
    Reveal,
    Puzzle {
        #[serde(default)]
        puzzle: Option<String>,
    },
    Transcript {
        #[serde(rename = "chatHistory")]
        chat_history: String,
    },
}

/// GET /ws — WebSocket upgrade handler.
pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(ws_state): State<WsState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, ws_state))
}

fn snapshot_message(game: &Game) -> WsMessage {
    WsMessage::Snapshot {
        data: GameSnapshot::from_game(game).to_json(),
    }
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, ws_state: WsState) {
    let (mut sink, mut stream) = socket.split();

    // Subscribe before the snapshot so no event falls between the two.
    let mut broadcast_rx = ws_state.broadcast_tx.subscribe();

    if ws_send(&mut sink, &snapshot_message(&ws_state.game)).await.is_err() {
        return;
    }

    debug!("WebSocket client connected");

    let game_for_resync = ws_state.game.clone();
    let forward_task = tokio::spawn(async move {
        loop {
            match broadcast_rx.recv().await {
                Ok(msg) => {
                    if ws_send(&mut sink, &msg).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket client lagged by {n} messages, resending snapshot");
                    if ws_send(&mut sink, &snapshot_message(&game_for_resync))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(text) => handle_client_message(&text, &ws_state),
            Message::Close(_) => break,
            _ => {}
        }
    }

    debug!("WebSocket client disconnected");
    forward_task.abort();
}

/// Process a JSON message received from a client.
///
/// Game actions run on their own task so the socket keeps reading; their
/// results reach clients as broadcast events. Refusals are broadcast as
/// [`WsMessage::Rejected`].
fn handle_client_message(text: &str, ws_state: &WsState) {
    let Ok(msg) = serde_json::from_str::<ClientMessage>(text) else {
        debug!("Ignoring malformed WebSocket message");
        return;
    };

    let game = ws_state.game.clone();
    let tx = ws_state.broadcast_tx.clone();
    tokio::spawn(async move {
        let result = match msg {
            ClientMessage::Turn { text } => game.submit(&text).await.map(drop),
            ClientMessage::Hint => game.hint().await.map(drop),
            ClientMessage::Reveal => game.reveal().map(drop),
            ClientMessage::Puzzle { puzzle: Some(name) } => game.open_puzzle(&name).await.map(drop),
            ClientMessage::Puzzle { puzzle: None } => game.open_random().await.map(drop),
            ClientMessage::Transcript { chat_history } => {
                game.set_transcript(chat_history);
                Ok(())
            }
        };
        match result {
            // Oracle and load failures were already broadcast as events.
            Ok(()) | Err(GameError::Oracle(_) | GameError::Library(_) | GameError::Parse(_)) => {}
            Err(e) => {
                let _ = tx.send(WsMessage::Rejected {
                    error: e.to_string(),
                });
            }
        }
    });
}

/// Serialize a `WsMessage` and send it over the WebSocket sink.
async fn ws_send(sink: &mut SplitSink<WebSocket, Message>, msg: &WsMessage) -> Result<(), ()> {
    let json = serde_json::to_string(msg).unwrap_or_default();
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_deserialize() {
        let turn: ClientMessage = serde_json::from_str(r#"{"type":"turn","text":"他是被杀的吗"}"#).unwrap();
        assert!(matches!(turn, ClientMessage::Turn { text } if text == "他是被杀的吗"));

        let hint: ClientMessage = serde_json::from_str(r#"{"type":"hint"}"#).unwrap();
        assert!(matches!(hint, ClientMessage::Hint));

        let random: ClientMessage = serde_json::from_str(r#"{"type":"puzzle"}"#).unwrap();
        assert!(matches!(random, ClientMessage::Puzzle { puzzle: None }));

        let transcript: ClientMessage =
            serde_json::from_str(r#"{"type":"transcript","chatHistory":"x"}"#).unwrap();
        assert!(matches!(transcript, ClientMessage::Transcript { chat_history } if chat_history == "x"));
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"quit"}"#).is_err());
    }
}
