//! HTTP and WebSocket front for a single haigui game session.
//!
//! `haigui-web` wraps one [`Game`] in an axum server. It renders nothing:
//! the REST API drives the game, the WebSocket stream forwards display
//! events, and `/puzzles/` serves puzzle documents the way a static file
//! server would, so a [`HttpLibrary`](haigui::puzzle::HttpLibrary) (or a
//! browser page) can pick puzzles from it.
//!
//! # Quick start
//!
//! ```ignore
//! use haigui::prelude::*;
//! use haigui_web::{WebBroadcastHandler, WebConfig, WsMessage, spawn_web};
//! use std::sync::Arc;
//!
//! let (ws_tx, _) = tokio::sync::broadcast::channel::<WsMessage>(256);
//! let game = Game::new(oracle, store, DirLibrary::new("puzzles"))
//!     .with_event_handler(
//!         CompositeEventHandler::new()
//!             .with(LoggingHandler)
//!             .with(WebBroadcastHandler::new(ws_tx.clone())),
//!     );
//!
//! let config = WebConfig {
//!     puzzle_dir: Some("puzzles".into()),
//!     ..Default::default()
//! };
//! let addr = spawn_web(Arc::new(game), ws_tx, config).await?;
//! println!("http://{addr}");
//! ```
//!
//! # Architecture
//!
//! ```text
//! Game ──GameEvent──▶ WebBroadcastHandler ──WsMessage──▶ WebSocket clients
//!  ▲                                                           │
//!  └──── /api/turn, /api/hint, /api/puzzle, {"type":"turn"} ◀──┘
//! ```

mod api;
pub mod broadcast;
pub mod puzzles;
mod server;
pub mod snapshot;
mod ws;

pub use api::{ApiError, TurnResponse};
pub use broadcast::{WebBroadcastHandler, WsMessage};
pub use snapshot::GameSnapshot;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use haigui::game::Game;

/// Configuration for the web server.
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:3001`.
    pub bind_addr: SocketAddr,
    /// Directory served under `/puzzles/`. `None` disables the routes.
    pub puzzle_dir: Option<PathBuf>,
    /// Front-end files served for every other path.
    pub static_dir: Option<PathBuf>,
    /// WebSocket broadcast channel capacity. Default: 256.
    ///
    /// Clients that fall behind by this many messages receive a fresh
    /// snapshot to resynchronize.
    pub broadcast_capacity: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            puzzle_dir: None,
            static_dir: None,
            broadcast_capacity: 256,
        }
    }
}

/// Spawn the web server on a Tokio task and return the bound address.
///
/// `broadcast_tx` must be the sender given to the game's
/// [`WebBroadcastHandler`]. The server runs until the runtime shuts down.
pub async fn spawn_web(
    game: Arc<Game>,
    broadcast_tx: tokio::sync::broadcast::Sender<WsMessage>,
    config: WebConfig,
) -> std::io::Result<SocketAddr> {
    let router = server::build_router(game, broadcast_tx, config.puzzle_dir, config.static_dir);
    server::start_server(router, config.bind_addr).await
}
