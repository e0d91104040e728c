//! Axum server setup and router construction.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use haigui::game::Game;
use haigui::puzzle::DirLibrary;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::error;

use crate::api::{self, AppState};
use crate::broadcast::WsMessage;
use crate::puzzles::{self, PuzzleFiles};
use crate::ws::{self, WsState};

/// Build the full axum router.
///
/// The router serves:
/// - WebSocket at `/ws`
/// - REST API at `/api/*`
/// - Puzzle documents at `/puzzles/` when a puzzle directory is given
/// - Optional static front-end files for everything else
pub fn build_router(
    game: Arc<Game>,
    broadcast_tx: broadcast::Sender<WsMessage>,
    puzzle_dir: Option<PathBuf>,
    static_dir: Option<PathBuf>,
) -> Router {
    let app_state = AppState { game: game.clone() };
    let ws_state = WsState { game, broadcast_tx };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_upgrade))
        .with_state(ws_state);

    let api_routes = Router::new()
        .route("/api/state", get(api::get_state))
        .route("/api/puzzle", post(api::post_puzzle))
        .route("/api/turn", post(api::post_turn))
        .route("/api/hint", post(api::post_hint))
        .route("/api/reveal", post(api::post_reveal))
        .route("/api/transcript", put(api::put_transcript))
        .with_state(app_state);

    let mut router = Router::new().merge(ws_routes).merge(api_routes);

    if let Some(dir) = puzzle_dir {
        let files = PuzzleFiles {
            library: Arc::new(DirLibrary::new(dir)),
        };
        let puzzle_routes = Router::new()
            .route("/puzzles", get(puzzles::get_listing))
            .route("/puzzles/", get(puzzles::get_listing))
            .route("/puzzles/{name}", get(puzzles::get_document))
            .with_state(files);
        router = router.merge(puzzle_routes);
    }

    let mut router = router.layer(cors);

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
}

/// Bind `bind_addr`, serve `router` on a background task, and return the
/// bound address.
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!("Web server stopped: {e}");
        }
    });

    Ok(addr)
}
