//! Serve one turtle-soup game over HTTP and WebSocket.
//!
//! # Usage
//!
//! ```bash
//! OPENROUTER_KEY=sk-... haigui-web --puzzles ./puzzles
//! OPENROUTER_KEY=sk-... haigui-web --puzzle dinner.md --port 8080
//! OPENROUTER_KEY=sk-... haigui-web --static-dir ./site
//! ```
//!
//! ## Playing
//!
//! **REST** (`POST /api/turn`):
//! ```json
//! {"text": "他是被杀的吗"}
//! ```
//!
//! **WebSocket** (connect to `/ws`):
//! ```json
//! {"type": "turn", "text": "汤底：他吃东西的时候噎死了"}
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use haigui::prelude::*;
use haigui_web::{WebBroadcastHandler, WebConfig, WsMessage, spawn_web};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Serve one turtle-soup game over HTTP and WebSocket.
#[derive(Parser)]
#[command(name = "haigui-web")]
struct Args {
    /// Port for the web server.
    #[arg(long, default_value_t = 3001)]
    port: u16,

    /// Start this puzzle file and discard any saved session.
    #[arg(long)]
    puzzle: Option<String>,

    /// Directory of puzzle documents, also served under /puzzles/.
    #[arg(long, default_value = "puzzles")]
    puzzles: PathBuf,

    /// Front-end files served for every non-API path.
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Saved session file.
    #[arg(long, default_value = ".haigui/state.json")]
    state: PathBuf,

    /// LLM model to use.
    #[arg(long, default_value = haigui::DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature.
    #[arg(long, default_value_t = haigui::DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// Maximum tokens per oracle reply.
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Chat completions endpoint.
    #[arg(long, default_value = haigui::OPENROUTER_URL)]
    endpoint: String,

    /// What the oracle sees of the puzzle.
    #[arg(long, value_enum, default_value_t = PromptContext::Scenario)]
    prompt_context: PromptContext,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = GameConfig {
        model: args.model,
        temperature: args.temperature,
        endpoint: args.endpoint,
        max_tokens: args.max_tokens,
        puzzles: PuzzleSource::Dir(args.puzzles.clone()),
        state_path: args.state,
        prompt_context: args.prompt_context,
        ..Default::default()
    };

    // 1. Oracle client and collaborators.
    let api_key = api_key_from_env()?;
    let oracle = config.build_oracle(api_key).map_err(|e| e.to_string())?;
    let library = config.build_library().map_err(|e| e.to_string())?;

    // 2. WebSocket broadcast channel, fed by the game's event handler.
    let web_config = WebConfig {
        bind_addr: ([127, 0, 0, 1], args.port).into(),
        puzzle_dir: Some(args.puzzles),
        static_dir: args.static_dir,
        ..Default::default()
    };
    let (ws_tx, _) = tokio::sync::broadcast::channel::<WsMessage>(web_config.broadcast_capacity);

    let game = Arc::new(
        Game::new(oracle, config.build_store(), library)
            .with_prompt_context(config.prompt_context)
            .with_event_handler(
                CompositeEventHandler::new()
                    .with(LoggingHandler)
                    .with(WebBroadcastHandler::new(ws_tx.clone())),
            ),
    );

    // 3. Enter the game. A failed start leaves an empty session that
    //    clients can fill through POST /api/puzzle.
    match game.start(args.puzzle.as_deref()).await {
        Ok(start) => info!("Game started: {start:?}"),
        Err(e) => warn!("No puzzle loaded at startup: {e}"),
    }

    // 4. Serve until interrupted.
    let addr = spawn_web(game, ws_tx, web_config)
        .await
        .map_err(|e| format!("failed to bind: {e}"))?;
    println!("Web UI: http://{addr}");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to listen for shutdown: {e}"))?;
    info!("Shutting down");
    Ok(())
}
