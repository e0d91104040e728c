//! Play turtle-soup puzzles in the terminal.
//!
//! Reads the API key from the `OPENROUTER_KEY` environment variable. Type a
//! yes/no question, or start a line with `汤底` to propose the resolution.
//!
//! # Examples
//!
//! ```sh
//! # Resume the saved game, or start a random puzzle
//! haigui --puzzles ./puzzles
//!
//! # Start a specific puzzle, discarding saved state
//! haigui --puzzle dinner.md
//!
//! # Fetch puzzles from a running haigui-web server
//! haigui --puzzle-url http://localhost:3000
//! ```

use std::path::PathBuf;
use std::process;
use std::sync::{Arc, Mutex};

use chrono::Local;
use clap::Parser;
use haigui::game::events::{DISCLOSURE_PREFIX, HINT_WAITING_TEXT, SOLVED_BANNER, WAITING_TEXT};
use haigui::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Play turtle-soup puzzles in the terminal.
///
/// Reads the API key from the OPENROUTER_KEY environment variable.
#[derive(Parser)]
#[command(name = "haigui")]
struct Cli {
    /// Start this puzzle file and discard any saved session
    #[arg(long)]
    puzzle: Option<String>,

    /// Directory of puzzle documents
    #[arg(long, default_value = "puzzles")]
    puzzles: PathBuf,

    /// Fetch puzzles from a static file server instead of a directory
    #[arg(long, conflicts_with = "puzzles")]
    puzzle_url: Option<String>,

    /// Saved session file
    #[arg(long, default_value = ".haigui/state.json")]
    state: PathBuf,

    /// Model to use for completions
    #[arg(long, default_value = haigui::DEFAULT_MODEL)]
    model: String,

    /// Sampling temperature
    #[arg(long, default_value_t = haigui::DEFAULT_TEMPERATURE)]
    temperature: f32,

    /// Maximum tokens per oracle reply
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Chat completions endpoint
    #[arg(long, default_value = haigui::OPENROUTER_URL)]
    endpoint: String,

    /// What the oracle sees of the puzzle
    #[arg(long, value_enum, default_value_t = PromptContext::Scenario)]
    prompt_context: PromptContext,
}

impl Cli {
    fn config(&self) -> GameConfig {
        GameConfig {
            model: self.model.clone(),
            temperature: self.temperature,
            endpoint: self.endpoint.clone(),
            max_tokens: self.max_tokens,
            puzzles: match &self.puzzle_url {
                Some(url) => PuzzleSource::Http(url.clone()),
                None => PuzzleSource::Dir(self.puzzles.clone()),
            },
            state_path: self.state.clone(),
            prompt_context: self.prompt_context,
            ..Default::default()
        }
    }
}

/// Prints events and keeps the timestamped transcript that is saved with
/// the session.
#[derive(Clone, Default)]
struct Terminal {
    transcript: Arc<Mutex<String>>,
}

impl Terminal {
    fn line(&self, text: &str) {
        println!("{text}");
        let stamp = Local::now().format("%H:%M:%S");
        let mut transcript = self.transcript.lock().unwrap_or_else(|e| e.into_inner());
        for line in text.lines() {
            transcript.push_str(&format!("[{stamp}] {line}\n"));
        }
    }

    fn transcript(&self) -> String {
        self.transcript
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn replace(&self, text: &str) {
        *self.transcript.lock().unwrap_or_else(|e| e.into_inner()) = text.to_string();
    }
}

impl EventHandler for Terminal {
    fn on_event(&self, event: &GameEvent<'_>) {
        match event {
            GameEvent::PuzzleLoaded { puzzle } => {
                self.replace("");
                self.line(&format!("── {} ──\n{}", puzzle.id, puzzle.scenario));
                self.line("你可以通过提问来获取线索，问题请用\"是/不是\"能回答的形式。");
                self.line("当你想猜测汤底时，请以\"汤底\"开头描述你的推理。");
            }
            GameEvent::SessionRestored { session } => {
                self.replace(&session.transcript);
                print!("{}", session.transcript);
            }
            GameEvent::LoadFailed { error } => self.line(&format!("加载谜题失败: {error}")),
            GameEvent::Waiting { kind, pending } => match kind {
                PromptKind::Hint => println!("{HINT_WAITING_TEXT}"),
                _ => println!("> {pending} - {WAITING_TEXT}"),
            },
            GameEvent::Answered { question, answer, .. } => {
                self.line(&format!("> {question} - {}", answer.display_text()));
            }
            GameEvent::Judged { attempt, verdict, .. } => {
                if verdict.label() != Some(Label::FullyCorrect) {
                    self.line(&format!("> 汤底: {attempt} - {}", verdict.display_text()));
                }
            }
            GameEvent::Disclosure { resolution, solved } => {
                if *solved {
                    self.line(SOLVED_BANNER);
                }
                self.line(&format!("{DISCLOSURE_PREFIX}{resolution}"));
            }
            GameEvent::Hint { text } => self.line(text),
            GameEvent::TurnFailed { error, .. } => eprintln!("处理失败: {error}"),
            GameEvent::InputLocked | GameEvent::InputReleased => {}
        }
    }
}

enum Command<'a> {
    Hint,
    Reveal,
    New(Option<&'a str>),
    Quit,
    Turn(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Command<'a> {
        match line.trim().split_once(' ') {
            Some(("/new", name)) => Command::New(Some(name.trim())),
            _ => match line.trim() {
                "/hint" => Command::Hint,
                "/reveal" => Command::Reveal,
                "/new" => Command::New(None),
                "/quit" | "/exit" => Command::Quit,
                _ => Command::Turn(line),
            },
        }
    }
}

/// Start or resume the game. A failed load is reported instead of ending
/// the program; `/new` can load another puzzle.
async fn enter(game: &Game, puzzle: Option<&str>) -> Option<Start> {
    match game.start(puzzle).await {
        Ok(start) => Some(start),
        Err(e) => {
            warn!("No puzzle loaded at startup: {e}");
            eprintln!("用 /new [文件] 加载另一个谜题");
            None
        }
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let config = cli.config();
    let api_key = api_key_from_env()?;
    let terminal = Terminal::default();

    let game = Game::new(
        config.build_oracle(api_key).map_err(|e| e.to_string())?,
        config.build_store(),
        config.build_library().map_err(|e| e.to_string())?,
    )
    .with_prompt_context(config.prompt_context)
    .with_event_handler(
        CompositeEventHandler::new()
            .with(LoggingHandler)
            .with(terminal.clone()),
    );

    enter(&game, cli.puzzle.as_deref()).await;
    game.set_transcript(terminal.transcript());

    println!("(/hint 提示, /reveal 谜底, /new [文件] 换题, /quit 退出)");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.map_err(|e| e.to_string())? {
        let result = match Command::parse(&line) {
            Command::Quit => break,
            Command::Hint => game.hint().await.map(drop),
            Command::Reveal => game.reveal().map(drop),
            Command::New(Some(name)) => game.open_puzzle(name).await.map(drop),
            Command::New(None) => game.open_random().await.map(drop),
            Command::Turn(text) => game.submit(text).await.map(drop),
        };
        match result {
            Ok(()) | Err(GameError::EmptyInput) => {}
            Err(GameError::NoPuzzle) => eprintln!("请先加载一个谜题"),
            Err(GameError::Oracle(_) | GameError::Library(_) | GameError::Parse(_)) => {}
            Err(e) => eprintln!("{e}"),
        }
        game.set_transcript(terminal.transcript());
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;

    impl Oracle for Silent {
        fn send<'a>(&'a self, _prompt: &'a OraclePrompt) -> OracleFuture<'a> {
            Box::pin(async { Err(OracleError::Transport("offline".into())) })
        }
    }

    #[test]
    fn commands_parse() {
        assert!(matches!(Command::parse("/new dinner.md"), Command::New(Some("dinner.md"))));
        assert!(matches!(Command::parse(" /new "), Command::New(None)));
        assert!(matches!(Command::parse("/exit"), Command::Quit));
        assert!(matches!(Command::parse("汤底：他噎死了"), Command::Turn(_)));
    }

    #[tokio::test]
    async fn broken_startup_puzzle_leaves_game_playable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.md"), "no markers").unwrap();
        let game = Game::new(Silent, MemoryStore::new(), DirLibrary::new(dir.path()));

        assert_eq!(enter(&game, None).await, None);
        assert_eq!(enter(&game, Some("missing.md")).await, None);
        assert!(game.snapshot().puzzle.is_none());

        std::fs::write(
            dir.path().join("choke.md"),
            "### 汤面\nA man dies.\n### 汤底\nHe choked.",
        )
        .unwrap();
        let puzzle = game.open_puzzle("choke.md").await.unwrap();
        assert_eq!(puzzle.scenario, "A man dies.");
    }
}
