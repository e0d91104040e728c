//! Game configuration with defaults.
//!
//! [`GameConfig`] gathers every knob the binaries expose and turns them into
//! the collaborators a [`Game`](crate::game::Game) needs via
//! [`build_oracle`](GameConfig::build_oracle),
//! [`build_store`](GameConfig::build_store), and
//! [`build_library`](GameConfig::build_library).

use std::path::PathBuf;

use crate::oracle::{OpenRouterOracle, OracleConfig, OracleError};
use crate::prompt::PromptContext;
use crate::puzzle::{DirLibrary, HttpLibrary, LibraryError, PuzzleLibrary};
use crate::session::FileStore;
use crate::{APP_TITLE, DEFAULT_MODEL, DEFAULT_TEMPERATURE, OPENROUTER_URL};

/// Environment variable holding the oracle credential.
pub const API_KEY_ENV: &str = "OPENROUTER_KEY";

/// Where puzzle documents are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleSource {
    /// A local directory of `*.md` files.
    Dir(PathBuf),
    /// A static file server exposing `/puzzles/`.
    Http(String),
}

/// Settings for one game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Model identifier. Default: `"deepseek/deepseek-chat-v3-0324"`.
    pub model: String,
    /// Sampling temperature. Default: `0.7`.
    pub temperature: f32,
    /// Chat completions endpoint. Default: OpenRouter.
    pub endpoint: String,
    /// Completion token cap. Default: none.
    pub max_tokens: Option<u32>,
    /// `X-Title` header value. Default: `"海龟汤AI助手"`.
    pub title: String,
    /// `HTTP-Referer` header value.
    pub referer: String,
    /// Default: `./puzzles`.
    pub puzzles: PuzzleSource,
    /// Saved session file. Default: `.haigui/state.json`.
    pub state_path: PathBuf,
    /// What the oracle sees of the puzzle. Default: scenario only.
    pub prompt_context: PromptContext,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            endpoint: OPENROUTER_URL.to_string(),
            max_tokens: None,
            title: APP_TITLE.to_string(),
            referer: OracleConfig::default().referer,
            puzzles: PuzzleSource::Dir(PathBuf::from("puzzles")),
            state_path: PathBuf::from(".haigui").join("state.json"),
            prompt_context: PromptContext::default(),
        }
    }
}

impl GameConfig {
    pub fn oracle_config(&self) -> OracleConfig {
        OracleConfig {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            referer: self.referer.clone(),
            title: self.title.clone(),
        }
    }

    pub fn build_oracle(&self, api_key: impl Into<String>) -> Result<OpenRouterOracle, OracleError> {
        OpenRouterOracle::new(api_key, self.oracle_config())
    }

    pub fn build_store(&self) -> FileStore {
        FileStore::new(&self.state_path)
    }

    pub fn build_library(&self) -> Result<Box<dyn PuzzleLibrary>, LibraryError> {
        Ok(match &self.puzzles {
            PuzzleSource::Dir(dir) => Box::new(DirLibrary::new(dir)),
            PuzzleSource::Http(base) => Box::new(HttpLibrary::new(base.clone())?),
        })
    }
}

/// Read the oracle credential from [`API_KEY_ENV`].
pub fn api_key_from_env() -> Result<String, String> {
    std::env::var(API_KEY_ENV).map_err(|_| format!("{API_KEY_ENV} environment variable not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_hosted_game() {
        let config = GameConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.max_tokens, None);
        assert_eq!(config.prompt_context, PromptContext::Scenario);
        assert_eq!(config.puzzles, PuzzleSource::Dir(PathBuf::from("puzzles")));
    }

    #[test]
    fn oracle_config_carries_every_field() {
        let config = GameConfig {
            model: "m".into(),
            max_tokens: Some(256),
            endpoint: "http://localhost:1/v1/chat/completions".into(),
            ..Default::default()
        };
        let oracle = config.oracle_config();
        assert_eq!(oracle.model, "m");
        assert_eq!(oracle.max_tokens, Some(256));
        assert_eq!(oracle.endpoint, config.endpoint);
        assert_eq!(oracle.title, APP_TITLE);
    }

    #[test]
    fn build_store_uses_state_path() {
        let config = GameConfig {
            state_path: PathBuf::from("/tmp/x/state.json"),
            ..Default::default()
        };
        assert_eq!(config.build_store().path(), PathBuf::from("/tmp/x/state.json"));
    }

    #[tokio::test]
    async fn build_library_reads_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "### 汤面\nx\n### 汤底\ny").unwrap();
        let config = GameConfig {
            puzzles: PuzzleSource::Dir(dir.path().to_path_buf()),
            ..Default::default()
        };
        let library = config.build_library().unwrap();
        assert_eq!(library.list().await.unwrap(), vec!["a.md".to_string()]);
    }

    #[test]
    fn build_oracle_accepts_any_key() {
        assert!(GameConfig::default().build_oracle("sk-test").is_ok());
    }
}
