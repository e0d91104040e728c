//! Where puzzle documents come from.
//!
//! A [`PuzzleLibrary`] lists available puzzle files and fetches one by name.
//! [`DirLibrary`] reads a local directory; [`HttpLibrary`] talks to a static
//! file server that exposes `GET /puzzles/` (an HTML directory listing) and
//! `GET /puzzles/<name>` (the document itself).

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::LazyLock;
use std::time::Duration;

use rand::seq::SliceRandom;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use super::PUZZLE_EXTENSION;

/// Boxed future returned by [`PuzzleLibrary`] methods.
pub type LibraryFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LibraryError>> + Send + 'a>>;

/// Failure to list or fetch puzzles.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("no puzzle files found")]
    Empty,
    #[error("puzzle not found: {0}")]
    NotFound(String),
    #[error("invalid puzzle name: {0:?}")]
    InvalidName(String),
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
    #[error("puzzle server returned HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("puzzle request failed: {0}")]
    Transport(String),
}

/// A source of puzzle documents.
pub trait PuzzleLibrary: Send + Sync {
    /// File names of every available puzzle (e.g. `"dinner.md"`).
    fn list(&self) -> LibraryFuture<'_, Vec<String>>;

    /// Raw text of one puzzle document.
    fn fetch<'a>(&'a self, file_name: &'a str) -> LibraryFuture<'a, String>;
}

impl<L: PuzzleLibrary + ?Sized> PuzzleLibrary for Box<L> {
    fn list(&self) -> LibraryFuture<'_, Vec<String>> {
        (**self).list()
    }

    fn fetch<'a>(&'a self, file_name: &'a str) -> LibraryFuture<'a, String> {
        (**self).fetch(file_name)
    }
}

impl<L: PuzzleLibrary + ?Sized> PuzzleLibrary for std::sync::Arc<L> {
    fn list(&self) -> LibraryFuture<'_, Vec<String>> {
        (**self).list()
    }

    fn fetch<'a>(&'a self, file_name: &'a str) -> LibraryFuture<'a, String> {
        (**self).fetch(file_name)
    }
}

/// List the library and pick one file name uniformly at random.
pub async fn pick_random(library: &dyn PuzzleLibrary) -> Result<String, LibraryError> {
    let names = library.list().await?;
    choose(&names).cloned().ok_or(LibraryError::Empty)
}

fn choose(names: &[String]) -> Option<&String> {
    names.choose(&mut rand::thread_rng())
}

/// Reject names that could escape the puzzle directory or are not puzzles.
fn validate_name(file_name: &str) -> Result<(), LibraryError> {
    let bad = file_name.is_empty()
        || file_name.contains('/')
        || file_name.contains('\\')
        || file_name.contains("..")
        || !file_name.ends_with(PUZZLE_EXTENSION);
    if bad {
        return Err(LibraryError::InvalidName(file_name.to_string()));
    }
    Ok(())
}

// ── Directory ──────────────────────────────────────────────────────

/// Puzzles stored as `*.md` files in one local directory.
pub struct DirLibrary {
    root: PathBuf,
}

impl DirLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    async fn list_files(&self) -> Result<Vec<String>, LibraryError> {
        let io_err = |e: std::io::Error| LibraryError::Io {
            path: self.root.display().to_string(),
            message: e.to_string(),
        };
        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(io_err)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(PUZZLE_EXTENSION) && entry.file_type().await.is_ok_and(|t| t.is_file())
            {
                names.push(name);
            }
        }
        names.sort();
        debug!("Found {} puzzle(s) in {}", names.len(), self.root.display());
        Ok(names)
    }

    async fn read_file(&self, file_name: &str) -> Result<String, LibraryError> {
        validate_name(file_name)?;
        let path = self.root.join(file_name);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(LibraryError::NotFound(file_name.to_string()))
            }
            Err(e) => Err(LibraryError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }
}

impl PuzzleLibrary for DirLibrary {
    fn list(&self) -> LibraryFuture<'_, Vec<String>> {
        Box::pin(self.list_files())
    }

    fn fetch<'a>(&'a self, file_name: &'a str) -> LibraryFuture<'a, String> {
        Box::pin(self.read_file(file_name))
    }
}

// ── HTTP ───────────────────────────────────────────────────────────

/// Puzzles served by a static file server under `/puzzles/`.
pub struct HttpLibrary {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLibrary {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:3001`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, LibraryError> {
        let client = reqwest::Client::builder()
            .user_agent("haigui/0.1")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LibraryError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_text(&self, url: String) -> Result<String, LibraryError> {
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LibraryError::Transport(e.to_string()))?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LibraryError::NotFound(url));
        }
        if !status.is_success() {
            return Err(LibraryError::Status {
                status: status.as_u16(),
                url,
            });
        }
        resp.text()
            .await
            .map_err(|e| LibraryError::Transport(format!("failed to read response: {e}")))
    }

    async fn list_remote(&self) -> Result<Vec<String>, LibraryError> {
        let html = self.get_text(format!("{}/puzzles/", self.base_url)).await?;
        let names = extract_listing_links(&html);
        debug!("Puzzle listing has {} link(s)", names.len());
        Ok(names)
    }

    async fn fetch_remote(&self, file_name: &str) -> Result<String, LibraryError> {
        validate_name(file_name)?;
        self.get_text(format!("{}/puzzles/{file_name}", self.base_url))
            .await
    }
}

impl PuzzleLibrary for HttpLibrary {
    fn list(&self) -> LibraryFuture<'_, Vec<String>> {
        Box::pin(self.list_remote())
    }

    fn fetch<'a>(&'a self, file_name: &'a str) -> LibraryFuture<'a, String> {
        Box::pin(self.fetch_remote(file_name))
    }
}

static MD_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\s[^>]*href\s*=\s*["']([^"']+\.md)["']"#).expect("valid link regex")
});

/// File names of the `.md` anchors in an HTML directory listing, in
/// document order without duplicates. Only the last path segment is kept,
/// so `/puzzles/a.md` and `a.md` both yield `a.md`.
pub fn extract_listing_links(html: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for cap in MD_LINK.captures_iter(html) {
        let href = unescape(&cap[1]);
        let name = href.rsplit('/').next().unwrap_or_default().to_string();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Decode the entities an HTML listing uses inside attribute values.
fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
