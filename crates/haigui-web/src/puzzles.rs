//! Static puzzle file routes: `GET /puzzles/` and `GET /puzzles/{name}`.
//!
//! The listing is a minimal HTML page whose anchors point at the `.md`
//! documents, the shape [`HttpLibrary`](haigui::puzzle::HttpLibrary) expects.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use haigui::puzzle::{DirLibrary, LibraryError, PuzzleLibrary};
use tracing::warn;

/// Shared state for puzzle routes.
#[derive(Clone)]
pub struct PuzzleFiles {
    pub library: Arc<DirLibrary>,
}

/// GET /puzzles/ — HTML directory listing of `*.md` files.
pub async fn get_listing(State(files): State<PuzzleFiles>) -> Response {
    match files.library.list().await {
        Ok(names) => Html(render_listing(&names)).into_response(),
        Err(e) => library_error(e),
    }
}

/// GET /puzzles/{name} — one puzzle document as UTF-8 text.
pub async fn get_document(
    State(files): State<PuzzleFiles>,
    Path(name): Path<String>,
) -> Response {
    match files.library.fetch(&name).await {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
            text,
        )
            .into_response(),
        Err(e) => library_error(e),
    }
}

fn library_error(error: LibraryError) -> Response {
    let status = match &error {
        LibraryError::NotFound(_) => StatusCode::NOT_FOUND,
        LibraryError::InvalidName(_) => StatusCode::BAD_REQUEST,
        _ => {
            warn!("Puzzle route failed: {error}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, error.to_string()).into_response()
}

/// Anchors are relative so they resolve under `/puzzles/`.
pub fn render_listing(names: &[String]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>/puzzles/</title></head>\n<body>\n<ul>\n",
    );
    for name in names {
        let escaped = escape(name);
        html.push_str(&format!("<li><a href=\"{escaped}\">{escaped}</a></li>\n"));
    }
    html.push_str("</ul>\n</body>\n</html>\n");
    html
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use haigui::puzzle::extract_listing_links;

    #[test]
    fn listing_round_trips_through_link_extraction() {
        let names = vec!["a.md".to_string(), "a&b.md".to_string(), "晚餐.md".to_string()];
        assert_eq!(extract_listing_links(&render_listing(&names)), names);
    }

    #[test]
    fn listing_escapes_markup() {
        let html = render_listing(&["<x>.md".to_string()]);
        assert!(html.contains("&lt;x&gt;.md"));
        assert!(!html.contains("<x>"));
    }
}
