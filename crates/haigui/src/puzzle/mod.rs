//! Puzzle documents and their two-marker section format.
//!
//! A puzzle document is markdown with a public scenario section and a private
//! resolution section, in that order:
//!
//! ```text
//! ### 汤面
//! A man dies.
//! ### 汤底
//! He choked.
//! ### 附加说明
//! (optional notes)
//! ```
//!
//! [`parse_document`] splits a document into its sections. [`Puzzle`] keeps
//! only the raw document and the scenario; the resolution is re-derived on
//! demand so the session never carries it around as a separate field.

pub mod library;

use thiserror::Error;

pub use library::{
    DirLibrary, HttpLibrary, LibraryError, LibraryFuture, PuzzleLibrary, extract_listing_links,
    pick_random,
};

/// Heading that introduces the public scenario.
pub const SCENARIO_MARKER: &str = "### 汤面";
/// Heading that introduces the hidden resolution.
pub const RESOLUTION_MARKER: &str = "### 汤底";
/// Heading that introduces optional host notes after the resolution.
pub const NOTES_MARKER: &str = "### 附加说明";
/// Any section heading; ends the resolution body.
const SECTION_MARKER: &str = "###";

/// File extension of puzzle documents.
pub const PUZZLE_EXTENSION: &str = ".md";

/// A malformed puzzle document. No partial puzzle is ever produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid puzzle format: missing scenario section (`### 汤面`)")]
    MissingScenarioMarker,
    #[error("invalid puzzle format: missing resolution section (`### 汤底`)")]
    MissingResolutionMarker,
}

/// The sections of a parsed puzzle document, trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub scenario: String,
    pub resolution: String,
    pub notes: Option<String>,
}

/// Split a puzzle document into scenario, resolution, and optional notes.
///
/// The scenario runs from the first scenario marker to the first resolution
/// marker after it. The resolution runs from there to the next `###` heading
/// or end of document, so only the first resolution marker is honored.
pub fn parse_document(document: &str) -> Result<ParsedDocument, ParseError> {
    let (_, after_scenario) = document
        .split_once(SCENARIO_MARKER)
        .ok_or(ParseError::MissingScenarioMarker)?;
    let (scenario, after_resolution) = after_scenario
        .split_once(RESOLUTION_MARKER)
        .ok_or(ParseError::MissingResolutionMarker)?;

    let resolution = section_body(after_resolution);
    let notes = after_resolution
        .split_once(NOTES_MARKER)
        .map(|(_, rest)| section_body(rest))
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    Ok(ParsedDocument {
        scenario: scenario.trim().to_string(),
        resolution: resolution.to_string(),
        notes,
    })
}

/// Text up to the next section heading, trimmed.
fn section_body(rest: &str) -> &str {
    rest.split_once(SECTION_MARKER)
        .map_or(rest, |(body, _)| body)
        .trim()
}

/// Build a document from its two mandatory sections.
pub fn compose_document(scenario: &str, resolution: &str) -> String {
    format!("{SCENARIO_MARKER}\n{scenario}\n{RESOLUTION_MARKER}\n{resolution}\n")
}

/// A loaded puzzle: identifier, public scenario, and the raw document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    /// File name without the `.md` extension.
    pub id: String,
    /// File name the document was loaded from.
    pub file_name: String,
    /// Public scenario text.
    pub scenario: String,
    /// The document exactly as loaded.
    pub raw_document: String,
}

impl Puzzle {
    /// Parse a document into a puzzle. Fails without producing a partial
    /// puzzle when either marker is missing.
    pub fn from_document(
        file_name: impl Into<String>,
        raw_document: impl Into<String>,
    ) -> Result<Self, ParseError> {
        let file_name = file_name.into();
        let raw_document = raw_document.into();
        let parsed = parse_document(&raw_document)?;
        Ok(Self {
            id: puzzle_id(&file_name).to_string(),
            file_name,
            scenario: parsed.scenario,
            raw_document,
        })
    }

    /// Re-derive the resolution from the raw document.
    pub fn resolution(&self) -> Result<String, ParseError> {
        parse_document(&self.raw_document).map(|p| p.resolution)
    }

    /// Re-derive the optional host notes from the raw document.
    pub fn notes(&self) -> Option<String> {
        parse_document(&self.raw_document).ok().and_then(|p| p.notes)
    }
}

/// `"dinner.md"` → `"dinner"`.
pub fn puzzle_id(file_name: &str) -> &str {
    file_name
        .strip_suffix(PUZZLE_EXTENSION)
        .unwrap_or(file_name)
}
