//! Resumable game state: the loaded puzzle, the clue log, and the opaque
//! transcript snapshot a front-end hands back for display on resume.
//!
//! A [`Session`] is plain data. The transitions ([`Session::reset`],
//! [`Session::append_clue`]) consume and return it so the controller can
//! treat state changes as values. Persistence goes through a
//! [`SessionStore`] using the [`SessionRecord`] JSON shape:
//!
//! ```json
//! {
//!   "puzzle": "### 汤面\n...\n### 汤底\n...",
//!   "file": "dinner.md",
//!   "clues": [{ "question": "他是被杀的吗", "answer": "不是", "label": "NO" }],
//!   "chatHistory": "<opaque>"
//! }
//! ```

pub mod store;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::label::{Answer, Label};
use crate::puzzle::{ParseError, Puzzle};

pub use store::{FileStore, MemoryStore, SessionStore, StoreError, load, save};

/// One resolved question and the oracle's answer to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clue {
    pub question: String,
    pub answer: Answer,
}

impl Clue {
    pub fn new(question: impl Into<String>, answer: impl Into<Answer>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// The whole resumable state of one game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub puzzle: Option<Puzzle>,
    /// Chronological, append-only between resets.
    pub clues: Vec<Clue>,
    /// Opaque front-end snapshot, stored and returned byte-for-byte.
    pub transcript: String,
}

impl Session {
    /// A fresh session for `puzzle`: no clues, empty transcript.
    pub fn reset(puzzle: Puzzle) -> Session {
        Session {
            puzzle: Some(puzzle),
            clues: Vec::new(),
            transcript: String::new(),
        }
    }

    pub fn append_clue(mut self, clue: Clue) -> Session {
        self.clues.push(clue);
        self
    }

    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Session {
        self.transcript = transcript.into();
        self
    }

    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            puzzle: self.puzzle.as_ref().map(|p| p.raw_document.clone()),
            file: self.puzzle.as_ref().map(|p| p.file_name.clone()),
            clues: self.clues.iter().map(ClueRecord::from).collect(),
            chat_history: self.transcript.clone(),
        }
    }
}

// ── Persisted record ───────────────────────────────────────────────

/// Why a persisted record could not be turned back into a [`Session`].
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("stored puzzle has no file name")]
    MissingFile,
    #[error("stored puzzle does not parse: {0}")]
    Puzzle(#[from] ParseError),
}

/// On-disk shape of a [`Session`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Raw puzzle document.
    #[serde(default)]
    pub puzzle: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub clues: Vec<ClueRecord>,
    #[serde(rename = "chatHistory", default, deserialize_with = "null_as_default")]
    pub chat_history: String,
}

impl SessionRecord {
    pub fn into_session(self) -> Result<Session, RecordError> {
        let puzzle = match self.puzzle {
            Some(raw) => {
                let file = self.file.ok_or(RecordError::MissingFile)?;
                Some(Puzzle::from_document(file, raw)?)
            }
            None => None,
        };
        Ok(Session {
            puzzle,
            clues: self.clues.into_iter().map(Clue::from).collect(),
            transcript: self.chat_history,
        })
    }
}

/// On-disk shape of a [`Clue`].
///
/// `answer` is always the display text. `label` is written as the label name
/// or `null` for unclassified replies; records that predate the field fall
/// back to matching `answer` against the label tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClueRecord {
    pub question: String,
    pub answer: String,
    #[serde(default, deserialize_with = "present")]
    pub label: Option<Option<Label>>,
}

/// Distinguish `"label": null` (`Some(None)`) from an absent field (`None`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Read an explicit `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl From<&Clue> for ClueRecord {
    fn from(clue: &Clue) -> Self {
        ClueRecord {
            question: clue.question.clone(),
            answer: clue.answer.display_text().to_string(),
            label: Some(clue.answer.label()),
        }
    }
}

impl From<ClueRecord> for Clue {
    fn from(record: ClueRecord) -> Self {
        let answer = match record.label {
            Some(Some(label)) => Answer::Label(label),
            Some(None) => Answer::Unclassified(record.answer),
            None => Label::from_token(&record.answer)
                .map_or(Answer::Unclassified(record.answer), Answer::Label),
        };
        Clue {
            question: record.question,
            answer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn puzzle() -> Puzzle {
        Puzzle::from_document("choke.md", "### 汤面\nA man dies.\n### 汤底\nHe choked.").unwrap()
    }

    #[test]
    fn reset_discards_clues_and_transcript() {
        let played = Session::reset(puzzle())
            .append_clue(Clue::new("q1", Label::Yes))
            .with_transcript("<p>hi</p>");
        assert_eq!(played.clues.len(), 1);

        let fresh = Session::reset(puzzle());
        assert!(fresh.clues.is_empty());
        assert!(fresh.transcript.is_empty());
        assert_eq!(fresh.puzzle.as_ref().map(|p| p.id.as_str()), Some("choke"));
    }

    #[test]
    fn append_clue_preserves_order() {
        let s = Session::reset(puzzle())
            .append_clue(Clue::new("first", Label::No))
            .append_clue(Clue::new("second", Answer::Unclassified("嗯?".into())))
            .append_clue(Clue::new("third", Label::Unrelated));
        let questions: Vec<_> = s.clues.iter().map(|c| c.question.as_str()).collect();
        assert_eq!(questions, ["first", "second", "third"]);
    }

    #[test]
    fn record_uses_wire_field_names() {
        let s = Session::reset(puzzle())
            .append_clue(Clue::new("他是被杀的吗", Label::No))
            .with_transcript("x");
        let json = serde_json::to_value(s.to_record()).unwrap();
        assert_eq!(json["file"], "choke.md");
        assert_eq!(json["chatHistory"], "x");
        assert_eq!(json["clues"][0]["answer"], "不是");
        assert_eq!(json["clues"][0]["label"], "NO");
    }

    #[test]
    fn empty_session_record_has_nulls() {
        let json = serde_json::to_value(Session::default().to_record()).unwrap();
        assert!(json["puzzle"].is_null());
        assert!(json["file"].is_null());
        assert_eq!(json["clues"], serde_json::json!([]));
    }

    #[test]
    fn unclassified_answer_that_looks_like_a_token_stays_unclassified() {
        let s = Session::reset(puzzle()).append_clue(Clue::new("q", Answer::Unclassified("是".into())));
        let json = serde_json::to_string(&s.to_record()).unwrap();
        let back: SessionRecord = serde_json::from_str(&json).unwrap();
        let restored = back.into_session().unwrap();
        assert_eq!(restored.clues[0].answer, Answer::Unclassified("是".into()));
    }

    #[test]
    fn legacy_clue_without_label_field_is_matched_by_token() {
        let json = r#"{"puzzle":null,"file":null,"clues":[
            {"question":"a","answer":"是也不是"},
            {"question":"b","answer":"我不确定"}
        ],"chatHistory":""}"#;
        let record: SessionRecord = serde_json::from_str(json).unwrap();
        let s = record.into_session().unwrap();
        assert_eq!(s.clues[0].answer, Answer::Label(Label::Both));
        assert_eq!(s.clues[1].answer, Answer::Unclassified("我不确定".into()));
    }

    #[test]
    fn missing_fields_default() {
        let record: SessionRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record.into_session().unwrap(), Session::default());
    }

    #[test]
    fn unparseable_stored_puzzle_is_an_error() {
        let record = SessionRecord {
            puzzle: Some("no markers".into()),
            file: Some("x.md".into()),
            ..Default::default()
        };
        assert!(matches!(record.into_session(), Err(RecordError::Puzzle(_))));

        let orphan = SessionRecord {
            puzzle: Some(puzzle().raw_document),
            file: None,
            ..Default::default()
        };
        assert!(matches!(orphan.into_session(), Err(RecordError::MissingFile)));
    }

    #[test]
    fn null_clues_and_history_read_as_empty() {
        let json = r#"{"puzzle":null,"file":null,"clues":null,"chatHistory":null}"#;
        let record: SessionRecord = serde_json::from_str(json).unwrap();
        assert!(record.clues.is_empty());
        assert!(record.chat_history.is_empty());
        assert_eq!(record.into_session().unwrap(), Session::default());
    }
}
