//! The closed label vocabulary the oracle must answer with.
//!
//! Labels are exchanged as localized tokens wrapped in a delimiter pair, e.g.
//! `{不是}`. The [`Delimiters`] pair is shared by the prompt builder (which
//! tells the oracle how to format its answer) and the classifier (which looks
//! for that format), so it is versioned as a protocol constant.

use serde::{Deserialize, Serialize};

/// Version of the delimiter/label protocol between prompts and classifier.
pub const LABEL_PROTOCOL_VERSION: u32 = 1;

/// Delimiter pair wrapping a label token in oracle output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub open: char,
    pub close: char,
}

impl Delimiters {
    /// Wrap a token, e.g. `是` → `{是}`.
    pub fn wrap(&self, token: &str) -> String {
        format!("{}{token}{}", self.open, self.close)
    }
}

/// The delimiter pair used by every prompt and by the classifier.
pub const LABEL_DELIMITERS: Delimiters = Delimiters {
    open: '{',
    close: '}',
};

/// Which interaction a label set belongs to.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    /// Answers to yes/no questions.
    Answer,
    /// Verdicts on a proposed resolution.
    Verdict,
}

/// A game-meaningful label.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    Yes,
    No,
    Both,
    Unrelated,
    FullyCorrect,
    PartiallyCorrect,
    FullyWrong,
}

impl Label {
    /// Every label, answers first.
    pub const ALL: [Label; 7] = [
        Label::Yes,
        Label::No,
        Label::Both,
        Label::Unrelated,
        Label::FullyCorrect,
        Label::PartiallyCorrect,
        Label::FullyWrong,
    ];

    /// The localized token the oracle emits for this label.
    pub fn token(self) -> &'static str {
        match self {
            Label::Yes => "是",
            Label::No => "不是",
            Label::Both => "是也不是",
            Label::Unrelated => "没有关系",
            Label::FullyCorrect => "完全正确",
            Label::PartiallyCorrect => "部分正确",
            Label::FullyWrong => "完全错误",
        }
    }

    /// Exact, case-sensitive reverse lookup of [`token`](Self::token).
    pub fn from_token(token: &str) -> Option<Label> {
        Label::ALL.into_iter().find(|l| l.token() == token)
    }

    pub fn kind(self) -> LabelKind {
        match self {
            Label::Yes | Label::No | Label::Both | Label::Unrelated => LabelKind::Answer,
            Label::FullyCorrect | Label::PartiallyCorrect | Label::FullyWrong => {
                LabelKind::Verdict
            }
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// The set of labels acceptable for one interaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSet(&'static [Label]);

/// Labels accepted for a yes/no question.
pub const ANSWER_LABELS: LabelSet =
    LabelSet(&[Label::Yes, Label::No, Label::Both, Label::Unrelated]);

/// Labels accepted for a resolution check.
pub const VERDICT_LABELS: LabelSet = LabelSet(&[
    Label::FullyCorrect,
    Label::PartiallyCorrect,
    Label::FullyWrong,
]);

impl LabelSet {
    pub fn labels(&self) -> &'static [Label] {
        self.0
    }

    pub fn contains(&self, label: Label) -> bool {
        self.0.contains(&label)
    }

    /// Match a raw token against this set (exact, case-sensitive).
    pub fn lookup(&self, token: &str) -> Option<Label> {
        self.0.iter().copied().find(|l| l.token() == token)
    }

    /// Render the set as delimited alternatives for a prompt:
    /// `"{是}"、"{不是}"或"{没有关系}"`.
    pub fn render_choices(&self) -> String {
        let quoted: Vec<String> = self
            .0
            .iter()
            .map(|l| format!("\"{}\"", LABEL_DELIMITERS.wrap(l.token())))
            .collect();
        match quoted.split_last() {
            Some((last, [])) => last.clone(),
            Some((last, init)) => format!("{}或{last}", init.join("、")),
            None => String::new(),
        }
    }
}

/// The outcome of classifying one oracle reply.
///
/// `Unclassified` carries the full raw reply so it can still be shown to the
/// player when the oracle ignored the label format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Answer {
    Label(Label),
    Unclassified(String),
}

impl Answer {
    pub fn label(&self) -> Option<Label> {
        match self {
            Answer::Label(l) => Some(*l),
            Answer::Unclassified(_) => None,
        }
    }

    /// Text to show the player: the label token, or the raw reply.
    pub fn display_text(&self) -> &str {
        match self {
            Answer::Label(l) => l.token(),
            Answer::Unclassified(raw) => raw,
        }
    }
}

impl From<Label> for Answer {
    fn from(label: Label) -> Self {
        Answer::Label(label)
    }
}
