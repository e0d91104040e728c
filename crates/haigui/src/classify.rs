//! Classify free-form oracle replies into game labels.
//!
//! The oracle is asked to reason first and then emit exactly one label
//! wrapped in [`LABEL_DELIMITERS`]. It does not always comply, so
//! classification never fails: a reply without a recognizable token is
//! [`Answer::Unclassified`] and keeps its full text for display.
//!
//! Only the first delimited token counts. A token must open and close on the
//! same line. Later tokens are counted in
//! [`Classification::tokens_seen`] so callers can log replies that broke the
//! one-label contract.

use crate::label::{Answer, Delimiters, LABEL_DELIMITERS, LabelSet};

/// Result of classifying one oracle reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub answer: Answer,
    /// The reply exactly as received.
    pub raw: String,
    /// Number of delimited tokens found in the reply.
    pub tokens_seen: usize,
}

impl Classification {
    pub fn is_classified(&self) -> bool {
        matches!(self.answer, Answer::Label(_))
    }
}

/// Classify `raw` against the labels acceptable for this interaction.
pub fn classify(raw: &str, expected: LabelSet) -> Classification {
    let tokens = delimited_tokens(raw, LABEL_DELIMITERS);
    let answer = tokens
        .first()
        .and_then(|token| expected.lookup(token))
        .map_or_else(|| Answer::Unclassified(raw.to_string()), Answer::Label);
    Classification {
        answer,
        raw: raw.to_string(),
        tokens_seen: tokens.len(),
    }
}

/// Every non-overlapping delimited token in `text`, in order.
///
/// Mirrors a lazy `\{(.*?)\}` scan: from each opening delimiter, the token
/// runs to the nearest closing delimiter on the same line. An opening
/// delimiter with no closer before the line ends is skipped.
pub fn delimited_tokens(text: &str, delims: Delimiters) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = text;
    while let Some((_, after_open)) = rest.split_once(delims.open) {
        let line = after_open.split(['\n', '\r']).next().unwrap_or_default();
        match line.split_once(delims.close) {
            Some((token, _)) => {
                tokens.push(token);
                let consumed = token.len() + delims.close.len_utf8();
                rest = after_open.get(consumed..).unwrap_or_default();
            }
            None => rest = after_open,
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::{ANSWER_LABELS, Label, VERDICT_LABELS};

    #[test]
    fn single_token_is_classified() {
        let c = classify("分析...{不是}", ANSWER_LABELS);
        assert_eq!(c.answer, Answer::Label(Label::No));
        assert_eq!(c.tokens_seen, 1);
        assert!(c.is_classified());
    }

    #[test]
    fn no_token_keeps_raw_text_verbatim() {
        let raw = "  我觉得这和谜题无关。\n";
        let c = classify(raw, ANSWER_LABELS);
        assert_eq!(c.answer, Answer::Unclassified(raw.to_string()));
        assert_eq!(c.raw, raw);
        assert_eq!(c.tokens_seen, 0);
    }

    #[test]
    fn token_outside_expected_set_is_unclassified() {
        let c = classify("结论：{完全正确}", ANSWER_LABELS);
        assert!(!c.is_classified());
        assert_eq!(c.tokens_seen, 1);
    }

    #[test]
    fn comparison_is_exact() {
        assert!(!classify("{ 是 }", ANSWER_LABELS).is_classified());
        assert!(!classify("{YES}", ANSWER_LABELS).is_classified());
    }

    #[test]
    fn first_of_duplicated_tokens_wins() {
        let c = classify("先说{是}，再改口{不是}", ANSWER_LABELS);
        assert_eq!(c.answer, Answer::Label(Label::Yes));
        assert_eq!(c.tokens_seen, 2);
    }

    #[test]
    fn unmatched_first_token_does_not_fall_through() {
        let c = classify("{嗯} 其实 {是}", ANSWER_LABELS);
        assert!(!c.is_classified());
    }

    #[test]
    fn missing_closing_delimiter_is_unclassified() {
        let c = classify("答案是{不是", ANSWER_LABELS);
        assert!(!c.is_classified());
        assert_eq!(c.tokens_seen, 0);
    }

    #[test]
    fn missing_opening_delimiter_is_unclassified() {
        assert!(!classify("答案是不是}", ANSWER_LABELS).is_classified());
    }

    #[test]
    fn token_cannot_span_lines() {
        let c = classify("{完全\n正确} 然后 {部分正确}", VERDICT_LABELS);
        assert_eq!(c.answer, Answer::Label(Label::PartiallyCorrect));
        assert_eq!(c.tokens_seen, 1);
    }

    #[test]
    fn nested_open_is_part_of_token() {
        assert_eq!(delimited_tokens("{{是}", LABEL_DELIMITERS), vec!["{是"]);
    }

    #[test]
    fn empty_token_is_found_but_unclassified() {
        let c = classify("{}", VERDICT_LABELS);
        assert_eq!(c.tokens_seen, 1);
        assert!(!c.is_classified());
    }
}
