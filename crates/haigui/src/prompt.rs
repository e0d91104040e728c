//! Oracle prompts for the three interaction kinds.
//!
//! Every prompt is an instruction turn (role `system`) followed by one user
//! turn. Question and resolution-check instructions pin the output format to
//! a single delimited label from [`ANSWER_LABELS`] or [`VERDICT_LABELS`];
//! the classifier in [`crate::classify`] relies on that contract.

use serde::{Deserialize, Serialize};

use crate::Message;
use crate::label::{ANSWER_LABELS, LABEL_DELIMITERS, Label, LabelSet, VERDICT_LABELS};
use crate::puzzle::Puzzle;

/// User turn for a hint request.
pub const HINT_REQUEST: &str = "请给我一个提示";

/// Prefix of the user turn for a resolution check.
pub const RESOLUTION_USER_PREFIX: &str = "汤底: ";

/// What the instruction turn embeds as the puzzle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PromptContext {
    /// The public scenario only. The resolution never reaches the oracle.
    #[default]
    Scenario,
    /// The whole raw document, resolution included.
    FullDocument,
}

/// The three interactions the oracle takes part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Hint,
    Question,
    ResolutionCheck,
}

impl PromptKind {
    /// Labels the classifier should accept for replies to this kind.
    /// Hints are free text.
    pub fn expected_labels(self) -> Option<LabelSet> {
        match self {
            PromptKind::Hint => None,
            PromptKind::Question => Some(ANSWER_LABELS),
            PromptKind::ResolutionCheck => Some(VERDICT_LABELS),
        }
    }
}

/// An instruction turn plus a user turn, ready to send.
#[derive(Debug, Clone)]
pub struct OraclePrompt {
    pub kind: PromptKind,
    pub instruction: Message,
    pub user: Message,
}

impl OraclePrompt {
    /// Messages in wire order.
    pub fn messages(&self) -> Vec<Message> {
        vec![self.instruction.clone(), self.user.clone()]
    }
}

/// Numbered-rule instruction text:
///
/// ```text
/// <preamble>
/// 谜题: <puzzle>
/// 规则:
/// 1. ...
/// ```
struct Instructions {
    preamble: &'static str,
    puzzle: String,
    rules: Vec<String>,
}

impl Instructions {
    fn new(preamble: &'static str, puzzle: &str) -> Self {
        Self {
            preamble,
            puzzle: puzzle.to_string(),
            rules: Vec::new(),
        }
    }

    fn rule(mut self, rule: impl Into<String>) -> Self {
        self.rules.push(rule.into());
        self
    }

    fn build(self) -> String {
        let mut out = format!("{}\n谜题: {}\n规则:", self.preamble, self.puzzle);
        for (i, rule) in self.rules.iter().enumerate() {
            out.push_str(&format!("\n{}. {rule}", i + 1));
        }
        out
    }
}

/// Builds [`OraclePrompt`]s for a puzzle.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder {
    context: PromptContext,
}

impl PromptBuilder {
    pub fn new(context: PromptContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> PromptContext {
        self.context
    }

    /// Assemble the prompt for `kind`. `user_text` is the question or the
    /// proposed resolution (without its prefix); it is ignored for hints.
    pub fn build(&self, kind: PromptKind, puzzle: &Puzzle, user_text: &str) -> OraclePrompt {
        let (instruction, user) = match kind {
            PromptKind::Hint => (self.hint_instructions(puzzle), HINT_REQUEST.to_string()),
            PromptKind::Question => (self.question_instructions(puzzle), user_text.to_string()),
            PromptKind::ResolutionCheck => (
                self.resolution_instructions(puzzle),
                format!("{RESOLUTION_USER_PREFIX}{user_text}"),
            ),
        };
        OraclePrompt {
            kind,
            instruction: Message::system(instruction),
            user: Message::user(user),
        }
    }

    fn puzzle_text<'a>(&self, puzzle: &'a Puzzle) -> &'a str {
        match self.context {
            PromptContext::Scenario => &puzzle.scenario,
            PromptContext::FullDocument => &puzzle.raw_document,
        }
    }

    fn hint_instructions(&self, puzzle: &Puzzle) -> String {
        Instructions::new(
            "你是一个海龟汤游戏主持人，根据以下谜题提供一个不泄露谜底的提示：",
            self.puzzle_text(puzzle),
        )
        .rule("提示应该引导思考但不要直接给出答案")
        .rule("提示应该简短明了")
        .build()
    }

    fn question_instructions(&self, puzzle: &Puzzle) -> String {
        Instructions::new(
            "你是一个海龟汤游戏主持人，根据以下谜题和规则回答问题：",
            self.puzzle_text(puzzle),
        )
        .rule("先对谜题和问题进行简单分析，然后再给出回答")
        .rule(format!("回答必须用{}格式", ANSWER_LABELS.render_choices()))
        .rule(format!("如果问题部分正确回答\"{}\"", wrapped(Label::Both)))
        .rule(format!("如果问题与谜题无关回答\"{}\"", wrapped(Label::Unrelated)))
        .rule(single_label_rule())
        .build()
    }

    fn resolution_instructions(&self, puzzle: &Puzzle) -> String {
        Instructions::new(
            "你是一个海龟汤游戏主持人，根据以下谜题验证猜题者的答案：",
            self.puzzle_text(puzzle),
        )
        .rule("先对谜题和猜题者的答案进行简单分析，然后再给出判断结果")
        .rule(format!("判断结果必须用{}格式", VERDICT_LABELS.render_choices()))
        .rule("可以指出错误或遗漏的部分")
        .rule(single_label_rule())
        .build()
    }
}

fn wrapped(label: Label) -> String {
    LABEL_DELIMITERS.wrap(label.token())
}

fn single_label_rule() -> String {
    format!(
        "整个回复中只能出现一次{}{}包裹的结果",
        LABEL_DELIMITERS.open, LABEL_DELIMITERS.close
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageRole;

    fn puzzle() -> Puzzle {
        Puzzle::from_document(
            "choke.md",
            "### 汤面\nA man dies.\n### 汤底\nHe choked.\n",
        )
        .unwrap()
    }

    #[test]
    fn question_prompt_has_instruction_then_user_turn() {
        let p = PromptBuilder::default().build(PromptKind::Question, &puzzle(), "他是被杀的吗");
        let msgs = p.messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, MessageRole::System);
        assert_eq!(msgs[1].role, MessageRole::User);
        assert_eq!(msgs[1].content, "他是被杀的吗");
    }

    #[test]
    fn question_prompt_pins_answer_labels() {
        let p = PromptBuilder::default().build(PromptKind::Question, &puzzle(), "q");
        let text = &p.instruction.content;
        for label in ANSWER_LABELS.labels() {
            assert!(text.contains(&wrapped(*label)), "missing {label}");
        }
        assert!(text.contains("如果问题部分正确回答\"{是也不是}\""));
        assert!(text.contains("如果问题与谜题无关回答\"{没有关系}\""));
    }

    #[test]
    fn resolution_prompt_pins_verdict_labels_and_prefixes_attempt() {
        let p = PromptBuilder::default().build(PromptKind::ResolutionCheck, &puzzle(), "他噎死了");
        for label in VERDICT_LABELS.labels() {
            assert!(p.instruction.content.contains(&wrapped(*label)));
        }
        assert!(p.instruction.content.contains("可以指出错误或遗漏的部分"));
        assert_eq!(p.user.content, "汤底: 他噎死了");
    }

    #[test]
    fn hint_prompt_uses_fixed_user_turn() {
        let p = PromptBuilder::default().build(PromptKind::Hint, &puzzle(), "ignored");
        assert_eq!(p.user.content, HINT_REQUEST);
        assert!(p.instruction.content.contains("不泄露谜底"));
        assert_eq!(p.kind.expected_labels(), None);
    }

    #[test]
    fn scenario_context_never_leaks_resolution() {
        let builder = PromptBuilder::new(PromptContext::Scenario);
        for kind in [PromptKind::Hint, PromptKind::Question, PromptKind::ResolutionCheck] {
            let p = builder.build(kind, &puzzle(), "x");
            assert!(p.instruction.content.contains("谜题: A man dies."));
            assert!(!p.instruction.content.contains("He choked."));
        }
    }

    #[test]
    fn full_document_context_embeds_raw_document() {
        let p = PromptBuilder::new(PromptContext::FullDocument).build(
            PromptKind::ResolutionCheck,
            &puzzle(),
            "x",
        );
        assert!(p.instruction.content.contains("### 汤底\nHe choked."));
    }

    #[test]
    fn rules_are_numbered_in_order() {
        let p = PromptBuilder::default().build(PromptKind::Hint, &puzzle(), "");
        let text = &p.instruction.content;
        let first = text.find("\n1. ").unwrap();
        let second = text.find("\n2. ").unwrap();
        assert!(first < second);
    }
}
