//! Question or resolution attempt, decided by prefix.

/// Prefix that marks an input as a proposed resolution.
pub const RESOLUTION_PREFIX: &str = "汤底";

/// What the player meant by one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent<'a> {
    Question(&'a str),
    /// The attempt text, prefix and separator removed.
    Resolution(&'a str),
}

impl<'a> Intent<'a> {
    /// Trimmed input starting with `汤底` is a resolution attempt; an optional
    /// `:` or `：` and any whitespace after the prefix are dropped. Anything
    /// else is a question.
    pub fn of(input: &'a str) -> Intent<'a> {
        let input = input.trim();
        match input.strip_prefix(RESOLUTION_PREFIX) {
            Some(rest) => {
                let rest = rest
                    .strip_prefix([':', '：'])
                    .unwrap_or(rest)
                    .trim_start();
                Intent::Resolution(rest)
            }
            None => Intent::Question(input),
        }
    }

    pub fn text(&self) -> &'a str {
        match self {
            Intent::Question(t) | Intent::Resolution(t) => t,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_input_is_a_question() {
        assert_eq!(Intent::of("  他是被杀的吗 "), Intent::Question("他是被杀的吗"));
    }

    #[test]
    fn prefix_variants_are_resolutions() {
        let expected = Intent::Resolution("他噎死了");
        assert_eq!(Intent::of("汤底：他噎死了"), expected);
        assert_eq!(Intent::of("汤底:他噎死了"), expected);
        assert_eq!(Intent::of("汤底 他噎死了"), expected);
        assert_eq!(Intent::of("  汤底：  他噎死了"), expected);
        assert_eq!(Intent::of("汤底他噎死了"), expected);
    }

    #[test]
    fn prefix_must_lead() {
        assert_eq!(Intent::of("这是汤底吗"), Intent::Question("这是汤底吗"));
    }

    #[test]
    fn bare_prefix_has_empty_attempt() {
        assert_eq!(Intent::of("汤底："), Intent::Resolution(""));
        assert_eq!(Intent::of("汤底").text(), "");
    }
}
