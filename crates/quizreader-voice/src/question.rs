//! Question text preparation
//!
//! Raw question text carries light markup and a power mark `(*)`. Both the
//! spoken words and the power position are derived from one token stream so
//! that a stop index can be compared against the power index directly.

use serde::{Deserialize, Serialize};

/// Power mark as it appears in raw question text.
pub const POWER_MARK: &str = "(*)";

const MARKUP_TAGS: [&str; 8] = ["<b>", "</b>", "<u>", "</u>", "<i>", "</i>", "<em>", "</em>"];

/// Split text on whitespace into word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

fn strip_markup(token: &str) -> String {
    MARKUP_TAGS
        .iter()
        .fold(token.to_string(), |acc, tag| acc.replace(tag, ""))
}

/// A question ready for reading: speakable words plus the power position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedQuestion {
    /// Spoken words, markup and power mark removed
    pub words: Vec<String>,
    /// Index into `words` of the last word before the power mark
    pub power_index: Option<usize>,
}

impl PreparedQuestion {
    /// Build from raw question text.
    pub fn from_raw(raw: &str) -> Self {
        let mut words = Vec::new();
        let mut power_index = None;

        for token in raw.split_whitespace() {
            let cleaned = strip_markup(token);
            if let Some(pos) = cleaned.find(POWER_MARK) {
                let before = &cleaned[..pos];
                let after = &cleaned[pos + POWER_MARK.len()..];
                if !before.is_empty() {
                    words.push(before.to_string());
                }
                if power_index.is_none() {
                    power_index = words.len().checked_sub(1);
                }
                if !after.is_empty() {
                    words.push(after.to_string());
                }
                continue;
            }
            if !cleaned.is_empty() {
                words.push(cleaned);
            }
        }

        Self { words, power_index }
    }

    /// Whether the question has a power mark
    pub fn has_power(&self) -> bool {
        self.power_index.is_some()
    }

    /// Whether an interruption at `stop_index` came at or before the power mark.
    ///
    /// `None` (nothing revealed yet) counts as before the mark.
    pub fn is_power_buzz(&self, stop_index: Option<usize>) -> bool {
        match (self.power_index, stop_index) {
            (Some(_), None) => true,
            (Some(power), Some(stop)) => stop <= power,
            (None, _) => false,
        }
    }

    /// Plain text of the spoken words
    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_collapses_whitespace() {
        assert_eq!(tokenize("  one\ttwo \n three "), vec!["one", "two", "three"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn standalone_power_mark_is_removed() {
        let q = PreparedQuestion::from_raw("This author wrote (*) Moby-Dick.");
        assert_eq!(q.words, vec!["This", "author", "wrote", "Moby-Dick."]);
        assert_eq!(q.power_index, Some(2));
    }

    #[test]
    fn attached_power_mark_splits_token() {
        let q = PreparedQuestion::from_raw("name this whale(*)hunter now");
        assert_eq!(q.words, vec!["name", "this", "whale", "hunter", "now"]);
        assert_eq!(q.power_index, Some(2));

        let q = PreparedQuestion::from_raw("name this whale(*) now");
        assert_eq!(q.words, vec!["name", "this", "whale", "now"]);
        assert_eq!(q.power_index, Some(2));
    }

    #[test]
    fn markup_does_not_shift_indices() {
        let q = PreparedQuestion::from_raw("<b>For 10 points, <u>name</u></b> (*) this");
        assert_eq!(q.words, vec!["For", "10", "points,", "name", "this"]);
        assert_eq!(q.power_index, Some(3));
    }

    #[test]
    fn lone_markup_tokens_vanish() {
        let q = PreparedQuestion::from_raw("<b> bold </b> text");
        assert_eq!(q.words, vec!["bold", "text"]);
        assert!(!q.has_power());
    }

    #[test]
    fn power_buzz_classification() {
        let q = PreparedQuestion::from_raw("a b c (*) d e");
        assert!(q.is_power_buzz(None));
        assert!(q.is_power_buzz(Some(1)));
        assert!(q.is_power_buzz(Some(2)));
        assert!(!q.is_power_buzz(Some(3)));

        let plain = PreparedQuestion::from_raw("a b c");
        assert!(!plain.is_power_buzz(Some(0)));
    }

    #[test]
    fn leading_power_mark_has_no_preceding_word() {
        let q = PreparedQuestion::from_raw("(*) everything is power");
        assert_eq!(q.power_index, None);
        assert_eq!(q.words.len(), 3);
    }
}
