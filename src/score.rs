#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{constants::MAX_SCORE, types::Language};

/// `Score: 4/5` or `Note : 4/5`, case-insensitive. Digits may be ASCII or
/// full-width, like the colon.
static SCORE_OUT_OF_FIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:note|score)\s*[:：]\s*([0-9０-９]+)\s*[/／]\s*[5５]\b")
        .expect("valid score regex")
});

/// Bare `Score: 4` fallback for completions that drop the `/5`.
static SCORE_BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:note|score)\s*[:：]\s*([0-9０-９]+)").expect("valid score regex")
});

/// Outcome of reading a score line out of a completion.
///
/// `Unparsed` is kept apart from `Score(0)`: an unreadable completion is not a
/// legitimate zero and must not be counted as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ParseResult {
    /// A score in `0..=5`, already clamped.
    Score(u8),
    /// No score line was found.
    Unparsed,
}

impl ParseResult {
    /// Score to persist and compare against the passing threshold. An
    /// unparsed completion counts as 0.
    pub fn value(&self) -> u8 {
        match self {
            ParseResult::Score(score) => *score,
            ParseResult::Unparsed => 0,
        }
    }

    /// True when no score line was found.
    pub fn is_unparsed(&self) -> bool {
        matches!(self, ParseResult::Unparsed)
    }
}

/// Value of an ASCII or full-width decimal digit.
fn digit_value(c: char) -> Option<u64> {
    match c {
        '0'..='9' => c.to_digit(10).map(u64::from),
        '０'..='９' => Some(u64::from(c as u32 - '０' as u32)),
        _ => None,
    }
}

/// Reads a captured digit run and clamps it into the score scale. Runs too
/// long for a `u64` saturate, so they clamp to the maximum as well. Any
/// character that is not a supported digit makes the run unreadable.
fn clamp_digits(digits: &str) -> Option<u8> {
    let value = digits.chars().try_fold(0u64, |acc, c| {
        digit_value(c).map(|d| acc.saturating_mul(10).saturating_add(d))
    })?;
    Some(value.min(u64::from(MAX_SCORE)) as u8)
}

/// Reads the score line out of a grading completion.
///
/// The `Label: d/5` form is searched first; only if it is absent anywhere in
/// the text is the bare `Label: d` form tried. Both labels are accepted in
/// either language, the first match wins, and values above 5 are clamped.
pub fn extract_score(completion: &str, language: Language) -> ParseResult {
    let captured = SCORE_OUT_OF_FIVE
        .captures(completion)
        .or_else(|| SCORE_BARE.captures(completion))
        .and_then(|caps| caps.get(1))
        .and_then(|digits| clamp_digits(digits.as_str()));

    match captured {
        Some(score) => {
            tracing::debug!(score, language = %language, "extracted score");
            ParseResult::Score(score)
        }
        None => {
            tracing::warn!(
                unparsed = true,
                language = %language,
                "no score line found in completion; recording 0 as unparsed"
            );
            ParseResult::Unparsed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_five_form_wins_over_earlier_bare_form() {
        let text = "Score: 1 (draft)\nAnalysis...\nScore: 4/5";
        assert_eq!(extract_score(text, Language::En), ParseResult::Score(4));
    }

    #[test]
    fn oversized_digit_runs_clamp() {
        assert_eq!(clamp_digits("7"), Some(5));
        assert_eq!(clamp_digits("99999999999999999999999"), Some(5));
        assert_eq!(clamp_digits("3"), Some(3));
        assert_eq!(clamp_digits("２"), Some(2));
    }

    #[test]
    fn unsupported_digits_are_unreadable_not_maximal() {
        assert_eq!(clamp_digits("٢"), None);
    }

    #[test]
    fn label_must_start_a_word() {
        assert_eq!(extract_score("Footnote: 3", Language::En), ParseResult::Unparsed);
    }
}
