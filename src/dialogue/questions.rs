#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::sync::LazyLock;

use regex::Regex;

use crate::{constants::MIN_QUESTION_LEN, types::Language};

/// Compiles an ordered pattern list.
fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid question pattern"))
        .collect()
}

/// French interrogative openings, most specific first.
static FRENCH: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\b[Pp]eux-tu\s+(.*?)\?",
        r"\b[Qq]u['’]est-ce que\s+(.*?)\?",
        r"\b[Cc]alcule\s+(.*?)\?",
        r"\b[Tt]rouve\s+(.*?)\?",
        r"\b[Dd]is-moi\s+(.*?)\?",
        r"\b[Qq]uel(?:le)?s?\s+(.*?)\?",
        r"\b[Cc]ombien\s+(.*?)\?",
        r"\b[Cc]omment\s+(.*?)\?",
        r"\b[Pp]ourquoi\s+(.*?)\?",
        r"\b[Éé]cris\s+(.*?)\?",
        r"\b[Aa]nalyse\s+(.*?)\?",
        r"\b[Ee]xplique\s+(.*?)\?",
        r"\b[Rr]eformule\s+(.*?)\?",
    ])
});

/// English interrogative openings, most specific first.
static ENGLISH: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\b[Cc]an you\s+(.*?)\?",
        r"\b[Ww]hat is\s+(.*?)\?",
        r"\b[Cc]alculate\s+(.*?)\?",
        r"\b[Ff]ind\s+(.*?)\?",
        r"\b[Tt]ell me\s+(.*?)\?",
        r"\b[Ww]hich\s+(.*?)\?",
        r"\b[Hh]ow many\s+(.*?)\?",
        r"\b[Hh]ow\s+(.*?)\?",
        r"\b[Ww]hy\s+(.*?)\?",
        r"\b[Ww]rite\s+(.*?)\?",
        r"\b[Aa]nalyze\s+(.*?)\?",
        r"\b[Ee]xplain\s+(.*?)\?",
        r"\b[Dd]escribe\s+(.*?)\?",
        r"\b[Rr]ephrase\s+(.*?)\?",
    ])
});

/// Finds the guiding question a tutor turn ends on.
///
/// Patterns are tried in order; within a pattern, matches are scanned left to
/// right. The whole interrogative sentence is returned, provided the part
/// after the opening word is at least `MIN_QUESTION_LEN` characters long.
pub fn extract_question(text: &str, language: Language) -> Option<String> {
    let patterns = match language {
        Language::Fr => &*FRENCH,
        Language::En => &*ENGLISH,
    };

    patterns.iter().find_map(|pattern| {
        pattern.captures_iter(text).find_map(|caps| {
            let body = caps.get(1)?.as_str().trim();
            (body.chars().count() >= MIN_QUESTION_LEN)
                .then(|| caps.get(0).map(|m| m.as_str().trim().to_string()))
                .flatten()
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earlier_pattern_wins_even_when_later_in_text() {
        let text = "Why do we add? Good start. Can you isolate x on one side?";
        assert_eq!(
            extract_question(text, Language::En).as_deref(),
            Some("Can you isolate x on one side?")
        );
    }

    #[test]
    fn short_bodies_are_skipped() {
        assert_eq!(extract_question("Can you do it?", Language::En), None);
        assert_eq!(
            extract_question("Peux-tu? Quelle est la première étape ?", Language::Fr).as_deref(),
            Some("Quelle est la première étape ?")
        );
    }
}
