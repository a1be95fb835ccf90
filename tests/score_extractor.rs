use remedia::{
    score::{ParseResult, extract_score},
    types::Language,
};
use tracing_test::traced_test;

#[test]
fn both_labels_read_in_both_languages() {
    for text in ["Score: 4/5", "Note: 4/5", "note : 4 / 5", "SCORE：4/5"] {
        for language in [Language::Fr, Language::En] {
            assert_eq!(extract_score(text, language), ParseResult::Score(4), "{text}");
        }
    }
}

#[test]
fn values_above_five_clamp() {
    assert_eq!(extract_score("Score: 7/5", Language::En), ParseResult::Score(5));
    assert_eq!(extract_score("Note : 9", Language::Fr), ParseResult::Score(5));
    assert_eq!(extract_score("Note : 10/5", Language::Fr), ParseResult::Score(5));
}

#[test]
fn bare_form_is_the_fallback() {
    let text = "Analyse : raisonnement correct.\nNote : 3\nBon travail.";
    assert_eq!(extract_score(text, Language::Fr), ParseResult::Score(3));
}

#[test]
fn first_match_wins() {
    let text = "Note : 2/5\n...\nNote : 4/5";
    assert_eq!(extract_score(text, Language::Fr), ParseResult::Score(2));
}

#[test]
fn full_width_digits_read_as_their_value() {
    assert_eq!(extract_score("Note : ２/5", Language::Fr), ParseResult::Score(2));
    assert_eq!(extract_score("Note：３／５", Language::Fr), ParseResult::Score(3));
    assert_eq!(extract_score("Score: １", Language::En), ParseResult::Score(1));
}

#[test]
fn other_scripts_never_count_as_a_pass() {
    for text in ["Score: ٢/5", "Note : ۲/5", "Score: २/5"] {
        assert_eq!(extract_score(text, Language::En), ParseResult::Unparsed, "{text}");
    }
}

#[test]
fn missing_score_line_is_unparsed_not_zero() {
    let unparsed = extract_score("Great reasoning, well done!", Language::En);
    let zero = extract_score("Score: 0/5", Language::En);

    assert_eq!(unparsed, ParseResult::Unparsed);
    assert_eq!(zero, ParseResult::Score(0));
    assert_ne!(unparsed, zero);
    assert_eq!(unparsed.value(), 0);
    assert!(unparsed.is_unparsed());
    assert!(!zero.is_unparsed());
}

#[test]
#[traced_test]
fn unparsed_completion_is_logged_as_such() {
    extract_score("Je ne peux pas noter cette réponse.", Language::Fr);
    assert!(logs_contain("unparsed=true"));
}

#[test]
#[traced_test]
fn legitimate_zero_is_not_logged_as_unparsed() {
    extract_score("Note : 0/5", Language::Fr);
    assert!(!logs_contain("unparsed"));
}
