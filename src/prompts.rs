#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::types::Language;

/// School subjects with a dedicated tutor persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    /// Mathematics; also the fallback for unknown subjects.
    #[default]
    Mathematics,
    /// French language and literature.
    French,
    /// History.
    History,
    /// Natural sciences.
    Science,
    /// Geography.
    Geography,
}

impl Subject {
    /// Every subject, in display order.
    pub const ALL: [Subject; 5] = [
        Subject::Mathematics,
        Subject::French,
        Subject::History,
        Subject::Science,
        Subject::Geography,
    ];

    /// Normalizes a subject name in either language. Unknown names map to
    /// mathematics.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "français" | "francais" | "french" => Subject::French,
            "histoire" | "history" => Subject::History,
            "sciences" | "science" => Subject::Science,
            "géographie" | "geographie" | "geography" => Subject::Geography,
            _ => Subject::Mathematics,
        }
    }

    /// Name of the subject as shown to a student.
    pub fn label(&self, language: Language) -> &'static str {
        match (self, language) {
            (Subject::Mathematics, Language::Fr) => "mathématiques",
            (Subject::Mathematics, Language::En) => "mathematics",
            (Subject::French, Language::Fr) => "français",
            (Subject::French, Language::En) => "French",
            (Subject::History, Language::Fr) => "histoire",
            (Subject::History, Language::En) => "history",
            (Subject::Science, Language::Fr) => "sciences",
            (Subject::Science, Language::En) => "science",
            (Subject::Geography, Language::Fr) => "géographie",
            (Subject::Geography, Language::En) => "geography",
        }
    }
}

impl Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label(Language::En))
    }
}

/// Short fixed phrases used around the templates.
#[derive(Clone, Copy)]
struct Phrases {
    /// First tutor line of every new dialogue.
    welcome:            &'static str,
    /// Tutor turn used when the completion service fails.
    apology:            &'static str,
    /// Label prefixed to student lines in a rendered transcript.
    student_label:      &'static str,
    /// Label prefixed to tutor lines in a rendered transcript.
    tutor_label:        &'static str,
    /// Level used when the student's level is unknown.
    default_level:      &'static str,
    /// Exam-mode addendum for the tutor system prompt.
    exam_system_note:   &'static str,
    /// Exam-mode addendum for the opening turn.
    exam_start_note:    &'static str,
    /// Exam-mode addendum for follow-up turns.
    exam_continue_note: &'static str,
    /// Note attached to a suggestion created after a low score.
    remediation_note:   &'static str,
}

/// French phrases.
const FR_PHRASES: Phrases = Phrases {
    welcome:            "👋 Bonjour ! Je suis ton enseignant virtuel. Pose-moi ta question, je vais \
                         te guider pas à pas.",
    apology:            "Je suis désolé, j'ai rencontré une erreur. Pourrais-tu reformuler ta \
                         question ?",
    student_label:      "👤 Élève :",
    tutor_label:        "🤖 Enseignant :",
    default_level:      "6ème",
    exam_system_note:   "⚠️ MODE EXAMEN : guide avec des indices seulement, ne donne pas les \
                         étapes complètes.",
    exam_start_note:    "Mode examen : reste au niveau des indices généraux.",
    exam_continue_note: "Mode examen : guide avec des indices, ne révèle pas les étapes.",
    remediation_note:   "Exercice de remédiation proposé automatiquement (note : {SCORE}/5).",
};

/// English phrases.
const EN_PHRASES: Phrases = Phrases {
    welcome:            "👋 Hello! I'm your virtual teacher. Ask me your question and I'll guide \
                         you step by step.",
    apology:            "I'm sorry, I encountered an error. Could you rephrase your question?",
    student_label:      "👤 Student:",
    tutor_label:        "🤖 Teacher:",
    default_level:      "6th grade",
    exam_system_note:   "⚠️ EXAM MODE: guide with hints only, do not give complete steps.",
    exam_start_note:    "Exam mode: stay at the level of general hints.",
    exam_continue_note: "Exam mode: guide with hints, do not reveal the steps.",
    remediation_note:   "Remediation exercise suggested automatically (score: {SCORE}/5).",
};

/// Templates for one language.
#[derive(Clone)]
struct LanguagePrompts {
    /// System instructions for grading.
    grading_system:    &'static str,
    /// Grading prompt template.
    grading:           &'static str,
    /// Remediation generation template.
    remediation:       &'static str,
    /// Opening dialogue turn template.
    dialogue_start:    &'static str,
    /// Follow-up dialogue turn template.
    dialogue_continue: &'static str,
    /// Shared methodology appended to every tutor persona.
    methodology:       &'static str,
    /// Tutor personas, indexed like `Subject::ALL`.
    subjects:          [&'static str; 5],
    /// Fixed phrases.
    phrases:           Phrases,
}

/// Prompt templates for both languages, embedded in the binary.
#[derive(Clone)]
pub struct PromptCatalog {
    /// French templates.
    fr: LanguagePrompts,
    /// English templates.
    en: LanguagePrompts,
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self::load()
    }
}

impl PromptCatalog {
    /// Load prompt templates embedded in the binary.
    pub fn load() -> Self {
        let fr = LanguagePrompts {
            grading_system:    include_str!("prompts/fr/grading_system.md"),
            grading:           include_str!("prompts/fr/grading.md"),
            remediation:       include_str!("prompts/fr/remediation.md"),
            dialogue_start:    include_str!("prompts/fr/dialogue_start.md"),
            dialogue_continue: include_str!("prompts/fr/dialogue_continue.md"),
            methodology:       include_str!("prompts/fr/methodology.md"),
            subjects:          [
                include_str!("prompts/fr/subjects/mathematics.md"),
                include_str!("prompts/fr/subjects/french.md"),
                include_str!("prompts/fr/subjects/history.md"),
                include_str!("prompts/fr/subjects/science.md"),
                include_str!("prompts/fr/subjects/geography.md"),
            ],
            phrases:           FR_PHRASES,
        };
        let en = LanguagePrompts {
            grading_system:    include_str!("prompts/en/grading_system.md"),
            grading:           include_str!("prompts/en/grading.md"),
            remediation:       include_str!("prompts/en/remediation.md"),
            dialogue_start:    include_str!("prompts/en/dialogue_start.md"),
            dialogue_continue: include_str!("prompts/en/dialogue_continue.md"),
            methodology:       include_str!("prompts/en/methodology.md"),
            subjects:          [
                include_str!("prompts/en/subjects/mathematics.md"),
                include_str!("prompts/en/subjects/french.md"),
                include_str!("prompts/en/subjects/history.md"),
                include_str!("prompts/en/subjects/science.md"),
                include_str!("prompts/en/subjects/geography.md"),
            ],
            phrases:           EN_PHRASES,
        };

        Self { fr, en }
    }

    /// Returns the templates for `language`.
    fn lang(&self, language: Language) -> &LanguagePrompts {
        match language {
            Language::Fr => &self.fr,
            Language::En => &self.en,
        }
    }

    /// System instructions for a grading call.
    pub fn grading_system(&self, language: Language) -> &str {
        self.lang(language).grading_system.trim()
    }

    /// Grading prompt. A pure function of its four inputs.
    pub fn grading(
        &self,
        language: Language,
        question: &str,
        expected_answer: &str,
        student_answer: &str,
    ) -> String {
        fill(self.lang(language).grading, &[
            ("QUESTION", question),
            ("EXPECTED_ANSWER", expected_answer),
            ("STUDENT_ANSWER", student_answer),
        ])
        .trim()
        .to_string()
    }

    /// Prompt asking for a remediation exercise after a low score.
    pub fn remediation(
        &self,
        language: Language,
        question: &str,
        student_answer: &str,
        score: u8,
    ) -> String {
        let score = score.to_string();
        fill(self.lang(language).remediation, &[
            ("QUESTION", question),
            ("STUDENT_ANSWER", student_answer),
            ("SCORE", &score),
        ])
        .trim()
        .to_string()
    }

    /// Tutor persona for `subject`, followed by the shared methodology.
    pub fn tutor_system(&self, language: Language, subject: Subject, exam_mode: bool) -> String {
        let prompts = self.lang(language);
        let index = Subject::ALL
            .iter()
            .position(|s| *s == subject)
            .unwrap_or_default();
        let note = if exam_mode {
            prompts.phrases.exam_system_note
        } else {
            ""
        };

        format!(
            "{}\n{}",
            prompts.subjects[index].trim(),
            fill(prompts.methodology, &[("EXAM_NOTE", note)]).trim_end()
        )
    }

    /// Opening turn of a guided dialogue.
    pub fn dialogue_start(
        &self,
        language: Language,
        subject: Subject,
        level: Option<&str>,
        question: &str,
        exam_mode: bool,
    ) -> String {
        let prompts = self.lang(language);
        let note = if exam_mode {
            prompts.phrases.exam_start_note
        } else {
            ""
        };
        let subject = subject.label(language).to_uppercase();

        fill(prompts.dialogue_start, &[
            ("LEVEL", level.unwrap_or(prompts.phrases.default_level)),
            ("SUBJECT", &subject),
            ("QUESTION", question),
            ("EXAM_NOTE", note),
        ])
        .trim()
        .to_string()
    }

    /// Follow-up turn of a guided dialogue.
    #[allow(clippy::too_many_arguments)]
    pub fn dialogue_continue(
        &self,
        language: Language,
        subject: Subject,
        level: Option<&str>,
        history: &str,
        last_question: &str,
        student_reply: &str,
        exam_mode: bool,
    ) -> String {
        let prompts = self.lang(language);
        let note = if exam_mode {
            prompts.phrases.exam_continue_note
        } else {
            ""
        };
        let subject = subject.label(language).to_uppercase();

        fill(prompts.dialogue_continue, &[
            ("LEVEL", level.unwrap_or(prompts.phrases.default_level)),
            ("SUBJECT", &subject),
            ("HISTORY", history),
            ("LAST_QUESTION", last_question),
            ("STUDENT_REPLY", student_reply),
            ("EXAM_NOTE", note),
        ])
        .trim()
        .to_string()
    }

    /// Note stored with a suggestion created after a low score.
    pub fn remediation_note(&self, language: Language, score: u8) -> String {
        fill(self.lang(language).phrases.remediation_note, &[(
            "SCORE",
            &score.to_string(),
        )])
    }

    /// Canned first tutor line of every dialogue.
    pub fn welcome(&self, language: Language) -> &'static str {
        self.lang(language).phrases.welcome
    }

    /// Canned tutor turn used when the completion service fails.
    pub fn apology(&self, language: Language) -> &'static str {
        self.lang(language).phrases.apology
    }

    /// Label for student lines in a rendered transcript.
    pub fn student_label(&self, language: Language) -> &'static str {
        self.lang(language).phrases.student_label
    }

    /// Label for tutor lines in a rendered transcript.
    pub fn tutor_label(&self, language: Language) -> &'static str {
        self.lang(language).phrases.tutor_label
    }
}

/// Substitutes `{KEY}` placeholders in a single left-to-right pass. Values are
/// inserted verbatim and never rescanned, so student text containing braces
/// cannot trigger further substitution. Unknown placeholders are kept as is.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });

        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_does_not_rescan_inserted_values() {
        let out = fill("Q: {QUESTION} / A: {ANSWER}", &[
            ("QUESTION", "what is {ANSWER}?"),
            ("ANSWER", "42"),
        ]);
        assert_eq!(out, "Q: what is {ANSWER}? / A: 42");
    }

    #[test]
    fn fill_keeps_unknown_placeholders() {
        assert_eq!(fill("{x} and {", &[]), "{x} and {");
    }

    #[test]
    fn grading_prompt_is_deterministic_and_language_specific() {
        let catalog = PromptCatalog::load();
        let fr = catalog.grading(Language::Fr, "2+2", "4", "4");
        assert_eq!(fr, catalog.grading(Language::Fr, "2+2", "4", "4"));
        assert!(fr.contains("Note : X/5"));

        let en = catalog.grading(Language::En, "2+2", "4", "4");
        assert!(en.contains("Score: X/5"));
        assert!(!en.contains("{QUESTION}"));
    }

    #[test]
    fn unknown_subject_falls_back_to_mathematics() {
        assert_eq!(Subject::parse("Astrologie"), Subject::Mathematics);
        assert_eq!(Subject::parse("Géographie"), Subject::Geography);
        assert_eq!(Subject::parse("history"), Subject::History);
    }
}
