#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::sync::LazyLock;

use bon::Builder;
use regex::Regex;

use crate::types::Language;

/// A labelled line, e.g. `- Expected answer: 12` or `Réponse attendue : 12`.
static LABELLED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:[-*•]\s*)?(?:\*\*)?(question|expected answer|réponse attendue|hint|indice|explanation|explication)(?:\*\*)?\s*[:：]\s*(?:\*\*)?\s*(.*)$",
    )
    .expect("valid exercise label pattern")
});

/// An exercise as written by the completion service or a teacher.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeneratedExercise {
    /// Exercise statement.
    pub question:        String,
    /// Reference answer used for grading attempts.
    pub expected_answer: String,
    /// Short hint for the student.
    pub hint:            Option<String>,
    /// Teacher's explanation.
    pub explanation:     Option<String>,
}

impl GeneratedExercise {
    /// Reads the labelled lines of `text`. The first line carrying a label
    /// wins. Returns `None` when the question or the expected answer is
    /// missing.
    pub fn parse(text: &str) -> Option<Self> {
        let mut exercise = Self::default();
        let mut hint = None;
        let mut explanation = None;

        for line in text.lines() {
            let Some(caps) = LABELLED_LINE.captures(line) else {
                continue;
            };
            let value = caps[2].trim().to_string();
            let slot = match caps[1].to_lowercase().as_str() {
                "question" => &mut exercise.question,
                "expected answer" | "réponse attendue" => &mut exercise.expected_answer,
                "hint" | "indice" => hint.get_or_insert_with(String::new),
                _ => explanation.get_or_insert_with(String::new),
            };
            if slot.is_empty() {
                *slot = value;
            }
        }

        exercise.hint = hint.filter(|h| !h.is_empty());
        exercise.explanation = explanation.filter(|e| !e.is_empty());

        (!exercise.question.is_empty() && !exercise.expected_answer.is_empty()).then_some(exercise)
    }

    /// Rebuilds the text block stored after teacher review.
    pub fn to_teacher_text(&self, language: Language) -> String {
        let (header, question, answer, hint, explanation) = match language {
            Language::En => (
                "Remediation:",
                "Question:",
                "Expected answer:",
                "Hint:",
                "Explanation:",
            ),
            Language::Fr => (
                "Remédiation :",
                "Question :",
                "Réponse attendue :",
                "Indice :",
                "Explication :",
            ),
        };

        let mut text = format!(
            "{header}\n- {question} {}\n- {answer} {}",
            self.question, self.expected_answer
        );
        if let Some(value) = &self.hint {
            text.push_str(&format!("\n- {hint} {value}"));
        }
        text.push_str(&format!(
            "\n- {explanation} {}",
            self.explanation.as_deref().unwrap_or_default()
        ));
        text
    }

    /// Applies a teacher edit; fields left out of the edit keep their value.
    pub fn edited(&self, edit: &TeacherEdit) -> Self {
        Self {
            question:        edit.question.clone().unwrap_or_else(|| self.question.clone()),
            expected_answer: edit
                .expected_answer
                .clone()
                .unwrap_or_else(|| self.expected_answer.clone()),
            hint:            self.hint.clone(),
            explanation:     edit.explanation.clone().or_else(|| self.explanation.clone()),
        }
    }
}

/// Changes a teacher makes while approving a suggestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder)]
#[builder(on(String, into))]
pub struct TeacherEdit {
    /// Note shown to the student with the exercise.
    pub message:         Option<String>,
    /// Replacement statement.
    pub question:        Option<String>,
    /// Replacement reference answer.
    pub expected_answer: Option<String>,
    /// Explanation to add or replace.
    pub explanation:     Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bullets_bold_and_full_width_colons() {
        let text = "Voici un exercice.\n- **Question** ： Résous 3x = 12.\nRéponse attendue : x = 4\nIndice: divise par 3";
        let exercise = GeneratedExercise::parse(text).unwrap();
        assert_eq!(exercise.question, "Résous 3x = 12.");
        assert_eq!(exercise.expected_answer, "x = 4");
        assert_eq!(exercise.hint.as_deref(), Some("divise par 3"));
        assert_eq!(exercise.explanation, None);
    }

    #[test]
    fn missing_expected_answer_is_not_an_exercise() {
        assert_eq!(GeneratedExercise::parse("Question: What is 2+2?"), None);
    }
}
