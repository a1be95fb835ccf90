#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use super::{RemediationStatus, RemediationSuggestion};
use crate::{
    access::AccessGate,
    completion::{CompletionRequest, CompletionService},
    constants::{REMEDIATION_MAX_TOKENS, REMEDIATION_TEMPERATURE},
    grading::ExerciseContext,
    prompts::PromptCatalog,
    session::StudentSession,
    store::Store,
    types::Submission,
};

/// Builds a follow-up exercise after a low score and opens dialogue access.
#[derive(Clone)]
pub struct RemediationGenerator {
    /// Completion service that writes the exercise.
    completion: Arc<dyn CompletionService>,
    /// Where suggestions are kept.
    store:      Arc<dyn Store>,
    /// Prompt templates.
    prompts:    Arc<PromptCatalog>,
    /// Opens the remediation grant.
    gate:       AccessGate,
}

impl RemediationGenerator {
    /// Creates a generator.
    pub fn new(
        completion: Arc<dyn CompletionService>,
        store: Arc<dyn Store>,
        prompts: Arc<PromptCatalog>,
        gate: AccessGate,
    ) -> Self {
        Self {
            completion,
            store,
            prompts,
            gate,
        }
    }

    /// Asks for an exercise of equal difficulty on the same concept, stores
    /// it as a pending suggestion for the submission's author and opens a
    /// remediation grant on their session.
    ///
    /// Best effort: any failure is logged and yields `None`, with no
    /// suggestion stored and no grant opened. A session that does not belong
    /// to the submission's author gets neither.
    pub async fn generate_remediation(
        &self,
        session: &mut StudentSession,
        exercise: &ExerciseContext,
        submission: &Submission,
        score: u8,
    ) -> Option<RemediationSuggestion> {
        if session.student_id != submission.student_id {
            error!(
                student_id = %session.student_id,
                submission_id = %submission.id,
                "session does not own the submission; skipping remediation"
            );
            return None;
        }

        let language = submission.language;
        let request = CompletionRequest::builder()
            .prompt(self.prompts.remediation(
                language,
                &exercise.question,
                &submission.answer_text,
                score,
            ))
            .temperature(REMEDIATION_TEMPERATURE)
            .max_tokens(REMEDIATION_MAX_TOKENS)
            .build();

        let text = match self.completion.complete(request).await {
            Ok(text) => text,
            Err(e) => {
                error!(
                    student_id = %submission.student_id,
                    score,
                    "remediation generation failed: {e}"
                );
                return None;
            }
        };

        let now = Utc::now();
        let suggestion = RemediationSuggestion {
            id: Uuid::new_v4(),
            student_id: submission.student_id.clone(),
            origin_exercise_id: exercise.exercise_id.clone(),
            origin_theme: exercise.theme.clone(),
            origin_lesson_label: exercise.lesson_label.clone(),
            origin_score: score,
            message: Some(self.prompts.remediation_note(language, score)),
            generated_exercise_text: text,
            status: RemediationStatus::Pending,
            student_answer: None,
            grading_result_ref: None,
            seen_by_student: false,
            notified_to_teacher: false,
            created_at: now,
        };

        if let Err(e) = self.store.insert_suggestion(&suggestion).await {
            error!(
                student_id = %submission.student_id,
                "could not store remediation suggestion: {e}"
            );
            return None;
        }
        info!(
            student_id = %suggestion.student_id,
            suggestion_id = %suggestion.id,
            score,
            "remediation suggested"
        );

        self.gate
            .open_grant(session, exercise.exercise_id.clone(), score, now);
        Some(suggestion)
    }
}
