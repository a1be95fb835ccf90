#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::sync::Arc;

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    access::{AccessDecision, AccessGate, AccessWindow, RemediationGrant},
    completion::{CompletionError, CompletionRequest, CompletionService},
    constants::{GRADING_MAX_TOKENS, GRADING_TEMPERATURE, PASSING_SCORE},
    prompts::PromptCatalog,
    remediation::{RemediationGenerator, RemediationSuggestion},
    score::{ParseResult, extract_score},
    session::StudentSession,
    store::{Store, StoreError},
    types::{Language, StudentId, Submission},
};

/// The graded outcome of one submission. Created once, never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingResult {
    /// Record identifier.
    pub id:                  Uuid,
    /// Submission this result grades.
    pub submission_id:       Uuid,
    /// Completion text as returned by the service.
    pub raw_completion_text: String,
    /// Score on the 0 to 5 scale.
    pub score:               u8,
    /// True when no score line was found and `score` is a placeholder 0.
    pub unparsed:            bool,
    /// Grading time.
    pub created_at:          DateTime<Utc>,
}

impl GradingResult {
    /// Whether the score reaches the passing score.
    pub fn passed(&self) -> bool {
        self.score >= PASSING_SCORE
    }
}

/// Reasons a submission could not be graded.
#[derive(thiserror::Error, Debug)]
pub enum GradingError {
    /// The completion service failed; the submission stays ungraded and can
    /// be retried by hand.
    #[error("grading_unavailable for submission {submission_id}: {source}")]
    Unavailable {
        /// Stored submission left without a result.
        submission_id: Uuid,
        /// Why the completion failed.
        #[source]
        source:        CompletionError,
    },
    /// The submission already has a grading result.
    #[error("submission {0} has already been graded")]
    AlreadyGraded(Uuid),
    /// The submission belongs to another student.
    #[error("submission {0} belongs to another student")]
    NotOwner(Uuid),
    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The exercise a submission answers.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(on(String, into))]
pub struct ExerciseContext {
    /// Exercise key in the lesson store.
    pub exercise_id:     Option<String>,
    /// Exercise statement.
    pub question:        String,
    /// Reference answer.
    pub expected_answer: String,
    /// Theme, carried into remediation.
    #[builder(default)]
    pub theme:           String,
    /// Lesson label, carried into remediation.
    #[builder(default)]
    pub lesson_label:    String,
}

/// Everything a graded submission produced.
#[derive(Debug, Clone)]
pub struct GradingOutcome {
    /// Persisted submission.
    pub submission:  Submission,
    /// Persisted grading result.
    pub result:      GradingResult,
    /// How the score was read from the completion.
    pub parse:       ParseResult,
    /// Remediation created because of a low score, if generation succeeded.
    pub remediation: Option<RemediationSuggestion>,
    /// Dialogue access opened alongside the remediation.
    pub grant:       Option<RemediationGrant>,
}

impl GradingOutcome {
    /// Score on the 0 to 5 scale.
    pub fn score(&self) -> u8 {
        self.result.score
    }
}

/// Result of a gated grading request.
#[derive(Debug, Clone)]
pub enum GradeReply {
    /// The answer was graded.
    Graded(Box<GradingOutcome>),
    /// Graded features are closed to this student; redirect to the upgrade
    /// page.
    Upgrade,
}

/// Grades submissions and triggers remediation on low scores.
#[derive(Clone)]
pub struct Grader {
    /// Completion service used to grade.
    completion:  Arc<dyn CompletionService>,
    /// Durable records.
    store:       Arc<dyn Store>,
    /// Prompt templates.
    prompts:     Arc<PromptCatalog>,
    /// Runs after a low score.
    remediation: RemediationGenerator,
    /// Access rules for graded features.
    gate:        AccessGate,
}

impl Grader {
    /// Creates a grader. `gate` decides how long remediation grants last.
    pub fn new(
        completion: Arc<dyn CompletionService>,
        store: Arc<dyn Store>,
        prompts: Arc<PromptCatalog>,
        gate: AccessGate,
    ) -> Self {
        let remediation = RemediationGenerator::new(
            Arc::clone(&completion),
            Arc::clone(&store),
            Arc::clone(&prompts),
            gate,
        );
        Self {
            completion,
            store,
            prompts,
            remediation,
            gate,
        }
    }

    /// Access rules this grader applies.
    pub fn gate(&self) -> AccessGate {
        self.gate
    }

    /// Checks feature access first, then grades. A closed window stores
    /// nothing and makes no completion call.
    pub async fn grade_gated(
        &self,
        window: &AccessWindow,
        session: &mut StudentSession,
        exercise: &ExerciseContext,
        student_answer: &str,
        now: DateTime<Utc>,
    ) -> Result<GradeReply, GradingError> {
        match self.gate.feature_access(window, now) {
            AccessDecision::Granted(_) => {
                let outcome = self.grade(session, exercise, student_answer).await?;
                Ok(GradeReply::Graded(Box::new(outcome)))
            }
            AccessDecision::Upgrade => Ok(GradeReply::Upgrade),
        }
    }

    /// Grades a new answer of the session's student.
    ///
    /// The submission is stored first. A completion failure returns
    /// [`GradingError::Unavailable`] and leaves the submission without a
    /// result. Below the passing score, remediation runs once before this
    /// returns; its failure never fails the grading.
    pub async fn grade(
        &self,
        session: &mut StudentSession,
        exercise: &ExerciseContext,
        student_answer: &str,
    ) -> Result<GradingOutcome, GradingError> {
        let submission = Submission::builder()
            .student_id(session.student_id.clone())
            .maybe_exercise_id(exercise.exercise_id.clone())
            .answer_text(student_answer)
            .language(session.language)
            .build();
        self.store.insert_submission(&submission).await?;

        self.grade_stored(session, submission, exercise).await
    }

    /// Manual retry of a stored submission that has no result yet. Only the
    /// submission's author may retry it.
    pub async fn grade_submission(
        &self,
        session: &mut StudentSession,
        submission_id: Uuid,
        exercise: &ExerciseContext,
    ) -> Result<GradingOutcome, GradingError> {
        if self
            .store
            .grading_for_submission(submission_id)
            .await?
            .is_some()
        {
            return Err(GradingError::AlreadyGraded(submission_id));
        }
        let submission = self.store.get_submission(submission_id).await?;
        if submission.student_id != session.student_id {
            warn!(
                student_id = %session.student_id,
                %submission_id,
                "refused retry of another student's submission"
            );
            return Err(GradingError::NotOwner(submission_id));
        }
        self.grade_stored(session, submission, exercise).await
    }

    /// Grades an answer to a remediation exercise. The attempt is stored as
    /// its own submission and never triggers further remediation.
    pub async fn grade_attempt(
        &self,
        student_id: &StudentId,
        language: Language,
        question: &str,
        expected_answer: &str,
        student_answer: &str,
    ) -> Result<(Submission, GradingResult, ParseResult), GradingError> {
        let submission = Submission::builder()
            .student_id(student_id.clone())
            .answer_text(student_answer)
            .language(language)
            .build();
        self.store.insert_submission(&submission).await?;

        let (result, parse) = self
            .evaluate(&submission, question, expected_answer)
            .await?;
        Ok((submission, result, parse))
    }

    /// Shared tail of first grading and manual retry.
    async fn grade_stored(
        &self,
        session: &mut StudentSession,
        submission: Submission,
        exercise: &ExerciseContext,
    ) -> Result<GradingOutcome, GradingError> {
        let (result, parse) = self
            .evaluate(&submission, &exercise.question, &exercise.expected_answer)
            .await?;

        let (remediation, grant) = if result.passed() {
            (None, None)
        } else {
            let suggestion = self
                .remediation
                .generate_remediation(session, exercise, &submission, result.score)
                .await;
            let grant = suggestion
                .as_ref()
                .and_then(|_| session.remediation_grant.clone());
            (suggestion, grant)
        };

        Ok(GradingOutcome {
            submission,
            result,
            parse,
            remediation,
            grant,
        })
    }

    /// One completion call, one score, one persisted result.
    async fn evaluate(
        &self,
        submission: &Submission,
        question: &str,
        expected_answer: &str,
    ) -> Result<(GradingResult, ParseResult), GradingError> {
        let language = submission.language;
        let request = CompletionRequest::builder()
            .prompt(self.prompts.grading(
                language,
                question,
                expected_answer,
                &submission.answer_text,
            ))
            .system_instructions(self.prompts.grading_system(language).to_string())
            .temperature(GRADING_TEMPERATURE)
            .max_tokens(GRADING_MAX_TOKENS)
            .build();

        let raw = self.completion.complete(request).await.map_err(|e| {
            error!(
                student_id = %submission.student_id,
                submission_id = %submission.id,
                "grading unavailable: {e}"
            );
            GradingError::Unavailable {
                submission_id: submission.id,
                source:        e,
            }
        })?;

        let parse = extract_score(&raw, language);
        let result = GradingResult {
            id: Uuid::new_v4(),
            submission_id: submission.id,
            raw_completion_text: raw,
            score: parse.value(),
            unparsed: parse.is_unparsed(),
            created_at: Utc::now(),
        };
        self.store.insert_grading(&result).await?;

        if !result.unparsed {
            info!(
                student_id = %submission.student_id,
                submission_id = %submission.id,
                score = result.score,
                "submission graded"
            );
        }
        Ok((result, parse))
    }
}
