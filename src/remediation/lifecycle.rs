#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    GeneratedExercise, LifecycleAction, RemediationStatus, RemediationSuggestion, TeacherEdit,
};
use crate::{
    access::{AccessDecision, AccessWindow},
    constants::PASSING_SCORE,
    grading::{Grader, GradingError, GradingResult},
    score::ParseResult,
    store::{Store, StoreError},
    types::{RequestContext, StudentId},
};

/// Reasons a remediation action was refused.
#[derive(thiserror::Error, Debug)]
pub enum LifecycleError {
    /// The suggestion is not in a state that allows the action. Nothing was
    /// changed.
    #[error("cannot {action} remediation {id} while it is {from}")]
    StateConflict {
        /// Suggestion concerned.
        id:     Uuid,
        /// State it was found in.
        from:   RemediationStatus,
        /// Refused action.
        action: LifecycleAction,
    },
    /// No such suggestion.
    #[error("remediation {0} not found")]
    NotFound(Uuid),
    /// The caller's role does not allow the action.
    #[error("this action is not allowed for the current user")]
    Forbidden,
    /// The exercise text has no question or expected answer to grade against.
    #[error("remediation {0} has no gradable question and expected answer")]
    MalformedExercise(Uuid),
    /// Grading the attempt failed.
    #[error(transparent)]
    Grading(#[from] GradingError),
    /// The store failed.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for LifecycleError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { id, .. } => LifecycleError::NotFound(id),
            other => LifecycleError::Store(other),
        }
    }
}

/// A graded attempt at a remediation exercise.
#[derive(Debug, Clone)]
pub struct AttemptOutcome {
    /// Suggestion after the attempt.
    pub suggestion: RemediationSuggestion,
    /// Grading of the attempt.
    pub result:     GradingResult,
    /// How the score was read.
    pub parse:      ParseResult,
}

/// Result of a gated remediation attempt.
#[derive(Debug, Clone)]
pub enum AttemptReply {
    /// The attempt was graded.
    Graded(Box<AttemptOutcome>),
    /// Graded features are closed to this student; redirect to the upgrade
    /// page.
    Upgrade,
}

/// Teacher review, student attempts and listings of remediation suggestions.
#[derive(Clone)]
pub struct RemediationDesk {
    /// Where suggestions are kept.
    store:  Arc<dyn Store>,
    /// Grades student attempts.
    grader: Grader,
}

/// State reached from the suggestion's current one, or a conflict.
fn next_status(
    suggestion: &RemediationSuggestion,
    action: LifecycleAction,
) -> Result<RemediationStatus, LifecycleError> {
    suggestion.status.apply(action).ok_or_else(|| {
        warn!(id = %suggestion.id, from = %suggestion.status, %action, "remediation state conflict");
        LifecycleError::StateConflict {
            id: suggestion.id,
            from: suggestion.status,
            action,
        }
    })
}

/// Teachers and administrators only.
fn require_teacher(ctx: &RequestContext) -> Result<(), LifecycleError> {
    if ctx.is_staff() {
        Ok(())
    } else {
        Err(LifecycleError::Forbidden)
    }
}

/// Students only.
fn require_student(ctx: &RequestContext) -> Result<&StudentId, LifecycleError> {
    ctx.as_student().ok_or(LifecycleError::Forbidden)
}

impl RemediationDesk {
    /// Creates a desk.
    pub fn new(store: Arc<dyn Store>, grader: Grader) -> Self {
        Self { store, grader }
    }

    /// Loads a suggestion and checks that `action` is allowed from its
    /// current state.
    async fn load_for(
        &self,
        id: Uuid,
        action: LifecycleAction,
    ) -> Result<(RemediationSuggestion, RemediationStatus), LifecycleError> {
        let suggestion = self.store.get_suggestion(id).await?;
        let next = next_status(&suggestion, action)?;
        Ok((suggestion, next))
    }

    /// Teacher approval of a pending suggestion. Edited fields replace the
    /// generated ones and the text is rebuilt in the teacher's language;
    /// untouched fields are kept verbatim.
    ///
    /// A suggestion whose text has no question and expected answer, and whose
    /// edit does not supply both, is refused with nothing changed: it could
    /// never be attempted.
    pub async fn approve(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        edit: TeacherEdit,
    ) -> Result<RemediationSuggestion, LifecycleError> {
        require_teacher(ctx)?;
        let (mut suggestion, next) = self.load_for(id, LifecycleAction::Approve).await?;

        let rebuilt = match suggestion.exercise() {
            Some(exercise) => Some(exercise.edited(&edit)),
            None => match (&edit.question, &edit.expected_answer) {
                (Some(question), Some(expected_answer)) => Some(GeneratedExercise {
                    question: question.clone(),
                    expected_answer: expected_answer.clone(),
                    hint: None,
                    explanation: edit.explanation.clone(),
                }),
                _ => None,
            },
        };
        let Some(exercise) = rebuilt else {
            warn!(%id, "refused approval of an exercise with no question or expected answer");
            return Err(LifecycleError::MalformedExercise(id));
        };
        suggestion.generated_exercise_text = exercise.to_teacher_text(ctx.language);
        if edit.message.is_some() {
            suggestion.message = edit.message;
        }
        suggestion.status = next;

        self.store.update_suggestion(&suggestion).await?;
        info!(%id, status = %suggestion.status, "remediation approved");
        Ok(suggestion)
    }

    /// Grades the student's attempt at their approved suggestion.
    ///
    /// A passing attempt closes the suggestion as succeeded; otherwise it is
    /// left in progress. Attempts never create further remediation.
    pub async fn submit_attempt(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        answer: &str,
    ) -> Result<AttemptOutcome, LifecycleError> {
        let student_id = require_student(ctx)?;
        let mut suggestion = self.store.get_suggestion(id).await?;
        if &suggestion.student_id != student_id {
            return Err(LifecycleError::Forbidden);
        }
        // Checked before grading so a refused attempt costs no completion call.
        next_status(&suggestion, LifecycleAction::Attempt { passed: false })?;
        let exercise = suggestion
            .exercise()
            .ok_or(LifecycleError::MalformedExercise(id))?;

        let (_, result, parse) = self
            .grader
            .grade_attempt(
                student_id,
                ctx.language,
                &exercise.question,
                &exercise.expected_answer,
                answer,
            )
            .await?;

        let action = LifecycleAction::Attempt {
            passed: result.score >= PASSING_SCORE,
        };
        suggestion.status = next_status(&suggestion, action)?;
        suggestion.student_answer = Some(answer.to_string());
        suggestion.grading_result_ref = Some(result.id);
        self.store.update_suggestion(&suggestion).await?;

        info!(
            %id,
            student_id = %student_id,
            score = result.score,
            status = %suggestion.status,
            "remediation attempt graded"
        );
        Ok(AttemptOutcome {
            suggestion,
            result,
            parse,
        })
    }

    /// Checks feature access first, then grades the attempt. A closed window
    /// changes nothing and makes no completion call.
    pub async fn submit_attempt_gated(
        &self,
        window: &AccessWindow,
        ctx: &RequestContext,
        id: Uuid,
        answer: &str,
        now: DateTime<Utc>,
    ) -> Result<AttemptReply, LifecycleError> {
        match self.grader.gate().feature_access(window, now) {
            AccessDecision::Granted(_) => {
                let outcome = self.submit_attempt(ctx, id, answer).await?;
                Ok(AttemptReply::Graded(Box::new(outcome)))
            }
            AccessDecision::Upgrade => Ok(AttemptReply::Upgrade),
        }
    }

    /// Deletes a suggestion, whatever its state.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> Result<(), LifecycleError> {
        require_teacher(ctx)?;
        self.store.delete_suggestion(id).await?;
        info!(%id, "remediation deleted");
        Ok(())
    }

    /// Suggestions awaiting review.
    pub async fn pending_for_review(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<RemediationSuggestion>, LifecycleError> {
        require_teacher(ctx)?;
        Ok(self
            .store
            .suggestions_with_status(RemediationStatus::Pending)
            .await?)
    }

    /// Suggestions the teacher has not been told about yet.
    pub async fn new_for_teacher(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<RemediationSuggestion>, LifecycleError> {
        require_teacher(ctx)?;
        Ok(self.store.unnotified_suggestions().await?)
    }

    /// Records that the teacher has been told about a suggestion.
    pub async fn mark_notified(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> Result<RemediationSuggestion, LifecycleError> {
        require_teacher(ctx)?;
        let mut suggestion = self.store.get_suggestion(id).await?;
        if !suggestion.notified_to_teacher {
            suggestion.notified_to_teacher = true;
            self.store.update_suggestion(&suggestion).await?;
        }
        Ok(suggestion)
    }

    /// The student's open suggestions, newest first. Listing marks them seen.
    pub async fn student_inbox(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<RemediationSuggestion>, LifecycleError> {
        let student_id = require_student(ctx)?;
        let mut open: Vec<_> = self
            .store
            .suggestions_for_student(student_id)
            .await?
            .into_iter()
            .filter(|s| {
                matches!(
                    s.status,
                    RemediationStatus::Approved | RemediationStatus::InProgress
                )
            })
            .collect();

        for suggestion in open.iter_mut().filter(|s| !s.seen_by_student) {
            suggestion.seen_by_student = true;
            self.store.update_suggestion(suggestion).await?;
        }
        Ok(open)
    }
}
