#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Remediation exercises: generation after a low score, their text format,
//! and their review and retry lifecycle.

/// Parsing and rebuilding of generated exercise text.
pub mod exercise;
/// Best-effort generation after a low score.
pub mod generator;
/// Teacher review, student attempts and listings.
pub mod lifecycle;

use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::{
    exercise::{GeneratedExercise, TeacherEdit},
    generator::RemediationGenerator,
    lifecycle::{AttemptOutcome, AttemptReply, LifecycleError, RemediationDesk},
};
use crate::types::StudentId;

/// Lifecycle state of a remediation suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationStatus {
    /// Awaiting teacher review.
    Pending,
    /// Finalized by a teacher; open to the student.
    Approved,
    /// At least one attempt scored below the passing score.
    InProgress,
    /// An attempt passed. Terminal.
    Succeeded,
}

/// Something that moves a suggestion through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    /// Teacher approval.
    Approve,
    /// A graded student attempt.
    Attempt {
        /// Whether the attempt reached the passing score.
        passed: bool,
    },
}

impl Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleAction::Approve => f.write_str("approve"),
            LifecycleAction::Attempt { .. } => f.write_str("attempt"),
        }
    }
}

impl RemediationStatus {
    /// Name used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            RemediationStatus::Pending => "pending",
            RemediationStatus::Approved => "approved",
            RemediationStatus::InProgress => "in_progress",
            RemediationStatus::Succeeded => "succeeded",
        }
    }

    /// State reached by applying `action`, or `None` when the transition is
    /// not allowed.
    pub fn apply(self, action: LifecycleAction) -> Option<Self> {
        use RemediationStatus::*;

        match (self, action) {
            (Pending, LifecycleAction::Approve) => Some(Approved),
            (Approved | InProgress, LifecycleAction::Attempt { passed: true }) => Some(Succeeded),
            (Approved | InProgress, LifecycleAction::Attempt { passed: false }) => {
                Some(InProgress)
            }
            _ => None,
        }
    }

    /// True once no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        *self == RemediationStatus::Succeeded
    }
}

impl Display for RemediationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A follow-up exercise proposed after a low score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationSuggestion {
    /// Record identifier.
    pub id:                      Uuid,
    /// Student the exercise is for.
    pub student_id:              StudentId,
    /// Exercise whose low score triggered the suggestion.
    pub origin_exercise_id:      Option<String>,
    /// Theme of the failed exercise.
    pub origin_theme:            String,
    /// Lesson label of the failed exercise.
    pub origin_lesson_label:     String,
    /// Score that triggered the suggestion.
    pub origin_score:            u8,
    /// Note shown to the student: the automatic one, or the teacher's.
    pub message:                 Option<String>,
    /// Exercise text, generated then possibly rewritten by the teacher.
    pub generated_exercise_text: String,
    /// Lifecycle state.
    pub status:                  RemediationStatus,
    /// Latest attempt of the student.
    pub student_answer:          Option<String>,
    /// Grading of the latest attempt.
    pub grading_result_ref:      Option<Uuid>,
    /// Set once the student has listed it.
    pub seen_by_student:         bool,
    /// Set once the teacher has been told about it.
    pub notified_to_teacher:     bool,
    /// Creation time.
    pub created_at:              DateTime<Utc>,
}

impl RemediationSuggestion {
    /// The question and expected answer parsed from the exercise text.
    pub fn exercise(&self) -> Option<GeneratedExercise> {
        GeneratedExercise::parse(&self.generated_exercise_text)
    }
}
