#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Durable persistence for submissions, grading results and remediation
//! suggestions. Every write touches exactly one row.

/// In-process store used by tests and the command line.
pub mod memory;
/// Supabase/PostgREST-backed store.
pub mod postgrest;

use async_trait::async_trait;
use uuid::Uuid;

pub use self::{memory::MemoryStore, postgrest::PostgrestStore};
use crate::{
    grading::GradingResult,
    remediation::{RemediationStatus, RemediationSuggestion},
    types::{StudentId, Submission},
};

/// Errors raised by a store back-end.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// No row with this key exists.
    #[error("no {table} record with id {id}")]
    NotFound {
        /// Table that was queried.
        table: &'static str,
        /// Key that was looked up.
        id:    Uuid,
    },
    /// A row with this key already exists.
    #[error("a {table} record with id {id} already exists")]
    Duplicate {
        /// Table that was written.
        table: &'static str,
        /// Conflicting key.
        id:    Uuid,
    },
    /// The back-end failed.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Key-based create/read/update over the three records the engine owns.
#[async_trait]
pub trait Store: Send + Sync {
    /// Persists a new submission.
    async fn insert_submission(&self, submission: &Submission) -> Result<(), StoreError>;

    /// Reads a submission by key.
    async fn get_submission(&self, id: Uuid) -> Result<Submission, StoreError>;

    /// Persists a new grading result.
    async fn insert_grading(&self, result: &GradingResult) -> Result<(), StoreError>;

    /// Reads a grading result by key.
    async fn get_grading(&self, id: Uuid) -> Result<GradingResult, StoreError>;

    /// Returns the grading result attached to a submission, if any.
    async fn grading_for_submission(
        &self,
        submission_id: Uuid,
    ) -> Result<Option<GradingResult>, StoreError>;

    /// Persists a new remediation suggestion.
    async fn insert_suggestion(&self, suggestion: &RemediationSuggestion)
    -> Result<(), StoreError>;

    /// Reads a remediation suggestion by key.
    async fn get_suggestion(&self, id: Uuid) -> Result<RemediationSuggestion, StoreError>;

    /// Replaces a remediation suggestion with the given version.
    async fn update_suggestion(&self, suggestion: &RemediationSuggestion)
    -> Result<(), StoreError>;

    /// Deletes a remediation suggestion.
    async fn delete_suggestion(&self, id: Uuid) -> Result<(), StoreError>;

    /// All suggestions of a student, newest first.
    async fn suggestions_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<RemediationSuggestion>, StoreError>;

    /// All suggestions in a given state, newest first.
    async fn suggestions_with_status(
        &self,
        status: RemediationStatus,
    ) -> Result<Vec<RemediationSuggestion>, StoreError>;

    /// Suggestions the teacher has not yet been notified about, newest first.
    async fn unnotified_suggestions(&self) -> Result<Vec<RemediationSuggestion>, StoreError>;
}
