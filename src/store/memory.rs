#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::{
    grading::GradingResult,
    remediation::{RemediationStatus, RemediationSuggestion},
    types::{StudentId, Submission},
};

/// Store keeping every table in memory. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    /// Submissions by id.
    submissions: RwLock<HashMap<Uuid, Submission>>,
    /// Grading results by id.
    gradings:    RwLock<HashMap<Uuid, GradingResult>>,
    /// Remediation suggestions by id.
    suggestions: RwLock<HashMap<Uuid, RemediationSuggestion>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of submissions stored.
    pub async fn submission_count(&self) -> usize {
        self.submissions.read().await.len()
    }

    /// Number of grading results stored.
    pub async fn grading_count(&self) -> usize {
        self.gradings.read().await.len()
    }

    /// Number of remediation suggestions stored.
    pub async fn suggestion_count(&self) -> usize {
        self.suggestions.read().await.len()
    }

    /// Collects suggestions matching `keep`, newest first.
    async fn collect_suggestions(
        &self,
        keep: impl Fn(&RemediationSuggestion) -> bool,
    ) -> Vec<RemediationSuggestion> {
        let mut found: Vec<_> = self
            .suggestions
            .read()
            .await
            .values()
            .filter(|s| keep(s))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        let mut rows = self.submissions.write().await;
        if rows.contains_key(&submission.id) {
            return Err(StoreError::Duplicate {
                table: "submissions",
                id:    submission.id,
            });
        }
        rows.insert(submission.id, submission.clone());
        Ok(())
    }

    async fn get_submission(&self, id: Uuid) -> Result<Submission, StoreError> {
        self.submissions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                table: "submissions",
                id,
            })
    }

    async fn insert_grading(&self, result: &GradingResult) -> Result<(), StoreError> {
        let mut rows = self.gradings.write().await;
        if rows.contains_key(&result.id) {
            return Err(StoreError::Duplicate {
                table: "grading_results",
                id:    result.id,
            });
        }
        rows.insert(result.id, result.clone());
        Ok(())
    }

    async fn get_grading(&self, id: Uuid) -> Result<GradingResult, StoreError> {
        self.gradings
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                table: "grading_results",
                id,
            })
    }

    async fn grading_for_submission(
        &self,
        submission_id: Uuid,
    ) -> Result<Option<GradingResult>, StoreError> {
        Ok(self
            .gradings
            .read()
            .await
            .values()
            .find(|g| g.submission_id == submission_id)
            .cloned())
    }

    async fn insert_suggestion(
        &self,
        suggestion: &RemediationSuggestion,
    ) -> Result<(), StoreError> {
        let mut rows = self.suggestions.write().await;
        if rows.contains_key(&suggestion.id) {
            return Err(StoreError::Duplicate {
                table: "remediation_suggestions",
                id:    suggestion.id,
            });
        }
        rows.insert(suggestion.id, suggestion.clone());
        Ok(())
    }

    async fn get_suggestion(&self, id: Uuid) -> Result<RemediationSuggestion, StoreError> {
        self.suggestions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                table: "remediation_suggestions",
                id,
            })
    }

    async fn update_suggestion(
        &self,
        suggestion: &RemediationSuggestion,
    ) -> Result<(), StoreError> {
        match self.suggestions.write().await.get_mut(&suggestion.id) {
            Some(row) => {
                *row = suggestion.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                table: "remediation_suggestions",
                id:    suggestion.id,
            }),
        }
    }

    async fn delete_suggestion(&self, id: Uuid) -> Result<(), StoreError> {
        self.suggestions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound {
                table: "remediation_suggestions",
                id,
            })
    }

    async fn suggestions_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<RemediationSuggestion>, StoreError> {
        Ok(self
            .collect_suggestions(|s| &s.student_id == student_id)
            .await)
    }

    async fn suggestions_with_status(
        &self,
        status: RemediationStatus,
    ) -> Result<Vec<RemediationSuggestion>, StoreError> {
        Ok(self.collect_suggestions(|s| s.status == status).await)
    }

    async fn unnotified_suggestions(&self) -> Result<Vec<RemediationSuggestion>, StoreError> {
        Ok(self.collect_suggestions(|s| !s.notified_to_teacher).await)
    }
}
