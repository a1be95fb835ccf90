#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use postgrest::Postgrest;
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use super::{Store, StoreError};
use crate::{
    config,
    grading::GradingResult,
    remediation::{RemediationStatus, RemediationSuggestion},
    types::{StudentId, Submission},
};

/// Table holding submissions.
const SUBMISSIONS: &str = "submissions";
/// Table holding grading results.
const GRADING_RESULTS: &str = "grading_results";
/// Table holding remediation suggestions.
const SUGGESTIONS: &str = "remediation_suggestions";

/// Store writing to Supabase tables through PostgREST.
#[derive(Clone)]
pub struct PostgrestStore {
    /// Configured PostgREST client.
    client: Postgrest,
}

impl PostgrestStore {
    /// Wraps an existing client.
    pub fn new(client: Postgrest) -> Self {
        Self { client }
    }

    /// Builds a store from `SUPABASE_URL` and `SUPABASE_ANON_KEY`.
    pub fn from_config() -> Result<Self> {
        let client = config::postgrest_client().ok_or_else(|| {
            anyhow!("SUPABASE_URL and SUPABASE_ANON_KEY must be set to use the Supabase store.")
        })?;
        Ok(Self::new(client))
    }

    /// Inserts a single row.
    async fn insert_row<T: Serialize>(&self, table: &'static str, row: &T) -> Result<()> {
        let body = serde_json::to_string(row)
            .with_context(|| format!("Failed to serialize {table} row"))?;
        self.client
            .from(table)
            .insert(body)
            .execute()
            .await
            .with_context(|| format!("Failed to write {table} row to Supabase"))?
            .error_for_status()
            .with_context(|| format!("Supabase rejected {table} row"))?;
        Ok(())
    }

    /// Runs a select and deserializes every returned row.
    async fn select_rows<T: DeserializeOwned>(
        &self,
        table: &'static str,
        filters: &[(&str, String)],
        not_equal: Option<(&str, String)>,
    ) -> Result<Vec<T>> {
        let mut query = self.client.from(table).select("*");
        for (column, value) in filters {
            query = query.eq(*column, value.clone());
        }
        if let Some((column, value)) = not_equal {
            query = query.neq(column, value);
        }

        let body = query
            .order("created_at.desc")
            .execute()
            .await
            .with_context(|| format!("Failed to query {table}"))?
            .error_for_status()
            .with_context(|| format!("Supabase rejected query on {table}"))?
            .text()
            .await
            .with_context(|| format!("Could not read {table} response body"))?;

        serde_json::from_str(&body).with_context(|| format!("Failed to deserialize {table} rows"))
    }

    /// Reads a single row by id.
    async fn select_one<T: DeserializeOwned>(
        &self,
        table: &'static str,
        id: Uuid,
    ) -> Result<T, StoreError> {
        self.select_rows::<T>(table, &[("id", id.to_string())], None)
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound { table, id })
    }
}

/// Checks the rows returned by an update or delete (PostgREST answers with
/// `return=representation` for both) and reports a missing key as
/// `NotFound`, the same way `MemoryStore` does.
fn require_affected(body: &str, table: &'static str, id: Uuid) -> Result<(), StoreError> {
    if affected_rows(body)? == 0 {
        return Err(StoreError::NotFound { table, id });
    }
    Ok(())
}

/// Number of rows in a PostgREST representation body.
fn affected_rows(body: &str) -> Result<usize> {
    let rows: Vec<serde_json::Value> =
        serde_json::from_str(body).context("Failed to read affected rows")?;
    Ok(rows.len())
}

#[async_trait]
impl Store for PostgrestStore {
    async fn insert_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        Ok(self.insert_row(SUBMISSIONS, submission).await?)
    }

    async fn get_submission(&self, id: Uuid) -> Result<Submission, StoreError> {
        self.select_one(SUBMISSIONS, id).await
    }

    async fn insert_grading(&self, result: &GradingResult) -> Result<(), StoreError> {
        Ok(self.insert_row(GRADING_RESULTS, result).await?)
    }

    async fn get_grading(&self, id: Uuid) -> Result<GradingResult, StoreError> {
        self.select_one(GRADING_RESULTS, id).await
    }

    async fn grading_for_submission(
        &self,
        submission_id: Uuid,
    ) -> Result<Option<GradingResult>, StoreError> {
        Ok(self
            .select_rows::<GradingResult>(
                GRADING_RESULTS,
                &[("submission_id", submission_id.to_string())],
                None,
            )
            .await?
            .into_iter()
            .next())
    }

    async fn insert_suggestion(
        &self,
        suggestion: &RemediationSuggestion,
    ) -> Result<(), StoreError> {
        Ok(self.insert_row(SUGGESTIONS, suggestion).await?)
    }

    async fn get_suggestion(&self, id: Uuid) -> Result<RemediationSuggestion, StoreError> {
        self.select_one(SUGGESTIONS, id).await
    }

    async fn update_suggestion(
        &self,
        suggestion: &RemediationSuggestion,
    ) -> Result<(), StoreError> {
        let body = serde_json::to_string(suggestion)
            .context("Failed to serialize remediation suggestion")?;
        let response = self
            .client
            .from(SUGGESTIONS)
            .eq("id", suggestion.id.to_string())
            .update(body)
            .execute()
            .await
            .context("Failed to update remediation suggestion")?
            .error_for_status()
            .context("Supabase rejected remediation update")?
            .text()
            .await
            .context("Could not read remediation update response")?;
        require_affected(&response, SUGGESTIONS, suggestion.id)
    }

    async fn delete_suggestion(&self, id: Uuid) -> Result<(), StoreError> {
        let response = self
            .client
            .from(SUGGESTIONS)
            .eq("id", id.to_string())
            .delete()
            .execute()
            .await
            .context("Failed to delete remediation suggestion")?
            .error_for_status()
            .context("Supabase rejected remediation delete")?
            .text()
            .await
            .context("Could not read remediation delete response")?;
        require_affected(&response, SUGGESTIONS, id)
    }

    async fn suggestions_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<RemediationSuggestion>, StoreError> {
        Ok(self
            .select_rows(SUGGESTIONS, &[("student_id", student_id.to_string())], None)
            .await?)
    }

    async fn suggestions_with_status(
        &self,
        status: RemediationStatus,
    ) -> Result<Vec<RemediationSuggestion>, StoreError> {
        Ok(self
            .select_rows(SUGGESTIONS, &[("status", status.as_str().to_string())], None)
            .await?)
    }

    async fn unnotified_suggestions(&self) -> Result<Vec<RemediationSuggestion>, StoreError> {
        Ok(self
            .select_rows(SUGGESTIONS, &[], Some(("notified_to_teacher", "true".to_string())))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_representation_means_no_row_matched() {
        assert_eq!(affected_rows("[]").unwrap(), 0);
        assert_eq!(affected_rows(r#"[{"id": "a"}]"#).unwrap(), 1);
        assert!(affected_rows("not json").is_err());
    }

    #[test]
    fn missing_row_is_not_found() {
        let id = Uuid::new_v4();
        assert!(matches!(
            require_affected("[]", SUGGESTIONS, id),
            Err(StoreError::NotFound { table: SUGGESTIONS, id: missing }) if missing == id
        ));
        assert!(require_affected(r#"[{"id": "x"}]"#, SUGGESTIONS, id).is_ok());
    }
}
