//! Submission create and list

use crate::error::ServiceError;
use std::sync::Arc;
use wall_core::{NewSubmission, Submission, LIST_LIMIT};
use wall_store::WallStore;

/// Creates submissions and lists the approved ones
#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<dyn WallStore>,
}

impl SubmissionService {
    /// Create service over a store
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn WallStore>) -> Self {
        Self { store }
    }

    /// Persist a validated submission in `pending` state
    ///
    /// No moderation happens here; callers run it separately.
    ///
    /// # Errors
    /// `ServiceError::Store` if the insert fails
    #[tracing::instrument(skip(self, draft), fields(username = %draft.username))]
    pub async fn create(&self, draft: &NewSubmission) -> Result<Submission, ServiceError> {
        let row = self.store.create_submission(draft).await?;
        tracing::info!(id = %row.id, has_image = row.image_url.is_some(), "submission created");
        Ok(row)
    }

    /// Approved submissions, newest first, at most [`LIST_LIMIT`]
    ///
    /// # Errors
    /// `ServiceError::Store` if the query fails
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Submission>, ServiceError> {
        let rows = self.store.list_approved(LIST_LIMIT).await?;
        tracing::debug!(count = rows.len(), "listed approved submissions");
        Ok(rows)
    }
}
