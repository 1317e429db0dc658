//! Keyword moderation

use crate::error::ServiceError;
use std::sync::Arc;
use wall_core::moderation::{classify, Verdict};
use wall_core::SubmissionId;
use wall_store::WallStore;

/// Classifies a message and records the verdict on a submission
#[derive(Clone)]
pub struct ModerationService {
    store: Arc<dyn WallStore>,
}

impl ModerationService {
    /// Create service over a store
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn WallStore>) -> Self {
        Self { store }
    }

    /// Classify `message` and write the outcome to submission `id`
    ///
    /// # Errors
    /// - `ServiceError::Store` wrapping `NotFound` for an unknown id
    /// - `ServiceError::Store` if the write fails
    #[tracing::instrument(skip(self, message), fields(id = %id))]
    pub async fn moderate(&self, id: SubmissionId, message: &str) -> Result<Verdict, ServiceError> {
        let verdict = classify(message);
        self.store.apply_verdict(id, &verdict).await?;

        match verdict.matched {
            Some(keyword) => tracing::warn!(keyword, "submission flagged"),
            None => tracing::info!("submission approved"),
        }
        Ok(verdict)
    }
}
