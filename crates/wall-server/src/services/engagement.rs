//! Engagement toggle

use crate::error::ServiceError;
use std::sync::Arc;
use wall_core::{EngagementKey, ToggleOutcome};
use wall_store::WallStore;

/// Adds or removes one actor's reaction on a submission
#[derive(Clone)]
pub struct EngagementService {
    store: Arc<dyn WallStore>,
}

impl EngagementService {
    /// Create service over a store
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn WallStore>) -> Self {
        Self { store }
    }

    /// Flip the engagement identified by `key`
    ///
    /// # Errors
    /// - `ServiceError::Store` wrapping `NotFound` for an unknown submission
    /// - `ServiceError::Store` if the transaction fails
    #[tracing::instrument(skip(self, key), fields(id = %key.submission_id, kind = %key.kind))]
    pub async fn toggle(&self, key: &EngagementKey) -> Result<ToggleOutcome, ServiceError> {
        let outcome = self.store.toggle_engagement(key).await?;
        tracing::info!(
            engaged = outcome.engaged,
            count = outcome.engagement_count,
            "engagement toggled"
        );
        Ok(outcome)
    }
}
