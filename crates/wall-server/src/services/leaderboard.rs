//! Submitter ranking

use crate::error::ServiceError;
use std::sync::Arc;
use wall_core::{LeaderboardEntry, LEADERBOARD_LIMIT};
use wall_store::WallStore;

/// Ranks submitters by total engagement
#[derive(Clone)]
pub struct LeaderboardService {
    store: Arc<dyn WallStore>,
}

impl LeaderboardService {
    /// Create service over a store
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn WallStore>) -> Self {
        Self { store }
    }

    /// Top [`LEADERBOARD_LIMIT`] submitters
    ///
    /// # Errors
    /// `ServiceError::Store` if the query fails
    #[tracing::instrument(skip(self))]
    pub async fn rank(&self) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        Ok(self.store.leaderboard(LEADERBOARD_LIMIT).await?)
    }
}
