//! Request-scoped services over the shared store and gateway
//!
//! Each service is a cheap handle around an `Arc`; [`AppState`] bundles them
//! for the router.

pub mod engagement;
pub mod leaderboard;
pub mod moderation;
pub mod submission;

pub use engagement::EngagementService;
pub use leaderboard::LeaderboardService;
pub use moderation::ModerationService;
pub use submission::SubmissionService;

use std::sync::Arc;
use wall_imagen::ImageFilterGateway;
use wall_store::WallStore;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// Submission create/list
    pub submissions: SubmissionService,
    /// Keyword moderation
    pub moderation: ModerationService,
    /// Engagement toggles
    pub engagements: EngagementService,
    /// Ranking
    pub leaderboard: LeaderboardService,
    /// Style-filter gateway
    pub filters: Arc<ImageFilterGateway>,
}

impl AppState {
    /// Wire every service to one store and one gateway
    #[must_use]
    pub fn new(store: Arc<dyn WallStore>, filters: Arc<ImageFilterGateway>) -> Self {
        Self {
            submissions: SubmissionService::new(Arc::clone(&store)),
            moderation: ModerationService::new(Arc::clone(&store)),
            engagements: EngagementService::new(Arc::clone(&store)),
            leaderboard: LeaderboardService::new(store),
            filters,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}
