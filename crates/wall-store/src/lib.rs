//! Wall Store - relational persistence
//!
//! Three tables, owned exclusively by this crate:
//! - `submissions`
//! - `engagements` (UNIQUE on `submission_id, user_id, type`)
//! - `moderation_logs` (append-only)
//!
//! Every read re-queries the database; nothing is cached in process.
//!
//! # Example
//!
//! ```rust,ignore
//! use wall_store::{SqliteStore, WallStore};
//! use wall_core::NewSubmission;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::connect("sqlite://wall.db", 5).await?;
//! let draft = NewSubmission::new("ada", Some("hello"), None, None)?;
//! let row = store.create_submission(&draft).await?;
//! println!("created {}", row.id);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod error;
mod rows;
pub mod schema;
pub mod sqlite;

pub use error::StoreError;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use wall_core::{
    EngagementKey, LeaderboardEntry, ModerationLog, NewSubmission, Submission, SubmissionId,
    ToggleOutcome, Verdict,
};

/// Persistence operations used by the services
#[async_trait]
pub trait WallStore: Send + Sync {
    /// Insert a validated submission in `pending` state
    async fn create_submission(&self, draft: &NewSubmission) -> Result<Submission, StoreError>;

    /// Fetch one submission regardless of status
    async fn get_submission(&self, id: SubmissionId) -> Result<Option<Submission>, StoreError>;

    /// Approved submissions, newest first
    async fn list_approved(&self, limit: u32) -> Result<Vec<Submission>, StoreError>;

    /// Write a moderation verdict, appending a log row when flagged
    ///
    /// # Errors
    /// `StoreError::NotFound` if the submission does not exist
    async fn apply_verdict(&self, id: SubmissionId, verdict: &Verdict) -> Result<(), StoreError>;

    /// Moderation log rows for a submission, oldest first
    async fn moderation_logs(&self, id: SubmissionId) -> Result<Vec<ModerationLog>, StoreError>;

    /// Insert or delete one engagement and rewrite the submission's count
    ///
    /// # Errors
    /// `StoreError::NotFound` if the submission does not exist
    async fn toggle_engagement(&self, key: &EngagementKey) -> Result<ToggleOutcome, StoreError>;

    /// Approved submissions grouped by username
    async fn leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, StoreError>;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
