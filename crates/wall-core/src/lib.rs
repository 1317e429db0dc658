//! Wall Core - domain model of the community wall
//!
//! Holds everything that does not touch the network or the database:
//! - Submission, engagement and leaderboard types
//! - Request validation (`NewSubmission`, `EngagementKey`)
//! - The keyword moderation classifier
//!
//! # Example
//!
//! ```rust
//! use wall_core::{moderation, ModerationStatus, NewSubmission};
//!
//! let draft = NewSubmission::new("ada", Some("I get screened yearly"), None, None).unwrap();
//! assert_eq!(draft.filter_applied, "none");
//!
//! let verdict = moderation::classify("this is spam content");
//! assert_eq!(verdict.status, ModerationStatus::Flagged);
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod error;
pub mod moderation;
pub mod types;

pub use error::ValidationError;
pub use moderation::Verdict;
pub use types::{
    EngagementKey, LeaderboardEntry, ModerationLog, ModerationStatus, NewSubmission, Submission,
    SubmissionId, ToggleOutcome, DEFAULT_FILTER, LEADERBOARD_LIMIT, LIST_LIMIT,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
