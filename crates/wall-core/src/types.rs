//! Core types for the wall
//!
//! Defines:
//! - Submission identity and rows
//! - Moderation status lifecycle
//! - Engagement keys and toggle outcomes
//! - Leaderboard entries

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Filter name recorded when no style filter was applied
pub const DEFAULT_FILTER: &str = "none";

/// Maximum rows returned by the public listing
pub const LIST_LIMIT: u32 = 100;

/// Maximum rows returned by the leaderboard
pub const LEADERBOARD_LIMIT: u32 = 50;

/// Server-assigned submission identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub i64);

impl SubmissionId {
    /// Raw integer value
    #[inline]
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for SubmissionId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Moderation lifecycle: `Pending` until the filter runs, then `Approved` or `Flagged`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    /// Not yet screened; hidden from the listing
    #[default]
    Pending,
    /// Screened and publicly listed
    Approved,
    /// Matched a forbidden keyword; hidden
    Flagged,
}

impl ModerationStatus {
    /// Column value stored in the database
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Flagged => "flagged",
        }
    }

    /// Whether submissions in this state are publicly listed
    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl FromStr for ModerationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "flagged" => Ok(Self::Flagged),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted submission row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Server-assigned id
    pub id: SubmissionId,
    /// Display name of the submitter
    pub username: String,
    /// Text message, absent for image-only submissions
    pub message: Option<String>,
    /// Stored URI or inline data URI, absent for text-only submissions
    pub image_url: Option<String>,
    /// Name of the style filter used
    pub filter_applied: String,
    /// Exact count of engagement rows for this submission
    pub engagement_count: i64,
    /// Current moderation state
    pub moderation_status: ModerationStatus,
    /// Server timestamp of creation
    pub created_at: DateTime<Utc>,
}

/// A validated, not yet persisted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    /// Display name
    pub username: String,
    /// Text message (never an empty string)
    pub message: Option<String>,
    /// Image URI (never an empty string)
    pub image_url: Option<String>,
    /// Filter name, `"none"` when not given
    pub filter_applied: String,
}

impl NewSubmission {
    /// Validate raw request fields
    ///
    /// Empty strings count as absent. At least one of `message` and
    /// `image_url` must survive that normalisation.
    ///
    /// # Errors
    /// - `ValidationError::MissingField("username")` for a blank username
    /// - `ValidationError::EmptyContent` when both content fields are empty
    pub fn new(
        username: &str,
        message: Option<&str>,
        image_url: Option<&str>,
        filter_applied: Option<&str>,
    ) -> Result<Self, ValidationError> {
        if username.trim().is_empty() {
            return Err(ValidationError::MissingField("username"));
        }

        let message = non_empty(message);
        let image_url = non_empty(image_url);
        if message.is_none() && image_url.is_none() {
            return Err(ValidationError::EmptyContent);
        }

        Ok(Self {
            username: username.to_string(),
            message,
            image_url,
            filter_applied: non_empty(filter_applied).unwrap_or_else(|| DEFAULT_FILTER.to_string()),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

/// One `(submission, user, kind)` reaction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EngagementKey {
    /// Target submission
    pub submission_id: SubmissionId,
    /// Client-generated actor id
    pub user_id: String,
    /// Reaction kind, e.g. `"like"`
    pub kind: String,
}

impl EngagementKey {
    /// Validate raw request fields
    ///
    /// # Errors
    /// `ValidationError::MissingField` for a blank `userId` or `engagementType`
    pub fn new(
        submission_id: SubmissionId,
        user_id: &str,
        kind: &str,
    ) -> Result<Self, ValidationError> {
        if user_id.trim().is_empty() {
            return Err(ValidationError::MissingField("userId"));
        }
        if kind.trim().is_empty() {
            return Err(ValidationError::MissingField("engagementType"));
        }
        Ok(Self {
            submission_id,
            user_id: user_id.to_string(),
            kind: kind.to_string(),
        })
    }
}

/// Result of toggling an engagement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    /// `true` if the engagement now exists, `false` if it was removed
    pub engaged: bool,
    /// Recomputed count for the submission, across all kinds
    pub engagement_count: i64,
}

/// Append-only audit record written when content is flagged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationLog {
    /// Surrogate key
    pub id: i64,
    /// Submission the action applies to
    pub submission_id: SubmissionId,
    /// Action taken, e.g. `"flag"`
    pub action: String,
    /// Human-readable reason
    pub reason: String,
    /// When the action was recorded
    pub created_at: DateTime<Utc>,
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Submitter display name
    pub username: String,
    /// Approved submissions by this name
    pub submission_count: i64,
    /// Sum of engagement counts over those submissions
    pub total_engagements: i64,
}
