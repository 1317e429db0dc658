//! Raw row shapes and their mapping to domain types

use crate::error::StoreError;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::FromRow;
use wall_core::{LeaderboardEntry, ModerationLog, Submission, SubmissionId};

/// Columns selected for every submission read
pub(crate) const SUBMISSION_COLUMNS: &str = "id, username, message, image_url, filter_applied, \
     engagement_count, moderation_status, created_at";

#[derive(Debug, FromRow)]
pub(crate) struct SubmissionRow {
    id: i64,
    username: String,
    message: Option<String>,
    image_url: Option<String>,
    filter_applied: String,
    engagement_count: i64,
    moderation_status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = StoreError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SubmissionId(row.id),
            username: row.username,
            message: row.message,
            image_url: row.image_url,
            filter_applied: row.filter_applied,
            engagement_count: row.engagement_count,
            moderation_status: row.moderation_status.parse()?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ModerationLogRow {
    id: i64,
    submission_id: i64,
    action: String,
    reason: String,
    created_at: DateTime<Utc>,
}

impl From<ModerationLogRow> for ModerationLog {
    fn from(row: ModerationLogRow) -> Self {
        Self {
            id: row.id,
            submission_id: SubmissionId(row.submission_id),
            action: row.action,
            reason: row.reason,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct LeaderboardRow {
    username: String,
    submission_count: i64,
    total_engagements: i64,
}

impl From<LeaderboardRow> for LeaderboardEntry {
    fn from(row: LeaderboardRow) -> Self {
        Self {
            username: row.username,
            submission_count: row.submission_count,
            total_engagements: row.total_engagements,
        }
    }
}

/// Fixed-width RFC 3339 text, so `ORDER BY created_at` sorts chronologically
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamps_are_fixed_width() {
        let whole = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let fractional = whole + chrono::Duration::microseconds(1500);

        assert_eq!(timestamp(whole), "2024-01-02T03:04:05.000000Z");
        assert_eq!(timestamp(fractional), "2024-01-02T03:04:05.001500Z");
        assert!(timestamp(whole) < timestamp(fractional));
    }
}
