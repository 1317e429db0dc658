//! SQLite implementation of [`WallStore`]
//!
//! Multi-statement writes (moderation, engagement toggle) run inside a single
//! transaction whose first statement is a write, so SQLite takes the write
//! lock up front and concurrent toggles serialise instead of racing on the
//! recount.

use crate::error::StoreError;
use crate::rows::{timestamp, LeaderboardRow, ModerationLogRow, SubmissionRow, SUBMISSION_COLUMNS};
use crate::schema::MIGRATIONS;
use crate::WallStore;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use wall_core::moderation::{FLAG_ACTION, FLAG_REASON};
use wall_core::{
    EngagementKey, LeaderboardEntry, ModerationLog, ModerationStatus, NewSubmission, Submission,
    SubmissionId, ToggleOutcome, Verdict,
};

/// SQLite-backed store
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url` and run migrations
    ///
    /// # Arguments
    /// * `url` - `sqlite://path/to/file.db` or `sqlite::memory:`
    /// * `max_connections` - pool size; forced to 1 for in-memory databases
    ///
    /// # Errors
    /// `StoreError::Database` if the URL is invalid or the connection fails,
    /// `StoreError::Migration` if schema creation fails
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let in_memory = url.contains(":memory:");
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        let options = if in_memory {
            options
        } else {
            options.journal_mode(SqliteJournalMode::Wal)
        };

        // Each in-memory connection is its own database: keep exactly one alive.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await?;
        let store = Self { pool };
        store.run_migrations().await?;

        tracing::info!(url, in_memory, "store ready");
        Ok(store)
    }

    /// Fresh private in-memory database
    ///
    /// # Errors
    /// Same as [`SqliteStore::connect`]
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::connect("sqlite::memory:", 1).await
    }

    /// Underlying pool
    #[inline]
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        for (label, statement) in MIGRATIONS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::migration(format!("failed to create {label}: {e}")))?;
        }
        Ok(())
    }
}

#[async_trait]
impl WallStore for SqliteStore {
    #[tracing::instrument(skip(self, draft), fields(username = %draft.username))]
    async fn create_submission(&self, draft: &NewSubmission) -> Result<Submission, StoreError> {
        let sql = format!(
            "INSERT INTO submissions (username, message, image_url, filter_applied, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {SUBMISSION_COLUMNS}"
        );
        let row: SubmissionRow = sqlx::query_as(&sql)
            .bind(&draft.username)
            .bind(draft.message.as_deref())
            .bind(draft.image_url.as_deref())
            .bind(&draft.filter_applied)
            .bind(timestamp(Utc::now()))
            .fetch_one(&self.pool)
            .await?;

        let submission = Submission::try_from(row)?;
        tracing::debug!(id = %submission.id, "submission inserted");
        Ok(submission)
    }

    async fn get_submission(&self, id: SubmissionId) -> Result<Option<Submission>, StoreError> {
        let sql = format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1");
        let row: Option<SubmissionRow> = sqlx::query_as(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Submission::try_from).transpose()
    }

    async fn list_approved(&self, limit: u32) -> Result<Vec<Submission>, StoreError> {
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions \
             WHERE moderation_status = ?1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT ?2"
        );
        let rows: Vec<SubmissionRow> = sqlx::query_as(&sql)
            .bind(ModerationStatus::Approved.as_str())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Submission::try_from).collect()
    }

    #[tracing::instrument(skip(self, verdict), fields(status = %verdict.status))]
    async fn apply_verdict(&self, id: SubmissionId, verdict: &Verdict) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE submissions SET moderation_status = ?2 WHERE id = ?1")
            .bind(id.get())
            .bind(verdict.status.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(StoreError::NotFound(id));
        }

        if verdict.is_flagged() {
            sqlx::query(
                "INSERT INTO moderation_logs (submission_id, action, reason, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(id.get())
            .bind(FLAG_ACTION)
            .bind(FLAG_REASON)
            .bind(timestamp(Utc::now()))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn moderation_logs(&self, id: SubmissionId) -> Result<Vec<ModerationLog>, StoreError> {
        let rows: Vec<ModerationLogRow> = sqlx::query_as(
            "SELECT id, submission_id, action, reason, created_at FROM moderation_logs \
             WHERE submission_id = ?1 ORDER BY id ASC",
        )
        .bind(id.get())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ModerationLog::from).collect())
    }

    #[tracing::instrument(skip(self, key), fields(submission_id = %key.submission_id, kind = %key.kind))]
    async fn toggle_engagement(&self, key: &EngagementKey) -> Result<ToggleOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            "DELETE FROM engagements WHERE submission_id = ?1 AND user_id = ?2 AND type = ?3",
        )
        .bind(key.submission_id.get())
        .bind(&key.user_id)
        .bind(&key.kind)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let engaged = deleted == 0;
        if engaged {
            let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM submissions WHERE id = ?1")
                .bind(key.submission_id.get())
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(StoreError::NotFound(key.submission_id));
            }

            sqlx::query(
                "INSERT INTO engagements (submission_id, user_id, type, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(key.submission_id.get())
            .bind(&key.user_id)
            .bind(&key.kind)
            .bind(timestamp(Utc::now()))
            .execute(&mut *tx)
            .await?;
        }

        let engagement_count: i64 = sqlx::query_scalar(
            "UPDATE submissions \
             SET engagement_count = (SELECT COUNT(*) FROM engagements WHERE submission_id = ?1) \
             WHERE id = ?1 \
             RETURNING engagement_count",
        )
        .bind(key.submission_id.get())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(engaged, engagement_count, "engagement toggled");
        Ok(ToggleOutcome {
            engaged,
            engagement_count,
        })
    }

    async fn leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let rows: Vec<LeaderboardRow> = sqlx::query_as(
            "SELECT username, \
                    COUNT(id) AS submission_count, \
                    COALESCE(SUM(engagement_count), 0) AS total_engagements \
             FROM submissions \
             WHERE moderation_status = ?1 \
             GROUP BY username \
             ORDER BY total_engagements DESC, submission_count DESC, username ASC \
             LIMIT ?2",
        )
        .bind(ModerationStatus::Approved.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LeaderboardEntry::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use wall_core::moderation::classify;

    async fn store() -> SqliteStore {
        SqliteStore::in_memory().await.unwrap()
    }

    async fn approved(store: &SqliteStore, username: &str, message: &str) -> Submission {
        let draft = NewSubmission::new(username, Some(message), None, None).unwrap();
        let row = store.create_submission(&draft).await.unwrap();
        store
            .apply_verdict(row.id, &classify("hello"))
            .await
            .unwrap();
        row
    }

    fn like(id: SubmissionId, user: &str) -> EngagementKey {
        EngagementKey::new(id, user, "like").unwrap()
    }

    #[tokio::test]
    async fn create_returns_pending_row() {
        let store = store().await;
        let draft = NewSubmission::new("ada", Some("I get screened yearly"), None, None).unwrap();

        let row = store.create_submission(&draft).await.unwrap();

        assert!(row.id.get() > 0);
        assert_eq!(row.username, "ada");
        assert_eq!(row.image_url, None);
        assert_eq!(row.filter_applied, "none");
        assert_eq!(row.engagement_count, 0);
        assert_eq!(row.moderation_status, ModerationStatus::Pending);
    }

    #[tokio::test]
    async fn ids_are_monotonic() {
        let store = store().await;
        let draft = NewSubmission::new("ada", Some("one"), None, None).unwrap();
        let first = store.create_submission(&draft).await.unwrap();
        let second = store.create_submission(&draft).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn list_only_returns_approved_newest_first() {
        let store = store().await;
        let older = approved(&store, "ada", "first").await;
        let newer = approved(&store, "bob", "second").await;

        let pending = NewSubmission::new("eve", Some("waiting"), None, None).unwrap();
        store.create_submission(&pending).await.unwrap();

        let flagged = NewSubmission::new("mal", Some("buy spam now"), None, None).unwrap();
        let flagged = store.create_submission(&flagged).await.unwrap();
        store
            .apply_verdict(flagged.id, &classify("buy spam now"))
            .await
            .unwrap();

        let listed = store.list_approved(100).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
        assert!(listed
            .iter()
            .all(|s| s.moderation_status == ModerationStatus::Approved));
    }

    #[tokio::test]
    async fn list_respects_limit() {
        let store = store().await;
        for i in 0..5 {
            approved(&store, "ada", &format!("message {i}")).await;
        }
        assert_eq!(store.list_approved(3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn flagged_verdict_appends_one_log() {
        let store = store().await;
        let draft = NewSubmission::new("mal", Some("this is spam content"), None, None).unwrap();
        let row = store.create_submission(&draft).await.unwrap();

        store
            .apply_verdict(row.id, &classify("this is spam content"))
            .await
            .unwrap();

        let logs = store.moderation_logs(row.id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, FLAG_ACTION);
        assert_eq!(logs[0].reason, FLAG_REASON);

        let stored = store.get_submission(row.id).await.unwrap().unwrap();
        assert_eq!(stored.moderation_status, ModerationStatus::Flagged);
    }

    #[tokio::test]
    async fn approved_verdict_appends_nothing() {
        let store = store().await;
        let row = approved(&store, "ada", "hello world").await;
        assert!(store.moderation_logs(row.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn verdict_on_missing_submission_is_not_found() {
        let store = store().await;
        let err = store
            .apply_verdict(SubmissionId(999), &classify("hello"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn toggle_twice_restores_count() {
        let store = store().await;
        let row = approved(&store, "ada", "hi").await;

        let on = store.toggle_engagement(&like(row.id, "user-1")).await.unwrap();
        assert_eq!(
            on,
            ToggleOutcome {
                engaged: true,
                engagement_count: 1
            }
        );

        let off = store.toggle_engagement(&like(row.id, "user-1")).await.unwrap();
        assert_eq!(
            off,
            ToggleOutcome {
                engaged: false,
                engagement_count: 0
            }
        );

        let stored = store.get_submission(row.id).await.unwrap().unwrap();
        assert_eq!(stored.engagement_count, 0);
    }

    #[tokio::test]
    async fn count_spans_all_kinds() {
        let store = store().await;
        let row = approved(&store, "ada", "hi").await;

        store.toggle_engagement(&like(row.id, "user-1")).await.unwrap();
        let heart = EngagementKey::new(row.id, "user-1", "heart").unwrap();
        let outcome = store.toggle_engagement(&heart).await.unwrap();

        assert_eq!(outcome.engagement_count, 2);
    }

    #[tokio::test]
    async fn toggle_on_missing_submission_is_not_found() {
        let store = store().await;
        let err = store
            .toggle_engagement(&like(SubmissionId(404), "user-1"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn leaderboard_groups_approved_by_username() {
        let store = store().await;
        let a1 = approved(&store, "ada", "one").await;
        approved(&store, "ada", "two").await;
        let b1 = approved(&store, "bob", "three").await;

        store.toggle_engagement(&like(a1.id, "u1")).await.unwrap();
        store.toggle_engagement(&like(b1.id, "u1")).await.unwrap();
        store.toggle_engagement(&like(b1.id, "u2")).await.unwrap();

        // pending rows do not count
        let pending = NewSubmission::new("ada", Some("hidden"), None, None).unwrap();
        store.create_submission(&pending).await.unwrap();

        let board = store.leaderboard(50).await.unwrap();
        assert_eq!(
            board,
            vec![
                LeaderboardEntry {
                    username: "bob".to_string(),
                    submission_count: 1,
                    total_engagements: 2,
                },
                LeaderboardEntry {
                    username: "ada".to_string(),
                    submission_count: 2,
                    total_engagements: 1,
                },
            ]
        );
    }

    #[tokio::test]
    async fn leaderboard_ties_break_on_submission_count() {
        let store = store().await;
        approved(&store, "solo", "one").await;
        approved(&store, "busy", "one").await;
        approved(&store, "busy", "two").await;

        let board = store.leaderboard(50).await.unwrap();
        assert_eq!(board[0].username, "busy");
        assert_eq!(board[0].submission_count, 2);
        assert_eq!(board[1].username, "solo");
    }

    #[tokio::test]
    async fn file_database_persists_between_connections() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("wall.db").display());

        let id = {
            let store = SqliteStore::connect(&url, 2).await.unwrap();
            let draft = NewSubmission::new("ada", Some("persisted"), None, None).unwrap();
            store.create_submission(&draft).await.unwrap().id
        };

        let reopened = SqliteStore::connect(&url, 2).await.unwrap();
        let row = reopened.get_submission(id).await.unwrap().unwrap();
        assert_eq!(row.message.as_deref(), Some("persisted"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_distinct_engagements_count_exactly(
            order in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle()
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let store = store().await;
                let row = approved(&store, "ada", "hi").await;

                for (step, i) in order.iter().enumerate() {
                    let kind = if *i < 3 { "like" } else { "heart" };
                    let key = EngagementKey::new(row.id, &format!("user-{}", i % 3), kind).unwrap();
                    let outcome = store.toggle_engagement(&key).await.unwrap();
                    assert!(outcome.engaged);
                    assert_eq!(outcome.engagement_count, step as i64 + 1);
                }

                let stored = store.get_submission(row.id).await.unwrap().unwrap();
                assert_eq!(stored.engagement_count, 6);
            });
        }

        #[test]
        fn prop_leaderboard_is_sorted(
            plan in proptest::collection::vec((0..4usize, 0..4usize), 1..12)
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let store = store().await;
                for (n, (author, likes)) in plan.iter().enumerate() {
                    let row = approved(&store, &format!("author-{author}"), "post").await;
                    for user in 0..*likes {
                        store
                            .toggle_engagement(&like(row.id, &format!("fan-{n}-{user}")))
                            .await
                            .unwrap();
                    }
                }

                let board = store.leaderboard(50).await.unwrap();
                let total: i64 = board.iter().map(|e| e.submission_count).sum();
                assert_eq!(total, plan.len() as i64);
                for pair in board.windows(2) {
                    let key = |e: &LeaderboardEntry| (e.total_engagements, e.submission_count);
                    assert!(key(&pair[0]) >= key(&pair[1]));
                }
            });
        }
    }
}
