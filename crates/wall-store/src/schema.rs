//! Table definitions
//!
//! Statements are idempotent and run on every start-up.

/// Submissions table. Status and content invariants are CHECK constraints.
pub const CREATE_SUBMISSIONS: &str = r#"
CREATE TABLE IF NOT EXISTS submissions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    message TEXT,
    image_url TEXT,
    filter_applied TEXT NOT NULL DEFAULT 'none',
    engagement_count INTEGER NOT NULL DEFAULT 0 CHECK (engagement_count >= 0),
    moderation_status TEXT NOT NULL DEFAULT 'pending'
        CHECK (moderation_status IN ('pending', 'approved', 'flagged')),
    created_at TEXT NOT NULL,
    CHECK (COALESCE(message, '') <> '' OR COALESCE(image_url, '') <> '')
)
"#;

/// Listing index
pub const CREATE_SUBMISSIONS_STATUS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_submissions_status_created
ON submissions(moderation_status, created_at DESC)
"#;

/// Engagements table
pub const CREATE_ENGAGEMENTS: &str = r#"
CREATE TABLE IF NOT EXISTS engagements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    submission_id INTEGER NOT NULL REFERENCES submissions(id),
    user_id TEXT NOT NULL,
    type TEXT NOT NULL,
    created_at TEXT NOT NULL
)
"#;

/// One engagement per `(submission, user, type)`
pub const CREATE_ENGAGEMENTS_UNIQUE_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_engagements_unique
ON engagements(submission_id, user_id, type)
"#;

/// Moderation audit log
pub const CREATE_MODERATION_LOGS: &str = r#"
CREATE TABLE IF NOT EXISTS moderation_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    submission_id INTEGER NOT NULL REFERENCES submissions(id),
    action TEXT NOT NULL,
    reason TEXT NOT NULL,
    created_at TEXT NOT NULL
)
"#;

/// All statements in dependency order, with a label for error reporting
pub const MIGRATIONS: [(&str, &str); 5] = [
    ("submissions table", CREATE_SUBMISSIONS),
    ("submissions status index", CREATE_SUBMISSIONS_STATUS_INDEX),
    ("engagements table", CREATE_ENGAGEMENTS),
    ("engagements unique index", CREATE_ENGAGEMENTS_UNIQUE_INDEX),
    ("moderation_logs table", CREATE_MODERATION_LOGS),
];
