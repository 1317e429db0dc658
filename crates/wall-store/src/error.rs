//! Store errors

use wall_core::{SubmissionId, ValidationError};

/// Errors raised by the persistence layer
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Connection, query or transaction failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema creation failed
    #[error("migration failed: {message}")]
    Migration {
        /// What was being created
        message: String,
    },

    /// Referenced submission does not exist
    #[error("submission not found: {0}")]
    NotFound(SubmissionId),

    /// A stored value could not be mapped back to a domain type
    #[error("corrupt row: {0}")]
    CorruptRow(#[from] ValidationError),
}

impl StoreError {
    /// Create migration error
    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration {
            message: message.into(),
        }
    }

    /// Check if the error is a missing submission
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = StoreError::NotFound(SubmissionId(42));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "submission not found: 42");
    }

    #[test]
    fn migration_helper() {
        let err = StoreError::migration("engagements table");
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("engagements table"));
    }
}
