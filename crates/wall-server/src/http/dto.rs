//! Request and response bodies
//!
//! Request fields are all optional at the serde level so that a missing
//! field surfaces as a [`ValidationError`] naming it, not as a parse failure.

use serde::{Deserialize, Serialize};
use wall_core::{EngagementKey, ModerationStatus, NewSubmission, SubmissionId, ValidationError};

/// `POST /submissions`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionRequest {
    /// Author display name
    pub username: Option<String>,
    /// Post text
    pub message: Option<String>,
    /// Image as URL or data URI
    pub image_url: Option<String>,
    /// Style filter already applied to the image
    pub filter_applied: Option<String>,
}

impl CreateSubmissionRequest {
    /// Validate into a draft row
    ///
    /// # Errors
    /// See [`NewSubmission::new`]
    pub fn validate(&self) -> Result<NewSubmission, ValidationError> {
        NewSubmission::new(
            self.username.as_deref().unwrap_or_default(),
            self.message.as_deref(),
            self.image_url.as_deref(),
            self.filter_applied.as_deref(),
        )
    }
}

/// `POST /engagements`
///
/// The older `{submission_id, engagement_type, action}` body carries no
/// actor and fails validation on `submissionId`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementRequest {
    /// Target submission
    pub submission_id: Option<i64>,
    /// Acting user
    pub user_id: Option<String>,
    /// Engagement kind, such as `like`
    pub engagement_type: Option<String>,
}

impl EngagementRequest {
    /// Validate into an engagement key
    ///
    /// # Errors
    /// `ValidationError::MissingField` naming the first absent field
    pub fn validate(&self) -> Result<EngagementKey, ValidationError> {
        let id = submission_id(self.submission_id)?;
        EngagementKey::new(
            id,
            self.user_id.as_deref().unwrap_or_default(),
            self.engagement_type.as_deref().unwrap_or_default(),
        )
    }
}

/// `POST /moderate`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateRequest {
    /// Target submission
    pub submission_id: Option<i64>,
    /// Text to classify
    pub message: Option<String>,
}

impl ModerateRequest {
    /// Validate into target id and message text
    ///
    /// # Errors
    /// `ValidationError::MissingField` for an absent id or empty message
    pub fn validate(&self) -> Result<(SubmissionId, &str), ValidationError> {
        let id = submission_id(self.submission_id)?;
        let message = required(self.message.as_deref(), "message")?;
        Ok((id, message))
    }
}

/// `POST /apply-filter`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyFilterRequest {
    /// Source image, bare base64 or data URI
    pub image_base64: Option<String>,
    /// Filter name
    pub filter_type: Option<String>,
}

impl ApplyFilterRequest {
    /// Validate into image payload and filter name
    ///
    /// # Errors
    /// `ValidationError::MissingField` for either absent field
    pub fn validate(&self) -> Result<(&str, &str), ValidationError> {
        let image = required(self.image_base64.as_deref(), "imageBase64")?;
        let filter = required(self.filter_type.as_deref(), "filterType")?;
        Ok((image, filter))
    }
}

fn submission_id(raw: Option<i64>) -> Result<SubmissionId, ValidationError> {
    raw.filter(|id| *id > 0)
        .map(SubmissionId)
        .ok_or(ValidationError::MissingField("submissionId"))
}

fn required<'a>(
    value: Option<&'a str>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::MissingField(field))
}

/// Moderation result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerateResponse {
    /// Status written to the row
    pub status: ModerationStatus,
    /// Whether a keyword matched
    pub is_flagged: bool,
}

/// Acknowledgement body
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    /// Always `true`
    pub success: bool,
}

/// Liveness body
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `ok`
    pub status: &'static str,
}
