//! Error types for the HTTP surface
//!
//! Services fail with [`ServiceError`]. Handlers attach a fixed, endpoint
//! specific message with [`ResultExt::context`], producing an [`ApiError`]
//! that logs the full detail and answers with `{"error": "<message>"}`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use wall_core::ValidationError;
use wall_imagen::GatewayError;
use wall_store::StoreError;

/// Failure inside a service call
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Request fields failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Persistence failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Image provider failure
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ServiceError {
    /// HTTP status for this failure
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Store(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error returned from handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body was not JSON or did not fit the request shape
    #[error("rejected request body: {0}")]
    Body(#[from] JsonRejection),

    /// A service call failed
    #[error("{context}: {source}")]
    Service {
        /// Fixed message shown to the client for server-side failures
        context: &'static str,
        /// What went wrong
        #[source]
        source: ServiceError,
    },
}

impl ApiError {
    /// HTTP status for this error
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Body(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            Self::Body(_) => StatusCode::BAD_REQUEST,
            Self::Service { source, .. } => source.status(),
        }
    }

    /// Message safe to show the client
    fn public_message(&self) -> String {
        match self {
            Self::Body(_) if self.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                "Request body too large".to_string()
            }
            Self::Body(_) => "Malformed request body".to_string(),
            Self::Service { source, context } => match source {
                ServiceError::Validation(e) => e.to_string(),
                ServiceError::Store(e) if e.is_not_found() => "Submission not found".to_string(),
                ServiceError::Gateway(e) if e.is_misconfiguration() => e.to_string(),
                _ => (*context).to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = ErrorBody {
            error: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

/// Attach an endpoint message to a service result
pub trait ResultExt<T> {
    /// Convert the error into an [`ApiError`] carrying `message`
    ///
    /// # Errors
    /// Returns the wrapped error when `self` is `Err`
    fn context(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<ServiceError>,
{
    fn context(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::Service {
            context: message,
            source: e.into(),
        })
    }
}

/// Start-up failure
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Store could not be opened
    #[error("failed to open store: {0}")]
    Store(#[from] StoreError),

    /// Gateway could not be built
    #[error("failed to build image gateway: {0}")]
    Gateway(#[from] GatewayError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use wall_core::SubmissionId;

    fn service_error(source: impl Into<ServiceError>) -> ApiError {
        Err::<(), _>(source).context("Failed to do the thing").unwrap_err()
    }

    #[test]
    fn validation_is_bad_request_with_detail() {
        let err = service_error(ValidationError::MissingField("username"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "missing required field: username");
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = service_error(StoreError::NotFound(SubmissionId(9)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.public_message(), "Submission not found");
    }

    #[test]
    fn internal_detail_is_hidden() {
        let err = service_error(StoreError::migration("secret table name"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Failed to do the thing");
        assert!(err.to_string().contains("secret table name"));
    }

    #[test]
    fn provider_failure_is_generic() {
        let err = service_error(GatewayError::Provider { status: 429 });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Failed to do the thing");
    }

    #[test]
    fn misconfiguration_names_the_setting() {
        let err = service_error(GatewayError::Misconfigured("GOOGLE_CLOUD_PROJECT_ID"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.public_message().contains("GOOGLE_CLOUD_PROJECT_ID"));
    }
}
