//! Gateway errors
//!
//! All variants are server faults. Details are for logs only; the HTTP layer
//! answers with a fixed message.

/// Image filter gateway failure
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Required configuration is absent; raised before any network call
    #[error("{0} is not configured on the server")]
    Misconfigured(&'static str),

    /// The bearer credential could not be obtained
    #[error("failed to obtain access token: {0}")]
    Credential(String),

    /// Provider answered with a non-success status
    #[error("provider returned status {status}")]
    Provider {
        /// HTTP status code
        status: u16,
    },

    /// Request could not be sent or the body could not be read
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl GatewayError {
    /// Create credential error
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential(message.into())
    }

    /// Check if this is a configuration problem rather than a runtime failure
    #[inline]
    #[must_use]
    pub fn is_misconfiguration(&self) -> bool {
        matches!(self, Self::Misconfigured(_))
    }
}
