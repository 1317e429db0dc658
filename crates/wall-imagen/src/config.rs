//! Gateway configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default Vertex AI region
pub const DEFAULT_LOCATION: &str = "us-central1";

/// Default Imagen model
pub const DEFAULT_MODEL: &str = "imagegeneration@006";

/// Default GCE metadata server
pub const DEFAULT_METADATA_URL: &str = "http://metadata.google.internal";

/// Imagen gateway configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagenConfig {
    /// Google Cloud project; requests fail as misconfigured without it
    pub project_id: Option<String>,
    /// Vertex AI region
    pub location: String,
    /// Model name in the predict URL
    pub model: String,
    /// Override for `https://{location}-aiplatform.googleapis.com`
    pub base_url: Option<String>,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Fixed bearer token, never refreshed
    pub access_token: Option<String>,
    /// Service-account JSON key; used when no fixed token is set
    pub service_account_key_file: Option<PathBuf>,
    /// Metadata server root
    pub metadata_url: String,
}

impl ImagenConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With project id
    #[inline]
    #[must_use]
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// With region
    #[inline]
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// With model
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// With provider base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// With a fixed bearer token
    #[inline]
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// With service-account key file
    #[inline]
    #[must_use]
    pub fn with_service_account_key_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.service_account_key_file = Some(path.into());
        self
    }

    /// With metadata server root
    #[inline]
    #[must_use]
    pub fn with_metadata_url(mut self, url: impl Into<String>) -> Self {
        self.metadata_url = url.into();
        self
    }

    /// Project id, ignoring blank values
    #[must_use]
    pub fn project(&self) -> Option<&str> {
        self.project_id
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Full `:predict` URL for a project
    #[must_use]
    pub fn predict_url(&self, project: &str) -> String {
        let base = self.base_url.clone().unwrap_or_else(|| {
            format!("https://{}-aiplatform.googleapis.com", self.location)
        });
        format!(
            "{}/v1/projects/{project}/locations/{}/publishers/google/models/{}:predict",
            base.trim_end_matches('/'),
            self.location,
            self.model
        )
    }

    /// Request timeout
    #[inline]
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ImagenConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            location: DEFAULT_LOCATION.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            request_timeout_secs: 60,
            access_token: None,
            service_account_key_file: None,
            metadata_url: DEFAULT_METADATA_URL.to_string(),
        }
    }
}
