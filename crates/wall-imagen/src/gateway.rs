//! Imagen predict gateway

use crate::clock::{Clock, SystemClock};
use crate::config::ImagenConfig;
use crate::error::GatewayError;
use crate::filters::{prompt_for, strip_data_uri};
use crate::service_account::ServiceAccountTokenSource;
use crate::token::{MetadataTokenSource, StaticTokenSource, TokenCache, TokenSource};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_MIME_TYPE: &str = "image/png";

/// Result of a filter request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilteredImage {
    /// Data URI of the generated image, or the caller's original image
    pub image: String,
    /// Prompt that was sent
    pub prompt: String,
    /// Model that was asked
    pub model: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictRequest<'a> {
    instances: [PredictInstance<'a>; 1],
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance<'a> {
    prompt: &'a str,
    image: InlineImage<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineImage<'a> {
    bytes_base64_encoded: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    sample_count: u32,
    aspect_ratio: &'static str,
    safety_filter_level: &'static str,
    person_generation: &'static str,
}

impl Default for PredictParameters {
    fn default() -> Self {
        Self {
            sample_count: 1,
            aspect_ratio: "1:1",
            safety_filter_level: "block_some",
            person_generation: "allow_all",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

/// Applies named style filters through the Imagen predict API
pub struct ImageFilterGateway {
    config: ImagenConfig,
    client: reqwest::Client,
    tokens: Arc<TokenCache>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ImageFilterGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFilterGateway")
            .field("model", &self.config.model)
            .field("location", &self.config.location)
            .finish_non_exhaustive()
    }
}

impl ImageFilterGateway {
    /// Assemble a gateway from explicit parts
    ///
    /// # Errors
    /// `GatewayError::Transport` if the HTTP client cannot be built
    pub fn new(
        config: ImagenConfig,
        tokens: Arc<TokenCache>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GatewayError> {
        let client = build_client(&config)?;
        Ok(Self {
            config,
            client,
            tokens,
            clock,
        })
    }

    /// Gateway with the token source implied by the configuration
    ///
    /// Precedence: a configured `access_token`, then `service_account_key_file`,
    /// then the metadata server.
    ///
    /// # Errors
    /// - `GatewayError::Transport` if the HTTP client cannot be built
    /// - `GatewayError::Credential` if the key file cannot be loaded
    pub fn from_config(config: ImagenConfig) -> Result<Self, GatewayError> {
        let client = build_client(&config)?;
        let source: Arc<dyn TokenSource> = match (
            config.access_token.as_deref().filter(|t| !t.trim().is_empty()),
            config.service_account_key_file.as_deref(),
        ) {
            (Some(token), _) => Arc::new(StaticTokenSource::new(token)),
            (None, Some(path)) => {
                let source = ServiceAccountTokenSource::from_file(client.clone(), path)?;
                tracing::info!(key_file = %path.display(), "using service account credentials");
                Arc::new(source)
            }
            (None, None) => Arc::new(MetadataTokenSource::new(
                client.clone(),
                config.metadata_url.clone(),
            )),
        };
        Ok(Self {
            tokens: Arc::new(TokenCache::new(source)),
            clock: Arc::new(SystemClock),
            client,
            config,
        })
    }

    /// Configured model name
    #[inline]
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Stylise an image
    ///
    /// # Arguments
    /// * `image_base64` - raw base64 or a `data:` URI
    /// * `filter_type` - filter name; unknown names use the default prompt
    ///
    /// # Errors
    /// - `GatewayError::Misconfigured` without a project id (no network call)
    /// - `GatewayError::Credential` if no token can be obtained
    /// - `GatewayError::Provider` on a non-success status
    /// - `GatewayError::Transport` if the request cannot be sent
    #[tracing::instrument(skip(self, image_base64), fields(model = %self.config.model, input_len = image_base64.len()))]
    pub async fn apply_filter(
        &self,
        image_base64: &str,
        filter_type: &str,
    ) -> Result<FilteredImage, GatewayError> {
        let project = self
            .config
            .project()
            .ok_or(GatewayError::Misconfigured("GOOGLE_CLOUD_PROJECT_ID"))?;

        let token = self.tokens.get_valid_token(self.clock.now()).await?;
        let prompt = prompt_for(filter_type);

        let request = PredictRequest {
            instances: [PredictInstance {
                prompt,
                image: InlineImage {
                    bytes_base64_encoded: strip_data_uri(image_base64),
                },
            }],
            parameters: PredictParameters::default(),
        };

        let response = self
            .client
            .post(self.config.predict_url(project))
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %body, "imagen predict failed");
            return Err(GatewayError::Provider {
                status: status.as_u16(),
            });
        }

        let image = match response.bytes().await {
            Ok(body) => match serde_json::from_slice::<PredictResponse>(&body) {
                Ok(parsed) => extract_image(&parsed),
                Err(e) => {
                    tracing::warn!(error = %e, "unparseable imagen response");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "unreadable imagen response body");
                None
            }
        };

        let image = image.unwrap_or_else(|| {
            tracing::warn!("no usable image in imagen response, returning original");
            image_base64.to_string()
        });

        Ok(FilteredImage {
            image,
            prompt: prompt.to_string(),
            model: self.config.model.clone(),
        })
    }
}

fn build_client(config: &ImagenConfig) -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(GatewayError::Transport)
}

/// First prediction as a data URI, if it carries valid base64
fn extract_image(response: &PredictResponse) -> Option<String> {
    let first = response.predictions.first()?;
    let payload = first.bytes_base64_encoded.as_deref()?;
    if payload.is_empty() || BASE64.decode(payload).is_err() {
        return None;
    }
    let mime = first
        .mime_type
        .as_deref()
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MIME_TYPE);
    Some(format!("data:{mime};base64,{payload}"))
}
