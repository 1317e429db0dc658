//! Service-account key credentials
//!
//! Signs an RS256 JWT with the key's private key and exchanges it at the
//! key's `token_uri` using the `jwt-bearer` grant.

use crate::error::GatewayError;
use crate::token::{AccessToken, TokenSource, CLOUD_PLATFORM_SCOPE};
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each signed assertion
const ASSERTION_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// Default OAuth token endpoint
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Fields used from a service-account JSON key
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Account e-mail, the JWT issuer
    pub client_email: String,
    /// PEM-encoded RSA private key
    pub private_key: String,
    /// Key id, sent as the JWT `kid`
    #[serde(default)]
    pub private_key_id: Option<String>,
    /// OAuth token endpoint
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    /// Parse a JSON key
    ///
    /// # Errors
    /// `GatewayError::Credential` if the JSON lacks required fields
    pub fn from_json(json: &str) -> Result<Self, GatewayError> {
        serde_json::from_str(json)
            .map_err(|e| GatewayError::credential(format!("invalid service account key: {e}")))
    }

    /// Read and parse a JSON key file
    ///
    /// # Errors
    /// `GatewayError::Credential` if the file is unreadable or malformed
    pub fn from_file(path: &Path) -> Result<Self, GatewayError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::credential(format!(
                "failed to read service account key {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

/// Mints tokens from a service-account key
pub struct ServiceAccountTokenSource {
    client: reqwest::Client,
    key: ServiceAccountKey,
    signing_key: EncodingKey,
}

impl std::fmt::Debug for ServiceAccountTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountTokenSource")
            .field("client_email", &self.key.client_email)
            .field("token_uri", &self.key.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountTokenSource {
    /// Create source from a parsed key
    ///
    /// # Errors
    /// `GatewayError::Credential` if the private key is not RSA PEM
    pub fn new(client: reqwest::Client, key: ServiceAccountKey) -> Result<Self, GatewayError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            GatewayError::credential(format!("invalid service account private key: {e}"))
        })?;
        Ok(Self {
            client,
            key,
            signing_key,
        })
    }

    /// Create source from a JSON key file
    ///
    /// # Errors
    /// `GatewayError::Credential` if the file cannot be loaded
    pub fn from_file(client: reqwest::Client, path: &Path) -> Result<Self, GatewayError> {
        Self::new(client, ServiceAccountKey::from_file(path)?)
    }

    fn assertion(&self, now: u64) -> Result<String, GatewayError> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: CLOUD_PLATFORM_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME.as_secs(),
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid.clone_from(&self.key.private_key_id);

        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|e| GatewayError::credential(format!("failed to sign assertion: {e}")))
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn fetch_token(&self) -> Result<AccessToken, GatewayError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        let assertion = self.assertion(now)?;

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| GatewayError::credential(format!("token endpoint unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %body, "service account token exchange failed");
            return Err(GatewayError::credential(format!(
                "token endpoint returned {status}"
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::credential(format!("invalid token response: {e}")))?;
        if body.access_token.is_empty() {
            return Err(GatewayError::credential("token endpoint returned no token"));
        }

        tracing::debug!(client_email = %self.key.client_email, "service account token minted");
        Ok(AccessToken {
            token: body.access_token,
            expires_in: body.expires_in.map(Duration::from_secs),
        })
    }
}
