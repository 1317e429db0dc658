//! Bearer credential acquisition and caching
//!
//! [`TokenCache`] holds `{token, expires_at}` and only asks its
//! [`TokenSource`] for a new credential when none is cached or the cached one
//! is within [`REFRESH_MARGIN`] of expiry. Refreshes are serialised, so one
//! expiry window costs at most one call to the identity provider.

use crate::error::GatewayError;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Refresh when the cached token expires within this window
pub const REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Lifetime assumed for tokens whose source does not report one
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(55 * 60);

/// Scope requested from identity providers
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// A freshly minted credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Bearer token
    pub token: String,
    /// Lifetime reported by the provider
    pub expires_in: Option<Duration>,
}

/// Anything that can mint a bearer credential
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Obtain a new access token
    async fn fetch_token(&self) -> Result<AccessToken, GatewayError>;
}

/// Token supplied up front, e.g. from `GOOGLE_ACCESS_TOKEN`
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    /// Wrap a fixed token
    #[inline]
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn fetch_token(&self) -> Result<AccessToken, GatewayError> {
        if self.token.trim().is_empty() {
            return Err(GatewayError::credential("static access token is empty"));
        }
        Ok(AccessToken {
            token: self.token.clone(),
            expires_in: None,
        })
    }
}

/// Default service account token from the GCE / Cloud Run metadata server
#[derive(Debug, Clone)]
pub struct MetadataTokenSource {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

impl MetadataTokenSource {
    /// Create source against a metadata server root
    #[inline]
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn token_url(&self) -> String {
        format!(
            "{}/computeMetadata/v1/instance/service-accounts/default/token?scopes={CLOUD_PLATFORM_SCOPE}",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl TokenSource for MetadataTokenSource {
    async fn fetch_token(&self) -> Result<AccessToken, GatewayError> {
        let response = self
            .client
            .get(self.token_url())
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| GatewayError::credential(format!("metadata server unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::credential(format!(
                "metadata server returned {status}"
            )));
        }

        let body: MetadataTokenResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::credential(format!("invalid metadata response: {e}")))?;
        if body.access_token.is_empty() {
            return Err(GatewayError::credential("metadata server returned no token"));
        }

        Ok(AccessToken {
            token: body.access_token,
            expires_in: body.expires_in.map(Duration::from_secs),
        })
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Process-wide credential cache, constructed once and shared by `Arc`
pub struct TokenCache {
    source: Arc<dyn TokenSource>,
    margin: Duration,
    state: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("margin", &self.margin)
            .finish_non_exhaustive()
    }
}

impl TokenCache {
    /// Create cache over a source with the default refresh margin
    #[inline]
    #[must_use]
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self::with_margin(source, REFRESH_MARGIN)
    }

    /// Create cache with a custom refresh margin
    #[inline]
    #[must_use]
    pub fn with_margin(source: Arc<dyn TokenSource>, margin: Duration) -> Self {
        Self {
            source,
            margin,
            state: Mutex::new(None),
        }
    }

    /// Cached token if still fresh at `now`, otherwise a newly fetched one
    ///
    /// # Errors
    /// `GatewayError::Credential` if the source fails
    pub async fn get_valid_token(&self, now: Instant) -> Result<String, GatewayError> {
        let mut state = self.state.lock().await;

        if let Some(cached) = state.as_ref() {
            if cached.expires_at > now + self.margin {
                return Ok(cached.token.clone());
            }
        }

        tracing::debug!("refreshing access token");
        let fresh = self.source.fetch_token().await.map_err(|e| match e {
            GatewayError::Credential(_) => e,
            other => GatewayError::credential(other.to_string()),
        })?;

        let lifetime = fresh.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME);
        *state = Some(CachedToken {
            token: fresh.token.clone(),
            expires_at: now + lifetime,
        });
        tracing::info!(lifetime_secs = lifetime.as_secs(), "access token refreshed");

        Ok(fresh.token)
    }

    /// Drop the cached token
    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(value: &str, expires_in: Option<Duration>) -> AccessToken {
        AccessToken {
            token: value.to_string(),
            expires_in,
        }
    }

    #[tokio::test]
    async fn caches_until_margin() {
        let mut source = MockTokenSource::new();
        source
            .expect_fetch_token()
            .times(1)
            .returning(|| Ok(token("t1", None)));
        let cache = TokenCache::new(Arc::new(source));
        let start = Instant::now();

        assert_eq!(cache.get_valid_token(start).await.unwrap(), "t1");
        // 49 minutes later: 6 minutes left, still outside the 5 minute margin
        let later = start + Duration::from_secs(49 * 60);
        assert_eq!(cache.get_valid_token(later).await.unwrap(), "t1");
    }

    #[tokio::test]
    async fn refreshes_inside_margin() {
        let mut source = MockTokenSource::new();
        let mut seq = mockall::Sequence::new();
        source
            .expect_fetch_token()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(token("t1", None)));
        source
            .expect_fetch_token()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(token("t2", None)));
        let cache = TokenCache::new(Arc::new(source));
        let start = Instant::now();

        assert_eq!(cache.get_valid_token(start).await.unwrap(), "t1");
        let near_expiry = start + Duration::from_secs(51 * 60);
        assert_eq!(cache.get_valid_token(near_expiry).await.unwrap(), "t2");
    }

    #[tokio::test]
    async fn honours_reported_lifetime() {
        let mut source = MockTokenSource::new();
        source
            .expect_fetch_token()
            .times(2)
            .returning(|| Ok(token("short", Some(Duration::from_secs(6 * 60)))));
        let cache = TokenCache::new(Arc::new(source));
        let start = Instant::now();

        cache.get_valid_token(start).await.unwrap();
        cache
            .get_valid_token(start + Duration::from_secs(2 * 60))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn source_failure_is_credential_error() {
        let mut source = MockTokenSource::new();
        source
            .expect_fetch_token()
            .returning(|| Err(GatewayError::credential("no key file")));
        let cache = TokenCache::new(Arc::new(source));

        let err = cache.get_valid_token(Instant::now()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Credential(_)));
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let mut source = MockTokenSource::new();
        source
            .expect_fetch_token()
            .times(1)
            .returning(|| Ok(token("shared", None)));
        let cache = Arc::new(TokenCache::new(Arc::new(source)));
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_valid_token(now).await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "shared");
        }
    }

    #[tokio::test]
    async fn invalidate_forces_refresh() {
        let mut source = MockTokenSource::new();
        source
            .expect_fetch_token()
            .times(2)
            .returning(|| Ok(token("t", None)));
        let cache = TokenCache::new(Arc::new(source));
        let now = Instant::now();

        cache.get_valid_token(now).await.unwrap();
        cache.invalidate().await;
        cache.get_valid_token(now).await.unwrap();
    }

    #[tokio::test]
    async fn static_source_rejects_empty_token() {
        assert!(StaticTokenSource::new("").fetch_token().await.is_err());
        let ok = StaticTokenSource::new("abc").fetch_token().await.unwrap();
        assert_eq!(ok.token, "abc");
        assert_eq!(ok.expires_in, None);
    }
}
