//! Shared-secret authenticator
//!
//! Bearer-token authentication for the internal replication data plane.
//! The worker and the gateway share one secret distributed out of band;
//! comparison is constant-time.

use crate::provider::{AuthError, AuthRequest, AuthenticatedIdentity, Authenticator};
use async_trait::async_trait;
use ring::constant_time::verify_slices_are_equal;
use tracing::debug;

const PROVIDER_NAME: &str = "shared-secret";
const WORKER_SUBJECT: &str = "replication-worker";
const WORKER_ARN: &str = "arn:harbor:iam::system:role/replication-worker";

/// Authenticates the replication worker by a shared bearer secret
pub struct SharedSecretAuthenticator {
    secret: String,
}

impl SharedSecretAuthenticator {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl Authenticator for SharedSecretAuthenticator {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn authenticate(
        &self,
        request: &AuthRequest<'_>,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        if request.authorization_header().is_none() {
            return Err(AuthError::MissingCredentials);
        }
        let Some(token) = request.bearer_token() else {
            debug!(method = request.method, path = request.path, "non-bearer credentials");
            return Err(AuthError::UnsupportedMethod);
        };

        verify_slices_are_equal(token.as_bytes(), self.secret.as_bytes())
            .map_err(|_| AuthError::InvalidCredentials)?;

        Ok(AuthenticatedIdentity::new(
            WORKER_SUBJECT,
            WORKER_ARN,
            PROVIDER_NAME,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(value: Option<&str>) -> http::HeaderMap {
        let mut headers = http::HeaderMap::new();
        if let Some(value) = value {
            headers.insert("authorization", value.parse().unwrap());
        }
        headers
    }

    #[tokio::test]
    async fn test_valid_secret() {
        let auth = SharedSecretAuthenticator::new("sesame");
        let headers = headers_with(Some("Bearer sesame"));
        let request = AuthRequest::new("GET", "/b/k/metadata", &headers);
        let identity = auth.authenticate(&request).await.unwrap();
        assert_eq!(identity.subject, "replication-worker");
        assert_eq!(identity.provider, "shared-secret");
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let auth = SharedSecretAuthenticator::new("sesame");
        let headers = headers_with(None);
        let request = AuthRequest::new("GET", "/b/k/metadata", &headers);
        assert!(matches!(
            auth.authenticate(&request).await.unwrap_err(),
            AuthError::MissingCredentials
        ));
    }

    #[tokio::test]
    async fn test_wrong_secret() {
        let auth = SharedSecretAuthenticator::new("sesame");
        let headers = headers_with(Some("Bearer open"));
        let request = AuthRequest::new("GET", "/b/k/metadata", &headers);
        assert!(matches!(
            auth.authenticate(&request).await.unwrap_err(),
            AuthError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn test_non_bearer_scheme() {
        let auth = SharedSecretAuthenticator::new("sesame");
        let headers = headers_with(Some("AWS4-HMAC-SHA256 Credential=..."));
        let request = AuthRequest::new("GET", "/b/k/metadata", &headers);
        assert!(matches!(
            auth.authenticate(&request).await.unwrap_err(),
            AuthError::UnsupportedMethod
        ));
    }
}
