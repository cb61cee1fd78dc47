//! Pluggable authenticator trait and types

use async_trait::async_trait;

/// Authenticated identity from any authenticator
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity {
    /// Canonical id of the caller
    pub subject: String,
    /// ARN-style identifier for policy matching
    pub arn: String,
    /// Authenticator name (shared-secret, ...)
    pub provider: String,
}

impl AuthenticatedIdentity {
    /// Create a new authenticated identity
    pub fn new(
        subject: impl Into<String>,
        arn: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            arn: arn.into(),
            provider: provider.into(),
        }
    }
}

/// Request context for authentication
#[derive(Debug)]
pub struct AuthRequest<'a> {
    /// HTTP method
    pub method: &'a str,
    /// Request path
    pub path: &'a str,
    /// HTTP headers
    pub headers: &'a http::HeaderMap,
}

impl<'a> AuthRequest<'a> {
    /// Create a new auth request
    #[must_use]
    pub const fn new(method: &'a str, path: &'a str, headers: &'a http::HeaderMap) -> Self {
        Self {
            method,
            path,
            headers,
        }
    }

    /// Get Authorization header value
    #[must_use]
    pub fn authorization_header(&self) -> Option<&str> {
        self.headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
    }

    /// Check if request has Bearer token authentication
    #[must_use]
    pub fn has_bearer_auth(&self) -> bool {
        self.authorization_header()
            .is_some_and(|s| s.starts_with("Bearer "))
    }

    /// Extract Bearer token if present
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.authorization_header()
            .filter(|s| s.starts_with("Bearer "))
            .map(|s| &s[7..])
    }
}

/// Authentication error types.
///
/// `code()` and `status()` flow to the caller verbatim.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing authentication credentials")]
    MissingCredentials,
    #[error("invalid authentication credentials")]
    InvalidCredentials,
    #[error("unsupported authentication method")]
    UnsupportedMethod,
    #[error("authenticator unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// S3-style error code for the response body
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingCredentials | Self::UnsupportedMethod => "AccessDenied",
            Self::InvalidCredentials => "SignatureDoesNotMatch",
            Self::Unavailable(_) => "InternalError",
        }
    }

    /// HTTP status for the response
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::MissingCredentials | Self::UnsupportedMethod => 401,
            Self::InvalidCredentials => 403,
            Self::Unavailable(_) => 500,
        }
    }
}

/// Trait for pluggable authenticators
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticator name for logging
    fn name(&self) -> &str;

    /// Authenticate the request and return identity
    async fn authenticate(
        &self,
        request: &AuthRequest<'_>,
    ) -> Result<AuthenticatedIdentity, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_request_helpers() {
        let mut headers = http::HeaderMap::new();
        headers.insert("authorization", "Bearer sesame".parse().unwrap());

        let request = AuthRequest::new("GET", "/b/k/metadata", &headers);
        assert!(request.has_bearer_auth());
        assert_eq!(request.bearer_token(), Some("sesame"));

        let empty = http::HeaderMap::new();
        let request = AuthRequest::new("GET", "/b/k/metadata", &empty);
        assert!(!request.has_bearer_auth());
        assert_eq!(request.bearer_token(), None);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AuthError::MissingCredentials.code(), "AccessDenied");
        assert_eq!(AuthError::MissingCredentials.status(), 401);
        assert_eq!(AuthError::InvalidCredentials.code(), "SignatureDoesNotMatch");
        assert_eq!(AuthError::InvalidCredentials.status(), 403);
    }
}
