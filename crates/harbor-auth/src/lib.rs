//! Harbor Auth - authentication for the internal data plane
//!
//! Defines the pluggable [`Authenticator`] trait the gateway delegates
//! to, plus the built-in shared-secret authenticator used by the
//! replication worker. The gateway surfaces an authenticator's error
//! code verbatim.

pub mod provider;
pub mod shared_secret;

// Re-exports
pub use provider::{AuthError, AuthRequest, AuthenticatedIdentity, Authenticator};
pub use shared_secret::SharedSecretAuthenticator;
