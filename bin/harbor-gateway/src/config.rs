//! Gateway configuration
//!
//! Loaded from an optional TOML file layered over defaults, with
//! `HARBOR__`-prefixed environment overrides. The backend section is the
//! [`BackendConfig`] handed to the resolver on every placement decision.
//!
//! ```toml
//! listen = "0.0.0.0:8600"
//!
//! [auth]
//! secret = "replication-plane-secret"
//!
//! [backend]
//! mode = "multiple"
//!
//! [backend.locations.us-east-1]
//! type = "file"
//! path = "/var/lib/harbor/data"
//!
//! [backend.locations.scratch]
//! type = "mem"
//!
//! [backend.endpoints]
//! "s3.example.com" = "us-east-1"
//! ```

use harbor_placement::{BackendConfig, BackendMode};
use serde::{Deserialize, Serialize};

/// Root gateway configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Listen address for the internal data plane
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Authentication settings
    #[serde(default)]
    pub auth: AuthConfig,
    /// Backend mode, location-constraint table and endpoint map
    #[serde(default = "default_backend")]
    pub backend: BackendConfig,
}

/// Authentication settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret the replication worker presents as a bearer token
    #[serde(default)]
    pub secret: String,
}

fn default_listen() -> String {
    "0.0.0.0:8600".to_string()
}

fn default_backend() -> BackendConfig {
    BackendConfig::local(BackendMode::Mem, "/var/lib/harbor/data")
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            auth: AuthConfig::default(),
            backend: default_backend(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `HARBOR__`-prefixed environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path));
        }
        builder = builder.add_source(config::Environment::with_prefix("HARBOR").separator("__"));
        builder.build()?.try_deserialize()
    }
}
