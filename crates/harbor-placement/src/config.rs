//! Backend configuration
//!
//! The deployment's backend mode, the table of known location constraints
//! and the endpoint-to-location mapping. Built once at startup and passed
//! explicitly to the resolver; nothing here is ambient global state.

use harbor_common::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Deployment-wide backend mode.
///
/// Governs which resolver inputs are authoritative: the local modes
/// (`mem`, `file`) ignore network topology entirely, while `scality` and
/// `multiple` require the request endpoint to map to a configured
/// location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    Mem,
    File,
    Scality,
    Multiple,
}

impl BackendMode {
    /// Name of the mode as it appears in configuration files
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mem => "mem",
            Self::File => "file",
            Self::Scality => "scality",
            Self::Multiple => "multiple",
        }
    }

    /// Local modes store bytes on this host and never consult the
    /// endpoint table
    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Mem | Self::File)
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of physical store behind a location constraint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LocationKind {
    /// In-memory store (development and tests)
    Mem,
    /// Local filesystem store rooted at `path`
    File { path: PathBuf },
}

/// Backend configuration supplied to the resolver at call time
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Deployment-wide backend mode, read-only after startup
    pub mode: BackendMode,
    /// Known location constraints: name -> physical store kind
    #[serde(default)]
    pub locations: HashMap<String, LocationKind>,
    /// Request endpoint -> location constraint name
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

impl BackendConfig {
    /// Legacy table for the local modes: the `mem` and `file` constraints
    /// are always known, with `file` data rooted under `root`.
    #[must_use]
    pub fn local(mode: BackendMode, root: impl Into<PathBuf>) -> Self {
        let mut locations = HashMap::new();
        locations.insert("mem".to_string(), LocationKind::Mem);
        locations.insert("file".to_string(), LocationKind::File { path: root.into() });
        Self {
            mode,
            locations,
            endpoints: HashMap::new(),
        }
    }

    /// Whether `name` is a configured location constraint
    #[must_use]
    pub fn is_known_location(&self, name: &str) -> bool {
        self.locations.contains_key(name)
    }

    /// Location constraint a request endpoint maps to, if any
    #[must_use]
    pub fn location_for_endpoint(&self, endpoint: &str) -> Option<&str> {
        self.endpoints.get(endpoint).map(String::as_str)
    }

    /// Validate internal consistency at startup.
    ///
    /// Every endpoint must map to a known location, and the non-local
    /// modes need at least one endpoint mapping to resolve requests that
    /// carry no explicit constraint.
    pub fn validate(&self) -> Result<(), Error> {
        for (endpoint, location) in &self.endpoints {
            if !self.is_known_location(location) {
                return Err(Error::invalid_argument(format!(
                    "endpoint {endpoint} maps to unknown location constraint {location}"
                )));
            }
        }
        if !self.mode.is_local() && self.endpoints.is_empty() {
            return Err(Error::invalid_argument(format!(
                "backend mode {} requires at least one endpoint mapping",
                self.mode
            )));
        }
        Ok(())
    }

    /// Resolve the backend for one object operation.
    ///
    /// See [`crate::resolver::resolve`].
    pub fn resolve(
        &self,
        object_location_constraint: Option<&str>,
        bucket_location_constraint: Option<&str>,
        request_endpoint: &str,
    ) -> Result<crate::BackendDescriptor, crate::BackendResolutionError> {
        crate::resolver::resolve(
            object_location_constraint,
            bucket_location_constraint,
            request_endpoint,
            self,
        )
    }
}
