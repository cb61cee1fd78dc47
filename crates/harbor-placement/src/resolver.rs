//! Backend resolution
//!
//! Decides, for one object operation, which of the object constraint,
//! bucket constraint or request endpoint controls physical backend
//! selection. Inputs are checked in that order; the first invalid one
//! fails the whole resolution.

use crate::config::BackendConfig;
use serde::Serialize;
use thiserror::Error;

/// Which input determined backend selection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllingConstraint {
    Object,
    Bucket,
    Endpoint,
}

/// Resolution failure, identifying the offending field.
///
/// The display text of each variant is part of the protocol surface:
/// callers match on the "Object Location Error" / "Bucket Location Error"
/// / "Endpoint Location Error" prefixes.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BackendResolutionError {
    #[error("Object Location Error: unknown object location constraint: {0}")]
    ObjectLocation(String),

    #[error("Bucket Location Error: unknown bucket location constraint: {0}")]
    BucketLocation(String),

    #[error("Endpoint Location Error: no location mapped for endpoint: {0}")]
    EndpointLocation(String),
}

impl From<BackendResolutionError> for harbor_common::Error {
    fn from(err: BackendResolutionError) -> Self {
        Self::InvalidLocationConstraint(err.to_string())
    }
}

/// Immutable result of one placement decision.
///
/// Constructed per request by [`resolve`], consumed by the `DataStore`
/// invocation and then discarded. Only `data_store_name` outlives the
/// request, recorded on the object's stored metadata by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendDescriptor {
    object_location_constraint: Option<String>,
    bucket_location_constraint: Option<String>,
    request_endpoint: String,
    controlling: ControllingConstraint,
    data_store_name: String,
}

impl BackendDescriptor {
    /// Per-object location constraint override, if the request carried one
    #[must_use]
    pub fn object_location_constraint(&self) -> Option<&str> {
        self.object_location_constraint.as_deref()
    }

    /// Bucket-level default location constraint
    #[must_use]
    pub fn bucket_location_constraint(&self) -> Option<&str> {
        self.bucket_location_constraint.as_deref()
    }

    /// Network endpoint the client used to reach the gateway
    #[must_use]
    pub fn request_endpoint(&self) -> &str {
        &self.request_endpoint
    }

    /// Which input determined backend selection
    #[must_use]
    pub const fn controlling(&self) -> ControllingConstraint {
        self.controlling
    }

    /// The effective location constraint, i.e. the one that determined
    /// `data_store_name`
    #[must_use]
    pub fn controlling_location_constraint(&self) -> &str {
        &self.data_store_name
    }

    /// Resolved physical backend identifier for subsequent data store calls
    #[must_use]
    pub fn data_store_name(&self) -> &str {
        &self.data_store_name
    }
}

/// Resolve the backend for one object operation.
///
/// Precedence on success: object constraint over bucket constraint over
/// endpoint-derived constraint. Under the local modes the endpoint is
/// never validated and the mode name itself is the fallback backend;
/// under `scality`/`multiple` an unmapped endpoint fails resolution even
/// when an explicit constraint would otherwise control.
///
/// Pure and deterministic: no I/O, no ambient state.
pub fn resolve(
    object_location_constraint: Option<&str>,
    bucket_location_constraint: Option<&str>,
    request_endpoint: &str,
    config: &BackendConfig,
) -> Result<BackendDescriptor, BackendResolutionError> {
    // Empty strings are treated as absent
    let object_lc = object_location_constraint.filter(|s| !s.is_empty());
    let bucket_lc = bucket_location_constraint.filter(|s| !s.is_empty());

    if let Some(lc) = object_lc {
        if !config.is_known_location(lc) {
            return Err(BackendResolutionError::ObjectLocation(lc.to_string()));
        }
    }
    if let Some(lc) = bucket_lc {
        if !config.is_known_location(lc) {
            return Err(BackendResolutionError::BucketLocation(lc.to_string()));
        }
    }

    // Local backends ignore network topology; the other modes require a
    // mapped endpoint even when an explicit constraint controls.
    let endpoint_location = if config.mode.is_local() {
        None
    } else {
        match config.location_for_endpoint(request_endpoint) {
            Some(location) if config.is_known_location(location) => Some(location),
            _ => {
                return Err(BackendResolutionError::EndpointLocation(
                    request_endpoint.to_string(),
                ));
            }
        }
    };

    let (controlling, data_store_name) = if let Some(lc) = object_lc {
        (ControllingConstraint::Object, lc.to_string())
    } else if let Some(lc) = bucket_lc {
        (ControllingConstraint::Bucket, lc.to_string())
    } else if let Some(location) = endpoint_location {
        (ControllingConstraint::Endpoint, location.to_string())
    } else {
        // Local mode with no constraints: the mode name is the backend
        (
            ControllingConstraint::Endpoint,
            config.mode.as_str().to_string(),
        )
    };

    Ok(BackendDescriptor {
        object_location_constraint: object_lc.map(str::to_string),
        bucket_location_constraint: bucket_lc.map(str::to_string),
        request_endpoint: request_endpoint.to_string(),
        controlling,
        data_store_name,
    })
}
