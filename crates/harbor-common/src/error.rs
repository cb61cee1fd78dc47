//! Error types for Harbor
//!
//! One error enum covers every failure the data-plane surfaces to callers.
//! Each variant maps to an S3 error code and an HTTP status so the gateway
//! can render the XML error body without per-handler tables.

use thiserror::Error;

/// Common result type for Harbor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for Harbor
#[derive(Debug, Error)]
pub enum Error {
    // Configuration document errors
    #[error("malformed XML in request body")]
    MalformedXml,

    #[error("illegal replication configuration: {0}")]
    IllegalReplicationConfiguration(String),

    // Placement errors
    #[error("invalid location constraint: {0}")]
    InvalidLocationConstraint(String),

    #[error("no data store registered under: {0}")]
    DataStoreNotFound(String),

    #[error("data location not found: {0}")]
    DataLocationNotFound(String),

    // Metadata errors
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    #[error("object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    // Protocol errors
    #[error("access denied")]
    AccessDenied,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    // Backend I/O errors
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    // Internal errors
    #[error("internal error: {0}")]
    Internal(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),
}

impl Error {
    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Check if this is a not found error
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BucketNotFound(_)
                | Self::ObjectNotFound { .. }
                | Self::DataStoreNotFound(_)
                | Self::DataLocationNotFound(_)
        )
    }

    /// Get HTTP status code for S3 API compatibility
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Self::MalformedXml
            | Self::IllegalReplicationConfiguration(_)
            | Self::InvalidLocationConstraint(_)
            | Self::InvalidRequest(_)
            | Self::InvalidArgument(_) => 400,

            // 403 Forbidden
            Self::AccessDenied => 403,

            // 404 Not Found
            Self::BucketNotFound(_)
            | Self::ObjectNotFound { .. }
            | Self::DataStoreNotFound(_)
            | Self::DataLocationNotFound(_) => 404,

            // 405 Method Not Allowed
            Self::MethodNotAllowed(_) => 405,

            // 500 Internal Server Error
            Self::Io(_) | Self::Storage(_) | Self::Serialization(_) | Self::Internal(_) => 500,

            // 501 Not Implemented
            Self::NotImplemented(_) => 501,
        }
    }

    /// Get S3 error code for API compatibility
    #[must_use]
    pub const fn s3_error_code(&self) -> &'static str {
        match self {
            Self::MalformedXml => "MalformedXML",
            Self::IllegalReplicationConfiguration(_) => "IllegalReplicationConfiguration",
            Self::InvalidLocationConstraint(_) => "InvalidLocationConstraint",
            Self::BucketNotFound(_) => "NoSuchBucket",
            Self::ObjectNotFound { .. } => "NoSuchKey",
            Self::DataStoreNotFound(_) => "NoSuchDataStore",
            Self::DataLocationNotFound(_) => "NoSuchKey",
            Self::AccessDenied => "AccessDenied",
            Self::InvalidRequest(_) | Self::InvalidArgument(_) => "InvalidArgument",
            Self::MethodNotAllowed(_) => "MethodNotAllowed",
            Self::NotImplemented(_) => "NotImplemented",
            Self::Io(_)
            | Self::Storage(_)
            | Self::Serialization(_)
            | Self::Internal(_) => "InternalError",
        }
    }
}
