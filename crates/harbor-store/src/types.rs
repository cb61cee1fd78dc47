//! Wire and storage types shared by the store collaborators
//!
//! Field names follow the metadata document format the replication worker
//! reads and writes; unknown fields round-trip through `extra` untouched.

use bytes::Bytes;
use futures::stream::BoxStream;
use harbor_replication::ReplicationConfiguration;
use serde::{Deserialize, Serialize};

/// Stream of raw object bytes, chunked
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Backend location descriptor for one stored chunk.
///
/// The same format flows through object metadata, the `POST data` request
/// body and the `PUT data` response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLocation {
    /// Chunk key within the data store
    pub key: String,
    /// Name of the data store holding the chunk
    #[serde(rename = "dataStoreName")]
    pub data_store_name: String,
    /// Byte offset of this chunk within the stored blob
    #[serde(default)]
    pub start: u64,
    /// Chunk length in bytes
    #[serde(default)]
    pub size: u64,
}

/// Object metadata document.
///
/// The replication worker owns the full document shape; this layer types
/// the fields it needs and passes everything else through.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    #[serde(rename = "versionId", skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    #[serde(rename = "owner-id", skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(rename = "content-length", skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    #[serde(rename = "content-md5", skip_serializing_if = "Option::is_none")]
    pub content_md5: Option<String>,
    #[serde(rename = "dataStoreName", skip_serializing_if = "Option::is_none")]
    pub data_store_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub location: Vec<DataLocation>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Bucket metadata document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BucketMetadata {
    pub name: String,
    /// Canonical id of the bucket owner
    pub owner: String,
    #[serde(rename = "locationConstraint", skip_serializing_if = "Option::is_none")]
    pub location_constraint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication: Option<ReplicationConfiguration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cors: Vec<CorsRule>,
}

impl BucketMetadata {
    /// Create bucket metadata with no constraint, replication or CORS rules
    #[must_use]
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            location_constraint: None,
            replication: None,
            cors: Vec::new(),
        }
    }

    /// Set the bucket-level location constraint
    #[must_use]
    pub fn with_location_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.location_constraint = Some(constraint.into());
        self
    }

    /// Add a CORS rule
    #[must_use]
    pub fn with_cors_rule(mut self, rule: CorsRule) -> Self {
        self.cors.push(rule);
        self
    }
}

/// One CORS rule on a bucket; used to echo access-control headers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsRule {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
}

impl CorsRule {
    /// Whether this rule allows the given origin and method
    #[must_use]
    pub fn allows(&self, origin: &str, method: &str) -> bool {
        let origin_ok = self
            .allowed_origins
            .iter()
            .any(|o| o == "*" || o == origin);
        let method_ok = self
            .allowed_methods
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method));
        origin_ok && method_ok
    }
}

/// Context for one data write
#[derive(Clone, Debug)]
pub struct PutContext {
    pub bucket: String,
    pub key: String,
    /// Canonical id of the writing owner
    pub owner: Option<String>,
    pub namespace: String,
}

impl PutContext {
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            owner: None,
            namespace: "default".to_string(),
        }
    }

    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

/// Result of one data write
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutResult {
    /// Location descriptors for the stored chunks
    pub locations: Vec<DataLocation>,
    /// Hex MD5 of the stored bytes
    #[serde(rename = "contentDigest")]
    pub content_md5: String,
}
