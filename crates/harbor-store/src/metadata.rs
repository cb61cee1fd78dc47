//! Metadata store collaborator
//!
//! The gateway consumes metadata through this trait; the key-value engine
//! behind it is out of scope. The in-memory implementation backs the
//! local modes and the test suites.
//!
//! Bucket-level writes are last-writer-wins; a store with stronger
//! guarantees can implement `put_bucket_replication` atomically.

use crate::types::{BucketMetadata, ObjectMetadata};
use async_trait::async_trait;
use dashmap::DashMap;
use harbor_common::{Error, Result};
use harbor_replication::ReplicationConfiguration;
use tracing::debug;

/// Object and bucket metadata operations used by the data plane
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Fetch bucket metadata
    async fn get_bucket(&self, bucket: &str) -> Result<BucketMetadata>;

    /// Create or replace bucket metadata
    async fn put_bucket(&self, bucket: BucketMetadata) -> Result<()>;

    /// Attach a validated replication configuration to a bucket and
    /// return the updated bucket metadata
    async fn put_bucket_replication(
        &self,
        bucket: &str,
        config: ReplicationConfiguration,
    ) -> Result<BucketMetadata>;

    /// Fetch raw object metadata
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata>;

    /// Versioned object metadata write; returns the document as stored
    async fn put_object_versioned(
        &self,
        bucket: &str,
        key: &str,
        metadata: ObjectMetadata,
        version_id: &str,
    ) -> Result<ObjectMetadata>;
}

/// In-memory metadata store
#[derive(Default)]
pub struct MemMetadataStore {
    buckets: DashMap<String, BucketMetadata>,
    /// Master copy per (bucket, key)
    objects: DashMap<(String, String), ObjectMetadata>,
    /// Versioned copies per (bucket, key, version)
    versions: DashMap<(String, String, String), ObjectMetadata>,
}

impl MemMetadataStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch one specific stored version (test and worker introspection)
    #[must_use]
    pub fn get_object_version(
        &self,
        bucket: &str,
        key: &str,
        version_id: &str,
    ) -> Option<ObjectMetadata> {
        self.versions
            .get(&(bucket.to_string(), key.to_string(), version_id.to_string()))
            .map(|entry| entry.clone())
    }
}

#[async_trait]
impl MetadataStore for MemMetadataStore {
    async fn get_bucket(&self, bucket: &str) -> Result<BucketMetadata> {
        self.buckets
            .get(bucket)
            .map(|entry| entry.clone())
            .ok_or_else(|| Error::BucketNotFound(bucket.to_string()))
    }

    async fn put_bucket(&self, bucket: BucketMetadata) -> Result<()> {
        self.buckets.insert(bucket.name.clone(), bucket);
        Ok(())
    }

    async fn put_bucket_replication(
        &self,
        bucket: &str,
        config: ReplicationConfiguration,
    ) -> Result<BucketMetadata> {
        let mut entry = self
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Error::BucketNotFound(bucket.to_string()))?;
        entry.replication = Some(config);
        debug!(bucket, "stored replication configuration");
        Ok(entry.clone())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectMetadata> {
        if !self.buckets.contains_key(bucket) {
            return Err(Error::BucketNotFound(bucket.to_string()));
        }
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|entry| entry.clone())
            .ok_or_else(|| Error::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn put_object_versioned(
        &self,
        bucket: &str,
        key: &str,
        metadata: ObjectMetadata,
        version_id: &str,
    ) -> Result<ObjectMetadata> {
        if !self.buckets.contains_key(bucket) {
            return Err(Error::BucketNotFound(bucket.to_string()));
        }
        self.versions.insert(
            (
                bucket.to_string(),
                key.to_string(),
                version_id.to_string(),
            ),
            metadata.clone(),
        );
        self.objects
            .insert((bucket.to_string(), key.to_string()), metadata.clone());
        debug!(bucket, key, version_id, "stored object metadata");
        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bucket_round_trip() {
        let store = MemMetadataStore::new();
        assert!(matches!(
            store.get_bucket("b1").await.unwrap_err(),
            Error::BucketNotFound(_)
        ));

        store
            .put_bucket(BucketMetadata::new("b1", "owner-1"))
            .await
            .unwrap();
        let bucket = store.get_bucket("b1").await.unwrap();
        assert_eq!(bucket.owner, "owner-1");
        assert!(bucket.replication.is_none());
    }

    #[tokio::test]
    async fn test_put_bucket_replication() {
        let store = MemMetadataStore::new();
        store
            .put_bucket(BucketMetadata::new("b1", "owner-1"))
            .await
            .unwrap();

        let xml = "<ReplicationConfiguration><Role>arn:aws:iam::1:role/r</Role>\
                   <Rule><Status>Enabled</Status><Prefix></Prefix>\
                   <Destination><Bucket>arn:aws:s3:::dest</Bucket></Destination></Rule>\
                   </ReplicationConfiguration>";
        let config = harbor_replication::parse(xml.as_bytes()).unwrap();

        let updated = store.put_bucket_replication("b1", config.clone()).await.unwrap();
        assert_eq!(updated.replication, Some(config));

        assert!(matches!(
            store
                .put_bucket_replication("missing", updated.replication.unwrap())
                .await
                .unwrap_err(),
            Error::BucketNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_versioned_object_write_echoes_document() {
        let store = MemMetadataStore::new();
        store
            .put_bucket(BucketMetadata::new("b1", "owner-1"))
            .await
            .unwrap();

        let metadata = ObjectMetadata {
            version_id: Some("v1".to_string()),
            owner: Some("u1".to_string()),
            ..ObjectMetadata::default()
        };
        let stored = store
            .put_object_versioned("b1", "k1", metadata.clone(), "v1")
            .await
            .unwrap();
        assert_eq!(stored, metadata);

        assert_eq!(store.get_object("b1", "k1").await.unwrap(), metadata);
        assert_eq!(store.get_object_version("b1", "k1", "v1"), Some(metadata));
        assert!(store.get_object_version("b1", "k1", "v2").is_none());
    }

    #[tokio::test]
    async fn test_object_errors() {
        let store = MemMetadataStore::new();
        assert!(matches!(
            store.get_object("b1", "k1").await.unwrap_err(),
            Error::BucketNotFound(_)
        ));

        store
            .put_bucket(BucketMetadata::new("b1", "owner-1"))
            .await
            .unwrap();
        assert!(matches!(
            store.get_object("b1", "k1").await.unwrap_err(),
            Error::ObjectNotFound { .. }
        ));
        assert!(matches!(
            store
                .put_object_versioned("nope", "k1", ObjectMetadata::default(), "v1")
                .await
                .unwrap_err(),
            Error::BucketNotFound(_)
        ));
    }
}
