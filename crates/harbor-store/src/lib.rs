//! Harbor Store - metadata and data store collaborators
//!
//! Defines the `MetadataStore` and `DataStore` traits the gateway talks
//! to, the metadata document and location descriptor types on the wire,
//! and the built-in in-memory and file-backed implementations used by the
//! local backend modes and by tests.

pub mod data;
pub mod file;
pub mod metadata;
pub mod types;

// Re-exports
pub use data::{DataStore, DataStoreRegistry, MemDataStore};
pub use file::FileDataStore;
pub use metadata::{MemMetadataStore, MetadataStore};
pub use types::{
    BucketMetadata, ByteStream, CorsRule, DataLocation, ObjectMetadata, PutContext, PutResult,
};
