//! Harbor Replication - bucket replication configuration
//!
//! Parses and validates the `ReplicationConfiguration` document a client
//! sets on a bucket, producing the typed configuration the asynchronous
//! replication worker later consumes. Validation is a pipeline of pure
//! stages; persistence belongs to the metadata store collaborator.

pub mod model;
pub mod validator;

// Re-exports
pub use model::{
    Destination, MAX_RULES, ReplicationConfiguration, ReplicationRule, RuleStatus, StorageClass,
};
pub use validator::{ReplicationConfigError, parse};
