//! Harbor Gateway - internal replication data plane
//!
//! HTTP surface for the asynchronous replication worker: object metadata
//! and raw-byte operations addressed by `(bucket, object, resourceType)`,
//! plus the bucket "set replication configuration" handler. The public
//! S3 API lives elsewhere; this gateway only speaks the narrow internal
//! protocol.

pub mod app;
pub mod bucket_api;
pub mod config;
pub mod cors;
pub mod data_plane;
pub mod error;

pub use app::{AppState, router};
pub use config::GatewayConfig;
