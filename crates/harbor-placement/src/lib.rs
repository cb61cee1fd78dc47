//! Harbor Placement - backend resolution
//!
//! This crate decides which physical data store holds an object's bytes.
//! Given the per-object location constraint, the bucket's default
//! constraint and the endpoint the client connected to, the resolver
//! validates the inputs against the deployment's backend mode and produces
//! an immutable [`BackendDescriptor`].
//!
//! Resolution is pure: identical inputs and an identical [`BackendConfig`]
//! always yield the same descriptor.

pub mod config;
pub mod resolver;

// Re-exports
pub use config::{BackendConfig, BackendMode, LocationKind};
pub use resolver::{BackendDescriptor, BackendResolutionError, ControllingConstraint, resolve};
