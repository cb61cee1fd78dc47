//! Harbor Common - shared types and utilities
//!
//! This crate defines the error taxonomy shared by the placement,
//! replication and gateway crates, plus small utilities (content digests).

pub mod digest;
pub mod error;

// Re-exports
pub use digest::Md5Writer;
pub use error::{Error, Result};
