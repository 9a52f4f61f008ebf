//! Test tooling for the fsimage workspace.
//!
//! [`ImageBuilder`] encodes synthetic containers; [`fixture`] holds the
//! namespaces the integration tests share.

pub mod builder;
pub mod fixture;

pub use builder::{ImageBuilder, MAGIC, delimited, encode_inode};
pub use fixture::{GeneratedShape, SAMPLE_PATHS, generated_namespace, sample_namespace};
