//! Core data types for Quay registry lookups.
//!
//! This module provides the fundamental types used throughout Quay:
//! - Release records produced by the normalizer
//! - Host credentials resolved per registry URL

pub mod auth;
pub mod release;

// Re-export all public types
pub use auth::{CredentialLookup, HostCredentials, NoCredentials};
pub use release::{Release, ReleaseResult};
