//! # quay-core
//!
//! Core types and utilities shared across all Quay crates.
//!
//! This crate provides:
//! - ReleaseResult and Release types produced by registry lookups
//! - HostCredentials and the CredentialLookup seam used for registry auth
//! - QuayError enum for unified error handling
//! - Utility functions for cache keys and registry URLs
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (ReleaseResult, HostCredentials, etc.)
//! - `error`: Error types and result aliases
//! - `utils`: Utility functions and helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{QuayError, QuayResult};
pub use types::{CredentialLookup, HostCredentials, NoCredentials, Release, ReleaseResult};
