//! Configuration parsing for Quay
//!
//! This crate handles parsing and validation of `quay.toml`, layering of
//! global, project, environment and command line settings, and the host
//! rules that supply registry credentials.

pub mod host_rules;
pub mod merge;
pub mod toml;

// Re-export main types
pub use host_rules::HostRules;
pub use merge::{ConfigLayering, ConfigLoader, ConfigSource};
pub use toml::{CacheSection, HostRule, HttpSection, QuayToml};

use quay_core::error::QuayError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, QuayError>;

/// Project configuration file name
pub const CONFIG_FILE_NAME: &str = "quay.toml";
