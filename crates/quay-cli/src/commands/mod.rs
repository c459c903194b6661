//! Command implementations and dispatch logic.
//!
//! Each command is implemented as an async function that takes a
//! CommandContext holding the merged configuration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use tracing::info;

use quay_cache::FileStore;
use quay_config::{ConfigLoader, HostRules, QuayToml};
use quay_core::error::{QuayError, QuayResult};
use quay_registry::{HttpConfig, PackagistDatasource, RetryConfig};

pub mod cache;
pub mod releases;


use crate::{output::OutputHandler, CacheCommand, Commands};

/// Shared context for all commands
pub struct CommandContext {
    pub config: QuayToml,
    pub output: OutputHandler,
}

impl CommandContext {
    /// Load configuration for the current directory
    pub async fn new(cli_overrides: HashMap<String, String>) -> QuayResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| QuayError::io("Failed to get current directory".to_string(), e))?;
        let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|path| QuayError::ConfigValidation {
            field: "cwd".to_string(),
            reason: format!("current directory is not valid UTF-8: {}", path.display()),
        })?;

        let config = ConfigLoader::new(cwd).load_layered(cli_overrides).await?;

        Ok(Self {
            config,
            output: OutputHandler::new(),
        })
    }

    /// Cache directory from configuration, or the platform default
    pub fn cache_dir(&self) -> Utf8PathBuf {
        self.config
            .cache_dir()
            .unwrap_or_else(QuayToml::default_cache_dir)
    }

    /// Build a datasource wired to the persistent cache and host rules
    pub fn datasource(&self) -> QuayResult<PackagistDatasource> {
        let mut http = HttpConfig::default();
        if let Some(timeout) = self.config.http.timeout_secs {
            http.timeout = Duration::from_secs(timeout);
        }
        if let Some(max_retries) = self.config.http.max_retries {
            http.retry = RetryConfig {
                max_retries,
                ..RetryConfig::default()
            };
        }

        let store = FileStore::new(self.cache_dir())?;
        let credentials = HostRules::new(self.config.host_rules.clone());

        PackagistDatasource::builder()
            .http_config(http)
            .store(Arc::new(store))
            .credentials(Arc::new(credentials))
            .build()
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> QuayResult<()> {
    match command {
        Commands::Releases { package, json, .. } => {
            info!("Looking up releases for {}", package);
            releases::execute(package, json, ctx).await
        },
        Commands::Cache {
            command: CacheCommand::Clean { all },
        } => {
            info!("Cleaning cache (all: {})", all);
            cache::clean(all, ctx).await
        },
    }
}
