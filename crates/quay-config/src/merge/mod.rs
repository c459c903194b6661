//! Configuration layering, fallback logic, and environment overrides

use std::collections::HashMap;

use camino::Utf8PathBuf;
use tracing::debug;

use quay_core::error::QuayError;

use crate::toml::{validate_config, QuayToml};
use crate::{ConfigResult, CONFIG_FILE_NAME};

/// Environment variable listing registry URLs, comma separated
pub const ENV_REGISTRY_URLS: &str = "QUAY_REGISTRY_URLS";
/// Environment variable overriding the cache directory
pub const ENV_CACHE_DIR: &str = "QUAY_CACHE_DIR";
/// Environment variable overriding the request timeout in seconds
pub const ENV_HTTP_TIMEOUT: &str = "QUAY_HTTP_TIMEOUT";

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
}

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Global config file
    Global(Utf8PathBuf),
    /// Project quay.toml file
    Project(Utf8PathBuf),
    /// No file found, built-in defaults
    Defaults,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    /// Load project configuration, falling back to the global file, then defaults
    pub async fn load_project_config(&self) -> ConfigResult<(QuayToml, ConfigSource)> {
        if let Some(path) = self.find_project_config() {
            let config = crate::toml::load_from_file(&path).await?;
            debug!(path = %path, "Loaded project configuration");
            return Ok((config, ConfigSource::Project(path)));
        }

        if let Some(path) = Self::global_config_path()? {
            if path.exists() {
                let config = crate::toml::load_from_file(&path).await?;
                debug!(path = %path, "Loaded global configuration");
                return Ok((config, ConfigSource::Global(path)));
            }
        }

        Ok((QuayToml::default(), ConfigSource::Defaults))
    }

    /// Load every layer and merge them with environment and CLI overrides
    pub async fn load_layered(&self, cli_overrides: HashMap<String, String>) -> ConfigResult<QuayToml> {
        let global = match Self::global_config_path()? {
            Some(path) if path.is_file() => Some(crate::toml::load_from_file(&path).await?),
            _ => None,
        };
        let project = match self.find_project_config() {
            Some(path) => Some(crate::toml::load_from_file(&path).await?),
            None => None,
        };

        ConfigLayering::merge_configs(
            global,
            project,
            ConfigLayering::collect_env_overrides(),
            cli_overrides,
        )
    }

    /// Find quay.toml in the working directory or any parent
    pub fn find_project_config(&self) -> Option<Utf8PathBuf> {
        let mut current = Some(self.cwd.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                return Some(config_path);
            }
            current = dir.parent();
        }

        None
    }

    /// Location of the global configuration file
    pub fn global_config_path() -> ConfigResult<Option<Utf8PathBuf>> {
        let Some(home_dir) = dirs::home_dir() else {
            return Ok(None);
        };

        let home = Utf8PathBuf::try_from(home_dir).map_err(|e| QuayError::ConfigValidation {
            field: "home_dir".to_string(),
            reason: format!("Invalid home directory path: {}", e),
        })?;

        Ok(Some(home.join(".quay").join("config.toml")))
    }
}

/// Configuration layering and merging
pub struct ConfigLayering;

impl ConfigLayering {
    /// Merge configuration layers, later layers winning.
    ///
    /// Order: global file, project file, environment, command line flags.
    /// Host rules accumulate so that project rules are consulted after, and
    /// on ties override, global ones.
    pub fn merge_configs(
        global_config: Option<QuayToml>,
        project_config: Option<QuayToml>,
        env_overrides: HashMap<String, String>,
        cli_overrides: HashMap<String, String>,
    ) -> ConfigResult<QuayToml> {
        let mut merged = global_config.unwrap_or_default();

        if let Some(project) = project_config {
            Self::overlay(&mut merged, project);
        }

        Self::apply_env_overrides(&mut merged, &env_overrides)?;
        Self::apply_cli_overrides(&mut merged, &cli_overrides)?;

        validate_config(&merged)?;
        Ok(merged)
    }

    fn overlay(base: &mut QuayToml, layer: QuayToml) {
        if !layer.registry_urls.is_empty() {
            base.registry_urls = layer.registry_urls;
        }
        if layer.http.timeout_secs.is_some() {
            base.http.timeout_secs = layer.http.timeout_secs;
        }
        if layer.http.max_retries.is_some() {
            base.http.max_retries = layer.http.max_retries;
        }
        if layer.cache.dir.is_some() {
            base.cache.dir = layer.cache.dir;
        }
        base.host_rules.extend(layer.host_rules);
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(config: &mut QuayToml, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                ENV_REGISTRY_URLS => config.registry_urls = split_urls(value),
                ENV_CACHE_DIR => config.cache.dir = Some(value.clone()),
                ENV_HTTP_TIMEOUT => {
                    config.http.timeout_secs = Some(parse_timeout(ENV_HTTP_TIMEOUT, value)?);
                },
                _ => {
                    // Unknown environment variable, ignore
                },
            }
        }

        Ok(())
    }

    /// Apply CLI flag overrides
    fn apply_cli_overrides(config: &mut QuayToml, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "registry" => config.registry_urls = split_urls(value),
                "cache-dir" => config.cache.dir = Some(value.clone()),
                "timeout" => config.http.timeout_secs = Some(parse_timeout("--timeout", value)?),
                _ => {
                    // Unknown CLI override, ignore
                },
            }
        }

        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with("QUAY_"))
            .collect()
    }
}

fn split_urls(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_timeout(field: &str, value: &str) -> ConfigResult<u64> {
    value.trim().parse().map_err(|e| QuayError::ConfigValidation {
        field: field.to_string(),
        reason: format!("expected a number of seconds, got '{}': {}", value, e),
    })
}
