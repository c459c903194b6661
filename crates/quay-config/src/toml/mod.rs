//! quay.toml configuration parsing and serialization

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use quay_core::error::QuayError;
use quay_core::utils::normalize_registry_url;

use crate::ConfigResult;

/// Complete quay.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct QuayToml {
    /// Registries to try, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub registry_urls: Vec<String>,

    /// Transport settings
    #[serde(default)]
    pub http: HttpSection,

    /// Persistent cache settings
    #[serde(default)]
    pub cache: CacheSection,

    /// Per-host credentials
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host_rules: Vec<HostRule>,
}

/// `[http]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpSection {
    /// Per-request timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Retries for timeouts, resets and 5xx responses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

/// `[cache]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CacheSection {
    /// Cache directory; a leading `~/` expands to the home directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// One `[[host-rules]]` entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HostRule {
    /// Host name (`repo.example.com`) or URL prefix (`https://repo.example.com/private/`)
    pub match_host: String,

    /// Restrict the rule to one datasource family, e.g. `packagist`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl QuayToml {
    /// Resolved cache directory, if one is configured
    pub fn cache_dir(&self) -> Option<Utf8PathBuf> {
        self.cache.dir.as_deref().map(expand_home)
    }

    /// Cache directory to use when none is configured
    pub fn default_cache_dir() -> Utf8PathBuf {
        dirs::cache_dir()
            .and_then(|dir| Utf8PathBuf::try_from(dir).ok())
            .unwrap_or_else(|| Utf8PathBuf::from(".quay-cache"))
            .join("quay")
    }
}

/// Parse TOML string to QuayToml configuration
pub fn parse_quay_toml(content: &str) -> ConfigResult<QuayToml> {
    // First try with toml_edit for located syntax errors
    content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| located_error(content, e.message(), e.span()))?;

    // Then parse with serde for type safety
    let config: QuayToml = toml::from_str(content)
        .map_err(|e| located_error(content, e.message(), e.span()))?;

    validate_config(&config)?;

    Ok(config)
}

/// Serialize QuayToml to TOML string
pub fn serialize_quay_toml(config: &QuayToml) -> ConfigResult<String> {
    toml::to_string_pretty(config).map_err(|e| QuayError::ConfigValidation {
        field: "quay.toml".to_string(),
        reason: format!("serialization failed: {}", e),
    })
}

/// Validate configuration completeness
pub fn validate_config(config: &QuayToml) -> ConfigResult<()> {
    for url in &config.registry_urls {
        normalize_registry_url(url).map_err(|e| QuayError::ConfigValidation {
            field: "registry-urls".to_string(),
            reason: e.to_string(),
        })?;
    }

    if config.http.timeout_secs == Some(0) {
        return Err(QuayError::ConfigValidation {
            field: "http.timeout-secs".to_string(),
            reason: "timeout must be at least one second".to_string(),
        });
    }

    for rule in &config.host_rules {
        validate_host_rule(rule)?;
    }

    Ok(())
}

/// Load and parse quay.toml from file path
pub async fn load_from_file(path: &Utf8Path) -> ConfigResult<QuayToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| QuayError::io(format!("Failed to read {}", path), e))?;

    parse_quay_toml(&content).map_err(|e| match e {
        QuayError::TomlParse {
            message,
            line,
            column,
        } => QuayError::TomlParse {
            message: format!("in file {}: {}", path, message),
            line,
            column,
        },
        QuayError::ConfigValidation { field, reason } => QuayError::ConfigValidation {
            field,
            reason: format!("in file {}: {}", path, reason),
        },
        other => other,
    })
}

fn validate_host_rule(rule: &HostRule) -> ConfigResult<()> {
    if rule.match_host.trim().is_empty() {
        return Err(QuayError::ConfigValidation {
            field: "host-rules.match-host".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    if rule.token.is_some() && (rule.username.is_some() || rule.password.is_some()) {
        return Err(QuayError::ConfigValidation {
            field: "host-rules".to_string(),
            reason: format!(
                "rule for '{}' sets both a token and basic credentials",
                rule.match_host
            ),
        });
    }

    if rule.password.is_some() && rule.username.is_none() {
        return Err(QuayError::ConfigValidation {
            field: "host-rules.username".to_string(),
            reason: format!("rule for '{}' has a password but no username", rule.match_host),
        });
    }

    Ok(())
}

/// Build a TomlParse error with a 1-based line and column
fn located_error(content: &str, message: &str, span: Option<std::ops::Range<usize>>) -> QuayError {
    let offset = span.map_or(0, |span| span.start);
    let before = content.get(..offset).unwrap_or(content);
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before.chars().count(), |newline| before[newline + 1..].chars().count())
        + 1;

    QuayError::TomlParse {
        message: message.trim().to_string(),
        line,
        column,
    }
}

fn expand_home(dir: &str) -> Utf8PathBuf {
    if let Some(rest) = dir.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir().and_then(|home| Utf8PathBuf::try_from(home).ok()) {
            return home.join(rest);
        }
    }
    Utf8PathBuf::from(dir)
}

#[cfg(test)]
mod tests;
