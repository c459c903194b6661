//! Host rules: credentials keyed by host or URL prefix
//!
//! A rule matches a request URL when its `match-host` is either
//!
//! - a URL prefix of the request URL (`https://repo.example.com/private/`), or
//! - the request host itself, or a parent domain of it (`example.com`
//!   matches `repo.example.com`).
//!
//! The longest matching `match-host` wins. Rules with a `host-type` only
//! apply to that datasource family.

use tracing::trace;

use quay_core::types::{CredentialLookup, HostCredentials};
use quay_core::utils::url_host;

use crate::toml::HostRule;

/// Credential lookup over configured host rules
#[derive(Debug, Clone, Default)]
pub struct HostRules {
    rules: Vec<HostRule>,
}

impl HostRules {
    pub fn new(rules: Vec<HostRule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The most specific rule applying to `url`.
    ///
    /// On equal specificity the rule listed last wins, so project rules
    /// layered after global ones take precedence.
    pub fn matching(&self, host_type: &str, url: &str) -> Option<&HostRule> {
        let host = url_host(url);

        self.rules
            .iter()
            .filter(|rule| {
                rule.host_type
                    .as_deref()
                    .map_or(true, |wanted| wanted == host_type)
            })
            .filter(|rule| matches_url(&rule.match_host, url, host.as_deref()))
            .fold(None, |best: Option<&HostRule>, rule| match best {
                Some(current) if current.match_host.len() > rule.match_host.len() => Some(current),
                _ => Some(rule),
            })
    }
}

impl CredentialLookup for HostRules {
    fn find(&self, host_type: &str, url: &str) -> HostCredentials {
        match self.matching(host_type, url) {
            Some(rule) => {
                trace!(url, rule = %rule.match_host, "Host rule matched");
                HostCredentials {
                    username: rule.username.clone(),
                    password: rule.password.clone(),
                    token: rule.token.clone(),
                }
            },
            None => HostCredentials::default(),
        }
    }
}

fn matches_url(match_host: &str, url: &str, host: Option<&str>) -> bool {
    if match_host.contains("://") {
        return url.starts_with(match_host);
    }

    let Some(host) = host else {
        return false;
    };
    let pattern = match_host.trim_start_matches('.').to_ascii_lowercase();

    host == pattern
        || (host.len() > pattern.len()
            && host.ends_with(&pattern)
            && host.as_bytes()[host.len() - pattern.len() - 1] == b'.')
}
