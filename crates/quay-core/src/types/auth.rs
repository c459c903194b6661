//! Host credentials and the lookup seam used to resolve them.

use std::sync::Arc;

/// Credentials that apply to requests against one host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostCredentials {
    /// Basic auth username
    pub username: Option<String>,
    /// Basic auth password
    pub password: Option<String>,
    /// Bearer token, sent as an `Authorization` header
    pub token: Option<String>,
}

impl HostCredentials {
    /// Basic auth credentials
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            token: None,
        }
    }

    /// Bearer token credentials
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            username: None,
            password: None,
            token: Some(token.into()),
        }
    }

    /// Whether a request built from these credentials carries auth.
    ///
    /// A username alone is still sent as basic auth with an empty password.
    pub fn is_authenticated(&self) -> bool {
        self.username.is_some() || self.password.is_some() || self.token.is_some()
    }
}

/// Resolves credentials for a request URL.
///
/// `host_type` names the kind of datasource asking (e.g. `"packagist"`), so a
/// single rule set can serve several registry families.
pub trait CredentialLookup: Send + Sync {
    /// Find credentials for `url`; an empty value means anonymous
    fn find(&self, host_type: &str, url: &str) -> HostCredentials;
}

/// Lookup that never returns credentials
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialLookup for NoCredentials {
    fn find(&self, _host_type: &str, _url: &str) -> HostCredentials {
        HostCredentials::default()
    }
}

impl<T: CredentialLookup + ?Sized> CredentialLookup for Arc<T> {
    fn find(&self, host_type: &str, url: &str) -> HostCredentials {
        (**self).find(host_type, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_authenticated() {
        assert!(!HostCredentials::default().is_authenticated());
        assert!(HostCredentials::basic("user", "secret").is_authenticated());
        assert!(HostCredentials::bearer("token").is_authenticated());

        let username_only = HostCredentials {
            username: Some("user".to_string()),
            ..Default::default()
        };
        assert!(username_only.is_authenticated());
    }

    #[test]
    fn test_no_credentials() {
        let creds = NoCredentials.find("packagist", "https://repo.example.com");
        assert_eq!(creds, HostCredentials::default());
    }
}
