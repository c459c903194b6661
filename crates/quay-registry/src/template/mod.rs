//! File name and URL templates
//!
//! Registries address shard and provider files through templates with a
//! fixed set of placeholders:
//!
//! | Placeholder | Replaced with |
//! |---|---|
//! | `%hash%` | content hash of the file |
//! | `%package%` | package name, e.g. `acme/widgets` |
//!
//! Every occurrence of a bound placeholder is replaced; unbound placeholders
//! are left as-is.

use std::fmt;

/// A template placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// `%hash%`
    Hash,
    /// `%package%`
    Package,
}

impl Placeholder {
    /// All known placeholders
    pub const ALL: [Placeholder; 2] = [Placeholder::Hash, Placeholder::Package];

    /// The literal token in a template
    pub fn token(self) -> &'static str {
        match self {
            Placeholder::Hash => "%hash%",
            Placeholder::Package => "%package%",
        }
    }
}

/// A string containing zero or more placeholders
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Template(String);

impl Template {
    /// Wrap a raw template string
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Turn a concrete hashed file name back into a template.
    ///
    /// `include/all$3b2a.json` with hash `3b2a` becomes
    /// `include/all$%hash%.json`, so it can be re-expanded against a newer
    /// hash later. An empty hash leaves the name untouched.
    pub fn from_hashed_name(name: &str, hash: &str) -> Self {
        if hash.is_empty() {
            return Self::new(name);
        }
        Self(name.replace(hash, Placeholder::Hash.token()))
    }

    /// The raw template text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the template references `placeholder`
    pub fn contains(&self, placeholder: Placeholder) -> bool {
        self.0.contains(placeholder.token())
    }

    /// Substitute every bound placeholder
    pub fn expand(&self, bindings: &[(Placeholder, &str)]) -> String {
        let mut expanded = self.0.clone();
        for (placeholder, value) in bindings {
            expanded = expanded.replace(placeholder.token(), value);
        }
        expanded
    }

    /// Substitute `%hash%`
    pub fn with_hash(&self, hash: &str) -> String {
        self.expand(&[(Placeholder::Hash, hash)])
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Template {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Template {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}
