//! Registry document types
//!
//! Wire shapes of `packages.json`, shard files, and the default registry's
//! per-package endpoint. Maps keep document order, which the normalizer and
//! the shard merge rely on for their last-write-wins tie-break.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use indexmap::IndexMap;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// A string-keyed map that also accepts an empty JSON array.
///
/// Composer serializes empty associative arrays as `[]`, so any map position
/// in a registry document may arrive as a list. `null` reads as empty too.
#[derive(Debug, Clone, PartialEq)]
pub struct LenientMap<V>(pub IndexMap<String, V>);

impl<V> Default for LenientMap<V> {
    fn default() -> Self {
        Self(IndexMap::new())
    }
}

impl<V> Deref for LenientMap<V> {
    type Target = IndexMap<String, V>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<V> DerefMut for LenientMap<V> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<V> FromIterator<(String, V)> for LenientMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de, V> Deserialize<'de> for LenientMap<V>
where
    V: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LenientVisitor<V>(PhantomData<V>);

        impl<'de, V> Visitor<'de> for LenientVisitor<V>
        where
            V: Deserialize<'de>,
        {
            type Value = LenientMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map or an empty array")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    map.insert(key, value);
                }
                Ok(LenientMap(map))
            }

            fn visit_seq<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                if access.next_element::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(1, &self));
                }
                Ok(LenientMap::default())
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(LenientMap::default())
            }

            fn visit_none<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(LenientMap::default())
            }
        }

        deserializer.deserialize_any(LenientVisitor(PhantomData))
    }
}

/// Versions of one package keyed by the version string as published
pub type RawVersionMap = LenientMap<RawVersion>;

/// Source repository of a version
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceInfo {
    /// Repository URL
    pub url: Option<String>,
    /// VCS type, e.g. `git`
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Commit or tag reference
    pub reference: Option<String>,
}

/// One version entry of a package
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawVersion {
    /// Project homepage
    pub homepage: Option<String>,
    /// Source repository
    pub source: Option<SourceInfo>,
    /// Release time, kept verbatim
    pub time: Option<String>,
}

/// A content hash reference, e.g. `{"sha256": "..."}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HashRef {
    pub sha256: Option<String>,
    pub sha1: Option<String>,
}

impl HashRef {
    /// The hash to address the file by; sha256 wins over the legacy sha1
    pub fn hash(&self) -> Option<&str> {
        self.sha256.as_deref().or(self.sha1.as_deref())
    }
}

/// The registry root document (`packages.json`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RootDocument {
    /// Flat layout: package name to versions
    pub packages: LenientMap<RawVersionMap>,
    /// Bundled files: concrete file name to hash
    pub includes: LenientMap<HashRef>,
    /// Provider shards: file name template to hash
    #[serde(rename = "provider-includes")]
    pub provider_includes: LenientMap<HashRef>,
    /// Package name to the hash of its provider file
    pub providers: LenientMap<HashRef>,
    /// Template for per-package provider files
    #[serde(rename = "providers-url")]
    pub providers_url: Option<String>,
}

/// A fetched shard: either provider pointers, bundled packages, or both
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShardFile {
    /// Package name to the hash of its provider file
    pub providers: LenientMap<HashRef>,
    /// Package name to versions
    pub packages: LenientMap<RawVersionMap>,
}

/// Response of the default registry's per-package endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PackageEndpointResponse {
    pub package: Option<PackageEndpointPackage>,
}

/// Package body of [`PackageEndpointResponse`]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PackageEndpointPackage {
    pub name: Option<String>,
    pub versions: RawVersionMap,
}
