use serde::{Deserialize, Serialize};

/// How a library entry carries its version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSpec {
    /// `version.ref = "<key>"` — must resolve against the `[versions]` section.
    Ref(String),
    /// `version = "<literal>"`.
    Literal(String),
    /// No version segment was captured for this dependency.
    Omitted,
}

/// One `[libraries]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub alias: String,
    pub group: String,
    pub name: String,
    pub version: VersionSpec,
}

/// One `[plugins]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginEntry {
    pub alias: String,
    pub id: String,
    pub version: VersionSpec,
}

/// The synthesized version catalog. Section order is significant and
/// preserved on emission: versions, libraries, plugins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Ordered `key = "value"` pairs.
    pub versions: Vec<(String, String)>,
    pub libraries: Vec<LibraryEntry>,
    pub plugins: Vec<PluginEntry>,
}

impl Catalog {
    pub fn version_keys(&self) -> impl Iterator<Item = &str> {
        self.versions.iter().map(|(k, _)| k.as_str())
    }

    pub fn has_version_key(&self, key: &str) -> bool {
        self.versions.iter().any(|(k, _)| k == key)
    }
}
