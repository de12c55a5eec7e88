use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Build DSL variant, inferred from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dsl {
    Groovy,
    Kotlin,
    Unknown,
}

impl Dsl {
    /// Infer the DSL from a file name. `build.gradle.kts` is Kotlin,
    /// `build.gradle` is Groovy, anything else is unknown.
    pub fn from_path(path: &camino::Utf8Path) -> Self {
        let name = path.file_name().unwrap_or_default();
        if name.ends_with(".gradle.kts") {
            Dsl::Kotlin
        } else if name.ends_with(".gradle") {
            Dsl::Groovy
        } else {
            Dsl::Unknown
        }
    }
}

/// A build-descriptor file as read from disk. Never mutated in place;
/// rewrites produce new text that is written back separately.
#[derive(Debug, Clone)]
pub struct BuildFile {
    /// Path relative to the project root.
    pub path: Utf8PathBuf,
    pub dsl: Dsl,
    pub contents: String,
}

impl BuildFile {
    pub fn new(path: Utf8PathBuf, contents: String) -> Self {
        let dsl = Dsl::from_path(&path);
        Self {
            path,
            dsl,
            contents,
        }
    }
}

/// Publishing-block presence for one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishingInfo {
    pub has_block: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub repository_urls: Vec<String>,
}

/// Per-module extraction report. One record per module directory; flags
/// from multiple descriptor files under the same directory are OR-combined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleReport {
    /// Module directory relative to the project root ("." for the root module).
    pub path: Utf8PathBuf,
    pub dsl: Dsl,

    #[serde(default)]
    pub plugins: Vec<String>,

    #[serde(default)]
    pub repositories: Vec<String>,

    pub publishing: PublishingInfo,

    /// True when the module text mentions the legacy repository product.
    pub nexus_references: bool,

    #[serde(default)]
    pub files: Vec<Utf8PathBuf>,
}

/// A version variable pulled from an `ext` block or qualified assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub key: String,
    pub value: String,
    /// File the entry came from.
    pub origin: Utf8PathBuf,
}

/// An external dependency declaration.
///
/// Identity is `group:artifact`; two declarations with the same identity but
/// different configurations are one dependency for catalog purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDecl {
    pub configuration: String,
    pub group: String,
    pub artifact: String,

    /// Literal version or a reference to a version variable. Absent for
    /// declarations that carry no version segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl DependencyDecl {
    pub fn identity(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }
}

/// A project-reference dependency (`implementation project(':sub')`).
/// Excluded from catalog entries entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDep {
    pub configuration: String,
    pub project_path: String,
}
