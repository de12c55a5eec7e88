//! Declaration extraction from Gradle build descriptors.
//!
//! Responsibilities:
//! - Pull plugins, repository URLs, publishing presence, version variables,
//!   and dependency declarations out of raw descriptor text.
//! - Group per-file extractions into per-module reports.
//! - Merge version variables and dependencies across the whole project for
//!   catalog synthesis.
//!
//! Matching is block-scoped: `ext` and `dependencies` blocks are located by
//! the depth-counting scanner in [`block`], then their inner lines are
//! matched individually.

pub mod block;

use camino::{Utf8Path, Utf8PathBuf};
use gradcat_types::module::{
    BuildFile, DependencyDecl, Dsl, ModuleReport, ProjectDep, PublishingInfo, VersionEntry,
};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

static PLUGINS_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*plugins\s*\{").expect("plugins regex"));
static PLUGIN_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"id\s*\(?\s*["']([^"']+)["']"#).expect("plugin id regex"));
static APPLY_PLUGIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*apply\s+plugin\s*:\s*["']([^"']+)["']"#).expect("apply plugin regex")
});
static REPO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\s*[=:]?\s*(?:uri\s*\()?\s*["']([^"']+)["']"#).expect("url regex")
});
static PUBLISHING_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*publishing\s*\{").expect("publishing regex"));
static EXT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*ext\s*\{").expect("ext regex"));
static EXT_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*(?:rootProject\.)?ext\.([A-Za-z_][A-Za-z0-9_]*)\s*=\s*["']([^"']+)["']"#)
        .expect("ext assignment regex")
});
static VARIABLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*([A-Za-z_][A-Za-z0-9_]*)\s*=\s*["']([^"']+)["']\s*$"#)
        .expect("variable line regex")
});
static DEPENDENCIES_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*dependencies\s*\{").expect("dependencies regex"));
static DEPENDENCY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*([A-Za-z][A-Za-z0-9]*)\s*\(?\s*["']([^"':]+):([^"':]+?)(?::([^"']+))?["']\s*\)?"#)
        .expect("dependency line regex")
});
static PROJECT_DEP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*([A-Za-z][A-Za-z0-9]*)\s*\(?\s*project\s*\(\s*["']([^"']+)["']\s*\)"#)
        .expect("project dep regex")
});

/// Case-insensitive token marking a legacy repository reference.
const LEGACY_REPO_TOKEN: &str = "nexus";

/// Everything extracted from one build-descriptor file.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub plugins: Vec<String>,
    pub repository_urls: Vec<String>,
    pub publishing: PublishingInfo,
    pub versions: Vec<VersionEntry>,
    pub dependencies: Vec<DependencyDecl>,
    pub project_deps: Vec<ProjectDep>,
    pub nexus_references: bool,
}

/// Extract all declarations from one file.
pub fn extract(file: &BuildFile) -> Extraction {
    let text = &file.contents;

    let mut plugins = Vec::new();
    for blk in block::all_blocks(text, &PLUGINS_BLOCK) {
        for cap in PLUGIN_ID.captures_iter(&text[blk.inner.clone()]) {
            push_unique(&mut plugins, cap[1].to_string());
        }
    }
    for cap in APPLY_PLUGIN.captures_iter(text) {
        push_unique(&mut plugins, cap[1].to_string());
    }

    let repository_urls: Vec<String> = REPO_URL
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect();

    let publishing = match block::find_block(text, &PUBLISHING_BLOCK, 0) {
        Some(blk) => PublishingInfo {
            has_block: true,
            repository_urls: REPO_URL
                .captures_iter(&text[blk.inner.clone()])
                .map(|c| c[1].to_string())
                .collect(),
        },
        None => PublishingInfo::default(),
    };

    let versions = extract_versions(text, &file.path);
    let (dependencies, project_deps) = extract_dependencies(text);
    let nexus_references = has_legacy_reference(text);

    debug!(
        path = %file.path,
        plugins = plugins.len(),
        versions = versions.len(),
        dependencies = dependencies.len(),
        "extracted declarations"
    );

    Extraction {
        plugins,
        repository_urls,
        publishing,
        versions,
        dependencies,
        project_deps,
        nexus_references,
    }
}

/// Version variables from `ext { ... }` blocks plus qualified assignment
/// forms anywhere in the file. Nested `ext` blocks inside an `ext` block are
/// not specially handled.
pub fn extract_versions(text: &str, origin: &Utf8Path) -> Vec<VersionEntry> {
    let mut out = Vec::new();
    for blk in block::all_blocks(text, &EXT_BLOCK) {
        for cap in VARIABLE_LINE.captures_iter(&text[blk.inner.clone()]) {
            out.push(VersionEntry {
                key: cap[1].to_string(),
                value: cap[2].to_string(),
                origin: origin.to_path_buf(),
            });
        }
    }
    for cap in EXT_ASSIGNMENT.captures_iter(text) {
        out.push(VersionEntry {
            key: cap[1].to_string(),
            value: cap[2].to_string(),
            origin: origin.to_path_buf(),
        });
    }
    out
}

/// Dependency declarations from `dependencies { ... }` blocks.
///
/// External coordinates match `<configuration> "<group>:<artifact>[:<version>]"`
/// with single or double quotes; project references carry configuration only.
pub fn extract_dependencies(text: &str) -> (Vec<DependencyDecl>, Vec<ProjectDep>) {
    let mut deps = Vec::new();
    let mut projects = Vec::new();

    for blk in block::all_blocks(text, &DEPENDENCIES_BLOCK) {
        let inner = &text[blk.inner.clone()];

        for cap in PROJECT_DEP_LINE.captures_iter(inner) {
            projects.push(ProjectDep {
                configuration: cap[1].to_string(),
                project_path: cap[2].to_string(),
            });
        }

        for cap in DEPENDENCY_LINE.captures_iter(inner) {
            deps.push(DependencyDecl {
                configuration: cap[1].to_string(),
                group: cap[2].to_string(),
                artifact: cap[3].to_string(),
                version: cap.get(4).map(|m| m.as_str().to_string()),
            });
        }
    }

    (deps, projects)
}

/// Case-insensitive keyword test against the whole file text.
pub fn has_legacy_reference(text: &str) -> bool {
    text.to_ascii_lowercase().contains(LEGACY_REPO_TOKEN)
}

/// Group per-file extractions into per-module reports, one per parent
/// directory. Flags are OR-combined across a module's files.
pub fn group_modules(files: &[(BuildFile, Extraction)]) -> Vec<ModuleReport> {
    let mut modules: BTreeMap<Utf8PathBuf, ModuleReport> = BTreeMap::new();

    for (file, extraction) in files {
        let dir = file
            .path
            .parent()
            .filter(|p| !p.as_str().is_empty())
            .map(Utf8Path::to_path_buf)
            .unwrap_or_else(|| Utf8PathBuf::from("."));

        let report = modules.entry(dir.clone()).or_insert_with(|| ModuleReport {
            path: dir,
            dsl: file.dsl,
            plugins: Vec::new(),
            repositories: Vec::new(),
            publishing: PublishingInfo::default(),
            nexus_references: false,
            files: Vec::new(),
        });

        if report.dsl == Dsl::Unknown {
            report.dsl = file.dsl;
        }
        for plugin in &extraction.plugins {
            push_unique(&mut report.plugins, plugin.clone());
        }
        for url in &extraction.repository_urls {
            push_unique(&mut report.repositories, url.clone());
        }
        report.publishing.has_block |= extraction.publishing.has_block;
        for url in &extraction.publishing.repository_urls {
            push_unique(&mut report.publishing.repository_urls, url.clone());
        }
        report.nexus_references |= extraction.nexus_references;
        report.files.push(file.path.clone());
    }

    modules.into_values().collect()
}

/// Merge version variables across files: last-merged source wins on key
/// collision.
pub fn merge_versions(extractions: &[Extraction]) -> Vec<VersionEntry> {
    let mut order: Vec<String> = Vec::new();
    let mut by_key: BTreeMap<String, VersionEntry> = BTreeMap::new();

    for extraction in extractions {
        for entry in &extraction.versions {
            if !by_key.contains_key(&entry.key) {
                order.push(entry.key.clone());
            }
            by_key.insert(entry.key.clone(), entry.clone());
        }
    }

    order
        .into_iter()
        .filter_map(|key| by_key.remove(&key))
        .collect()
}

/// Merge dependencies across files: dedup by `group:artifact` identity,
/// first occurrence wins (configuration is irrelevant to identity).
pub fn merge_dependencies(extractions: &[Extraction]) -> Vec<DependencyDecl> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();

    for extraction in extractions {
        for dep in &extraction.dependencies {
            let identity = dep.identity();
            if seen.contains(&identity) {
                continue;
            }
            seen.push(identity);
            out.push(dep.clone());
        }
    }

    out
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
