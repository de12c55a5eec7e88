//! Version catalog synthesis.
//!
//! Merges extracted version variables and dependency declarations into one
//! catalog artifact with three ordered sections (versions, libraries,
//! plugins), applying alias normalization, exclusion rules, and dedup by
//! `group:artifact` identity. Also provides the trivial line-based reader
//! the catalog format is required to round-trip through, and a `verify`
//! pass used by the compliance validation step.

mod parse;

pub use parse::parse_catalog;

use gradcat_types::catalog::{Catalog, LibraryEntry, PluginEntry, VersionSpec};
use gradcat_types::module::{DependencyDecl, VersionEntry};
use tracing::debug;

/// Synthesizer configuration. Passed in explicitly so per-project
/// customization needs no code edits.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// A version key is dropped when its name *or value* contains one of
    /// these tokens; a library is dropped when its `group:artifact` contains
    /// one. Exclusion by value is intentional: it drops unrelated keys that
    /// happen to carry an excluded library's version number.
    pub excluded_dependency_tokens: Vec<String>,

    /// A version key is dropped when its name contains one of these tokens,
    /// regardless of value.
    pub excluded_key_tokens: Vec<String>,

    /// Fixed baseline entry for the project's own convention-plugin version.
    pub convention_version_key: String,
    pub convention_version: String,

    /// Fixed plugin-as-library entries for the convention plugin's
    /// sub-plugins, emitted ahead of extracted libraries.
    pub baseline_libraries: Vec<LibraryEntry>,

    /// Fixed plugin identifiers, always emitted; unrelated to extracted data.
    pub baseline_plugins: Vec<PluginEntry>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let convention_version_key = "acme-conventions".to_string();
        Self {
            excluded_dependency_tokens: vec![],
            excluded_key_tokens: vec![],
            convention_version_key: convention_version_key.clone(),
            convention_version: "1.0.0".to_string(),
            baseline_libraries: vec![LibraryEntry {
                alias: "acme.conventions-plugin".to_string(),
                group: "com.acme.build".to_string(),
                name: "conventions-gradle-plugin".to_string(),
                version: VersionSpec::Ref(convention_version_key),
            }],
            baseline_plugins: vec![
                PluginEntry {
                    alias: "versions".to_string(),
                    id: "com.github.ben-manes.versions".to_string(),
                    version: VersionSpec::Literal("0.51.0".to_string()),
                },
                PluginEntry {
                    alias: "dependency-analysis".to_string(),
                    id: "com.autonomousapps.dependency-analysis".to_string(),
                    version: VersionSpec::Literal("2.6.1".to_string()),
                },
            ],
        }
    }
}

/// Common reverse-DNS roots stripped from the front of a group when forming
/// an alias.
const NAMESPACE_PREFIXES: &[&str] = &["com", "org", "io", "net", "de", "co"];

fn contains_token(haystack: &str, tokens: &[String]) -> bool {
    let lower = haystack.to_ascii_lowercase();
    tokens.iter().any(|t| lower.contains(&t.to_ascii_lowercase()))
}

/// Normalize a version-variable key for the `[versions]` section: a trailing
/// `Version`/`_version` suffix is dropped, camelCase and separators become
/// hyphens, the whole key is lowercased. `slf4jVersion` becomes `slf4j`.
pub fn normalize_version_key(raw: &str) -> String {
    let trimmed = raw
        .strip_suffix("Version")
        .or_else(|| raw.strip_suffix("_version"))
        .or_else(|| raw.strip_suffix("_VERSION"))
        .unwrap_or(raw);

    let mut out = String::with_capacity(trimmed.len());
    for (i, c) in trimmed.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('-') {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else if c == '_' || c == '.' {
            if !out.ends_with('-') {
                out.push('-');
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Form a library alias from group and artifact: the group loses a leading
/// reverse-DNS segment and remaining dots become hyphens; group and artifact
/// are joined with a dot. `org.example:foo` becomes `example.foo`.
pub fn library_alias(group: &str, artifact: &str) -> String {
    let mut segments: Vec<&str> = group.split('.').collect();
    if segments.len() > 1 && NAMESPACE_PREFIXES.contains(&segments[0]) {
        segments.remove(0);
    }
    let group_part = segments.join("-").to_ascii_lowercase();
    let artifact_part = artifact.replace('.', "-").to_ascii_lowercase();
    format!("{group_part}.{artifact_part}")
}

/// Build the catalog from merged inputs.
///
/// When a `reference` catalog is supplied its entries are seeded ahead of
/// the extracted ones and take precedence on key collision. The orchestrator
/// feeds the previously generated catalog back in as the reference, which is
/// what makes regeneration converge once the variable blocks it was built
/// from have been stripped. Zero dependencies and zero version variables is
/// a valid input: only the fixed baseline entries are emitted.
pub fn synthesize(
    versions: &[VersionEntry],
    dependencies: &[DependencyDecl],
    reference: Option<&Catalog>,
    config: &CatalogConfig,
) -> Catalog {
    let mut catalog = Catalog::default();

    // [versions] — baseline first, then reference seeds, then surviving
    // variables.
    catalog.versions.push((
        config.convention_version_key.clone(),
        config.convention_version.clone(),
    ));
    if let Some(reference) = reference {
        for (key, value) in &reference.versions {
            if !catalog.has_version_key(key) {
                catalog.versions.push((key.clone(), value.clone()));
            }
        }
    }
    for entry in versions {
        if contains_token(&entry.key, &config.excluded_dependency_tokens)
            || contains_token(&entry.value, &config.excluded_dependency_tokens)
        {
            debug!(key = %entry.key, "version key excluded by dependency token");
            continue;
        }
        if contains_token(&entry.key, &config.excluded_key_tokens) {
            debug!(key = %entry.key, "version key excluded by key token");
            continue;
        }
        let key = normalize_version_key(&entry.key);
        if catalog.has_version_key(&key) {
            continue;
        }
        let value = reference
            .and_then(|r| r.versions.iter().find(|(k, _)| *k == key))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| entry.value.clone());
        catalog.versions.push((key, value));
    }

    // [libraries] — baseline sub-plugin entries, reference seeds, then one
    // alias-keyed entry per deduplicated group:artifact.
    catalog.libraries.extend(config.baseline_libraries.clone());
    if let Some(reference) = reference {
        for lib in &reference.libraries {
            if !catalog.libraries.iter().any(|l| l.alias == lib.alias) {
                catalog.libraries.push(lib.clone());
            }
        }
    }

    let mut seen_identities: Vec<String> = Vec::new();
    for dep in dependencies {
        let identity = dep.identity();
        if seen_identities.contains(&identity) {
            continue;
        }
        seen_identities.push(identity.clone());

        if catalog
            .libraries
            .iter()
            .any(|l| l.group == dep.group && l.name == dep.artifact)
        {
            // Already present via the reference catalog.
            continue;
        }

        if contains_token(&identity, &config.excluded_dependency_tokens) {
            debug!(%identity, "library excluded by dependency token");
            continue;
        }

        let alias = unique_alias(&catalog, &dep.group, &dep.artifact);
        let version = resolve_version(dep.version.as_deref(), &catalog);
        catalog.libraries.push(LibraryEntry {
            alias,
            group: dep.group.clone(),
            name: dep.artifact.clone(),
            version,
        });
    }

    // [plugins] — fixed baseline set, always emitted, plus reference seeds.
    catalog.plugins.extend(config.baseline_plugins.clone());
    if let Some(reference) = reference {
        for plugin in &reference.plugins {
            if !catalog.plugins.iter().any(|p| p.alias == plugin.alias) {
                catalog.plugins.push(plugin.clone());
            }
        }
    }

    catalog
}

/// A version segment becomes a catalog reference when it names a retained
/// key in `[versions]`; otherwise it stays a literal; a missing segment is
/// omitted from the entry.
fn resolve_version(raw: Option<&str>, catalog: &Catalog) -> VersionSpec {
    let Some(raw) = raw else {
        return VersionSpec::Omitted;
    };

    let candidate = raw
        .trim_start_matches('$')
        .trim_start_matches('{')
        .trim_end_matches('}')
        .trim_start_matches("rootProject.ext.")
        .trim_start_matches("ext.")
        .trim_start_matches("project.");
    let key = normalize_version_key(candidate);
    if catalog.has_version_key(&key) {
        VersionSpec::Ref(key)
    } else {
        VersionSpec::Literal(raw.to_string())
    }
}

fn unique_alias(catalog: &Catalog, group: &str, artifact: &str) -> String {
    let alias = library_alias(group, artifact);
    if !catalog.libraries.iter().any(|l| l.alias == alias) {
        return alias;
    }
    // Colliding aliases keep the full group path.
    let full = format!(
        "{}.{}",
        group.replace('.', "-").to_ascii_lowercase(),
        artifact.replace('.', "-").to_ascii_lowercase()
    );
    if !catalog.libraries.iter().any(|l| l.alias == full) {
        return full;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{full}-x{n}");
        if !catalog.libraries.iter().any(|l| l.alias == candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Render the catalog in the fixed three-section text format.
pub fn emit(catalog: &Catalog) -> String {
    let mut out = String::new();

    out.push_str("[versions]\n");
    for (key, value) in &catalog.versions {
        out.push_str(&format!("{key} = \"{value}\"\n"));
    }

    out.push_str("\n[libraries]\n");
    for lib in &catalog.libraries {
        out.push_str(&format!(
            "{} = {{ group = \"{}\", name = \"{}\"{} }}\n",
            lib.alias,
            lib.group,
            lib.name,
            version_fragment(&lib.version)
        ));
    }

    out.push_str("\n[plugins]\n");
    for plugin in &catalog.plugins {
        out.push_str(&format!(
            "{} = {{ id = \"{}\"{} }}\n",
            plugin.alias,
            plugin.id,
            version_fragment(&plugin.version)
        ));
    }

    out
}

fn version_fragment(spec: &VersionSpec) -> String {
    match spec {
        VersionSpec::Ref(key) => format!(", version.ref = \"{key}\""),
        VersionSpec::Literal(value) => format!(", version = \"{value}\""),
        VersionSpec::Omitted => String::new(),
    }
}

/// Check the catalog invariants: no duplicate alias, every `version.ref`
/// resolves against `[versions]`. Returns the list of violations.
pub fn verify(catalog: &Catalog) -> Vec<String> {
    let mut problems = Vec::new();

    let mut aliases: Vec<&str> = Vec::new();
    for lib in &catalog.libraries {
        if aliases.contains(&lib.alias.as_str()) {
            problems.push(format!("duplicate library alias: {}", lib.alias));
        }
        aliases.push(&lib.alias);
    }

    let mut refs: Vec<(&str, &VersionSpec)> = Vec::new();
    refs.extend(catalog.libraries.iter().map(|l| (l.alias.as_str(), &l.version)));
    refs.extend(catalog.plugins.iter().map(|p| (p.alias.as_str(), &p.version)));
    for (alias, spec) in refs {
        if let VersionSpec::Ref(key) = spec {
            if !catalog.has_version_key(key) {
                problems.push(format!("unresolved version.ref {key} on {alias}"));
            }
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(key: &str, value: &str) -> VersionEntry {
        VersionEntry {
            key: key.into(),
            value: value.into(),
            origin: "build.gradle".into(),
        }
    }

    fn dep(conf: &str, group: &str, artifact: &str, version: Option<&str>) -> DependencyDecl {
        DependencyDecl {
            configuration: conf.into(),
            group: group.into(),
            artifact: artifact.into(),
            version: version.map(String::from),
        }
    }

    #[test]
    fn empty_input_emits_only_baseline() {
        let config = CatalogConfig::default();
        let catalog = synthesize(&[], &[], None, &config);
        assert_eq!(catalog.versions.len(), 1);
        assert_eq!(catalog.versions[0].0, "acme-conventions");
        assert_eq!(catalog.libraries.len(), config.baseline_libraries.len());
        assert_eq!(catalog.plugins.len(), config.baseline_plugins.len());
        assert!(verify(&catalog).is_empty());
    }

    #[test]
    fn literal_version_when_no_matching_variable() {
        let config = CatalogConfig::default();
        let catalog = synthesize(
            &[],
            &[dep("implementation", "org.example", "foo", Some("1.2.3"))],
            None,
            &config,
        );
        let text = emit(&catalog);
        assert!(text.contains(
            "example.foo = { group = \"org.example\", name = \"foo\", version = \"1.2.3\" }"
        ));
    }

    #[test]
    fn interpolated_version_becomes_ref_when_key_retained() {
        let config = CatalogConfig::default();
        let catalog = synthesize(
            &[entry("slf4jVersion", "1.7.36")],
            &[dep("api", "org.slf4j", "slf4j-api", Some("$slf4jVersion"))],
            None,
            &config,
        );
        assert!(catalog.has_version_key("slf4j"));
        let lib = catalog
            .libraries
            .iter()
            .find(|l| l.alias == "slf4j.slf4j-api")
            .expect("slf4j lib");
        assert_eq!(lib.version, VersionSpec::Ref("slf4j".into()));
        assert!(verify(&catalog).is_empty());
    }

    #[test]
    fn dedup_by_identity_across_configurations() {
        let config = CatalogConfig::default();
        let catalog = synthesize(
            &[],
            &[
                dep("implementation", "org.example", "foo", Some("1.0")),
                dep("testImplementation", "org.example", "foo", Some("1.0")),
            ],
            None,
            &config,
        );
        let count = catalog
            .libraries
            .iter()
            .filter(|l| l.group == "org.example")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn exclusion_by_key_name_value_and_key_token() {
        let config = CatalogConfig {
            excluded_dependency_tokens: vec!["guava".into(), "33.0.0-jre".into()],
            excluded_key_tokens: vec!["internal".into()],
            ..CatalogConfig::default()
        };
        let catalog = synthesize(
            &[
                entry("guavaVersion", "33.0.0-jre"),
                // Unrelated key sharing the excluded value is dropped too.
                entry("shadedVersion", "33.0.0-jre"),
                entry("internalBomVersion", "7"),
                entry("slf4jVersion", "1.7.36"),
            ],
            &[dep("implementation", "com.google.guava", "guava", Some("$guavaVersion"))],
            None,
            &config,
        );
        assert!(!catalog.has_version_key("guava"));
        assert!(!catalog.has_version_key("shaded"));
        assert!(!catalog.has_version_key("internal-bom"));
        assert!(catalog.has_version_key("slf4j"));
        assert!(catalog.libraries.iter().all(|l| l.name != "guava"));
    }

    #[test]
    fn reference_catalog_takes_precedence_on_collision() {
        let config = CatalogConfig::default();
        let reference = Catalog {
            versions: vec![("slf4j".into(), "2.0.12".into())],
            ..Catalog::default()
        };
        let catalog = synthesize(
            &[entry("slf4jVersion", "1.7.36")],
            &[],
            Some(&reference),
            &config,
        );
        let value = &catalog
            .versions
            .iter()
            .find(|(k, _)| k == "slf4j")
            .expect("slf4j key")
            .1;
        assert_eq!(value, "2.0.12");
    }

    #[test]
    fn aliases_are_never_duplicated() {
        let config = CatalogConfig::default();
        let catalog = synthesize(
            &[],
            &[
                dep("implementation", "org.widget", "core", Some("1")),
                dep("implementation", "com.widget", "core", Some("2")),
            ],
            None,
            &config,
        );
        assert!(verify(&catalog).is_empty());
        let aliases: Vec<&str> = catalog.libraries.iter().map(|l| l.alias.as_str()).collect();
        assert!(aliases.contains(&"widget.core"));
        assert!(aliases.contains(&"com-widget.core"));
    }

    #[test]
    fn project_reference_free_catalog_round_trips_through_reader() {
        let config = CatalogConfig::default();
        let catalog = synthesize(
            &[entry("slf4jVersion", "1.7.36")],
            &[
                dep("api", "org.slf4j", "slf4j-api", Some("$slf4jVersion")),
                dep("implementation", "org.example", "foo", Some("1.2.3")),
                dep("implementation", "org.example", "bom", None),
            ],
            None,
            &config,
        );
        let text = emit(&catalog);
        let parsed = parse_catalog(&text);
        assert_eq!(parsed, catalog);
    }

    #[test]
    fn regeneration_with_previous_catalog_as_reference_converges() {
        let config = CatalogConfig::default();
        let deps = [dep("api", "org.slf4j", "slf4j-api", Some("$slf4jVersion"))];
        let first = synthesize(&[entry("slf4jVersion", "1.7.36")], &deps, None, &config);
        // After migration the variable blocks are stripped, so a re-run sees
        // the dependency but not the variable. Feeding the previous catalog
        // back as the reference must reproduce it exactly.
        let second = synthesize(&[], &deps, Some(&first), &config);
        assert_eq!(emit(&second), emit(&first));
    }

    #[test]
    fn normalize_version_key_forms() {
        assert_eq!(normalize_version_key("slf4jVersion"), "slf4j");
        assert_eq!(normalize_version_key("junit_version"), "junit");
        assert_eq!(normalize_version_key("apacheHttpClient"), "apache-http-client");
        assert_eq!(normalize_version_key("spring.boot"), "spring-boot");
    }
}
