//! Trivial line-based catalog reader.
//!
//! The catalog format is required to be parseable by a reader that only
//! tracks the current `[section]` header and matches one entry per line.
//! Unrecognized lines are skipped.

use gradcat_types::catalog::{Catalog, LibraryEntry, PluginEntry, VersionSpec};
use regex::Regex;
use std::sync::LazyLock;

static SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(\w+)\]\s*$").expect("section regex"));
static VERSION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^([A-Za-z0-9_.\-]+)\s*=\s*"([^"]*)"\s*$"#).expect("version line regex")
});
static LIBRARY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(\S+)\s*=\s*\{\s*group\s*=\s*"([^"]*)"\s*,\s*name\s*=\s*"([^"]*)"(?:\s*,\s*(version\.ref|version)\s*=\s*"([^"]*)")?\s*\}\s*$"#,
    )
    .expect("library line regex")
});
static PLUGIN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(\S+)\s*=\s*\{\s*id\s*=\s*"([^"]*)"(?:\s*,\s*(version\.ref|version)\s*=\s*"([^"]*)")?\s*\}\s*$"#,
    )
    .expect("plugin line regex")
});

fn version_spec(kind: Option<&str>, value: Option<&str>) -> VersionSpec {
    match (kind, value) {
        (Some("version.ref"), Some(v)) => VersionSpec::Ref(v.to_string()),
        (Some("version"), Some(v)) => VersionSpec::Literal(v.to_string()),
        _ => VersionSpec::Omitted,
    }
}

/// Parse catalog text back into a [`Catalog`].
pub fn parse_catalog(text: &str) -> Catalog {
    let mut catalog = Catalog::default();
    let mut section = String::new();

    for line in text.lines() {
        if let Some(cap) = SECTION.captures(line) {
            section = cap[1].to_string();
            continue;
        }
        match section.as_str() {
            "versions" => {
                if let Some(cap) = VERSION_LINE.captures(line) {
                    catalog.versions.push((cap[1].to_string(), cap[2].to_string()));
                }
            }
            "libraries" => {
                if let Some(cap) = LIBRARY_LINE.captures(line) {
                    catalog.libraries.push(LibraryEntry {
                        alias: cap[1].to_string(),
                        group: cap[2].to_string(),
                        name: cap[3].to_string(),
                        version: version_spec(
                            cap.get(4).map(|m| m.as_str()),
                            cap.get(5).map(|m| m.as_str()),
                        ),
                    });
                }
            }
            "plugins" => {
                if let Some(cap) = PLUGIN_LINE.captures(line) {
                    catalog.plugins.push(PluginEntry {
                        alias: cap[1].to_string(),
                        id: cap[2].to_string(),
                        version: version_spec(
                            cap.get(3).map(|m| m.as_str()),
                            cap.get(4).map(|m| m.as_str()),
                        ),
                    });
                }
            }
            _ => {}
        }
    }

    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_all_three_sections() {
        let text = concat!(
            "[versions]\n",
            "slf4j = \"1.7.36\"\n",
            "\n",
            "[libraries]\n",
            "slf4j.slf4j-api = { group = \"org.slf4j\", name = \"slf4j-api\", version.ref = \"slf4j\" }\n",
            "example.foo = { group = \"org.example\", name = \"foo\", version = \"1.2.3\" }\n",
            "example.bom = { group = \"org.example\", name = \"bom\" }\n",
            "\n",
            "[plugins]\n",
            "versions = { id = \"com.github.ben-manes.versions\", version = \"0.51.0\" }\n",
        );
        let catalog = parse_catalog(text);
        assert_eq!(catalog.versions, vec![("slf4j".to_string(), "1.7.36".to_string())]);
        assert_eq!(catalog.libraries.len(), 3);
        assert_eq!(catalog.libraries[0].version, VersionSpec::Ref("slf4j".into()));
        assert_eq!(catalog.libraries[1].version, VersionSpec::Literal("1.2.3".into()));
        assert_eq!(catalog.libraries[2].version, VersionSpec::Omitted);
        assert_eq!(catalog.plugins.len(), 1);
    }

    #[test]
    fn skips_unknown_lines_and_sections() {
        let text = "# comment\n[bundles]\nx = [\"a\"]\n[versions]\nk = \"1\"\n";
        let catalog = parse_catalog(text);
        assert_eq!(catalog.versions.len(), 1);
        assert!(catalog.libraries.is_empty());
    }
}
