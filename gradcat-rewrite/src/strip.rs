//! Legacy construct removal.
//!
//! Each construct class has its own rule. Block-shaped constructs are removed
//! by matching the opening keyword and walking to the balanced closing brace
//! with the depth-counting scanner; line-shaped constructs are removed by a
//! whole-line regex. Rule order matters: container blocks (publishing,
//! uploadArchives) are removed before `repositories`, so a nested
//! repositories block does not count twice.

use gradcat_extract::block;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

enum Rule {
    /// Keyword regex ending at the opening brace; the whole block is removed.
    Block(&'static LazyLock<Regex>),
    /// Whole-line regex; each match is removed.
    Line(&'static LazyLock<Regex>),
}

static PUBLISHING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*publishing\s*\{").expect("publishing regex"));
static UPLOAD_ARCHIVES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*uploadArchives\s*\{").expect("uploadArchives regex"));
static POM_MODIFICATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:modifyPom|pom)\s*\{").expect("pom regex"));
static NEXUS_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:nexusStaging|nexusPublishing|nexus)\s*\{").expect("nexus regex")
});
static SIGNING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*signing\s*\{").expect("signing regex"));
static WRAPPER_TASK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:task\s+wrapper\s*(?:\([^)]*\))?\s*\{|wrapper\s*\{)")
        .expect("wrapper regex")
});
static REPOSITORIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*repositories\s*\{").expect("repositories regex"));
static EXT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*ext\s*\{").expect("ext regex"));
static APPLY_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*apply\s+from\s*:\s*["'][^"']*dependencies[^"']*["'][^\n]*\n?"#)
        .expect("apply from regex")
});
static NEXUS_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*[A-Za-z_.]*[Nn]exus[A-Za-z_.]*\s*=[^\n]*\n?")
        .expect("nexus property regex")
});
static LEGACY_PLUGIN_APPLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*apply\s+plugin\s*:\s*["'](?:maven|maven-publish|signing|com\.bmuschko\.nexus)["'][^\n]*\n?"#,
    )
    .expect("legacy plugin apply regex")
});

/// All construct classes, in removal order.
const RULES: &[(&str, Rule)] = &[
    ("publishing", Rule::Block(&PUBLISHING)),
    ("upload_archives", Rule::Block(&UPLOAD_ARCHIVES)),
    ("pom_modification", Rule::Block(&POM_MODIFICATION)),
    ("nexus_config", Rule::Block(&NEXUS_BLOCK)),
    ("signing", Rule::Block(&SIGNING)),
    ("wrapper_task", Rule::Block(&WRAPPER_TASK)),
    ("repositories", Rule::Block(&REPOSITORIES)),
    ("ext_variables", Rule::Block(&EXT_BLOCK)),
    ("apply_from_variables", Rule::Line(&APPLY_FROM)),
    ("nexus_property", Rule::Line(&NEXUS_PROPERTY)),
    ("legacy_plugin_apply", Rule::Line(&LEGACY_PLUGIN_APPLY)),
];

/// Result of a strip pass.
#[derive(Debug, Clone)]
pub struct StripOutcome {
    pub text: String,
    /// Total constructs removed across all rules.
    pub removed: usize,
}

/// Remove all legacy constructs from `text`.
///
/// Running this twice yields zero further changes: once a construct is gone,
/// its rule matches nothing.
pub fn strip_legacy(text: &str) -> StripOutcome {
    let mut current = text.to_string();
    let mut removed = 0usize;

    for (name, rule) in RULES {
        let before = removed;
        match rule {
            Rule::Block(re) => loop {
                let Some(block) = block::find_block(&current, re, 0) else {
                    break;
                };
                let range = expand_to_lines(&current, block.outer);
                current.replace_range(range, "");
                removed += 1;
            },
            Rule::Line(re) => {
                let count = re.find_iter(&current).count();
                if count > 0 {
                    current = re.replace_all(&current, "").into_owned();
                    removed += count;
                }
            }
        }
        if removed > before {
            debug!(rule = name, count = removed - before, "stripped constructs");
        }
    }

    StripOutcome {
        text: current,
        removed,
    }
}

/// Widen a block range to whole lines: back to the start of its first line,
/// forward over the trailing newline.
fn expand_to_lines(text: &str, range: std::ops::Range<usize>) -> std::ops::Range<usize> {
    let start = text[..range.start]
        .rfind('\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let mut end = range.end;
    let bytes = text.as_bytes();
    while end < bytes.len() && (bytes[end] == b' ' || bytes[end] == b'\t' || bytes[end] == b'\r') {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'\n' {
        end += 1;
    }
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn removes_repositories_and_publishing_counting_each_once() {
        let text = "repositories { mavenCentral() }\npublishing {\n    repositories {\n        maven { url 'http://legacy/' }\n    }\n}\ndependencies {\n}\n";
        let outcome = strip_legacy(text);
        assert_eq!(outcome.removed, 2);
        assert_eq!(outcome.text, "dependencies {\n}\n");
    }

    #[test]
    fn removes_every_construct_class() {
        let text = concat!(
            "apply plugin: 'maven'\n",
            "apply from: \"$rootDir/dependencies.gradle\"\n",
            "ext {\n    fooVersion = '1.0'\n}\n",
            "signing {\n    sign publishing\n}\n",
            "uploadArchives {\n    repositories {\n        mavenDeployer {}\n    }\n}\n",
            "nexusStaging {\n    packageGroup = 'com.acme'\n}\n",
            "nexusUsername = findProperty('nexusUsername')\n",
            "task wrapper(type: Wrapper) {\n    gradleVersion = '6.9'\n}\n",
            "dependencies {\n    implementation 'a:b:1'\n}\n",
        );
        let outcome = strip_legacy(text);
        assert_eq!(outcome.removed, 8);
        assert_eq!(outcome.text, "dependencies {\n    implementation 'a:b:1'\n}\n");
    }

    #[test]
    fn nested_same_kind_blocks_close_correctly() {
        // A repositories block containing another repositories-named block
        // must be removed in one piece, not truncated at the inner brace.
        let text = "repositories {\n    repositories {\n        mavenLocal()\n    }\n}\nplugins {\n}\n";
        let outcome = strip_legacy(text);
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.text, "plugins {\n}\n");
    }

    #[test]
    fn stripping_is_idempotent() {
        let text = "repositories { mavenCentral() }\nsigning {\n    a\n}\napply plugin: 'maven'\n";
        let first = strip_legacy(text);
        assert_eq!(first.removed, 3);
        let second = strip_legacy(&first.text);
        assert_eq!(second.removed, 0);
        assert_eq!(second.text, first.text);
    }

    #[test]
    fn unrelated_apply_from_lines_survive() {
        let text = "apply from: 'quality.gradle'\napply from: \"$rootDir/dependencies.gradle\"\n";
        let outcome = strip_legacy(text);
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.text, "apply from: 'quality.gradle'\n");
    }

    #[test]
    fn clean_text_reports_zero_changes() {
        let text = "plugins {\n    id 'java'\n}\ndependencies {\n}\n";
        let outcome = strip_legacy(text);
        assert_eq!(outcome.removed, 0);
        assert_eq!(outcome.text, text);
    }
}
