//! Settings-descriptor normalization.
//!
//! A migrated settings descriptor carries only the project name and module
//! includes; everything else (plugin management, legacy repositories,
//! buildscript configuration) lives in the convention build logic.

use regex::Regex;
use std::sync::LazyLock;

static RETAINED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(rootProject\.name\s*=|include[\s(])").expect("retained line regex")
});

/// True when a settings line survives normalization.
pub fn is_retained_settings_line(line: &str) -> bool {
    RETAINED_LINE.is_match(line)
}

/// Reduce a settings descriptor to name and include lines.
///
/// Line order is preserved. The output always ends with a single newline
/// when non-empty, so repeated normalization is a fixed point.
pub fn normalize_settings(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        if is_retained_settings_line(line) {
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keeps_name_and_includes_in_order() {
        let text = concat!(
            "pluginManagement {\n",
            "    repositories { maven { url 'https://nexus.acme.com' } }\n",
            "}\n",
            "rootProject.name = 'widget'\n",
            "include ':app'\n",
            "include(\":lib\")\n",
            "apply from: 'env-prod.gradle'\n",
        );
        assert_eq!(
            normalize_settings(text),
            "rootProject.name = 'widget'\ninclude ':app'\ninclude(\":lib\")\n"
        );
    }

    #[test]
    fn normalization_is_a_fixed_point() {
        let once = normalize_settings("rootProject.name = 'x'\ninclude ':a'\njunk\n");
        assert_eq!(normalize_settings(&once), once);
    }

    #[test]
    fn include_build_is_not_retained() {
        // `includeBuild` pulls in composite builds; the convention build
        // logic is wired up separately, so these lines go too.
        assert!(!is_retained_settings_line("includeBuild 'build-logic'"));
        assert!(is_retained_settings_line("include ':app'"));
    }
}
