//! Destructive rewrites of build-descriptor text.
//!
//! Two passes run per file during migration:
//! - [`strip_legacy`] removes obsolete configuration constructs and reports
//!   how many it removed.
//! - [`ensure_convention_plugin`] guarantees the convention plugin is
//!   declared, inserting a declaration when absent.
//!
//! Both are purely textual and idempotent: a second run over already-clean
//! text reports zero changes. No validation is done that the result still
//! parses under Gradle.

pub mod settings;
mod strip;

pub use settings::normalize_settings;
pub use strip::{strip_legacy, StripOutcome};

use gradcat_types::module::Dsl;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static PLUGINS_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*plugins\s*\{").expect("plugins regex"));

/// Render the plugin declaration line in the file's DSL.
fn plugin_decl(plugin_id: &str, dsl: Dsl) -> String {
    match dsl {
        Dsl::Kotlin => format!("id(\"{plugin_id}\")"),
        _ => format!("id '{plugin_id}'"),
    }
}

fn has_plugin(text: &str, plugin_id: &str) -> bool {
    let pattern = format!(r#"id\s*\(?\s*["']{}["']"#, regex::escape(plugin_id));
    Regex::new(&pattern)
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// Ensure `plugin_id` is declared in the file's `plugins` block.
///
/// If a block exists but lacks the declaration, it is inserted as the first
/// entry; if no block exists, one is created at the top of the file. Returns
/// the updated text and a change count of 0 or 1. Idempotent by construction.
pub fn ensure_convention_plugin(text: &str, plugin_id: &str, dsl: Dsl) -> (String, usize) {
    if has_plugin(text, plugin_id) {
        return (text.to_string(), 0);
    }

    let decl = plugin_decl(plugin_id, dsl);

    if let Some(block) = gradcat_extract::block::find_block(text, &PLUGINS_BLOCK, 0) {
        let open_brace = block.inner.start;
        let mut out = String::with_capacity(text.len() + decl.len() + 8);
        out.push_str(&text[..open_brace]);
        out.push_str("\n    ");
        out.push_str(&decl);
        out.push_str(&text[open_brace..]);
        debug!(plugin = plugin_id, "inserted into existing plugins block");
        return (out, 1);
    }

    let mut out = String::with_capacity(text.len() + decl.len() + 16);
    out.push_str("plugins {\n    ");
    out.push_str(&decl);
    out.push_str("\n}\n");
    if !text.is_empty() {
        out.push('\n');
        out.push_str(text);
    }
    debug!(plugin = plugin_id, "created plugins block");
    (out, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CONVENTION: &str = "com.acme.conventions";

    #[test]
    fn creates_block_when_absent() {
        let (out, n) = ensure_convention_plugin("dependencies {\n}\n", CONVENTION, Dsl::Groovy);
        assert_eq!(n, 1);
        assert!(out.starts_with("plugins {\n    id 'com.acme.conventions'\n}\n\n"));
        assert!(out.contains("dependencies {"));
    }

    #[test]
    fn inserts_as_first_entry_in_existing_block() {
        let text = "plugins {\n    id 'java'\n}\n";
        let (out, n) = ensure_convention_plugin(text, CONVENTION, Dsl::Groovy);
        assert_eq!(n, 1);
        assert_eq!(
            out,
            "plugins {\n    id 'com.acme.conventions'\n    id 'java'\n}\n"
        );
    }

    #[test]
    fn kotlin_dsl_uses_call_syntax() {
        let (out, n) = ensure_convention_plugin("", CONVENTION, Dsl::Kotlin);
        assert_eq!(n, 1);
        assert_eq!(out, "plugins {\n    id(\"com.acme.conventions\")\n}\n");
    }

    #[test]
    fn idempotent_when_already_declared() {
        let text = "plugins {\n    id 'com.acme.conventions'\n    id 'java'\n}\n";
        let (out, n) = ensure_convention_plugin(text, CONVENTION, Dsl::Groovy);
        assert_eq!(n, 0);
        assert_eq!(out, text);

        let (out2, n2) = ensure_convention_plugin(
            "plugins { id(\"com.acme.conventions\") }\n",
            CONVENTION,
            Dsl::Kotlin,
        );
        assert_eq!(n2, 0);
        assert!(out2.contains("com.acme.conventions"));
    }
}
