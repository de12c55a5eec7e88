//! Post-migration compliance checks.
//!
//! Every check is report-only: a failed check lands in the report with a
//! detail string and never aborts the run.

use crate::ports::RepoView;
use crate::settings::{BUILD_LOGIC_DIR, CATALOG_PATH};
use camino::Utf8Path;
use gradcat_rewrite::settings::is_retained_settings_line;
use gradcat_scan::SETTINGS_CANDIDATES;
use gradcat_types::change::ChangeRecord;
use gradcat_types::validation::{ValidationCheck, ValidationReport};
use tracing::debug;

/// Run all compliance checks against the (possibly overlaid) project view.
///
/// `changes` is the run's change log so far; it stands in for directory
/// existence checks that an overlay cannot answer.
pub fn validate(repo: &dyn RepoView, changes: &[ChangeRecord]) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.checks.push(settings_normalized(repo));
    report.checks.push(build_logic_present(repo, changes));
    report.checks.push(catalog_present(repo));
    report.checks.push(catalog_valid(repo));
    report.checks.push(root_build_deleted(repo));
    debug!(passed = report.all_passed(), "validation complete");
    report
}

fn settings_normalized(repo: &dyn RepoView) -> ValidationCheck {
    let id = "settings_normalized";
    let Some(rel) = SETTINGS_CANDIDATES
        .iter()
        .map(Utf8Path::new)
        .find(|p| repo.exists(p))
    else {
        return ValidationCheck::fail(id, "no settings descriptor found");
    };
    let text = match repo.read_to_string(rel) {
        Ok(text) => text,
        Err(err) => return ValidationCheck::fail(id, format!("{rel}: {err}")),
    };
    let offending: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty() && !is_retained_settings_line(l))
        .collect();
    if offending.is_empty() {
        ValidationCheck::pass(id)
    } else {
        ValidationCheck::fail(
            id,
            format!("{rel} still carries {} non-include line(s)", offending.len()),
        )
    }
}

fn build_logic_present(repo: &dyn RepoView, changes: &[ChangeRecord]) -> ValidationCheck {
    let id = "build_logic_present";
    let prefix = format!("{BUILD_LOGIC_DIR}/");
    let on_disk = repo.exists(Utf8Path::new(BUILD_LOGIC_DIR));
    let in_changes = changes.iter().any(|c| c.path.starts_with(&prefix));
    if on_disk || in_changes {
        ValidationCheck::pass(id)
    } else {
        ValidationCheck::fail(id, format!("{BUILD_LOGIC_DIR}/ was not materialized"))
    }
}

fn catalog_present(repo: &dyn RepoView) -> ValidationCheck {
    let id = "catalog_present";
    if repo.exists(Utf8Path::new(CATALOG_PATH)) {
        ValidationCheck::pass(id)
    } else {
        ValidationCheck::fail(id, format!("{CATALOG_PATH} missing"))
    }
}

fn catalog_valid(repo: &dyn RepoView) -> ValidationCheck {
    let id = "catalog_valid";
    let text = match repo.read_to_string(Utf8Path::new(CATALOG_PATH)) {
        Ok(text) => text,
        Err(_) => return ValidationCheck::fail(id, format!("{CATALOG_PATH} unreadable")),
    };
    let catalog = gradcat_catalog::parse_catalog(&text);
    let problems = gradcat_catalog::verify(&catalog);
    if problems.is_empty() {
        ValidationCheck::pass(id)
    } else {
        ValidationCheck::fail(id, problems.join("; "))
    }
}

fn root_build_deleted(repo: &dyn RepoView) -> ValidationCheck {
    let id = "root_build_deleted";
    let leftovers: Vec<&str> = ["build.gradle", "build.gradle.kts", "dependencies.gradle"]
        .into_iter()
        .filter(|rel| repo.exists(Utf8Path::new(rel)))
        .collect();
    if leftovers.is_empty() {
        ValidationCheck::pass(id)
    } else {
        ValidationCheck::fail(id, format!("still present: {}", leftovers.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FsRepoView;
    use camino::Utf8PathBuf;
    use fs_err as fs;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(root: &Utf8Path, rel: &str, body: &str) {
        let abs = root.join(rel);
        if let Some(parent) = abs.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(&abs, body).expect("write");
    }

    fn utf8_root(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 temp dir")
    }

    #[test]
    fn all_checks_pass_on_a_migrated_tree() {
        let temp = TempDir::new().expect("temp");
        let root = utf8_root(&temp);
        write(&root, "settings.gradle", "rootProject.name = 'x'\ninclude ':app'\n");
        write(&root, "build-logic/build.gradle.kts", "plugins {}\n");
        write(
            &root,
            "gradle/libs.versions.toml",
            "[versions]\nslf4j = \"1.7.36\"\n",
        );

        let report = validate(&FsRepoView::new(root), &[]);
        assert!(report.all_passed(), "failed: {:?}", report.failed().collect::<Vec<_>>());
        assert_eq!(report.checks.len(), 5);
    }

    #[test]
    fn failures_are_reported_not_thrown() {
        let temp = TempDir::new().expect("temp");
        let root = utf8_root(&temp);
        write(&root, "settings.gradle", "pluginManagement {}\ninclude ':app'\n");
        write(&root, "build.gradle", "apply plugin: 'maven'\n");

        let report = validate(&FsRepoView::new(root), &[]);
        assert!(!report.all_passed());
        let failed: Vec<&str> = report.failed().map(|c| c.id.as_str()).collect();
        assert!(failed.contains(&"settings_normalized"));
        assert!(failed.contains(&"build_logic_present"));
        assert!(failed.contains(&"catalog_present"));
        assert!(failed.contains(&"root_build_deleted"));
    }

    #[test]
    fn change_log_stands_in_for_overlay_directories() {
        let temp = TempDir::new().expect("temp");
        let root = utf8_root(&temp);
        write(&root, "settings.gradle", "include ':app'\n");
        write(&root, "gradle/libs.versions.toml", "[versions]\n");

        let changes = vec![gradcat_types::change::ChangeRecord {
            path: "build-logic/settings.gradle.kts".to_string(),
            kind: gradcat_types::change::ChangeKind::Added,
            risk: gradcat_types::change::RiskLevel::Low,
            before_sha256: None,
            after_sha256: None,
        }];
        let report = validate(&FsRepoView::new(root), &changes);
        assert!(report.checks.iter().any(|c| c.id == "build_logic_present" && c.passed));
    }
}
