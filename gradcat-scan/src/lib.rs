//! Build-descriptor discovery.
//!
//! Walks a project tree for `*.gradle` / `*.gradle.kts` files, pruning the
//! fixed exclusion set during the walk (excluded directories are never
//! descended into). Also resolves the small set of singleton files the
//! orchestrator addresses by fixed relative path.

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directories never descended into. Pruned, not post-filtered, so large
/// build-output trees are skipped wholesale.
const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".gradle",
    ".idea",
    "build",
    "out",
    "node_modules",
    "gradle",
];

#[derive(Debug, Error)]
pub enum ScanError {
    /// The project root itself is missing. This is the only fatal case;
    /// unreadable subdirectories are skipped with a warning.
    #[error("project root does not exist: {0}")]
    MissingRoot(Utf8PathBuf),

    #[error("project root is not a directory: {0}")]
    NotADirectory(Utf8PathBuf),
}

/// Singleton files addressed by fixed relative path, when present.
#[derive(Debug, Clone, Default)]
pub struct WellKnownFiles {
    /// `settings.gradle` or `settings.gradle.kts`.
    pub settings: Option<Utf8PathBuf>,
    /// Root ad hoc version-variables descriptor.
    pub dependencies_gradle: Option<Utf8PathBuf>,
    pub wrapper_properties: Option<Utf8PathBuf>,
}

/// Relative paths probed by [`find_well_known`], in probe order.
pub const SETTINGS_CANDIDATES: &[&str] = &["settings.gradle", "settings.gradle.kts"];
pub const DEPENDENCIES_FILE: &str = "dependencies.gradle";
pub const WRAPPER_PROPERTIES: &str = "gradle/wrapper/gradle-wrapper.properties";

fn is_excluded(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| EXCLUDED_DIRS.contains(&name))
}

fn is_build_descriptor(name: &str) -> bool {
    name.ends_with(".gradle") || name.ends_with(".gradle.kts")
}

/// Discover build-descriptor files under `root`, relative to `root`.
///
/// Discovery order follows the walk and is an implementation detail, not a
/// contract. The settings descriptor is a singleton, not a module build
/// file, and is excluded here.
pub fn scan_build_files(root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, ScanError> {
    if !root.exists() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_excluded(e));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!("skipping unreadable entry under {}: {}", root, err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if !is_build_descriptor(name) {
            continue;
        }
        if name.starts_with("settings.gradle") {
            continue;
        }

        let Some(abs) = Utf8Path::from_path(entry.path()) else {
            warn!("skipping non-UTF8 path under {}", root);
            continue;
        };
        match abs.strip_prefix(root) {
            Ok(rel) => found.push(rel.to_path_buf()),
            Err(_) => found.push(abs.to_path_buf()),
        }
    }

    debug!(count = found.len(), root = %root, "scanned build descriptors");
    Ok(found)
}

/// Resolve the singleton files by fixed relative path.
pub fn find_well_known(root: &Utf8Path) -> WellKnownFiles {
    let mut out = WellKnownFiles::default();

    for candidate in SETTINGS_CANDIDATES {
        if root.join(candidate).is_file() {
            out.settings = Some(Utf8PathBuf::from(*candidate));
            break;
        }
    }
    if root.join(DEPENDENCIES_FILE).is_file() {
        out.dependencies_gradle = Some(Utf8PathBuf::from(DEPENDENCIES_FILE));
    }
    if root.join(WRAPPER_PROPERTIES).is_file() {
        out.wrapper_properties = Some(Utf8PathBuf::from(WRAPPER_PROPERTIES));
    }

    out
}
