//! Clap-free settings for the migration pipeline.

use camino::Utf8PathBuf;
use gradcat_catalog::CatalogConfig;

/// Relative path of the generated catalog, fixed by convention.
pub const CATALOG_PATH: &str = "gradle/libs.versions.toml";

/// Relative directory the convention build-logic subproject is
/// materialized into.
pub const BUILD_LOGIC_DIR: &str = "build-logic";

/// How long a persisted migration state stays resumable.
pub const STATE_FRESHNESS_MINUTES: i64 = 15;

/// Settings for one migration run.
#[derive(Debug, Clone)]
pub struct MigrateSettings {
    pub project_root: Utf8PathBuf,

    /// Artifact directory (summary, report, patch, state file).
    pub out_dir: Utf8PathBuf,

    /// Convention plugin injected into every module descriptor.
    pub convention_plugin_id: String,

    pub catalog: CatalogConfig,

    /// Explicit reference catalog; when unset, an existing generated
    /// catalog in the project is used instead.
    pub reference_catalog: Option<Utf8PathBuf>,

    // Templates (absolute paths; all optional, each guards its own step)
    /// Directory tree copied verbatim as the convention build-logic
    /// subproject.
    pub build_logic_template: Option<Utf8PathBuf>,
    /// Wrapper properties file copied verbatim over the project's copy.
    pub wrapper_template: Option<Utf8PathBuf>,
    /// Auxiliary template copied to the project root after the legacy
    /// per-environment files are deleted.
    pub aux_template: Option<Utf8PathBuf>,

    /// Glob (relative to the project root) naming the legacy
    /// per-environment files deleted in the auxiliary step.
    pub legacy_env_glob: String,

    /// When set, no file on disk is touched; all writes land in the
    /// dry-run overlay and only artifacts are produced.
    pub dry_run: bool,
}

impl MigrateSettings {
    pub fn new(project_root: Utf8PathBuf) -> Self {
        let out_dir = project_root.join(".gradcat");
        Self {
            project_root,
            out_dir,
            convention_plugin_id: "com.acme.conventions".to_string(),
            catalog: CatalogConfig::default(),
            reference_catalog: None,
            build_logic_template: None,
            wrapper_template: None,
            aux_template: None,
            legacy_env_glob: "env-*.gradle".to_string(),
            dry_run: false,
        }
    }

    pub fn state_path(&self) -> Utf8PathBuf {
        self.out_dir.join("state.json")
    }
}
