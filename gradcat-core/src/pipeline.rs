//! The eight-step migration pipeline.
//!
//! Steps run strictly in order; each completes its file I/O before the next
//! begins. Per-file work inside a step is independent, so a failure on one
//! file is recorded as a note and the step moves on; only precondition
//! violations and I/O failures on the artifact side abort the run.
//!
//! 1. Normalize the settings descriptor.
//! 2. Materialize the convention build-logic subproject from its template.
//! 3. Synthesize and write the version catalog.
//! 4. Replace the wrapper properties (checkpointed: the wrapper swap can
//!    restart the surrounding tooling, so the run is resumable from here).
//! 5. Delete the root build descriptors.
//! 6. Strip legacy blocks and inject the convention plugin per module.
//! 7. Compliance validation (report-only).
//! 8. Auxiliary cleanup: delete per-environment files, copy the aux template.

use crate::ports::{enhanced_or, Enhancer, Prompt, RepoView, WritePort};
use crate::render;
use crate::settings::{MigrateSettings, BUILD_LOGIC_DIR, CATALOG_PATH};
use crate::state;
use crate::validate;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use gradcat_catalog::parse_catalog;
use gradcat_scan::{find_well_known, scan_build_files, WRAPPER_PROPERTIES};
use gradcat_types::change::{ChangeKind, ChangeRecord, MigrationSummary, RiskLevel, RiskTally};
use gradcat_types::module::{BuildFile, ModuleReport};
use gradcat_types::state::MigrationState;
use gradcat_types::validation::ValidationReport;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ToolError {
    /// The project cannot be migrated as found (missing root, no settings
    /// descriptor). Reported before any file is touched.
    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Everything a host needs to report on one migration run.
#[derive(Debug)]
pub struct MigrationOutcome {
    pub summary: MigrationSummary,
    pub changes: Vec<ChangeRecord>,
    pub validation: ValidationReport,

    /// Unified diff covering every change of the run, concatenated in
    /// execution order.
    pub patch: String,

    pub modules: Vec<ModuleReport>,

    /// Step the run resumed from, when a fresh checkpoint was found.
    pub resumed_from: Option<u32>,

    /// Non-fatal observations (skipped templates, unreadable files).
    pub notes: Vec<String>,

    /// Human-readable run narrative.
    pub narrative: String,
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Mutable per-run bookkeeping shared by the steps.
struct Run<'a> {
    settings: &'a MigrateSettings,
    repo: &'a dyn RepoView,
    writer: &'a dyn WritePort,
    changes: Vec<ChangeRecord>,
    tally: RiskTally,
    patch: String,
    notes: Vec<String>,
}

impl<'a> Run<'a> {
    fn abs(&self, rel: &Utf8Path) -> Utf8PathBuf {
        self.settings.project_root.join(rel)
    }

    fn note(&mut self, note: impl Into<String>) {
        let note = note.into();
        warn!("{note}");
        self.notes.push(note);
    }

    /// Write `new` to `rel`, recording the change, diff, and digests.
    /// `old` is the prior content when the file existed.
    fn record_write(
        &mut self,
        rel: &Utf8Path,
        old: Option<&str>,
        new: &str,
        risk: RiskLevel,
    ) -> anyhow::Result<()> {
        self.writer.write_file(&self.abs(rel), new.as_bytes())?;
        let (kind, diff, before) = match old {
            Some(old) => (
                ChangeKind::Modified,
                gradcat_diff::modify_diff(rel.as_str(), old, new),
                Some(sha256_hex(old.as_bytes())),
            ),
            None => (
                ChangeKind::Added,
                gradcat_diff::add_diff(rel.as_str(), new),
                None,
            ),
        };
        self.patch.push_str(&diff);
        self.tally.bump(risk);
        self.changes.push(ChangeRecord {
            path: rel.to_string(),
            kind,
            risk,
            before_sha256: before,
            after_sha256: Some(sha256_hex(new.as_bytes())),
        });
        Ok(())
    }

    fn record_delete(&mut self, rel: &Utf8Path, old: &str, risk: RiskLevel) -> anyhow::Result<()> {
        self.writer.remove_file(&self.abs(rel))?;
        self.patch
            .push_str(&gradcat_diff::delete_diff(rel.as_str(), old));
        self.tally.bump(risk);
        self.changes.push(ChangeRecord {
            path: rel.to_string(),
            kind: ChangeKind::Deleted,
            risk,
            before_sha256: Some(sha256_hex(old.as_bytes())),
            after_sha256: None,
        });
        Ok(())
    }
}

/// Run the full migration pipeline.
///
/// The returned outcome is produced even when individual files fail; see the
/// module docs for the failure model.
pub fn run_migration(
    settings: &MigrateSettings,
    repo: &dyn RepoView,
    writer: &dyn WritePort,
    enhancer: &dyn Enhancer,
) -> Result<MigrationOutcome, ToolError> {
    if !settings.project_root.is_dir() {
        return Err(ToolError::Precondition(format!(
            "project root does not exist: {}",
            settings.project_root
        )));
    }
    let known = find_well_known(&settings.project_root);
    let Some(settings_rel) = known.settings.clone() else {
        return Err(ToolError::Precondition(format!(
            "no settings descriptor under {}",
            settings.project_root
        )));
    };

    let resumed_from = state::load_resumable(settings).map(|s| s.step);
    let start_step = resumed_from.unwrap_or(1);
    if let Some(step) = resumed_from {
        info!(step, "resuming from checkpoint");
    }

    let mut run = Run {
        settings,
        repo,
        writer,
        changes: Vec::new(),
        tally: RiskTally::default(),
        patch: String::new(),
        notes: Vec::new(),
    };
    let mut modules = Vec::new();

    if start_step <= 1 {
        step_normalize_settings(&mut run, &settings_rel)?;
    }
    if start_step <= 2 {
        step_materialize_build_logic(&mut run)?;
    }
    if start_step <= 3 {
        step_synthesize_catalog(&mut run, &mut modules)?;
    }
    if start_step <= 4 {
        if !settings.dry_run {
            let checkpoint = MigrationState::new(4, settings.project_root.as_str());
            state::save(settings, writer, &checkpoint)?;
        }
        step_replace_wrapper(&mut run)?;
    }
    if start_step <= 5 {
        step_delete_root_builds(&mut run)?;
    }
    // Steps 6-8 always run, resumed or not; they are idempotent.
    step_rewrite_modules(&mut run)?;
    let validation = validate::validate(repo, &run.changes);
    step_auxiliary_cleanup(&mut run)?;

    if !settings.dry_run {
        state::clear(settings)?;
    }

    let files_changed: Vec<String> = run.changes.iter().map(|c| c.path.clone()).collect();
    let summary = MigrationSummary::new(files_changed, run.tally);
    let deterministic = render::deterministic_narrative(&summary, &validation, resumed_from);
    let narrative = enhanced_or(
        enhancer.enhance(&Prompt::new(deterministic.as_str())),
        deterministic,
    );

    info!(
        files = summary.files_changed.len(),
        risk = %summary.risk,
        validated = validation.all_passed(),
        "migration complete"
    );

    Ok(MigrationOutcome {
        summary,
        changes: run.changes,
        validation,
        patch: run.patch,
        modules,
        resumed_from,
        notes: run.notes,
        narrative,
    })
}

/// Step 1: reduce the settings descriptor to name and include lines.
fn step_normalize_settings(run: &mut Run<'_>, settings_rel: &Utf8Path) -> anyhow::Result<()> {
    let old = run.repo.read_to_string(settings_rel)?;
    let new = gradcat_rewrite::normalize_settings(&old);
    if new != old {
        run.record_write(settings_rel, Some(&old), &new, RiskLevel::Low)?;
    }
    debug!("step 1 done");
    Ok(())
}

/// Step 2: copy the build-logic template tree into the project, file by
/// file, writing only files that are absent or differ.
fn step_materialize_build_logic(run: &mut Run<'_>) -> anyhow::Result<()> {
    let Some(template_root) = run.settings.build_logic_template.clone() else {
        run.note("no build-logic template configured, skipping step 2");
        return Ok(());
    };
    if !template_root.is_dir() {
        run.note(format!(
            "build-logic template missing: {template_root}, skipping step 2"
        ));
        return Ok(());
    }

    for entry in WalkDir::new(&template_root) {
        let entry = entry.with_context(|| format!("walk {}", template_root))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(abs) = Utf8Path::from_path(entry.path()) else {
            run.note(format!("non-UTF8 path under {template_root}, skipped"));
            continue;
        };
        let tail = abs
            .strip_prefix(&template_root)
            .context("template entry outside template root")?;
        let rel = Utf8PathBuf::from(BUILD_LOGIC_DIR).join(tail);
        let body = fs::read_to_string(abs).with_context(|| format!("read template {}", abs))?;

        if run.repo.exists(&rel) {
            let current = run.repo.read_to_string(&rel)?;
            if current == body {
                continue;
            }
            run.record_write(&rel, Some(&current), &body, RiskLevel::Low)?;
        } else {
            run.record_write(&rel, None, &body, RiskLevel::Low)?;
        }
    }
    debug!("step 2 done");
    Ok(())
}

/// Step 3: scan, extract, and synthesize the version catalog.
fn step_synthesize_catalog(
    run: &mut Run<'_>,
    modules: &mut Vec<ModuleReport>,
) -> anyhow::Result<()> {
    let files = build_files_for_extraction(run)?;
    let extracted = read_and_extract(run, &files)?;
    *modules = gradcat_extract::group_modules(&extracted);

    let extractions: Vec<_> = extracted.iter().map(|(_, e)| e.clone()).collect();
    let versions = gradcat_extract::merge_versions(&extractions);
    let dependencies = gradcat_extract::merge_dependencies(&extractions);

    let reference = load_reference_catalog(run)?;
    let catalog = gradcat_catalog::synthesize(
        &versions,
        &dependencies,
        reference.as_ref(),
        &run.settings.catalog,
    );
    let text = gradcat_catalog::emit(&catalog);

    let rel = Utf8Path::new(CATALOG_PATH);
    if run.repo.exists(rel) {
        let current = run.repo.read_to_string(rel)?;
        if current != text {
            run.record_write(rel, Some(&current), &text, RiskLevel::Medium)?;
        }
    } else {
        run.record_write(rel, None, &text, RiskLevel::Medium)?;
    }
    debug!(
        versions = catalog.versions.len(),
        libraries = catalog.libraries.len(),
        "step 3 done"
    );
    Ok(())
}

/// Step 4: overwrite the wrapper properties from the template.
fn step_replace_wrapper(run: &mut Run<'_>) -> anyhow::Result<()> {
    let Some(template) = run.settings.wrapper_template.clone() else {
        run.note("no wrapper template configured, skipping step 4");
        return Ok(());
    };
    let body = match fs::read_to_string(&template) {
        Ok(body) => body,
        Err(err) => {
            run.note(format!("wrapper template unreadable ({err}), skipping step 4"));
            return Ok(());
        }
    };

    let rel = Utf8Path::new(WRAPPER_PROPERTIES);
    if run.repo.exists(rel) {
        let current = run.repo.read_to_string(rel)?;
        if current != body {
            run.record_write(rel, Some(&current), &body, RiskLevel::Low)?;
        }
    } else {
        run.record_write(rel, None, &body, RiskLevel::Low)?;
    }
    debug!("step 4 done");
    Ok(())
}

const ROOT_BUILD_FILES: &[&str] = &["build.gradle", "build.gradle.kts", "dependencies.gradle"];

/// Step 5: delete the root build descriptors. Their declarations now live
/// in the catalog and the convention build logic.
fn step_delete_root_builds(run: &mut Run<'_>) -> anyhow::Result<()> {
    for name in ROOT_BUILD_FILES {
        let rel = Utf8Path::new(name);
        if !run.repo.exists(rel) {
            continue;
        }
        let old = run.repo.read_to_string(rel)?;
        run.record_delete(rel, &old, RiskLevel::Medium)?;
    }
    debug!("step 5 done");
    Ok(())
}

/// Step 6: per-module rewrite. Strip legacy constructs, then ensure the
/// convention plugin is declared. A legacy-flagged module whose files the
/// stripper left entirely untouched is tallied as high risk (once per
/// module) for manual review.
fn step_rewrite_modules(run: &mut Run<'_>) -> anyhow::Result<()> {
    // Module dir -> (legacy flag seen, strip removals), flag OR-combined
    // and removals summed across the module's files.
    let mut per_module: BTreeMap<Utf8PathBuf, (bool, usize)> = BTreeMap::new();

    for rel in module_build_files(run)? {
        let old = match run.repo.read_to_string(&rel) {
            Ok(old) => old,
            Err(err) => {
                run.note(format!("{rel}: unreadable, skipped ({err})"));
                continue;
            }
        };

        let file = BuildFile::new(rel.clone(), old.clone());
        let stripped = gradcat_rewrite::strip_legacy(&old);
        let (new, injected) = gradcat_rewrite::ensure_convention_plugin(
            &stripped.text,
            &run.settings.convention_plugin_id,
            file.dsl,
        );

        let entry = per_module.entry(module_dir(&rel)).or_insert((false, 0));
        entry.0 |= gradcat_extract::has_legacy_reference(&old);
        entry.1 += stripped.removed;

        if (stripped.removed > 0 || injected > 0) && new != old {
            run.record_write(&rel, Some(&old), &new, RiskLevel::Medium)?;
        }
    }

    for (dir, (has_legacy, removed)) in per_module {
        if has_legacy && removed == 0 {
            // Flagged but untouched: the legacy reference hides in a form
            // the stripper does not recognize.
            run.tally.bump(RiskLevel::High);
            run.note(format!("{dir}: legacy repository reference left in place"));
        }
    }
    debug!("step 6 done");
    Ok(())
}

/// Module directory of a build descriptor, `.` for root-level files. Matches
/// the grouping of the module reports.
fn module_dir(rel: &Utf8Path) -> Utf8PathBuf {
    rel.parent()
        .filter(|p| !p.as_str().is_empty())
        .map(Utf8Path::to_path_buf)
        .unwrap_or_else(|| Utf8PathBuf::from("."))
}

/// Step 8: delete per-environment descriptors, then drop in the auxiliary
/// template if one is configured.
fn step_auxiliary_cleanup(run: &mut Run<'_>) -> anyhow::Result<()> {
    let pattern = run
        .settings
        .project_root
        .join(&run.settings.legacy_env_glob);
    let paths = glob::glob(pattern.as_str()).context("bad legacy env glob")?;
    for path in paths {
        let path = path.context("glob entry")?;
        let Some(abs) = Utf8Path::from_path(&path) else {
            continue;
        };
        let rel = abs
            .strip_prefix(&run.settings.project_root)
            .unwrap_or(abs)
            .to_path_buf();
        if !run.repo.exists(&rel) {
            // Deleted earlier in this run (dry-run overlay).
            continue;
        }
        let old = run.repo.read_to_string(&rel)?;
        run.record_delete(&rel, &old, RiskLevel::Low)?;
    }

    if let Some(template) = run.settings.aux_template.clone() {
        match fs::read_to_string(&template) {
            Ok(body) => {
                let name = template.file_name().unwrap_or("aux.gradle").to_string();
                let rel = Utf8PathBuf::from(name);
                if run.repo.exists(&rel) {
                    let current = run.repo.read_to_string(&rel)?;
                    if current != body {
                        run.record_write(&rel, Some(&current), &body, RiskLevel::Low)?;
                    }
                } else {
                    run.record_write(&rel, None, &body, RiskLevel::Low)?;
                }
            }
            Err(err) => run.note(format!("aux template unreadable ({err}), skipped")),
        }
    }
    debug!("step 8 done");
    Ok(())
}

/// Build descriptors considered for extraction: every discovered module
/// file, including the root ones that step 5 later deletes.
fn build_files_for_extraction(run: &Run<'_>) -> anyhow::Result<Vec<Utf8PathBuf>> {
    let mut files = scan_build_files(&run.settings.project_root)
        .map_err(|e| anyhow::anyhow!("{e}"))?
        .into_iter()
        .filter(|rel| !rel.starts_with(BUILD_LOGIC_DIR))
        .collect::<Vec<_>>();
    files.sort();
    Ok(files)
}

/// Build descriptors rewritten in step 6: per-module files only, with the
/// (already deleted) root descriptors and per-environment files excluded.
fn module_build_files(run: &Run<'_>) -> anyhow::Result<Vec<Utf8PathBuf>> {
    let env_glob = glob::Pattern::new(&run.settings.legacy_env_glob).ok();
    // The auxiliary template lands at the root as a plain descriptor; it is
    // not a module and is never rewritten.
    let aux_name = run
        .settings
        .aux_template
        .as_deref()
        .and_then(|p| p.file_name())
        .map(str::to_owned);
    let files = build_files_for_extraction(run)?
        .into_iter()
        .filter(|rel| !ROOT_BUILD_FILES.contains(&rel.as_str()))
        .filter(|rel| aux_name.as_deref() != Some(rel.as_str()))
        .filter(|rel| {
            env_glob
                .as_ref()
                .map_or(true, |p| !p.matches(rel.as_str()))
        })
        .filter(|rel| run.repo.exists(rel))
        .collect();
    Ok(files)
}

fn read_and_extract(
    run: &mut Run<'_>,
    files: &[Utf8PathBuf],
) -> anyhow::Result<Vec<(BuildFile, gradcat_extract::Extraction)>> {
    let mut out = Vec::with_capacity(files.len());
    for rel in files {
        let contents = match run.repo.read_to_string(rel) {
            Ok(contents) => contents,
            Err(err) => {
                run.note(format!("{rel}: unreadable, excluded from extraction ({err})"));
                continue;
            }
        };
        let file = BuildFile::new(rel.clone(), contents);
        let extraction = gradcat_extract::extract(&file);
        out.push((file, extraction));
    }
    Ok(out)
}

/// Reference catalog: an explicit one wins; otherwise a catalog already
/// present in the project from a previous run.
fn load_reference_catalog(run: &mut Run<'_>) -> anyhow::Result<Option<gradcat_types::catalog::Catalog>> {
    if let Some(path) = &run.settings.reference_catalog {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read reference catalog {}", path))?;
        return Ok(Some(parse_catalog(&text)));
    }
    let rel = Utf8Path::new(CATALOG_PATH);
    if run.repo.exists(rel) {
        let text = run.repo.read_to_string(rel)?;
        return Ok(Some(parse_catalog(&text)));
    }
    Ok(None)
}
