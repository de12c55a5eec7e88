use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use fs_err as fs;
use gradcat_core::adapters::{DryRunFs, FsRepoView, FsWritePort, NoEnhancer, ShellScmPort};
use gradcat_core::ports::{ScmOutput, ScmPort};
use gradcat_core::render::render_summary_md;
use gradcat_core::{run_migration, MigrateSettings, MigrationOutcome};
use gradcat_types::module::BuildFile;
use gradcat_types::schema::GRADCAT_REPORT_V1;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "gradcat",
    version,
    about = "Migrates legacy Gradle builds to centralized version catalogs."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the full migration pipeline against a project.
    Migrate(MigrateArgs),
    /// Scan a project and report its modules without changing anything.
    Scan(ScanArgs),
}

#[derive(Debug, Parser)]
struct MigrateArgs {
    /// Project root (default: current directory).
    #[arg(long, default_value = ".")]
    project_root: Utf8PathBuf,

    /// Artifact directory (default: <project_root>/.gradcat).
    #[arg(long)]
    out_dir: Option<Utf8PathBuf>,

    /// Compute everything and write artifacts, but leave the project untouched.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Plugin id injected into every module descriptor.
    #[arg(long, default_value = "com.acme.conventions")]
    convention_plugin_id: String,

    /// Catalog whose entries take precedence over extracted ones.
    #[arg(long)]
    reference_catalog: Option<Utf8PathBuf>,

    /// Directory tree copied in as the convention build-logic subproject.
    #[arg(long, env = "GRADCAT_BUILD_LOGIC_TEMPLATE")]
    build_logic_template: Option<Utf8PathBuf>,

    /// Wrapper properties file copied over the project's copy.
    #[arg(long, env = "GRADCAT_WRAPPER_TEMPLATE")]
    wrapper_template: Option<Utf8PathBuf>,

    /// Auxiliary descriptor copied to the project root after cleanup.
    #[arg(long, env = "GRADCAT_AUX_TEMPLATE")]
    aux_template: Option<Utf8PathBuf>,

    /// Glob (relative to the project root) for legacy per-environment files.
    #[arg(long, default_value = "env-*.gradle")]
    legacy_env_glob: String,

    /// Create this git branch before migrating.
    #[arg(long)]
    branch: Option<String>,

    /// Commit all changes with this message after a successful run.
    #[arg(long)]
    commit: Option<String>,

    /// Push the created branch after committing (requires --branch).
    #[arg(long, default_value_t = false, requires = "branch")]
    push: bool,
}

#[derive(Debug, Parser)]
struct ScanArgs {
    /// Project root (default: current directory).
    #[arg(long, default_value = ".")]
    project_root: Utf8PathBuf,

    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{:?}", e);
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Migrate(args) => cmd_migrate(args),
        Command::Scan(args) => cmd_scan(args),
    }
}

fn cmd_migrate(args: MigrateArgs) -> anyhow::Result<()> {
    let project_root = canonicalize(&args.project_root)?;

    let mut settings = MigrateSettings::new(project_root.clone());
    if let Some(out_dir) = args.out_dir {
        settings.out_dir = out_dir;
    }
    settings.dry_run = args.dry_run;
    settings.convention_plugin_id = args.convention_plugin_id;
    settings.reference_catalog = args.reference_catalog;
    settings.build_logic_template = args.build_logic_template;
    settings.wrapper_template = args.wrapper_template;
    settings.aux_template = args.aux_template;
    settings.legacy_env_glob = args.legacy_env_glob;

    let scm = ShellScmPort;
    if let Some(branch) = &args.branch {
        if args.dry_run {
            anyhow::bail!("--branch cannot be combined with --dry-run");
        }
        let out = scm.create_branch(&project_root, branch)?;
        require_scm_success("create branch", &out)?;
        info!(branch = %branch, "created branch");
    }

    let outcome = if settings.dry_run {
        let overlay = DryRunFs::new(project_root.clone());
        run_migration(&settings, &overlay, &overlay, &NoEnhancer)?
    } else {
        let repo = FsRepoView::new(project_root.clone());
        run_migration(&settings, &repo, &FsWritePort, &NoEnhancer)?
    };

    write_artifacts(&settings.out_dir, &outcome)?;

    if !outcome.validation.all_passed() {
        for check in outcome.validation.failed() {
            warn!(
                check = %check.id,
                detail = check.detail.as_deref().unwrap_or(""),
                "compliance check failed"
            );
        }
    }
    println!("{}", outcome.narrative);

    if let Some(message) = &args.commit {
        if settings.dry_run {
            warn!("--commit ignored in dry-run mode");
        } else {
            let out = scm.commit_all(&project_root, message)?;
            require_scm_success("commit", &out)?;
            if args.push {
                let branch = args.branch.as_deref().unwrap_or_default();
                let out = scm.push(&project_root, branch)?;
                require_scm_success("push", &out)?;
            }
        }
    }

    info!("wrote artifacts to {}", settings.out_dir);
    Ok(())
}

fn cmd_scan(args: ScanArgs) -> anyhow::Result<()> {
    let project_root = canonicalize(&args.project_root)?;
    let files = gradcat_scan::scan_build_files(&project_root)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let mut extracted = Vec::with_capacity(files.len());
    for rel in files {
        let abs = project_root.join(&rel);
        let contents = fs::read_to_string(&abs).with_context(|| format!("read {}", abs))?;
        let file = BuildFile::new(rel, contents);
        let extraction = gradcat_extract::extract(&file);
        extracted.push((file, extraction));
    }
    let modules = gradcat_extract::group_modules(&extracted);

    match args.format {
        OutputFormat::Text => {
            println!("{:<32} {:<8} {:>8} {:>8} LEGACY", "MODULE", "DSL", "PLUGINS", "FILES");
            for module in &modules {
                println!(
                    "{:<32} {:<8} {:>8} {:>8} {}",
                    module.path,
                    format!("{:?}", module.dsl).to_lowercase(),
                    module.plugins.len(),
                    module.files.len(),
                    if module.nexus_references { "yes" } else { "no" }
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&modules)?);
        }
    }
    Ok(())
}

fn write_artifacts(out_dir: &Utf8Path, outcome: &MigrationOutcome) -> anyhow::Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("create {}", out_dir))?;

    write_json(&out_dir.join("summary.json"), &outcome.summary)?;
    write_json(&out_dir.join("modules.json"), &outcome.modules)?;
    let report = serde_json::json!({
        "schema": GRADCAT_REPORT_V1,
        "changes": outcome.changes,
        "validation": outcome.validation,
        "notes": outcome.notes,
        "resumed_from": outcome.resumed_from,
    });
    write_json(&out_dir.join("report.json"), &report)?;
    fs::write(out_dir.join("patch.diff"), &outcome.patch)?;
    fs::write(out_dir.join("summary.md"), render_summary_md(outcome))?;
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Utf8Path, v: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(v).context("serialize json")?;
    fs::write(path, s).with_context(|| format!("write {}", path))?;
    Ok(())
}

fn require_scm_success(what: &str, out: &ScmOutput) -> anyhow::Result<()> {
    if out.success {
        Ok(())
    } else {
        anyhow::bail!("git {what} failed:\n{}", out.stderr)
    }
}

fn canonicalize(path: &Utf8Path) -> anyhow::Result<Utf8PathBuf> {
    let canon = fs::canonicalize(path).with_context(|| format!("resolve {}", path))?;
    Utf8PathBuf::from_path_buf(canon).map_err(|p| anyhow::anyhow!("non-UTF8 path: {}", p.display()))
}
