//! Default port implementations.

use crate::ports::{Enhancement, Enhancer, Prompt, RepoView, ScmOutput, ScmPort, WritePort};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::collections::BTreeMap;
use std::process::Command;
use std::sync::Mutex;
use tracing::debug;

/// File-system backed `RepoView`.
#[derive(Debug, Clone)]
pub struct FsRepoView {
    root: Utf8PathBuf,
}

impl FsRepoView {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    fn abs(&self, rel: &Utf8Path) -> Utf8PathBuf {
        if rel.is_absolute() {
            rel.to_path_buf()
        } else {
            self.root.join(rel)
        }
    }
}

impl RepoView for FsRepoView {
    fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn read_to_string(&self, rel: &Utf8Path) -> anyhow::Result<String> {
        let abs = self.abs(rel);
        fs::read_to_string(&abs).with_context(|| format!("read {}", abs))
    }

    fn exists(&self, rel: &Utf8Path) -> bool {
        self.abs(rel).exists()
    }
}

/// Filesystem write operations. Writes are all-or-nothing: content goes to
/// a temp sibling first and is renamed into place.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        let tmp = Utf8PathBuf::from(format!("{path}.gradcat.tmp"));
        fs::write(&tmp, contents).with_context(|| format!("write {}", tmp))?;
        fs::rename(&tmp, path).with_context(|| format!("rename {} into place", tmp))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::create_dir_all(path).with_context(|| format!("create_dir_all {}", path))
    }

    fn remove_file(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::remove_file(path).with_context(|| format!("remove {}", path))
    }
}

/// In-memory overlay over the filesystem, used for dry runs and tests.
///
/// Writes and deletes land in the overlay; reads check the overlay first and
/// fall back to disk, so later steps observe earlier steps' edits without
/// the project being touched.
#[derive(Debug, Default)]
pub struct DryRunFs {
    root: Utf8PathBuf,
    /// Absolute path -> Some(content) for writes, None for deletes.
    entries: Mutex<BTreeMap<Utf8PathBuf, Option<Vec<u8>>>>,
}

impl DryRunFs {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self {
            root,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    fn abs(&self, rel: &Utf8Path) -> Utf8PathBuf {
        if rel.is_absolute() {
            rel.to_path_buf()
        } else {
            self.root.join(rel)
        }
    }

    /// Paths written during the dry run, in sorted order.
    pub fn written(&self) -> Vec<Utf8PathBuf> {
        self.entries
            .lock()
            .expect("lock dry-run entries")
            .iter()
            .filter(|(_, v)| v.is_some())
            .map(|(k, _)| k.clone())
            .collect()
    }
}

impl RepoView for DryRunFs {
    fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn read_to_string(&self, rel: &Utf8Path) -> anyhow::Result<String> {
        let abs = self.abs(rel);
        let entries = self.entries.lock().expect("lock dry-run entries");
        match entries.get(&abs) {
            Some(Some(bytes)) => {
                String::from_utf8(bytes.clone()).context("dry-run overlay content is not UTF-8")
            }
            Some(None) => anyhow::bail!("deleted in dry run: {}", abs),
            None => fs::read_to_string(&abs).with_context(|| format!("read {}", abs)),
        }
    }

    fn exists(&self, rel: &Utf8Path) -> bool {
        let abs = self.abs(rel);
        let entries = self.entries.lock().expect("lock dry-run entries");
        match entries.get(&abs) {
            Some(Some(_)) => true,
            Some(None) => false,
            None => abs.exists(),
        }
    }
}

impl WritePort for DryRunFs {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        self.entries
            .lock()
            .expect("lock dry-run entries")
            .insert(path.to_path_buf(), Some(contents.to_vec()));
        Ok(())
    }

    fn create_dir_all(&self, _path: &Utf8Path) -> anyhow::Result<()> {
        Ok(())
    }

    fn remove_file(&self, path: &Utf8Path) -> anyhow::Result<()> {
        self.entries
            .lock()
            .expect("lock dry-run entries")
            .insert(path.to_path_buf(), None);
        Ok(())
    }
}

/// Git operations via the `git` binary. Every call captures stdout/stderr;
/// a nonzero exit is reported through `ScmOutput::success`, not as an error.
#[derive(Debug, Clone, Default)]
pub struct ShellScmPort;

impl ShellScmPort {
    fn run(args: &[&str], cwd: Option<&Utf8Path>) -> anyhow::Result<ScmOutput> {
        let mut cmd = Command::new("git");
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }
        cmd.args(args);
        debug!(?args, "running git");
        let output = cmd
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        Ok(ScmOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn run_with_stdin(
        args: &[&str],
        cwd: &Utf8Path,
        stdin: &str,
    ) -> anyhow::Result<ScmOutput> {
        use std::io::Write;
        use std::process::Stdio;

        let mut child = Command::new("git")
            .current_dir(cwd)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        if let Some(mut pipe) = child.stdin.take() {
            pipe.write_all(stdin.as_bytes()).context("write git stdin")?;
        }
        let output = child.wait_with_output().context("wait for git")?;
        Ok(ScmOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl ScmPort for ShellScmPort {
    fn clone_repo(&self, url: &str, dest: &Utf8Path) -> anyhow::Result<ScmOutput> {
        Self::run(&["clone", url, dest.as_str()], None)
    }

    fn checkout(&self, repo_root: &Utf8Path, rev: &str) -> anyhow::Result<ScmOutput> {
        Self::run(&["checkout", rev], Some(repo_root))
    }

    fn create_branch(&self, repo_root: &Utf8Path, name: &str) -> anyhow::Result<ScmOutput> {
        Self::run(&["checkout", "-b", name], Some(repo_root))
    }

    fn apply_patch(&self, repo_root: &Utf8Path, patch: &str) -> anyhow::Result<ScmOutput> {
        Self::run_with_stdin(&["apply", "--whitespace=nowarn", "-"], repo_root, patch)
    }

    fn commit_all(&self, repo_root: &Utf8Path, message: &str) -> anyhow::Result<ScmOutput> {
        let add = Self::run(&["add", "-A"], Some(repo_root))?;
        if !add.success {
            return Ok(add);
        }
        Self::run(&["commit", "-m", message], Some(repo_root))
    }

    fn push(&self, repo_root: &Utf8Path, branch: &str) -> anyhow::Result<ScmOutput> {
        Self::run(&["push", "-u", "origin", branch], Some(repo_root))
    }
}

/// The absent enhancement collaborator: always falls back.
#[derive(Debug, Clone, Default)]
pub struct NoEnhancer;

impl Enhancer for NoEnhancer {
    fn enhance(&self, _prompt: &Prompt) -> Enhancement {
        Enhancement::Fallback
    }
}
