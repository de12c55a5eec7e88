//! Port traits abstracting all I/O and external collaborators away from
//! the pipeline.

use camino::Utf8Path;

/// Read-only project access.
///
/// The pipeline uses this so it can be tested against (and dry-run through)
/// an in-memory implementation.
pub trait RepoView {
    fn root(&self) -> &Utf8Path;

    fn read_to_string(&self, rel: &Utf8Path) -> anyhow::Result<String>;

    fn exists(&self, rel: &Utf8Path) -> bool;
}

/// File-system write operations. Paths are absolute; writes must be
/// all-or-nothing (no half-old/half-new file may ever be observable).
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
    fn remove_file(&self, path: &Utf8Path) -> anyhow::Result<()>;
}

/// Captured output of one source-control command.
#[derive(Debug, Clone)]
pub struct ScmOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Source-control operations, invoked as opaque commands.
///
/// Results are success/failure with captured output; apply/commit/push
/// failures are fatal for that operation and surfaced with the tool's raw
/// error text, with no automatic retry.
pub trait ScmPort {
    fn clone_repo(&self, url: &str, dest: &Utf8Path) -> anyhow::Result<ScmOutput>;
    fn checkout(&self, repo_root: &Utf8Path, rev: &str) -> anyhow::Result<ScmOutput>;
    fn create_branch(&self, repo_root: &Utf8Path, name: &str) -> anyhow::Result<ScmOutput>;
    fn apply_patch(&self, repo_root: &Utf8Path, patch: &str) -> anyhow::Result<ScmOutput>;
    fn commit_all(&self, repo_root: &Utf8Path, message: &str) -> anyhow::Result<ScmOutput>;
    fn push(&self, repo_root: &Utf8Path, branch: &str) -> anyhow::Result<ScmOutput>;
}

/// Upper bound on prompt size sent to an enhancement collaborator.
pub const MAX_PROMPT_BYTES: usize = 4096;

/// Upper bound on enhanced content accepted back.
pub const MAX_ENHANCED_BYTES: usize = 16 * 1024;

/// Confidence below this is treated identically to "not available".
pub const MIN_CONFIDENCE: f32 = 0.5;

/// A bounded prompt for the enhancement collaborator.
#[derive(Debug, Clone)]
pub struct Prompt {
    text: String,
}

impl Prompt {
    /// Truncates to [`MAX_PROMPT_BYTES`] on a char boundary.
    pub fn new(text: impl Into<String>) -> Self {
        let mut text = text.into();
        if text.len() > MAX_PROMPT_BYTES {
            let mut cut = MAX_PROMPT_BYTES;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
        }
        Self { text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Tagged result of an enhancement call. Absence, error, timeout, and low
/// confidence all collapse to `Fallback`; the deterministic path is always
/// available.
#[derive(Debug, Clone)]
pub enum Enhancement {
    Fallback,
    Enhanced { content: String, confidence: f32 },
}

/// Optional, capability-typed enhancement collaborator. Never a required
/// dependency: the pipeline must produce identical structure without it.
pub trait Enhancer {
    fn enhance(&self, prompt: &Prompt) -> Enhancement;
}

/// Accept the enhanced content only when it clears the confidence and size
/// gates; otherwise use the deterministic text.
pub fn enhanced_or(enhancement: Enhancement, deterministic: String) -> String {
    match enhancement {
        Enhancement::Enhanced {
            content,
            confidence,
        } if confidence >= MIN_CONFIDENCE && content.len() <= MAX_ENHANCED_BYTES => content,
        _ => deterministic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_is_truncated_to_bound() {
        let prompt = Prompt::new("x".repeat(MAX_PROMPT_BYTES * 2));
        assert_eq!(prompt.text().len(), MAX_PROMPT_BYTES);
    }

    #[test]
    fn prompt_truncation_respects_char_boundaries() {
        let text = "é".repeat(MAX_PROMPT_BYTES);
        let prompt = Prompt::new(text);
        assert!(prompt.text().len() <= MAX_PROMPT_BYTES);
        assert!(prompt.text().chars().all(|c| c == 'é'));
    }

    #[test]
    fn low_confidence_enhancement_falls_back() {
        let got = enhanced_or(
            Enhancement::Enhanced {
                content: "fancy".into(),
                confidence: 0.2,
            },
            "plain".into(),
        );
        assert_eq!(got, "plain");
    }

    #[test]
    fn confident_enhancement_is_used() {
        let got = enhanced_or(
            Enhancement::Enhanced {
                content: "fancy".into(),
                confidence: 0.9,
            },
            "plain".into(),
        );
        assert_eq!(got, "fancy");
    }

    #[test]
    fn oversized_enhancement_falls_back() {
        let got = enhanced_or(
            Enhancement::Enhanced {
                content: "y".repeat(MAX_ENHANCED_BYTES + 1),
                confidence: 1.0,
            },
            "plain".into(),
        );
        assert_eq!(got, "plain");
    }
}
