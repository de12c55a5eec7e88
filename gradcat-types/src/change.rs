use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to a file during migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

/// Coarse classification of how likely a change is to need manual review.
///
/// In gradcat terms:
/// - low: structural/cosmetic (settings normalization, template copies)
/// - medium: content rewrites (catalog generation, stripping, injection)
/// - high: a legacy-flagged module that the stripper did not touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// One file-level change produced during a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub path: String,
    pub kind: ChangeKind,
    pub risk: RiskLevel,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_sha256: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_sha256: Option<String>,
}

/// Running low/medium/high tally for a migration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskTally {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

impl RiskTally {
    pub fn bump(&mut self, risk: RiskLevel) {
        match risk {
            RiskLevel::Low => self.low += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::High => self.high += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.low + self.medium + self.high
    }
}

impl fmt::Display for RiskTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "low={}, medium={}, high={}",
            self.low, self.medium, self.high
        )
    }
}

/// End-of-run migration summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationSummary {
    pub schema: String,

    #[serde(default)]
    pub files_changed: Vec<String>,

    pub risk: RiskTally,

    /// Rendered `low=N, medium=N, high=N` form for hosts that only
    /// display text.
    pub risk_summary: String,
}

impl MigrationSummary {
    pub fn new(files_changed: Vec<String>, risk: RiskTally) -> Self {
        Self {
            schema: crate::schema::GRADCAT_SUMMARY_V1.to_string(),
            files_changed,
            risk_summary: risk.to_string(),
            risk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_tally_renders_fixed_form() {
        let mut tally = RiskTally::default();
        tally.bump(RiskLevel::Low);
        tally.bump(RiskLevel::Medium);
        tally.bump(RiskLevel::Medium);
        tally.bump(RiskLevel::High);
        assert_eq!(tally.to_string(), "low=1, medium=2, high=1");
    }

    #[test]
    fn empty_tally_renders_zeroes() {
        assert_eq!(RiskTally::default().to_string(), "low=0, medium=0, high=0");
    }
}
