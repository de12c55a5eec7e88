//! Human-readable rendering of a migration run.

use crate::pipeline::MigrationOutcome;
use gradcat_types::change::MigrationSummary;
use gradcat_types::validation::ValidationReport;
use std::fmt::Write;

/// The always-available narrative. An enhancement collaborator may replace
/// this text, never the structured summary it is derived from.
pub fn deterministic_narrative(
    summary: &MigrationSummary,
    validation: &ValidationReport,
    resumed_from: Option<u32>,
) -> String {
    let mut out = String::new();
    match resumed_from {
        Some(step) => {
            let _ = write!(out, "Migration resumed from step {step} and completed. ");
        }
        None => out.push_str("Migration completed. "),
    }
    let _ = write!(
        out,
        "{} file(s) changed ({}).",
        summary.files_changed.len(),
        summary.risk_summary
    );
    if validation.all_passed() {
        out.push_str(" All compliance checks passed.");
    } else {
        let failed: Vec<&str> = validation.failed().map(|c| c.id.as_str()).collect();
        let _ = write!(out, " Compliance checks failed: {}.", failed.join(", "));
    }
    if summary.risk.high > 0 {
        let _ = write!(
            out,
            " {} module(s) need manual review for legacy repository references.",
            summary.risk.high
        );
    }
    out
}

/// Render the run as a Markdown report for the artifact directory.
pub fn render_summary_md(outcome: &MigrationOutcome) -> String {
    let mut out = String::new();
    out.push_str("# Migration summary\n\n");
    out.push_str(&outcome.narrative);
    out.push_str("\n\n## Changes\n\n");

    if outcome.changes.is_empty() {
        out.push_str("No files changed.\n");
    } else {
        out.push_str("| File | Kind | Risk |\n|---|---|---|\n");
        for change in &outcome.changes {
            let _ = writeln!(
                out,
                "| `{}` | {:?} | {:?} |",
                change.path, change.kind, change.risk
            );
        }
    }

    out.push_str("\n## Compliance\n\n");
    for check in &outcome.validation.checks {
        let mark = if check.passed { "x" } else { " " };
        match &check.detail {
            Some(detail) => {
                let _ = writeln!(out, "- [{mark}] {} — {detail}", check.id);
            }
            None => {
                let _ = writeln!(out, "- [{mark}] {}", check.id);
            }
        }
    }

    if !outcome.notes.is_empty() {
        out.push_str("\n## Notes\n\n");
        for note in &outcome.notes {
            let _ = writeln!(out, "- {note}");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradcat_types::change::{RiskLevel, RiskTally};
    use gradcat_types::validation::ValidationCheck;
    use pretty_assertions::assert_eq;

    fn summary(high: u64) -> MigrationSummary {
        let mut tally = RiskTally::default();
        tally.bump(RiskLevel::Low);
        for _ in 0..high {
            tally.bump(RiskLevel::High);
        }
        MigrationSummary::new(vec!["settings.gradle".to_string()], tally)
    }

    #[test]
    fn narrative_reports_counts_and_checks() {
        let validation = ValidationReport {
            checks: vec![ValidationCheck::pass("catalog_present")],
        };
        let text = deterministic_narrative(&summary(0), &validation, None);
        assert_eq!(
            text,
            "Migration completed. 1 file(s) changed (low=1, medium=0, high=0). \
             All compliance checks passed."
        );
    }

    #[test]
    fn narrative_calls_out_resume_and_manual_review() {
        let validation = ValidationReport {
            checks: vec![ValidationCheck::fail("catalog_valid", "duplicate alias")],
        };
        let text = deterministic_narrative(&summary(2), &validation, Some(4));
        assert!(text.starts_with("Migration resumed from step 4"));
        assert!(text.contains("Compliance checks failed: catalog_valid."));
        assert!(text.contains("2 module(s) need manual review"));
    }
}
