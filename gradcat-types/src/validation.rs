use serde::{Deserialize, Serialize};

/// One pass/fail check from the compliance validation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationCheck {
    /// Stable check identifier, e.g. `settings_normalized`.
    pub id: String,
    pub passed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ValidationCheck {
    pub fn pass(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            passed: true,
            detail: None,
        }
    }

    pub fn fail(id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            passed: false,
            detail: Some(detail.into()),
        }
    }
}

/// Compliance validation report. Failures are reported, never thrown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(default)]
    pub checks: Vec<ValidationCheck>,
}

impl ValidationReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &ValidationCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }
}
