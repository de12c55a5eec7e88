use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable checkpoint written before an operation that may externally
/// interrupt the running process, so a later invocation can resume from
/// the recorded step instead of step 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationState {
    pub schema: String,

    /// 1-based step number to resume from.
    pub step: u32,

    /// Workspace the state belongs to; a state file found under a
    /// different workspace is ignored.
    pub workspace: String,

    pub timestamp: DateTime<Utc>,

    /// Step-specific payload; opaque to everything but the owning step.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

impl MigrationState {
    pub fn new(step: u32, workspace: impl Into<String>) -> Self {
        Self {
            schema: crate::schema::GRADCAT_STATE_V1.to_string(),
            step,
            workspace: workspace.into(),
            timestamp: Utc::now(),
            payload: serde_json::Value::Null,
        }
    }

    /// True when the checkpoint is older than the freshness window and
    /// should be discarded rather than resumed.
    pub fn is_stale(&self, now: DateTime<Utc>, freshness: chrono::Duration) -> bool {
        now.signed_duration_since(self.timestamp) > freshness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staleness_uses_freshness_window() {
        let state = MigrationState::new(4, "/tmp/ws");
        let now = state.timestamp + chrono::Duration::minutes(10);
        assert!(!state.is_stale(now, chrono::Duration::minutes(15)));
        let later = state.timestamp + chrono::Duration::minutes(20);
        assert!(state.is_stale(later, chrono::Duration::minutes(15)));
    }
}
