//! Persistence of the resumable migration checkpoint.

use crate::ports::WritePort;
use crate::settings::{MigrateSettings, STATE_FRESHNESS_MINUTES};
use anyhow::Context;
use chrono::Utc;
use fs_err as fs;
use gradcat_types::state::MigrationState;
use gradcat_types::schema::GRADCAT_STATE_V1;
use tracing::{debug, warn};

/// Load a resumable checkpoint, if one exists and still applies.
///
/// A checkpoint is discarded (returned as `None`) when it is unreadable,
/// carries an unknown schema, belongs to a different workspace, or is older
/// than the freshness window. Discarding is silent apart from a log line;
/// a bad state file must never block a fresh run.
pub fn load_resumable(settings: &MigrateSettings) -> Option<MigrationState> {
    let path = settings.state_path();
    if !path.exists() {
        return None;
    }
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(%path, %err, "state file unreadable, starting fresh");
            return None;
        }
    };
    let state: MigrationState = match serde_json::from_str(&raw) {
        Ok(state) => state,
        Err(err) => {
            warn!(%path, %err, "state file unparsable, starting fresh");
            return None;
        }
    };
    if state.schema != GRADCAT_STATE_V1 {
        warn!(%path, schema = %state.schema, "unknown state schema, starting fresh");
        return None;
    }
    if state.workspace != settings.project_root.as_str() {
        warn!(
            %path,
            workspace = %state.workspace,
            "state belongs to a different workspace, starting fresh"
        );
        return None;
    }
    if state.is_stale(Utc::now(), chrono::Duration::minutes(STATE_FRESHNESS_MINUTES)) {
        debug!(%path, "state is stale, starting fresh");
        return None;
    }
    Some(state)
}

/// Persist a checkpoint before an externally-interrupting operation.
pub fn save(settings: &MigrateSettings, writer: &dyn WritePort, state: &MigrationState) -> anyhow::Result<()> {
    let body = serde_json::to_vec_pretty(state).context("serialize migration state")?;
    writer.create_dir_all(&settings.out_dir)?;
    writer.write_file(&settings.state_path(), &body)
}

/// Remove the checkpoint after a successful run. A missing file is fine.
pub fn clear(settings: &MigrateSettings) -> anyhow::Result<()> {
    let path = settings.state_path();
    if path.exists() {
        fs::remove_file(&path).with_context(|| format!("remove {}", path))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FsWritePort;
    use camino::Utf8PathBuf;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn settings_in(temp: &TempDir) -> MigrateSettings {
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 temp dir");
        MigrateSettings::new(root)
    }

    #[test]
    fn save_load_clear_round_trip() {
        let temp = TempDir::new().expect("temp");
        let settings = settings_in(&temp);

        let state = MigrationState::new(4, settings.project_root.as_str());
        save(&settings, &FsWritePort, &state).expect("save");

        let loaded = load_resumable(&settings).expect("resumable");
        assert_eq!(loaded.step, 4);
        assert_eq!(loaded.workspace, settings.project_root.as_str());

        clear(&settings).expect("clear");
        assert!(load_resumable(&settings).is_none());
        // Clearing twice is fine.
        clear(&settings).expect("clear again");
    }

    #[test]
    fn state_for_another_workspace_is_ignored() {
        let temp = TempDir::new().expect("temp");
        let settings = settings_in(&temp);

        let state = MigrationState::new(4, "/somewhere/else");
        save(&settings, &FsWritePort, &state).expect("save");
        assert!(load_resumable(&settings).is_none());
    }

    #[test]
    fn stale_state_is_ignored() {
        let temp = TempDir::new().expect("temp");
        let settings = settings_in(&temp);

        let mut state = MigrationState::new(4, settings.project_root.as_str());
        state.timestamp = Utc::now() - chrono::Duration::minutes(STATE_FRESHNESS_MINUTES + 1);
        save(&settings, &FsWritePort, &state).expect("save");
        assert!(load_resumable(&settings).is_none());
    }

    #[test]
    fn garbage_state_file_is_ignored() {
        let temp = TempDir::new().expect("temp");
        let settings = settings_in(&temp);

        FsWritePort
            .write_file(&settings.state_path(), b"{not json")
            .expect("write");
        assert!(load_resumable(&settings).is_none());
    }
}
