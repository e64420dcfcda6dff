//! Home-based storage paths for migrator persistence.
//!
//! Everything lives under `~/.privacy-migration/`:
//! - `migration.yaml` - optional user configuration
//! - `logs/<session-id>/events.jsonl` - structured log of one run

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const MIGRATION_HOME_DIR: &str = ".privacy-migration";

/// Returns `~/.privacy-migration/`, creating it if needed.
pub fn migration_home_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory for migration logs")?;
    let dir = home.join(MIGRATION_HOME_DIR);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create migration directory: {}", dir.display()))?;
    Ok(dir)
}

/// Returns the user configuration path. The file may not exist.
pub fn user_config_path() -> Result<PathBuf> {
    Ok(migration_home_dir()?.join("migration.yaml"))
}

/// Returns `~/.privacy-migration/logs/<session-id>/`, creating it if needed.
pub fn session_logs_dir(session_id: &str) -> Result<PathBuf> {
    session_logs_dir_in(&migration_home_dir()?.join("logs"), session_id)
}

/// Returns `<root>/<session-id>/`, creating it if needed.
pub fn session_logs_dir_in(root: &Path, session_id: &str) -> Result<PathBuf> {
    let dir = root.join(session_id);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create session log directory: {}", dir.display()))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_session_logs_dir_is_created_under_root() {
        let root = tempdir().unwrap();

        let dir = session_logs_dir_in(root.path(), "abc-123").unwrap();

        assert_eq!(dir, root.path().join("abc-123"));
        assert!(dir.is_dir());
    }

    #[test]
    fn test_session_logs_dir_is_idempotent() {
        let root = tempdir().unwrap();

        let first = session_logs_dir_in(root.path(), "abc-123").unwrap();
        let second = session_logs_dir_in(root.path(), "abc-123").unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_session_logs_dir_fails_when_root_is_a_file() {
        let root = tempdir().unwrap();
        let file = root.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();

        let err = session_logs_dir_in(&file, "abc-123").unwrap_err();
        assert!(err.to_string().contains("Failed to create session log directory"));
    }
}
