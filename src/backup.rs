//! Local backup artifact handling for restores into development

use crate::config::RestoreSettings;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// TOC entries left out when materialized view data is skipped
const MATERIALIZED_VIEW_DATA: &str = "MATERIALIZED VIEW DATA";

/// The temp directory and the single backup artifact it holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupWorkspace {
    /// Directory where the artifact is stored
    pub temp_dir: PathBuf,
    /// Path of the downloaded artifact
    pub artifact: PathBuf,
}

impl BackupWorkspace {
    /// Create a workspace from restore settings
    #[must_use]
    pub fn from_settings(settings: &RestoreSettings) -> Self {
        Self {
            temp_dir: settings.temp_dir.clone(),
            artifact: settings.temp_dir.join(&settings.artifact_name),
        }
    }

    /// Path of the backup artifact
    #[must_use]
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Create the temp directory if it does not exist
    pub fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.temp_dir)
    }

    /// Delete the artifact. A missing artifact is not an error.
    pub fn remove_artifact(&self) -> io::Result<()> {
        match fs::remove_file(&self.artifact) {
            Ok(()) => {
                debug!("Removed {}", self.artifact.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Write a `pg_restore -L` list without materialized view data next to
    /// the artifact.
    ///
    /// The file is removed when the returned handle is dropped.
    pub fn write_restore_list(&self, toc: &str) -> io::Result<NamedTempFile> {
        let contents = filter_restore_list(toc);

        let mut file = tempfile::Builder::new()
            .prefix("ordered")
            .suffix(".lst")
            .tempfile_in(&self.temp_dir)?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;
        Ok(file)
    }
}

/// Drop materialized view data entries from a `pg_restore -l` listing
#[must_use]
pub fn filter_restore_list(toc: &str) -> String {
    toc.lines()
        .filter(|line| !line.contains(MATERIALIZED_VIEW_DATA))
        .map(|line| format!("{line}\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TOC: &str = "; Archive created at 2024-01-01\n\
        215; 1259 16386 TABLE public users postgres\n\
        3301; 0 16386 TABLE DATA public users postgres\n\
        3302; 0 16400 MATERIALIZED VIEW DATA public user_stats postgres\n";

    #[test]
    fn test_filter_restore_list() {
        let filtered = filter_restore_list(TOC);

        assert!(filtered.contains("TABLE DATA public users"));
        assert!(!filtered.contains("MATERIALIZED VIEW DATA"));
        assert_eq!(filtered.lines().count(), 3);
    }

    #[test]
    fn test_workspace_paths() {
        let workspace = BackupWorkspace::from_settings(&RestoreSettings::default());

        assert_eq!(workspace.temp_dir, PathBuf::from("tmp"));
        assert_eq!(workspace.artifact(), Path::new("tmp/quick_restore.backup"));
    }

    #[test]
    fn test_restore_list_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let workspace = BackupWorkspace {
            temp_dir: dir.path().to_path_buf(),
            artifact: dir.path().join("latest.backup"),
        };

        let list = workspace.write_restore_list(TOC).unwrap();
        let path = list.path().to_path_buf();
        assert!(!fs::read_to_string(&path).unwrap().contains(MATERIALIZED_VIEW_DATA));

        drop(list);
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_missing_artifact_is_ok() {
        let dir = TempDir::new().unwrap();
        let workspace = BackupWorkspace {
            temp_dir: dir.path().to_path_buf(),
            artifact: dir.path().join("latest.backup"),
        };

        assert!(workspace.remove_artifact().is_ok());
        fs::write(workspace.artifact(), b"PGDMP").unwrap();
        workspace.remove_artifact().unwrap();
        assert!(!workspace.artifact().exists());
    }
}
