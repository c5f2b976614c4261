use crate::error::{BatchError, BatchResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Per-run scratch directory, removed when dropped.
///
/// Removal is best-effort and tolerates the directory having been deleted already.
#[derive(Debug)]
pub struct WorkingDirectory {
    path: PathBuf,
}

impl WorkingDirectory {
    /// Create a uniquely named directory `<root>/<prefix><uuid>`
    pub fn create(root: &Path, prefix: &str) -> BatchResult<Self> {
        let path = root.join(format!("{prefix}{}", Uuid::new_v4().simple()));

        fs::create_dir_all(&path).map_err(|err| {
            BatchError::runtime_caused_by(
                format!("Unable to create the working directory \"{}\".", path.display()),
                err.raw_os_error().unwrap_or(0),
                BatchError::Io(err),
            )
        })?;

        debug!(path = %path.display(), "Created working directory");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the directory and its content; a missing directory is not an error
    pub fn remove(&self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed working directory"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(
                path = %self.path.display(),
                error = %err,
                "Failed to remove working directory"
            ),
        }
    }
}

impl Drop for WorkingDirectory {
    fn drop(&mut self) {
        self.remove();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_lifecycle() {
        let root = TempDir::new().unwrap();

        let working_directory = WorkingDirectory::create(root.path(), "batch_").unwrap();
        let path = working_directory.path().to_path_buf();
        assert!(path.is_dir());
        assert!(path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("batch_")));

        fs::write(path.join("export.csv"), "sku;name\n").unwrap();
        drop(working_directory);
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let root = TempDir::new().unwrap();
        let working_directory = WorkingDirectory::create(root.path(), "batch_").unwrap();

        working_directory.remove();
        working_directory.remove();
        assert!(!working_directory.path().exists());
    }

    #[test]
    fn test_creation_failure_is_runtime_error() {
        let root = TempDir::new().unwrap();
        let blocker = root.path().join("not_a_directory");
        fs::write(&blocker, "").unwrap();

        let err = WorkingDirectory::create(&blocker, "batch_").unwrap_err();
        assert!(matches!(err, BatchError::Runtime { .. }));
        assert!(err
            .to_string()
            .starts_with("Unable to create the working directory"));
    }
}
