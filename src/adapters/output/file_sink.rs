use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::core::errors::{KonfigError, Result};
use crate::core::traits::bundle_sink::BundleSink;

/// Writes the bundle to a file, replacing it atomically.
///
/// The content is staged in a temporary file next to the target and renamed
/// over it, so a reader never sees a half-written kubeconfig. On Unix the
/// file is readable by its owner only, since it holds a private key.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn failed(&self, reason: impl ToString) -> KonfigError {
        KonfigError::OutputFailed {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}

impl BundleSink for FileSink {
    fn deliver(&self, content: &str) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut staged = NamedTempFile::new_in(dir).map_err(|e| self.failed(e))?;
        staged
            .write_all(content.as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|e| self.failed(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(staged.path(), std::fs::Permissions::from_mode(0o600))
                .map_err(|e| self.failed(e))?;
        }

        staged.persist(&self.path).map_err(|e| self.failed(e.error))?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alice.kubeconfig");

        FileSink::new(path.clone()).deliver("apiVersion: v1\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "apiVersion: v1\n");
    }

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        std::fs::write(&path, "old").unwrap();

        FileSink::new(path.clone()).deliver("new").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        FileSink::new(path.clone()).deliver("key").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn missing_directory_is_an_output_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent").join("config");

        let err = FileSink::new(path).deliver("x").unwrap_err();
        assert!(matches!(err, KonfigError::OutputFailed { .. }));
    }
}
