//! Single-file writes and deletes at resolved paths.
//!
//! Nothing here touches the repository: a mutation followed by a failed
//! commit leaves an uncommitted working-tree change, which a reset undoes.

use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{Mutation, MutationRequest};

#[derive(Debug, Clone, Copy, Default)]
pub struct FileMutator;

impl FileMutator {
    /// Create or overwrite the file at `path`, creating parent directories.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if a directory or the file cannot be written.
    pub fn write(&self, path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        std::fs::write(path, content).map_err(|e| Error::io(path, e))?;
        log::debug!("wrote {} bytes to {}", content.len(), path.display());
        Ok(())
    }

    /// Remove the file at `path`.
    ///
    /// # Errors
    /// - [`Error::NotFound`] if nothing exists at `path`.
    /// - [`Error::Io`] for directories and any other failure.
    pub fn delete(&self, path: &Path) -> Result<()> {
        let meta = match std::fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::not_found(path.display().to_string()));
            }
            Err(e) => return Err(Error::io(path, e)),
        };
        if meta.is_dir() {
            return Err(Error::io(
                path,
                std::io::Error::new(ErrorKind::Other, "is a directory"),
            ));
        }
        std::fs::remove_file(path).map_err(|e| Error::io(path, e))?;
        log::debug!("deleted {}", path.display());
        Ok(())
    }

    /// Carry out `request`: [`write`](Self::write) or [`delete`](Self::delete).
    pub fn apply(&self, request: &MutationRequest) -> Result<()> {
        match &request.mutation {
            Mutation::Write(content) => self.write(&request.path, content),
            Mutation::Delete => self.delete(&request.path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_returns_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        FileMutator.write(&path, b"hello").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn write_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x/y/z.md");
        FileMutator.write(&path, b"deep").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"deep");
    }

    #[test]
    fn write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        FileMutator.write(&path, b"first version").unwrap();
        FileMutator.write(&path, b"v2").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"v2");
    }

    #[test]
    fn delete_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        std::fs::write(&path, b"x").unwrap();
        FileMutator.delete(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileMutator.delete(&dir.path().join("nope.md")).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn delete_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        assert!(matches!(FileMutator.delete(&sub), Err(Error::Io(_))));
        assert!(sub.exists());
    }

    #[test]
    fn apply_dispatches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        FileMutator.apply(&MutationRequest::write(&path, "abc")).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");
        FileMutator.apply(&MutationRequest::delete(&path)).unwrap();
        assert!(!path.exists());
    }
}
