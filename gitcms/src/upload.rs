use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use crate::error::{Error, Result};
use crate::paths::validate_file_name;

/// Moves finished uploads out of the staging area into the content tree.
///
/// The staging area is shared by every upload. Relocations that target the
/// same destination path are serialized; different destinations proceed in
/// parallel.
#[derive(Debug)]
pub struct UploadStager {
    staging_dir: PathBuf,
    in_flight: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl UploadStager {
    /// # Arguments
    /// * `staging_dir` - Directory the transport writes incoming files into.
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            in_flight: DashMap::new(),
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Create the staging directory if it does not exist yet.
    pub fn ensure_staging_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.staging_dir).map_err(|e| Error::io(&self.staging_dir, e))
    }

    /// Where the transport should write a file it will later hand over as `staged_name`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPath`] unless `staged_name` is a single file name.
    pub fn stage_path(&self, staged_name: &str) -> Result<PathBuf> {
        validate_file_name(staged_name)?;
        Ok(self.staging_dir.join(staged_name))
    }

    /// Move `staged_name` from the staging area to `destination_dir/final_name`.
    ///
    /// `destination_dir` must come from the path resolver; it is created if
    /// missing. An existing file at the destination is replaced.
    ///
    /// # Errors
    /// - [`Error::InvalidPath`] if either name is not a single file name.
    /// - [`Error::Io`] (kind `NotFound`) if the staged file does not exist.
    /// - [`Error::Io`] if the directory cannot be created or the rename fails.
    pub fn relocate(&self, staged_name: &str, destination_dir: &Path, final_name: &str) -> Result<PathBuf> {
        let source = self.stage_path(staged_name)?;
        validate_file_name(final_name)?;
        if !source.is_file() {
            return Err(Error::io(
                &source,
                std::io::Error::new(ErrorKind::NotFound, "staged upload not found"),
            ));
        }
        let dest = destination_dir.join(final_name);

        let slot = self.in_flight.entry(dest.clone()).or_default().clone();
        let result = {
            let _guard = slot.lock().unwrap_or_else(|e| e.into_inner());
            self.rename(&source, destination_dir, &dest)
        };
        drop(slot);
        self.in_flight
            .remove_if(&dest, |_, slot| Arc::strong_count(slot) == 1);

        result.map(|()| dest)
    }

    fn rename(&self, source: &Path, destination_dir: &Path, dest: &Path) -> Result<()> {
        std::fs::create_dir_all(destination_dir).map_err(|e| Error::io(destination_dir, e))?;
        std::fs::rename(source, dest).map_err(|e| Error::io(source, e))?;
        log::debug!("relocated {} to {}", source.display(), dest.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stager(dir: &Path) -> UploadStager {
        let stager = UploadStager::new(dir.join("tmp"));
        stager.ensure_staging_dir().unwrap();
        stager
    }

    #[test]
    fn relocate_moves_file() {
        let dir = tempfile::tempdir().unwrap();
        let stager = stager(dir.path());
        std::fs::write(stager.stage_path("abc-photo.png").unwrap(), b"png").unwrap();

        let dest_dir = dir.path().join("img/2024");
        let dest = stager.relocate("abc-photo.png", &dest_dir, "photo.png").unwrap();

        assert_eq!(dest, dest_dir.join("photo.png"));
        assert_eq!(std::fs::read(&dest).unwrap(), b"png");
        assert!(!stager.staging_dir().join("abc-photo.png").exists());
    }

    #[test]
    fn relocate_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let stager = stager(dir.path());
        std::fs::write(dir.path().join("photo.png"), b"old").unwrap();
        std::fs::write(stager.stage_path("up1").unwrap(), b"new").unwrap();

        stager.relocate("up1", dir.path(), "photo.png").unwrap();
        assert_eq!(std::fs::read(dir.path().join("photo.png")).unwrap(), b"new");
    }

    #[test]
    fn relocate_missing_source_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let stager = stager(dir.path());
        let err = stager.relocate("ghost", dir.path(), "ghost").unwrap_err();
        match err {
            Error::Io(e) => assert_eq!(e.kind(), ErrorKind::NotFound),
            other => panic!("expected io error, got {:?}", other),
        }
    }

    #[test]
    fn relocate_rejects_traversal_names() {
        let dir = tempfile::tempdir().unwrap();
        let stager = stager(dir.path());
        assert!(matches!(
            stager.relocate("../secret", dir.path(), "x"),
            Err(Error::InvalidPath(_))
        ));
        std::fs::write(stager.stage_path("ok").unwrap(), b"x").unwrap();
        assert!(matches!(
            stager.relocate("ok", dir.path(), "../../x"),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn relocate_releases_destination_slot() {
        let dir = tempfile::tempdir().unwrap();
        let stager = stager(dir.path());
        std::fs::write(stager.stage_path("a").unwrap(), b"x").unwrap();
        stager.relocate("a", dir.path(), "a.txt").unwrap();
        assert!(stager.in_flight.is_empty());
    }

    #[test]
    fn concurrent_relocations_to_same_destination() {
        let dir = tempfile::tempdir().unwrap();
        let stager = Arc::new(stager(dir.path()));
        for i in 0..8 {
            std::fs::write(stager.stage_path(&format!("up{}", i)).unwrap(), format!("{}", i)).unwrap();
        }

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let stager = Arc::clone(&stager);
                let dest_dir = dir.path().to_path_buf();
                std::thread::spawn(move || {
                    stager.relocate(&format!("up{}", i), &dest_dir, "same.txt").unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let content = std::fs::read_to_string(dir.path().join("same.txt")).unwrap();
        assert!(content.parse::<u32>().unwrap() < 8);
        assert!(stager.in_flight.is_empty());
    }
}
