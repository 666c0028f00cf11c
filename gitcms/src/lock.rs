use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;

use crate::error::{Error, Result};

/// Exclusive lock serializing stage+commit and checkout sequences on one
/// working tree.
///
/// Threads of this process queue on an in-process mutex; other processes are
/// kept out by an advisory `fs2` lock on `<gitdir>/gitcms.lock`.
#[derive(Debug)]
pub struct RepoLock {
    path: PathBuf,
    local: Mutex<()>,
}

impl RepoLock {
    /// Create a lock for the repository whose git directory is `gitdir`.
    /// Nothing is created on disk until the first [`hold`](Self::hold).
    ///
    /// # Arguments
    /// * `gitdir` - The `.git` directory of the working tree.
    pub fn new(gitdir: &Path) -> Self {
        Self {
            path: gitdir.join("gitcms.lock"),
            local: Mutex::new(()),
        }
    }

    /// Location of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire the lock, execute `f`, then release.
    ///
    /// # Arguments
    /// * `f` - Closure to execute while the lock is held. Its error is
    ///   returned unchanged.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the lock file cannot be opened or locked.
    pub fn hold<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let _local = self.local.lock().unwrap_or_else(|e| e.into_inner());
        let file = self.open()?;
        file.lock_exclusive().map_err(|e| Error::io(&self.path, e))?;

        let result = f();

        // Dropping `file` releases the lock as well.
        if let Err(e) = FileExt::unlock(&file) {
            log::warn!("failed to release {}: {}", self.path.display(), e);
        }
        result
    }

    fn open(&self) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))
    }
}
