use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::gateway::RepositoryGateway;
use crate::lock::RepoLock;

/// Discards uncommitted changes by checking paths out from HEAD.
pub struct ResetCoordinator<G> {
    gateway: Arc<G>,
    lock: Arc<RepoLock>,
}

impl<G: RepositoryGateway> ResetCoordinator<G> {
    pub fn new(gateway: Arc<G>, lock: Arc<RepoLock>) -> Self {
        Self { gateway, lock }
    }

    /// Restore the **first** of `files` to HEAD. The rest are ignored; use
    /// [`discard_all`](Self::discard_all) to restore every file.
    ///
    /// # Errors
    /// Returns [`Error::Repository`] if `files` is empty or the checkout fails.
    pub fn discard(&self, files: &[PathBuf]) -> Result<()> {
        let first = files
            .first()
            .ok_or_else(|| Error::repository("no files to reset"))?;
        if files.len() > 1 {
            log::debug!("reset ignores {} file(s) after the first", files.len() - 1);
        }
        self.lock
            .hold(|| self.gateway.checkout(std::slice::from_ref(first)))
    }

    /// Restore every one of `files` to HEAD in a single checkout.
    pub fn discard_all(&self, files: &[PathBuf]) -> Result<()> {
        if files.is_empty() {
            return Err(Error::repository("no files to reset"));
        }
        self.lock.hold(|| self.gateway.checkout(files))
    }
}
