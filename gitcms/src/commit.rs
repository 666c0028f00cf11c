use std::sync::Arc;

use crate::error::Result;
use crate::gateway::RepositoryGateway;
use crate::lock::RepoLock;
use crate::types::{CommitId, CommitRecord};

/// Turns a [`CommitRecord`] into exactly one commit: stage, then commit, under
/// the repository lock.
///
/// Filesystem mutations that preceded the call are never rolled back. If
/// staging or committing fails, the error is returned and the working tree
/// keeps the changes; callers retry the commit or reset. The index does not
/// keep them: a failed commit unstages the record's files again, so they
/// cannot leak into the next record's commit.
pub struct CommitCoordinator<G> {
    gateway: Arc<G>,
    lock: Arc<RepoLock>,
}

impl<G: RepositoryGateway> CommitCoordinator<G> {
    pub fn new(gateway: Arc<G>, lock: Arc<RepoLock>) -> Self {
        Self { gateway, lock }
    }

    /// Stage and commit `record` as one commit.
    ///
    /// # Errors
    /// - [`Error::Repository`](crate::Error::Repository) for an author git
    ///   rejects (checked before anything is staged), or if staging or the
    ///   commit itself fails.
    /// - [`Error::Io`](crate::Error::Io) if the repository lock cannot be taken.
    pub fn commit_change(&self, record: CommitRecord) -> Result<CommitId> {
        record.author().validate()?;

        self.lock.hold(|| {
            self.gateway.stage(record.files())?;
            let id = match self.gateway.commit(record.message(), record.author()) {
                Ok(id) => id,
                Err(e) => {
                    if let Err(undo) = self.gateway.unstage(record.files()) {
                        log::warn!("failed to unstage after failed commit: {}", undo);
                    }
                    return Err(e);
                }
            };
            log::info!(
                "commit {} by {} ({} file(s)): {}",
                id,
                record.author(),
                record.files().len(),
                record.message()
            );
            Ok(id)
        })
    }
}
