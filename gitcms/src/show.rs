use std::sync::Arc;

use crate::error::Result;
use crate::gateway::RepositoryGateway;
use crate::paths::PathResolver;

/// Reads file content as of HEAD, ignoring the working tree.
pub struct RevisionReader<G> {
    gateway: Arc<G>,
    resolver: PathResolver,
}

impl<G: RepositoryGateway> RevisionReader<G> {
    pub fn new(gateway: Arc<G>, resolver: PathResolver) -> Self {
        Self { gateway, resolver }
    }

    /// # Errors
    /// [`Error::NotFound`](crate::Error::NotFound) when `rel` has no committed
    /// content, even if the file exists in the working tree.
    pub fn read_at_head(&self, rel: &str) -> Result<Vec<u8>> {
        let path = self.resolver.resolve(rel)?;
        self.gateway.read_blob(&path)
    }
}
