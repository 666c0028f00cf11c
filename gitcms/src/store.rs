use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::commit::CommitCoordinator;
use crate::error::{Error, Result};
use crate::gateway::{Git2Gateway, RepositoryGateway};
use crate::lock::RepoLock;
use crate::mutate::FileMutator;
use crate::paths::{delete_message, normalize_path, validate_file_name, PathResolver};
use crate::reset::ResetCoordinator;
use crate::show::RevisionReader;
use crate::types::{
    CommitId, CommitRecord, MutationRequest, OpenOptions, Relocation, Signature, UploadedFile,
    DEFAULT_COMMIT_MESSAGE, STAGING_DIR,
};
use crate::upload::UploadStager;

/// Internal state shared via `Arc`.
pub(crate) struct ContentStoreInner<G> {
    gateway: Arc<G>,
    resolver: PathResolver,
    mutator: FileMutator,
    stager: UploadStager,
    commits: CommitCoordinator<G>,
    resets: ResetCoordinator<G>,
    reader: RevisionReader<G>,
    repo_root: PathBuf,
    commit_message: String,
    signature: Signature,
}

/// Content operations on one working tree: every path goes through the
/// resolver, every commit through the coordinator.
///
/// Cheap to clone (`Arc` internally).
pub struct ContentStore<G = Git2Gateway> {
    inner: Arc<ContentStoreInner<G>>,
}

impl<G> Clone for ContentStore<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ContentStore<Git2Gateway> {
    /// Open the repository whose working tree is `path`.
    ///
    /// With `options.create`, a repository is initialized when none exists.
    ///
    /// # Arguments
    /// * `path` - Working tree root; relative paths are taken from the current directory.
    /// * `options` - Content directory, commit defaults and `create`.
    ///
    /// # Errors
    /// - [`Error::NotFound`] if there is no repository and `create` is false.
    /// - [`Error::Repository`] for a bare repository.
    /// - [`Error::PathEscape`] if the content directory leaves the working tree.
    pub fn open(path: impl AsRef<Path>, options: OpenOptions) -> Result<Self> {
        let root = absolute(path.as_ref())?;

        let gateway = match Git2Gateway::open(&root) {
            Ok(gateway) => gateway,
            Err(Error::NotFound(_)) if options.create => Git2Gateway::init(&root)?,
            Err(e) => return Err(e),
        };
        let lock = Arc::new(RepoLock::new(gateway.git_dir()));
        Self::with_gateway(Arc::new(gateway), lock, root, options)
    }
}

impl<G: RepositoryGateway> ContentStore<G> {
    /// Assemble a store around an existing gateway. `repo_root` must be the
    /// working tree root the gateway operates on.
    pub fn with_gateway(
        gateway: Arc<G>,
        lock: Arc<RepoLock>,
        repo_root: PathBuf,
        options: OpenOptions,
    ) -> Result<Self> {
        let mut content_root = repo_root.clone();
        content_root.extend(normalize_path(options.content_path.as_deref().unwrap_or(""))?);

        let signature = Signature::default().or_defaults(options.author, options.email);
        let commit_message = options
            .commit_message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_COMMIT_MESSAGE.to_string());

        let stager = UploadStager::new(content_root.join(STAGING_DIR));
        stager.ensure_staging_dir()?;
        let resolver = PathResolver::new(content_root).with_reserved(STAGING_DIR);

        log::info!(
            "content store at {} (content root {}, author {})",
            repo_root.display(),
            resolver.root().display(),
            signature
        );

        Ok(Self {
            inner: Arc::new(ContentStoreInner {
                commits: CommitCoordinator::new(Arc::clone(&gateway), Arc::clone(&lock)),
                resets: ResetCoordinator::new(Arc::clone(&gateway), lock),
                reader: RevisionReader::new(Arc::clone(&gateway), resolver.clone()),
                gateway,
                resolver,
                mutator: FileMutator,
                stager,
                repo_root,
                commit_message,
                signature,
            }),
        })
    }

    /// Root of the working tree.
    pub fn repo_root(&self) -> &Path {
        &self.inner.repo_root
    }

    /// Directory every caller path is resolved under.
    pub fn content_root(&self) -> &Path {
        self.inner.resolver.root()
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.inner.resolver
    }

    pub fn stager(&self) -> &UploadStager {
        &self.inner.stager
    }

    /// The default commit author.
    pub fn signature(&self) -> &Signature {
        &self.inner.signature
    }

    /// The default commit message.
    pub fn commit_message(&self) -> &str {
        &self.inner.commit_message
    }

    /// Current HEAD commit, `None` before the first commit.
    pub fn head(&self) -> Result<Option<CommitId>> {
        self.inner.gateway.head()
    }

    /// Delete `rel` and commit the removal as `"<default message>: delete <rel>"`.
    ///
    /// A missing file fails before anything is staged.
    ///
    /// # Arguments
    /// * `rel` - Percent-encoded path relative to the content root.
    /// * `name`, `email` - Author overrides; missing or empty fields use the defaults.
    ///
    /// # Errors
    /// - [`Error::PathEscape`] / [`Error::InvalidPath`] for a rejected path.
    /// - [`Error::NotFound`] if the file does not exist.
    /// - [`Error::Repository`] if the removal cannot be committed. The file
    ///   stays deleted on disk.
    pub fn delete_file(&self, rel: &str, name: Option<String>, email: Option<String>) -> Result<CommitId> {
        let path = self.inner.resolver.resolve(rel)?;
        self.inner.mutator.apply(&MutationRequest::delete(&path))?;

        let rel = self.inner.resolver.relative(&path)?;
        let record = CommitRecord::new(
            delete_message(&self.inner.commit_message, &rel),
            self.inner.signature.or_defaults(name, email),
            vec![path],
        )?;
        self.inner.commits.commit_change(record)
    }

    /// Write `content` to `rel`, creating parent directories. Nothing is committed.
    ///
    /// # Errors
    /// Path errors from the resolver, or [`Error::Io`] if the write fails.
    pub fn create_file(&self, rel: &str, content: &[u8]) -> Result<PathBuf> {
        let request = MutationRequest::write(self.inner.resolver.resolve(rel)?, content);
        self.inner.mutator.apply(&request)?;
        Ok(request.path)
    }

    /// Move a finished upload into `directory` (relative to the content root)
    /// under its original name.
    ///
    /// Path and name errors are returned as `Err`. A failed move is not: it
    /// comes back as [`Relocation::Failed`] and is logged.
    pub fn upload_complete(&self, upload: &UploadedFile, directory: &str) -> Result<Relocation> {
        let dest_dir = self.inner.resolver.resolve_dir(directory)?;
        validate_file_name(&upload.original_name)?;

        let relocation = match self
            .inner
            .stager
            .relocate(&upload.staged_name, &dest_dir, &upload.original_name)
        {
            Ok(path) => Relocation::Relocated {
                path: self.inner.resolver.relative(&path)?,
            },
            Err(e) => {
                log::warn!("failed to relocate upload {}: {}", upload.staged_name, e);
                Relocation::Failed {
                    message: e.to_string(),
                }
            }
        };
        Ok(relocation)
    }

    /// Stage and commit `files` in one commit. Missing author fields and an
    /// empty message fall back to the configured defaults.
    ///
    /// # Errors
    /// - Path errors if any file is rejected; nothing is staged.
    /// - [`Error::Repository`] for an empty list, an invalid author, a file
    ///   that matches nothing, or when the files are unchanged.
    pub fn commit(
        &self,
        files: &[String],
        message: Option<String>,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<CommitId> {
        let paths = self.resolve_all(files)?;
        let message = message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.inner.commit_message.clone());
        let record = CommitRecord::new(message, self.inner.signature.or_defaults(name, email), paths)?;
        self.inner.commits.commit_change(record)
    }

    /// Discard uncommitted changes to the first of `files` only.
    pub fn reset(&self, files: &[String]) -> Result<()> {
        let paths = self.resolve_all(files)?;
        self.inner.resets.discard(&paths)
    }

    /// Discard uncommitted changes to every one of `files`.
    pub fn reset_all(&self, files: &[String]) -> Result<()> {
        let paths = self.resolve_all(files)?;
        self.inner.resets.discard_all(&paths)
    }

    /// Content of `rel` at HEAD.
    ///
    /// # Errors
    /// [`Error::NotFound`] if `rel` has no committed content.
    pub fn show(&self, rel: &str) -> Result<Vec<u8>> {
        self.inner.reader.read_at_head(rel)
    }

    fn resolve_all(&self, files: &[String]) -> Result<Vec<PathBuf>> {
        files
            .iter()
            .map(|f| self.inner.resolver.resolve(f))
            .collect()
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| Error::io(path, e))?;
    Ok(cwd.join(path))
}
