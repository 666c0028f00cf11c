//! Capability surface over the version-control tool.
//!
//! Coordinators only see [`RepositoryGateway`]; [`Git2Gateway`] implements it
//! on a non-bare libgit2 repository.

use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use git2::build::CheckoutBuilder;
use git2::{ErrorCode, ObjectType, Repository};

use crate::error::{Error, Result};
use crate::types::{CommitId, Signature};

pub trait RepositoryGateway: Send + Sync {
    /// Record the current on-disk state of `paths` in the index. A path that
    /// no longer exists on disk is staged as a removal.
    fn stage(&self, paths: &[PathBuf]) -> Result<()>;

    /// Commit the index on top of HEAD. Fails rather than create an empty commit.
    fn commit(&self, message: &str, author: &Signature) -> Result<CommitId>;

    /// Put the index entries for `paths` back to their HEAD state (or drop
    /// them while HEAD is unborn). The working tree is not touched.
    fn unstage(&self, paths: &[PathBuf]) -> Result<()>;

    /// Restore `paths` in the working tree and index to their HEAD content.
    fn checkout(&self, paths: &[PathBuf]) -> Result<()>;

    /// Content of `path` as committed at HEAD.
    fn read_blob(&self, path: &Path) -> Result<Vec<u8>>;

    /// Current HEAD commit, `None` while the branch is unborn.
    fn head(&self) -> Result<Option<CommitId>>;
}

/// [`RepositoryGateway`] over libgit2.
pub struct Git2Gateway {
    repo: Mutex<Repository>,
    root: PathBuf,
    git_dir: PathBuf,
}

impl std::fmt::Debug for Git2Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git2Gateway")
            .field("root", &self.root)
            .field("git_dir", &self.git_dir)
            .finish()
    }
}

impl Git2Gateway {
    /// Open the repository whose working tree is exactly `root`.
    ///
    /// # Errors
    /// - [`Error::NotFound`] if `root` is not a repository.
    /// - [`Error::Repository`] if the repository is bare.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let repo = Repository::open(&root)
            .map_err(|_| Error::not_found(format!("repository not found: {}", root.display())))?;
        Self::from_repo(repo, root)
    }

    /// Initialize a new non-bare repository at `root` and open it.
    ///
    /// # Errors
    /// [`Error::Io`] if `root` cannot be created, [`Error::Repository`] if
    /// libgit2 cannot initialize it.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| Error::io(&root, e))?;
        let repo = Repository::init(&root)
            .map_err(|e| Error::git(format!("init {}", root.display()), e))?;
        Self::from_repo(repo, root)
    }

    fn from_repo(repo: Repository, root: PathBuf) -> Result<Self> {
        if repo.is_bare() {
            return Err(Error::repository(format!(
                "{} is a bare repository",
                root.display()
            )));
        }
        let git_dir = repo.path().to_path_buf();
        Ok(Self {
            repo: Mutex::new(repo),
            root,
            git_dir,
        })
    }

    /// Root of the working tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The `.git` directory.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Helper: lock the repo mutex and call `f` with the repository.
    fn with_repo<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Repository) -> Result<T>,
    {
        let repo = self
            .repo
            .lock()
            .map_err(|e| Error::repository(e.to_string()))?;
        f(&repo)
    }

    /// `abs` relative to the working tree root.
    fn repo_relative(&self, abs: &Path) -> Result<PathBuf> {
        let rel = abs.strip_prefix(&self.root).map_err(|_| {
            Error::repository(format!("{} is outside the repository", abs.display()))
        })?;
        if rel.as_os_str().is_empty()
            || !rel.components().all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(Error::repository(format!(
                "{} does not name a file in the repository",
                abs.display()
            )));
        }
        Ok(rel.to_path_buf())
    }

    fn repo_relative_all(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        paths.iter().map(|p| self.repo_relative(p)).collect()
    }
}

fn head_commit(repo: &Repository) -> Result<Option<git2::Commit<'_>>> {
    match repo.head() {
        Ok(head) => head
            .peel_to_commit()
            .map(Some)
            .map_err(|e| Error::git("resolve HEAD", e)),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
        Err(e) => Err(Error::git("resolve HEAD", e)),
    }
}

fn open_index(repo: &Repository) -> Result<git2::Index> {
    let mut index = repo.index().map_err(|e| Error::git("open index", e))?;
    index.read(false).map_err(|e| Error::git("read index", e))?;
    if index.has_conflicts() {
        return Err(Error::repository("index has unresolved conflicts"));
    }
    Ok(index)
}

/// Add or remove each path in the in-memory index. Nothing is written.
fn stage_into(index: &mut git2::Index, paths: &[PathBuf], rels: &[PathBuf]) -> Result<()> {
    for (abs, rel) in paths.iter().zip(rels) {
        let on_disk = std::fs::symlink_metadata(abs)
            .map(|m| !m.is_dir())
            .unwrap_or(false);
        if on_disk {
            index
                .add_path(rel)
                .map_err(|e| Error::git(format!("stage {}", rel.display()), e))?;
        } else if index.get_path(rel, 0).is_some() {
            index
                .remove_path(rel)
                .map_err(|e| Error::git(format!("stage removal of {}", rel.display()), e))?;
        } else {
            return Err(Error::repository(format!(
                "pathspec '{}' did not match any files",
                rel.display()
            )));
        }
        log::debug!("staged {}", rel.display());
    }
    Ok(())
}

impl RepositoryGateway for Git2Gateway {
    fn stage(&self, paths: &[PathBuf]) -> Result<()> {
        let rels = self.repo_relative_all(paths)?;

        self.with_repo(|repo| {
            let mut index = open_index(repo)?;
            if let Err(e) = stage_into(&mut index, paths, &rels) {
                // The repository caches its index; drop the half-staged entries.
                index.read(true).map_err(|e| Error::git("reload index", e))?;
                return Err(e);
            }
            index.write().map_err(|e| Error::git("write index", e))
        })
    }

    fn commit(&self, message: &str, author: &Signature) -> Result<CommitId> {
        self.with_repo(|repo| {
            let sig = git2::Signature::now(&author.name, &author.email)
                .map_err(|e| Error::git(format!("invalid author '{}'", author), e))?;

            let mut index = open_index(repo)?;
            let tree_oid = index.write_tree().map_err(|e| Error::git("write tree", e))?;
            let tree = repo.find_tree(tree_oid)?;

            let parent = head_commit(repo)?;
            let unchanged = match &parent {
                Some(p) => p.tree_id() == tree_oid,
                None => tree.is_empty(),
            };
            if unchanged {
                return Err(Error::repository("nothing to commit"));
            }

            let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
            let oid = repo
                .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
                .map_err(|e| Error::git("commit", e))?;
            log::debug!("committed {} as {}", oid, author);
            Ok(CommitId::from(oid))
        })
    }

    fn unstage(&self, paths: &[PathBuf]) -> Result<()> {
        let rels = self.repo_relative_all(paths)?;

        self.with_repo(|repo| {
            let head = head_commit(repo)?;
            let target = head.as_ref().map(|c| c.as_object());
            repo.reset_default(target, rels.iter().map(|r| r.as_path()))
                .map_err(|e| Error::git("unstage", e))?;
            log::debug!("unstaged {} path(s)", rels.len());
            Ok(())
        })
    }

    fn checkout(&self, paths: &[PathBuf]) -> Result<()> {
        let rels = self.repo_relative_all(paths)?;

        self.with_repo(|repo| {
            let head = head_commit(repo)?
                .ok_or_else(|| Error::repository("HEAD has no commits"))?;
            let tree = head.tree()?;

            let mut builder = CheckoutBuilder::new();
            builder.force().disable_pathspec_match(true);
            for rel in &rels {
                if tree.get_path(rel).is_err() {
                    return Err(Error::repository(format!(
                        "'{}' has no committed history",
                        rel.display()
                    )));
                }
                builder.path(rel.as_path());
            }

            repo.checkout_head(Some(&mut builder))
                .map_err(|e| Error::git("checkout", e))?;
            log::debug!("restored {} path(s) from HEAD", rels.len());
            Ok(())
        })
    }

    fn read_blob(&self, path: &Path) -> Result<Vec<u8>> {
        let rel = self.repo_relative(path)?;
        let not_found = || Error::not_found(format!("{} at HEAD", rel.display()));

        self.with_repo(|repo| {
            let head = head_commit(repo)?.ok_or_else(not_found)?;
            let tree = head.tree()?;
            let entry = tree.get_path(&rel).map_err(|_| not_found())?;
            if entry.kind() != Some(ObjectType::Blob) {
                return Err(not_found());
            }
            let blob = repo.find_blob(entry.id())?;
            Ok(blob.content().to_vec())
        })
    }

    fn head(&self) -> Result<Option<CommitId>> {
        self.with_repo(|repo| Ok(head_commit(repo)?.map(|c| CommitId::from(c.id()))))
    }
}
