use std::path::PathBuf;

/// All errors produced by gitcms.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-supplied path tried to leave the content root.
    #[error("path escapes content root: {0}")]
    PathEscape(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Staging, commit or checkout failed. The working tree is left as-is.
    #[error("repository error: {0}")]
    Repository(String),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

// ---------------------------------------------------------------------------
// Convenience constructors
// ---------------------------------------------------------------------------

impl Error {
    /// The caller's path leaves the content root.
    pub fn path_escape(path: impl Into<String>) -> Self {
        Self::PathEscape(path.into())
    }

    /// The caller's path is malformed or names nothing.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// A file, blob or repository does not exist.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// A staging, commit or checkout failure described by `msg`.
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Wrap a libgit2 error as a repository failure, keeping `context` in the message.
    pub fn git(context: impl std::fmt::Display, err: git2::Error) -> Self {
        Self::Repository(format!("{}: {}", context, err.message()))
    }

    /// Wrap an I/O error, prefixing the message with `path` and keeping its kind.
    ///
    /// # Arguments
    /// * `path` - The file or directory the operation was working on.
    /// * `err` - The underlying error.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io(std::io::Error::new(
            err.kind(),
            format!("{}: {}", path.into().display(), err),
        ))
    }

    /// Whether the failure was caused by the caller's path rather than the system.
    pub fn is_path_error(&self) -> bool {
        matches!(self, Self::PathEscape(_) | Self::InvalidPath(_))
    }

    /// Whether the failure belongs to the repository-error class (retryable
    /// once the tree is cleaned up).
    pub fn is_repository_error(&self) -> bool {
        matches!(self, Self::Repository(_) | Self::Git(_))
    }
}
