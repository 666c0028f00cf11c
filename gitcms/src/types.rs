use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{Error, Result};

pub const DEFAULT_COMMIT_MESSAGE: &str = "Update from gitcms";
pub const DEFAULT_AUTHOR_NAME: &str = "gitcms";
pub const DEFAULT_AUTHOR_EMAIL: &str = "gitcms@localhost";

/// Name of the staging directory under the content root.
pub const STAGING_DIR: &str = "tmp";

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// Author identity attached to commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
}

impl Signature {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Check that git will accept this identity: both fields non-blank and
    /// free of `<` and `>`.
    ///
    /// # Errors
    /// Returns [`Error::Repository`] naming the offending identity.
    pub fn validate(&self) -> Result<()> {
        let bad = |s: &str| s.trim().is_empty() || s.contains(['<', '>']);
        if bad(&self.name) || bad(&self.email) {
            return Err(Error::repository(format!("invalid author '{}'", self)));
        }
        Ok(())
    }

    /// Fill in whichever of `name`/`email` the caller left out from `self`.
    pub fn or_defaults(&self, name: Option<String>, email: Option<String>) -> Self {
        Self {
            name: name.filter(|n| !n.is_empty()).unwrap_or_else(|| self.name.clone()),
            email: email.filter(|e| !e.is_empty()).unwrap_or_else(|| self.email.clone()),
        }
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::new(DEFAULT_AUTHOR_NAME, DEFAULT_AUTHOR_EMAIL)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

// ---------------------------------------------------------------------------
// CommitId
// ---------------------------------------------------------------------------

/// Hex object id of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<git2::Oid> for CommitId {
    fn from(oid: git2::Oid) -> Self {
        Self(oid.to_string())
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// CommitRecord
// ---------------------------------------------------------------------------

/// Everything needed to produce one commit. Consumed by
/// [`CommitCoordinator::commit_change`](crate::commit::CommitCoordinator::commit_change).
#[derive(Debug, Clone)]
pub struct CommitRecord {
    message: String,
    author: Signature,
    files: Vec<PathBuf>,
}

impl CommitRecord {
    /// # Errors
    /// Returns [`Error::Repository`] if `files` is empty.
    pub fn new(message: impl Into<String>, author: Signature, files: Vec<PathBuf>) -> Result<Self> {
        if files.is_empty() {
            return Err(Error::repository("no files to commit"));
        }
        Ok(Self {
            message: message.into(),
            author,
            files,
        })
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn author(&self) -> &Signature {
        &self.author
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

// ---------------------------------------------------------------------------
// MutationRequest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Write(Vec<u8>),
    Delete,
}

/// A single filesystem change at an already-resolved path.
#[derive(Debug, Clone)]
pub struct MutationRequest {
    pub path: PathBuf,
    pub mutation: Mutation,
}

impl MutationRequest {
    pub fn write(path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            mutation: Mutation::Write(content.into()),
        }
    }

    pub fn delete(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mutation: Mutation::Delete,
        }
    }
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

/// A file the upload transport has finished writing into the staging area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Name the client gave the file; becomes the final file name.
    pub original_name: String,
    /// Name of the file inside the staging area.
    pub staged_name: String,
    pub temp_path: PathBuf,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Outcome of moving an upload out of the staging area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Relocation {
    Relocated { path: String },
    Failed { message: String },
}

impl Relocation {
    pub fn is_relocated(&self) -> bool {
        matches!(self, Self::Relocated { .. })
    }
}

// ---------------------------------------------------------------------------
// OpenOptions
// ---------------------------------------------------------------------------

/// Options for [`ContentStore::open`](crate::store::ContentStore::open).
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    /// Content directory relative to the repository root. Empty means the root.
    pub content_path: Option<String>,
    /// Message used when a commit call gives none, and as the delete-message prefix.
    pub commit_message: Option<String>,
    /// Default commit author name.
    pub author: Option<String>,
    /// Default commit author email.
    pub email: Option<String>,
    /// Initialize a repository if none exists at the path.
    pub create: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn signature_defaults_skip_empty_fields() {
        let sig = Signature::new("Editor", "editor@example.com");
        let merged = sig.or_defaults(Some(String::new()), Some("ada@example.com".into()));
        assert_eq!(merged.to_string(), "Editor <ada@example.com>");
    }

    #[test]
    fn signature_validation() {
        assert!(Signature::default().validate().is_ok());
        assert!(Signature::new("Bad <Name>", "a@example.com").validate().is_err());
        assert!(Signature::new("Ada", "<a@example.com>").validate().is_err());
        assert!(Signature::new("  ", "a@example.com").validate().is_err());
    }

    #[test]
    fn commit_record_needs_files() {
        assert!(CommitRecord::new("msg", Signature::default(), vec![]).is_err());
    }

    #[test]
    fn relocation_wire_shape() {
        let ok = Relocation::Relocated {
            path: "img/a.png".into(),
        };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({ "status": "relocated", "path": "img/a.png" })
        );
        let failed = Relocation::Failed {
            message: "not found".into(),
        };
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({ "status": "failed", "message": "not found" })
        );
    }

    #[test]
    fn uploaded_file_is_camel_case() {
        let file = UploadedFile {
            original_name: "a.png".into(),
            staged_name: "abc".into(),
            temp_path: PathBuf::from("/c/tmp/abc"),
            size: 3,
            content_type: None,
        };
        assert_eq!(
            serde_json::to_value(&file).unwrap(),
            json!({
                "originalName": "a.png",
                "stagedName": "abc",
                "tempPath": "/c/tmp/abc",
                "size": 3,
            })
        );
    }
}
