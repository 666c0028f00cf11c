//! Git-backed content editing for a single working tree.
//!
//! `gitcms` turns edit requests into filesystem changes and commits:
//! untrusted relative paths are confined to a content root, files are written
//! or deleted, and changes are staged and committed with an author. Uncommitted
//! changes can be discarded, and file content can be read as of HEAD.
//!
//! # Key types
//!
//! - [`ContentStore`]: opens (or creates) a repository and exposes the
//!   content operations: create, delete, upload, commit, reset, show.
//! - [`PathResolver`]: the only place untrusted paths are checked.
//! - [`RepositoryGateway`]: stage/commit/checkout/read-blob capability;
//!   [`Git2Gateway`] implements it over libgit2.
//! - [`CommitCoordinator`], [`ResetCoordinator`], [`RevisionReader`]: the
//!   transactions built on top of a gateway.
//!
//! # Quick example
//!
//! ```rust,no_run
//! use gitcms::{ContentStore, OpenOptions};
//!
//! let store = ContentStore::open("/srv/site", OpenOptions {
//!     content_path: Some("content".into()),
//!     ..Default::default()
//! }).unwrap();
//!
//! store.create_file("posts/hello.md", b"# Hello").unwrap();
//! store.commit(&["posts/hello.md".into()], Some("Add hello".into()), None, None).unwrap();
//! assert_eq!(store.show("posts/hello.md").unwrap(), b"# Hello");
//! ```

pub mod commit;
pub mod error;
pub mod gateway;
pub mod lock;
pub mod mutate;
pub mod paths;
pub mod reset;
pub mod show;
pub mod store;
pub mod types;
pub mod upload;

// Re-export primary public types at crate root.
pub use commit::CommitCoordinator;
pub use error::{Error, Result};
pub use gateway::{Git2Gateway, RepositoryGateway};
pub use lock::RepoLock;
pub use mutate::FileMutator;
pub use paths::PathResolver;
pub use reset::ResetCoordinator;
pub use show::RevisionReader;
pub use store::ContentStore;
pub use types::*;
pub use upload::UploadStager;
