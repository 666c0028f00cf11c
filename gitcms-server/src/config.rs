use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use gitcms::OpenOptions;

/// Serve create/delete/upload/commit/reset/show over a git working tree.
#[derive(Debug, Clone, Parser)]
#[command(name = "gitcms-server", version, about)]
pub struct Args {
    /// Root of the repository working tree.
    #[arg(long, env = "GITCMS_REPO", default_value = ".")]
    pub repo: PathBuf,

    /// Content directory, relative to the repository root.
    #[arg(long, env = "GITCMS_CONTENT", default_value = "")]
    pub content: String,

    /// Commit message used when a commit request gives none.
    #[arg(long, env = "GITCMS_COMMIT_MESSAGE")]
    pub commit_message: Option<String>,

    /// Default commit author name.
    #[arg(long, env = "GITCMS_COMMIT_NAME")]
    pub commit_name: Option<String>,

    /// Default commit author email.
    #[arg(long, env = "GITCMS_COMMIT_EMAIL")]
    pub commit_email: Option<String>,

    /// Initialize a repository at --repo if there is none.
    #[arg(long, env = "GITCMS_INIT")]
    pub init: bool,

    #[arg(long, env = "GITCMS_BIND", default_value = "127.0.0.1:4567")]
    pub bind: SocketAddr,

    /// Allow cross-origin requests from any origin.
    #[arg(long, env = "GITCMS_CORS")]
    pub cors: bool,

    /// Largest accepted request body, in bytes.
    #[arg(long, env = "GITCMS_MAX_UPLOAD", default_value_t = 32 * 1024 * 1024)]
    pub max_upload: usize,
}

impl Args {
    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            content_path: Some(self.content.clone()),
            commit_message: self.commit_message.clone(),
            author: self.commit_name.clone(),
            email: self.commit_email.clone(),
            create: self.init,
        }
    }

    pub fn router_options(&self) -> RouterOptions {
        RouterOptions {
            cors: self.cors,
            max_upload: self.max_upload,
        }
    }
}

/// HTTP-level settings for [`router`](crate::routes::router).
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub cors: bool,
    pub max_upload: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            cors: false,
            max_upload: 32 * 1024 * 1024,
        }
    }
}
