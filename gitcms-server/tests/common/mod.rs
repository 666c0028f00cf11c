use std::path::{Path, PathBuf};

use gitcms::{ContentStore, OpenOptions};
use gitcms_server::{router, AppState, RouterOptions};
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const CONTENT: &str = "content";

/// A server on an ephemeral port over a freshly seeded repository.
pub struct TestServer {
    pub base: String,
    pub root: PathBuf,
    pub client: reqwest::Client,
    _dir: TempDir,
}

impl TestServer {
    pub async fn spawn(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = seed(dir.path(), files);

        let store = ContentStore::open(
            &root,
            OpenOptions {
                content_path: Some(CONTENT.into()),
                ..Default::default()
            },
        )
        .unwrap();
        let app = router(AppState::new(store), &RouterOptions::default());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base: format!("http://{}", addr),
            root,
            client: reqwest::Client::new(),
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn content_file(&self, rel: &str) -> PathBuf {
        self.root.join(CONTENT).join(rel)
    }

    /// Files currently sitting in the upload staging directory.
    #[allow(dead_code)]
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(self.content_file("tmp")).unwrap().count()
    }

    #[allow(dead_code)]
    pub fn commit_count(&self) -> usize {
        let repo = git2::Repository::open(&self.root).unwrap();
        let mut walk = repo.revwalk().unwrap();
        walk.push_head().unwrap();
        walk.count()
    }

    #[allow(dead_code)]
    pub fn head_message(&self) -> String {
        let repo = git2::Repository::open(&self.root).unwrap();
        let commit = repo.head().unwrap().peel_to_commit().unwrap();
        commit.message().unwrap_or("").to_string()
    }
}

fn seed(dir: &Path, files: &[(&str, &str)]) -> PathBuf {
    let root = dir.join("site");
    let repo = git2::Repository::init(&root).unwrap();
    for (rel, data) in files {
        let path = root.join(CONTENT).join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, data).unwrap();
    }

    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = git2::Signature::now("Seed", "seed@example.com").unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "seed", &tree, &[])
        .unwrap();
    root
}

/// Status code and JSON body of a response.
pub async fn reply(response: reqwest::Response) -> (u16, Value) {
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.unwrap();
    (status, body)
}
