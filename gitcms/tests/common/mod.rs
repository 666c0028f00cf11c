use std::path::{Path, PathBuf};

use gitcms::*;

pub const CONTENT: &str = "content";

/// Initialize `<dir>/site` with `files` (relative to the content dir)
/// committed as a single seed commit, and open a store on it.
pub fn store_with_files(dir: &Path, files: &[(&str, &str)]) -> (ContentStore, PathBuf) {
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

    (open_store(&root), root)
}

pub fn open_store(root: &Path) -> ContentStore {
    ContentStore::open(root, OpenOptions {
        content_path: Some(CONTENT.into()),
        ..Default::default()
    })
    .unwrap()
}

pub fn content_file(root: &Path, rel: &str) -> PathBuf {
    root.join(CONTENT).join(rel)
}

#[allow(dead_code)]
pub fn commit_count(root: &Path) -> usize {
    let repo = git2::Repository::open(root).unwrap();
    let mut walk = repo.revwalk().unwrap();
    if walk.push_head().is_err() {
        return 0;
    }
    walk.count()
}

#[allow(dead_code)]
pub fn head_commit(root: &Path) -> (String, String, String) {
    let repo = git2::Repository::open(root).unwrap();
    let commit = repo.head().unwrap().peel_to_commit().unwrap();
    let author = commit.author();
    (
        commit.message().unwrap_or("").to_string(),
        author.name().unwrap_or("").to_string(),
        author.email().unwrap_or("").to_string(),
    )
}

/// Content of `rel` (relative to the content dir) at HEAD, if committed.
#[allow(dead_code)]
pub fn head_file(root: &Path, rel: &str) -> Option<Vec<u8>> {
    let repo = git2::Repository::open(root).unwrap();
    let tree = repo.head().ok()?.peel_to_tree().ok()?;
    let entry = tree.get_path(&Path::new(CONTENT).join(rel)).ok()?;
    let blob = repo.find_blob(entry.id()).ok()?;
    Some(blob.content().to_vec())
}
