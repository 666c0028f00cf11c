mod common;

use gitcms::*;

#[test]
fn reset_restores_committed_content() {
    let dir = tempfile::tempdir().unwrap();
    let (store, root) = common::store_with_files(dir.path(), &[("a.md", "C1")]);
    store.create_file("a.md", b"C2, edited").unwrap();

    store.reset(&["a.md".into()]).unwrap();

    assert_eq!(std::fs::read(common::content_file(&root, "a.md")).unwrap(), b"C1");
    assert_eq!(common::commit_count(&root), 1);
}

#[test]
fn reset_restores_deleted_file() {
    let dir = tempfile::tempdir().unwrap();
    let (store, root) = common::store_with_files(dir.path(), &[("docs/a.md", "C1")]);
    std::fs::remove_file(common::content_file(&root, "docs/a.md")).unwrap();

    store.reset(&["docs/a.md".into()]).unwrap();

    assert_eq!(std::fs::read(common::content_file(&root, "docs/a.md")).unwrap(), b"C1");
}

#[test]
fn reset_only_applies_to_first_file() {
    let dir = tempfile::tempdir().unwrap();
    let (store, root) = common::store_with_files(dir.path(), &[("a.md", "a1"), ("b.md", "b1")]);
    store.create_file("a.md", b"a2 edited").unwrap();
    store.create_file("b.md", b"b2 edited").unwrap();

    store.reset(&["a.md".into(), "b.md".into()]).unwrap();

    assert_eq!(std::fs::read(common::content_file(&root, "a.md")).unwrap(), b"a1");
    assert_eq!(std::fs::read(common::content_file(&root, "b.md")).unwrap(), b"b2 edited");
}

#[test]
fn reset_all_applies_to_every_file() {
    let dir = tempfile::tempdir().unwrap();
    let (store, root) = common::store_with_files(dir.path(), &[("a.md", "a1"), ("b.md", "b1")]);
    store.create_file("a.md", b"a2 edited").unwrap();
    store.create_file("b.md", b"b2 edited").unwrap();

    store.reset_all(&["a.md".into(), "b.md".into()]).unwrap();

    assert_eq!(std::fs::read(common::content_file(&root, "a.md")).unwrap(), b"a1");
    assert_eq!(std::fs::read(common::content_file(&root, "b.md")).unwrap(), b"b1");
}

#[test]
fn reset_leaves_other_files_alone() {
    let dir = tempfile::tempdir().unwrap();
    let (store, root) = common::store_with_files(dir.path(), &[("a.md", "a1"), ("b.md", "b1")]);
    store.create_file("a.md", b"a2 edited").unwrap();
    store.create_file("b.md", b"b2 edited").unwrap();

    store.reset_all(&["a.md".into()]).unwrap();

    assert_eq!(std::fs::read(common::content_file(&root, "b.md")).unwrap(), b"b2 edited");
}

#[test]
fn reset_untracked_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (store, root) = common::store_with_files(dir.path(), &[("a.md", "a")]);
    store.create_file("new.md", b"n").unwrap();

    let err = store.reset(&["new.md".into()]).unwrap_err();

    assert!(matches!(err, Error::Repository(_)));
    assert!(common::content_file(&root, "new.md").exists());
}

#[test]
fn reset_empty_list_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _root) = common::store_with_files(dir.path(), &[("a.md", "a")]);
    assert!(matches!(store.reset(&[]), Err(Error::Repository(_))));
    assert!(matches!(store.reset_all(&[]), Err(Error::Repository(_))));
}

#[test]
fn reset_escape_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (store, _root) = common::store_with_files(dir.path(), &[("a.md", "a")]);
    assert!(matches!(
        store.reset(&["../../etc/passwd".into()]),
        Err(Error::PathEscape(_))
    ));
}
