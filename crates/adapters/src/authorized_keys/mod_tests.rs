// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn passwd_fixture(dir: &std::path::Path, user: &str, home: &std::path::Path) -> PathBuf {
    let path = dir.join("passwd");
    std::fs::write(&path, format!("{user}:x:1000:1000::{}:/bin/bash\n", home.display())).unwrap();
    path
}

#[tokio::test]
async fn write_then_read_round_trips() {
    let dir = tempdir().unwrap();
    let home = dir.path().join("home").join("alice");
    std::fs::create_dir_all(home.join(".ssh")).unwrap();
    let passwd = passwd_fixture(dir.path(), "alice", &home);

    let store = FsAuthorizedKeysStore::new("%h/.ssh/authorized_keys").with_passwd_path(passwd);
    store.write("alice", "ssh-ed25519 AAAA test\n").await.unwrap();
    let contents = store.read("alice").await.unwrap();
    assert_eq!(contents, "ssh-ed25519 AAAA test\n");
}

#[tokio::test]
async fn read_of_missing_file_returns_empty_string() {
    let dir = tempdir().unwrap();
    let home = dir.path().join("home").join("bob");
    std::fs::create_dir_all(&home).unwrap();
    let passwd = passwd_fixture(dir.path(), "bob", &home);

    let store = FsAuthorizedKeysStore::new("%h/.ssh/authorized_keys").with_passwd_path(passwd);
    assert_eq!(store.read("bob").await.unwrap(), "");
}

#[tokio::test]
async fn unknown_user_is_an_error() {
    let dir = tempdir().unwrap();
    let passwd = passwd_fixture(dir.path(), "alice", &dir.path().join("home/alice"));
    let store = FsAuthorizedKeysStore::new("%h/.ssh/authorized_keys").with_passwd_path(passwd);
    assert!(store.read("ghost").await.is_err());
}

#[tokio::test]
async fn write_sets_owner_only_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let home = dir.path().join("home").join("carol");
    std::fs::create_dir_all(home.join(".ssh")).unwrap();
    let passwd = passwd_fixture(dir.path(), "carol", &home);

    let store = FsAuthorizedKeysStore::new("%h/.ssh/authorized_keys").with_passwd_path(passwd);
    store.write("carol", "key\n").await.unwrap();

    let meta = std::fs::metadata(home.join(".ssh/authorized_keys")).unwrap();
    assert_eq!(meta.permissions().mode() & 0o777, 0o600);
}

#[tokio::test]
async fn write_chowns_the_file_and_ssh_dir_to_the_target_user() {
    use std::os::unix::fs::MetadataExt;

    let dir = tempdir().unwrap();
    let home = dir.path().join("home").join("dave");
    std::fs::create_dir_all(home.join(".ssh")).unwrap();
    let passwd = passwd_fixture(dir.path(), "dave", &home);

    let store = FsAuthorizedKeysStore::new("%h/.ssh/authorized_keys").with_passwd_path(passwd);
    store.write("dave", "key\n").await.unwrap();

    let ssh_dir_meta = std::fs::metadata(home.join(".ssh")).unwrap();
    assert_eq!(ssh_dir_meta.uid(), 1000);
    assert_eq!(ssh_dir_meta.gid(), 1000);

    let file_meta = std::fs::metadata(home.join(".ssh/authorized_keys")).unwrap();
    assert_eq!(file_meta.uid(), 1000);
    assert_eq!(file_meta.gid(), 1000);
}
