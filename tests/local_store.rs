use std::collections::BTreeSet;
use std::fs;

use anyhow::{Context, Result};

use gistling::model::{GistId, RemoteConfig};
use gistling::store::LocalStore;

#[test]
fn login_state_roundtrips_across_reopens() -> Result<()> {
    let tmp = tempfile::tempdir().context("create tempdir")?;
    let store = LocalStore::init(tmp.path())?;

    store.set_remote(RemoteConfig {
        base_url: "https://gists.example".to_string(),
    })?;
    store.set_token("secret-token")?;

    let reopened = LocalStore::open(tmp.path())?;
    assert_eq!(
        reopened.remote()?.map(|r| r.base_url),
        Some("https://gists.example".to_string())
    );
    assert_eq!(reopened.token()?, Some("secret-token".to_string()));

    reopened.clear_token()?;
    assert_eq!(reopened.token()?, None);
    // The remote config survives a logout.
    assert!(reopened.remote()?.is_some());
    Ok(())
}

#[test]
fn open_refuses_a_missing_store() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(LocalStore::open(&tmp.path().join("nowhere")).is_err());
}

#[test]
fn tag_assignments_persist_and_empty_clears() -> Result<()> {
    let tmp = tempfile::tempdir().context("create tempdir")?;
    let store = LocalStore::init(tmp.path())?;

    let id = GistId("g1".to_string());
    let tags: BTreeSet<String> = ["rust", "todo"].iter().map(|s| s.to_string()).collect();
    store.set_tags_for(&id, &tags)?;
    assert_eq!(store.tags_for(&id)?, tags);

    // An unknown gist simply has no tags.
    assert!(store.tags_for(&GistId("g2".to_string()))?.is_empty());

    store.set_tags_for(&id, &BTreeSet::new())?;
    assert!(store.tags_for(&id)?.is_empty());
    assert!(store.read_state()?.tags.is_empty());
    Ok(())
}

#[test]
fn tag_owner_renames_on_create_confirmation() -> Result<()> {
    let tmp = tempfile::tempdir().context("create tempdir")?;
    let store = LocalStore::init(tmp.path())?;

    let temp = GistId("local-abc".to_string());
    let tags: BTreeSet<String> = ["wip"].iter().map(|s| s.to_string()).collect();
    store.set_tags_for(&temp, &tags)?;

    let real = GistId("g7".to_string());
    store.rename_tag_owner(&temp, &real)?;
    assert!(store.tags_for(&temp)?.is_empty());
    assert_eq!(store.tags_for(&real)?, tags);
    Ok(())
}

#[test]
fn version_mismatch_is_rejected() -> Result<()> {
    let tmp = tempfile::tempdir().context("create tempdir")?;
    LocalStore::init(tmp.path())?;

    let path = tmp.path().join("state.json");
    let mangled = fs::read_to_string(&path)?.replace("\"version\": 1", "\"version\": 99");
    fs::write(&path, mangled)?;

    let store = LocalStore::open(tmp.path())?;
    assert!(store.read_state().is_err());
    Ok(())
}
