//! Config and token files on disk.

use ogsession_store::{SessionConfig, StoreError, TokenStore};
use tempfile::TempDir;

#[tokio::test]
async fn test_missing_config_loads_defaults() {
    let dir = TempDir::new().unwrap();
    let config = SessionConfig::load_from(&dir.path().join("config.json"))
        .await
        .unwrap();
    assert_eq!(config, SessionConfig::default());
}

#[tokio::test]
async fn test_config_survives_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ogsession").join("config.json");

    let config = SessionConfig {
        universe: "Zibal".into(),
        username: "commander@example.com".into(),
        otp_secret_env: Some("OGSESSION_OTP".into()),
        hold_timeout_secs: Some(120),
        ..SessionConfig::default()
    };
    config.save_to(&path).await.unwrap();

    let loaded = SessionConfig::load_from(&path).await.unwrap();
    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());
}

#[tokio::test]
async fn test_corrupt_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    tokio::fs::write(&path, "universe = Zibal").await.unwrap();

    let err = SessionConfig::load_from(&path).await.unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
}

#[tokio::test]
async fn test_tokens_persist_per_user() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tokens.json");

    let mut store = TokenStore::open(&path).await;
    assert!(store.is_empty());
    store.put("Commander@Example.com", "f1d2c3b4-bearer");
    store.put("other@example.com", "0a9b8c7d-bearer");
    store.save().await.unwrap();

    let reopened = TokenStore::open(&path).await;
    assert_eq!(reopened.len(), 2);
    assert_eq!(
        reopened.bearer_token("commander@example.com"),
        Some("f1d2c3b4-bearer")
    );
}

#[tokio::test]
async fn test_empty_token_removes_entry() {
    let dir = TempDir::new().unwrap();
    let mut store = TokenStore::open(dir.path().join("tokens.json")).await;
    store.put("me@example.com", "token");
    store.put("me@example.com", "");
    assert_eq!(store.bearer_token("me@example.com"), None);
}

#[tokio::test]
async fn test_clear_deletes_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tokens.json");

    let mut store = TokenStore::open(&path).await;
    store.put("me@example.com", "token");
    store.save().await.unwrap();
    assert!(path.exists());

    store.clear().await.unwrap();
    assert!(!path.exists());
    assert!(store.is_empty());

    // Clearing twice is fine.
    store.clear().await.unwrap();
}
