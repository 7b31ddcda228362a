//! Configuration loading tests
//!
//! Run with: cargo test --test config_tests

use donorlink::config::loader::default_config_content;
use donorlink::config::{load_config_from_path, save_config};
use donorlink::error::Error;
use donorlink::{AppContext, Config};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_config_default_values() {
    let config = Config::default();
    assert_eq!(config.api.base_url, "http://localhost:3000");
    assert_eq!(config.roles.stale_time(), Duration::from_secs(300));
    assert_eq!(config.roles.gc_time(), Duration::from_secs(1800));
    assert_eq!(config.identity.token_ttl(), Duration::from_secs(3600));
    assert!(config.identity.state_file.is_none());
    assert!(config.storage.path.is_none());
}

#[test]
fn test_partial_file_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("donorlink.toml");
    fs::write(
        &path,
        r#"
[api]
base_url = "https://api.example.org"

[roles]
stale_time_secs = 60
"#,
    )
    .unwrap();

    let config = load_config_from_path(&path).unwrap();
    assert_eq!(config.api.base_url, "https://api.example.org");
    assert_eq!(config.roles.stale_time(), Duration::from_secs(60));
    assert_eq!(config.roles.max_entries, 1000);
    assert_eq!(config.identity.token_ttl_secs, 3600);
}

#[test]
fn test_gc_time_never_below_stale_time() {
    let config: Config = toml::from_str("[roles]\nstale_time_secs = 600\ngc_time_secs = 10\n").unwrap();
    assert_eq!(config.roles.gc_time(), Duration::from_secs(600));
}

#[test]
fn test_env_interpolation_in_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("donorlink.toml");
    std::env::set_var("DONORLINK_CONFIG_TEST_URL", "https://from-env.example.org");
    fs::write(
        &path,
        "[api]\nbase_url = \"${DONORLINK_CONFIG_TEST_URL}\"\n[identity]\ntoken_secret = \"${DONORLINK_UNSET_SECRET:-fallback}\"\n",
    )
    .unwrap();

    let config = load_config_from_path(&path).unwrap();
    assert_eq!(config.api.base_url, "https://from-env.example.org");
    assert_eq!(config.identity.token_secret, "fallback");
    std::env::remove_var("DONORLINK_CONFIG_TEST_URL");
}

#[test]
fn test_default_file_content() {
    let config: Config = toml::from_str(default_config_content()).unwrap();
    assert_eq!(config.identity.state_file, Some(PathBuf::from("./.donorlink/identity.json")));
    assert_eq!(config.storage.path, Some(PathBuf::from("./.donorlink/storage.json")));
    assert_eq!(config.roles.stale_time_secs, 300);
}

#[test]
fn test_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("donorlink.toml");

    let mut config = Config::default();
    config.api.base_url = "https://saved.example.org".to_string();
    config.storage.path = Some(dir.path().join("storage.json"));
    save_config(&config, &path).unwrap();

    let loaded = load_config_from_path(&path).unwrap();
    assert_eq!(loaded.api.base_url, "https://saved.example.org");
    assert_eq!(loaded.storage.path, config.storage.path);
}

#[test]
fn test_missing_file_is_config_not_found() {
    let dir = TempDir::new().unwrap();
    let result = load_config_from_path(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(Error::ConfigNotFound)));
}

#[test]
fn test_invalid_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("donorlink.toml");
    fs::write(&path, "[api\nbase_url = ").unwrap();
    assert!(matches!(load_config_from_path(&path), Err(Error::TomlParse(_))));
}

#[tokio::test]
async fn test_context_from_config_uses_files() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.identity.state_file = Some(dir.path().join("identity.json"));
    config.storage.path = Some(dir.path().join("storage.json"));

    let app = AppContext::from_config(config).unwrap();
    app.session().register_user("cfg@example.org", "Secret1").await.unwrap();
    app.session().consumer().wait_for(|s| s.is_signed_in()).await.unwrap();
    app.shutdown();

    assert!(dir.path().join("identity.json").exists());
    assert!(dir.path().join("storage.json").exists());
}
