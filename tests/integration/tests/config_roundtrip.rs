//! Config save/load roundtrip integration tests.

use std::path::Path;
use std::time::Duration;

use keyward_core::config::{Config, LogLevel};
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keyward.json5");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.cipher.iterations, config.cipher.iterations);
    assert_eq!(
        loaded.session.auto_lock_minutes,
        config.session.auto_lock_minutes
    );
    assert_eq!(loaded.logging.level, config.logging.level);
    assert_eq!(loaded.storage.dir, None);
}

#[test]
fn test_config_modify_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keyward.json5");

    let mut config = Config::default();
    config.cipher.iterations = 250_000;
    config.session.auto_lock_minutes = None;
    config.logging.level = LogLevel::Warn;
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.cipher.iterations, 250_000);
    assert_eq!(loaded.auto_lock(), None);
    assert_eq!(loaded.logging.level, LogLevel::Warn);
}

#[test]
fn test_config_json5_syntax() {
    let config = Config::parse(
        r#"{
            // comments and trailing commas are fine
            storage: { dir: "/tmp/kw" },
            session: { auto_lock_minutes: 15, },
        }"#,
    )
    .unwrap();
    assert_eq!(config.storage.dir.as_deref(), Some("/tmp/kw"));
    assert_eq!(config.auto_lock(), Some(Duration::from_secs(15 * 60)));
    assert_eq!(config.cipher.iterations, 100_000);
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/keyward.json5"));
    assert!(result.is_err());
    let defaulted = Config::load_or_default_from(Some(Path::new("/nonexistent/keyward.json5")));
    assert!(defaulted.is_ok());
}

#[test]
fn test_config_parse_invalid() {
    assert!(Config::parse("not valid json").is_err());
}
