//! Shared fixtures for the integration tests.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use keyward_accounts::{ExportedKeypair, KeySchema};
use keyward_core::Config;
use tempfile::TempDir;

/// Iteration count that keeps tests fast while staying above the minimum.
pub const TEST_ITERATIONS: u32 = 1_000;

/// Deterministic exported keypair built from a repeated seed byte.
pub fn exported(seed: u8) -> ExportedKeypair {
    ExportedKeypair {
        schema: KeySchema::Ed25519,
        private_key: STANDARD.encode([seed; 32]),
    }
}

/// JSON form of [`exported`], as a user would hand it to `keyward import`.
pub fn exported_json(seed: u8) -> String {
    format!(
        r#"{{"schema":"ED25519","privateKey":"{}"}}"#,
        STANDARD.encode([seed; 32])
    )
}

/// A config rooted in a temporary directory.
pub struct TestEnv {
    pub dir: TempDir,
    pub config: Config,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.dir = Some(dir.path().join("accounts").to_string_lossy().into_owned());
        config.cipher.iterations = TEST_ITERATIONS;
        config.save(&dir.path().join("keyward.json5")).unwrap();
        Self { dir, config }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("keyward.json5")
    }

    pub fn accounts_dir(&self) -> PathBuf {
        self.dir.path().join("accounts")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
