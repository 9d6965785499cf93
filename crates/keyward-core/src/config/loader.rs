//! Configuration loading and persistence.

use super::{Config, MAX_ITERATIONS, MIN_ITERATIONS};
use crate::error::ConfigError;
use crate::paths;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        debug!(path = %path.display(), "loading config");
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to the default path.
    pub fn save_default(&self) -> Result<(), ConfigError> {
        let path = paths::config_file()?;
        self.save(&path)
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 doesn't have a serializer, so we use serde_json with pretty print
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        // 1. Key derivation cost
        if self.cipher.iterations < MIN_ITERATIONS {
            errors.push(format!(
                "Cipher iterations must be at least {}, got {}",
                MIN_ITERATIONS, self.cipher.iterations
            ));
        }
        if self.cipher.iterations > MAX_ITERATIONS {
            errors.push(format!(
                "Cipher iterations must be at most {}, got {}",
                MAX_ITERATIONS, self.cipher.iterations
            ));
        }

        // 2. Auto-lock must be a positive duration when set
        if self.session.auto_lock_minutes == Some(0) {
            errors.push(
                "Session auto_lock_minutes must be greater than 0 (use null to disable)"
                    .to_string(),
            );
        }

        // 3. Storage directory must not be blank
        if let Some(dir) = &self.storage.dir {
            if dir.trim().is_empty() {
                errors.push("Storage dir must not be empty".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// Load configuration from `path` when given, otherwise from the default
    /// location. A missing file yields defaults; a broken file is an error.
    pub fn load_or_default_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let result = match path {
            Some(path) => Self::load(path),
            None => Self::load_default(),
        };

        match result {
            Ok(config) => Ok(config),
            Err(ConfigError::NotFound(path)) => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Load configuration from the default path, falling back to defaults if
    /// the file is missing or unreadable.
    pub fn load_or_default() -> Self {
        Self::load_or_default_from(None).unwrap_or_default()
    }

    /// Directory holding account records.
    pub fn accounts_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.dir {
            Some(dir) => Ok(paths::expand_tilde(dir)),
            None => paths::accounts_dir(),
        }
    }

    /// Session lifetime after unlock, if auto-lock is enabled.
    pub fn auto_lock(&self) -> Option<Duration> {
        self.session
            .auto_lock_minutes
            .map(|minutes| Duration::from_secs(minutes * 60))
    }
}
