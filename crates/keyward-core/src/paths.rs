//! Path resolution utilities.

use crate::error::{ConfigError, Result};
use std::path::PathBuf;

/// Get the Keyward base directory (~/.keyward).
pub fn base_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".keyward"))
}

/// Get the main config file path (~/.keyward/keyward.json5).
pub fn config_file() -> Result<PathBuf> {
    Ok(base_dir()?.join("keyward.json5"))
}

/// Get the default account records directory (~/.keyward/accounts).
pub fn accounts_dir() -> Result<PathBuf> {
    Ok(base_dir()?.join("accounts"))
}

/// Ensure the base directory exists.
pub fn ensure_dirs() -> Result<()> {
    std::fs::create_dir_all(base_dir()?)?;
    Ok(())
}

/// Expand tilde (~) in a path.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
