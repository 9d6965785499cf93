//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Main Keyward configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Account storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Key derivation settings for newly encrypted accounts.
    #[serde(default)]
    pub cipher: CipherConfig,

    /// Unlocked session policy.
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Account storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding account records. Defaults to `~/.keyward/accounts`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// Password key-derivation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CipherConfig {
    /// PBKDF2-HMAC-SHA256 iteration count.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
        }
    }
}

/// Lowest iteration count accepted by [`super::Config::validate`].
pub const MIN_ITERATIONS: u32 = 1_000;

/// Highest iteration count accepted when configuring or decrypting.
pub const MAX_ITERATIONS: u32 = 10_000_000;

fn default_iterations() -> u32 {
    100_000
}

/// Unlocked session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Minutes after which an unlocked account locks itself.
    /// `None` keeps accounts unlocked until they are explicitly locked.
    #[serde(default = "default_auto_lock_minutes")]
    pub auto_lock_minutes: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_lock_minutes: default_auto_lock_minutes(),
        }
    }
}

fn default_auto_lock_minutes() -> Option<u64> {
    Some(30)
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
