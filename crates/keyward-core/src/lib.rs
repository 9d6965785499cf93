//! # keyward-core
//!
//! Core types, configuration, and utilities for Keyward.
//!
//! This crate provides shared functionality used across all Keyward crates:
//!
//! - **Configuration**: Loading, validation, and persistence of the JSON5 config file
//! - **Secrets**: [`SecretString`] for passwords held in memory
//! - **Utilities**: Path resolution and ID generation

pub mod config;
pub mod error;
pub mod paths;
pub mod id;
pub mod secret;

// Re-exports for convenience
pub use config::Config;
pub use error::{ConfigError, Result};
pub use secret::SecretString;
