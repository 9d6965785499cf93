//! Tracing subscriber setup.

use keyward_core::config::LogLevel;
use keyward_core::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive for the configured level, raised by `-v` flags.
pub fn directive(level: LogLevel, verbose: u8) -> String {
    let level = match verbose {
        0 => level.as_directive(),
        1 => LogLevel::Debug.as_directive(),
        _ => LogLevel::Trace.as_directive(),
    };
    format!("keyward={level}")
}

/// Install the global subscriber. `RUST_LOG` wins over config and flags.
///
/// Logs go to stderr so command output on stdout stays clean.
pub fn init(config: &Config, verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| directive(config.logging.level, verbose).into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
