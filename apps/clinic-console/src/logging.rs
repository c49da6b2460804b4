use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

use crate::config::{LogFormat, LoggingConfig};

/// Filter directive for a `-v` count, falling back to the configured level.
#[must_use]
pub fn directive(config: &LoggingConfig, verbose: u8) -> String {
    match verbose {
        0 => config.level.clone(),
        1 => "info".to_owned(),
        2 => "debug".to_owned(),
        _ => "trace".to_owned(),
    }
}

/// Install the global subscriber. `RUST_LOG` wins over config and `-v`.
///
/// Logs go to stderr so command output on stdout stays pipeable.
pub fn init(config: &LoggingConfig, verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive(config, verbose)));

    let registry = tracing_subscriber::registry().with(filter);
    // A second init (tests) keeps the first subscriber.
    let _ = match config.format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
}
