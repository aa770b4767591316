//! Tracing subscriber setup.

use std::str::FromStr;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "human" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format {:?}, expected text or json", other)),
        }
    }
}

/// Filter directive for a `-v` count, or `level` when no flag was given.
pub fn filter_for(verbosity: u8, level: &str) -> String {
    match verbosity {
        0 => level.to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Initialize logging. `RUST_LOG` overrides the computed filter.
pub fn init_logging(verbosity: u8, level: &str, format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_for(verbosity, level)));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_target(verbosity >= 3).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    // A subscriber may already be installed by an embedding host.
    let _ = result;
}
