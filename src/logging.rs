//! tracing subscriber setup

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Environment variable holding `EnvFilter` directives. Takes precedence over
/// the configured filter.
pub const LOG_ENV: &str = "HWINFO_FFI_LOG";

/// True when the environment asks for logging regardless of config
pub fn requested_by_env() -> bool {
    std::env::var_os(LOG_ENV).is_some_and(|value| !value.is_empty())
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install a stderr fmt subscriber. A subscriber installed earlier by the
/// host process wins.
pub fn init(config: &LoggingConfig) {
    tracing_subscriber::registry()
        .with(build_filter(config))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .try_init()
        .ok(); // Ignore error if already initialized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_falls_back_to_warn() {
        let config = LoggingConfig {
            enabled: true,
            filter: "hwinfo_ffi=loud".to_string(),
        };
        if std::env::var_os(LOG_ENV).is_none() {
            assert_eq!(build_filter(&config).to_string(), "warn");
        }
    }

    #[test]
    fn init_twice_is_harmless() {
        init(&LoggingConfig::default());
        init(&LoggingConfig::default());
    }
}
