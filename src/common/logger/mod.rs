use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub mod formatter;

pub use formatter::*;

use crate::configs::Config;

/// Builds the filter directive from the `[logging]` section. HTTP internals
/// are capped at `warn` unless the user filters say otherwise.
pub fn filter_directive(config: &Config) -> String {
    let log_level = config
        .logging
        .as_ref()
        .map(|l| l.level.as_str())
        .unwrap_or("info");

    let filters = config
        .logging
        .as_ref()
        .and_then(|l| l.filters.as_deref())
        .unwrap_or("");

    if filters.is_empty() {
        format!("{},hyper=warn,reqwest=warn", log_level)
    } else {
        format!("{},hyper=warn,reqwest=warn,{}", log_level, filters)
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over the config file.
pub fn init(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config)));

    let use_ansi = config.logging.as_ref().map(|l| l.ansi).unwrap_or(true);

    let stdout_layer = fmt::layer()
        .event_format(CrawlerFormatter::new(use_ansi))
        .with_ansi(use_ansi)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::LoggingConfig;

    #[test]
    fn test_filter_directive_defaults() {
        let config = Config::default();
        assert_eq!(filter_directive(&config), "info,hyper=warn,reqwest=warn");
    }

    #[test]
    fn test_filter_directive_with_filters() {
        let mut config = Config::default();
        config.logging = Some(LoggingConfig {
            level: "debug".into(),
            filters: Some("douyin_crawler::sign=trace".into()),
            ansi: false,
        });
        assert_eq!(
            filter_directive(&config),
            "debug,hyper=warn,reqwest=warn,douyin_crawler::sign=trace"
        );
    }
}
