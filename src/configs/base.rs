use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::configs::*;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },
  #[error("invalid configuration: {0}")]
  Toml(#[from] toml::de::Error),
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
  #[serde(default)]
  pub client: ClientConfig,
  pub logging: Option<LoggingConfig>,
}

impl Config {
  /// Reads a TOML file. A missing `[client]` table yields defaults, and an
  /// empty cookie is filled from the environment.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
      path: path.display().to_string(),
      source,
    })?;
    Self::from_toml(&raw)
  }

  pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
    let mut config: Config = toml::from_str(raw)?;
    config.client.apply_env();
    Ok(config)
  }

  /// Used when no config file exists: defaults plus `DOUYIN_COOKIE`.
  pub fn from_env() -> Self {
    let mut config = Self::default();
    config.client.apply_env();
    config
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_from_toml_applies_defaults() {
    let config = Config::from_toml(
      r#"
        [client]
        cookie = "msToken=abc; ttwid=1%7Cxyz"
        max_retries = 5

        [logging]
        level = "debug"
      "#,
    )
    .unwrap();

    assert_eq!(config.client.cookie, "msToken=abc; ttwid=1%7Cxyz");
    assert_eq!(config.client.max_retries, 5);
    assert!(config.client.retry);
    assert_eq!(config.client.timeout_ms, 30_000);

    let logging = config.logging.unwrap();
    assert_eq!(logging.level, "debug");
    assert!(logging.ansi);
  }

  #[test]
  fn test_invalid_toml_is_reported() {
    let err = Config::from_toml("[client\nretry = yes").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
  }

  #[test]
  fn test_missing_file() {
    let err = Config::load("/nonexistent/douyin-crawler.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
  }
}
