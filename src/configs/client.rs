use serde::{Deserialize, Serialize};

use crate::common::HttpClient;

/// Environment variable consulted when `cookie` is left empty.
pub const COOKIE_ENV: &str = "DOUYIN_COOKIE";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClientConfig {
    /// Raw browser cookie header, `k=v; k=v`.
    #[serde(default)]
    pub cookie: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub ms_token: Option<String>,
    #[serde(default)]
    pub webid: Option<String>,
    #[serde(default = "default_retry")]
    pub retry: bool,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_user_agent() -> String {
    HttpClient::default_user_agent()
}

fn default_retry() -> bool {
    true
}

fn default_max_retries() -> u32 {
    3
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

fn default_base_url() -> String {
    "https://www.douyin.com".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cookie: String::new(),
            user_agent: default_user_agent(),
            ms_token: None,
            webid: None,
            retry: default_retry(),
            max_retries: default_max_retries(),
            timeout_ms: default_timeout_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            base_url: default_base_url(),
        }
    }
}

impl ClientConfig {
    pub fn with_cookie(cookie: impl Into<String>) -> Self {
        Self {
            cookie: cookie.into(),
            ..Self::default()
        }
    }

    /// Fills an empty `cookie` from `DOUYIN_COOKIE`.
    pub fn apply_env(&mut self) {
        if self.cookie.trim().is_empty() {
            if let Ok(cookie) = std::env::var(COOKIE_ENV) {
                self.cookie = cookie;
            }
        }
    }

    /// Total attempts a single call may make.
    pub fn attempts(&self) -> u32 {
        if self.retry { self.max_retries + 1 } else { 1 }
    }
}
