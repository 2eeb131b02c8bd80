use serde_json::{Value, json};
use thiserror::Error;

/// Length of the raw body excerpt kept in serialized parse errors.
const RAW_PREVIEW_CHARS: usize = 500;

pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Failures of a single logical API call, after retries are exhausted.
#[derive(Debug, Error)]
pub enum CrawlerError {
    /// No usable response: connect failure, timeout, broken body stream.
    #[error("{method} {url} failed on attempt {attempt}: {source}")]
    Transport {
        url: String,
        method: String,
        attempt: u32,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with something that is not JSON.
    #[error("failed to parse JSON response from {endpoint}")]
    Parse {
        url: String,
        endpoint: String,
        http_status: u16,
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    /// Valid JSON with a non-zero (or missing) business `status_code`.
    #[error(
        "API error {}: {}",
        describe_code(.status_code),
        .status_msg.as_deref().unwrap_or("Unknown error")
    )]
    Api {
        status_code: Option<i64>,
        status_msg: Option<String>,
        endpoint: String,
        params: Vec<(String, String)>,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

fn describe_code(code: &Option<i64>) -> String {
    code.map_or_else(|| "<missing>".to_string(), |c| c.to_string())
}

impl CrawlerError {
    /// Whether the request layer may retry after this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Client(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "TransportError",
            Self::Parse { .. } => "ParseError",
            Self::Api { .. } => "ApiError",
            Self::Client(_) => "ClientError",
        }
    }

    /// Diagnostic JSON, used when an error has to cross a serialization boundary.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Transport {
                url,
                method,
                attempt,
                source,
            } => json!({
                "name": self.kind(),
                "message": self.to_string(),
                "url": url,
                "method": method,
                "attempt": attempt,
                "timeout": source.is_timeout(),
                "cause": source.to_string(),
            }),
            Self::Parse {
                url,
                endpoint,
                http_status,
                raw,
                ..
            } => json!({
                "name": self.kind(),
                "message": self.to_string(),
                "url": url,
                "endpoint": endpoint,
                "statusCode": http_status,
                "rawTextPreview": raw.chars().take(RAW_PREVIEW_CHARS).collect::<String>(),
                "rawTextLength": raw.len(),
            }),
            Self::Api {
                status_code,
                status_msg,
                endpoint,
                params,
            } => json!({
                "name": self.kind(),
                "message": self.to_string(),
                "statusCode": status_code,
                "statusMsg": status_msg,
                "endpoint": endpoint,
                "params": params
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect::<serde_json::Map<_, _>>(),
            }),
            Self::Client(source) => json!({
                "name": self.kind(),
                "message": self.to_string(),
                "cause": source.to_string(),
            }),
        }
    }
}
