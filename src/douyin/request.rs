use std::time::Duration;

use parking_lot::Mutex;
use reqwest::{
    Client, Method,
    header::{HeaderMap, SET_COOKIE},
};
use serde_json::Value;
use tracing::{debug, warn};

use super::{endpoints, session::Session};
use crate::{
    common::{CrawlerError, HttpClient, OrderedMap, Result, build_query_string},
    configs::ClientConfig,
    sign::{self, SignRequest},
};

const BASE_PARAMS: [(&str, &str); 3] = [
    ("device_platform", "webapp"),
    ("aid", "6383"),
    ("channel", "channel_pc_web"),
];

/// Device fingerprint parameters: (query key, cookie name, fallback).
const DEVICE_PARAMS: [(&str, &str, &str); 4] = [
    ("screen_width", "dy_swidth", "2560"),
    ("screen_height", "dy_sheight", "1440"),
    ("cpu_core_num", "device_web_cpu_core", "24"),
    ("device_memory", "device_web_memory_size", "8"),
];

const DEFAULT_HEADERS: [(&str, &str); 9] = [
    ("accept", "application/json, text/plain, */*"),
    ("accept-language", "zh-CN,zh;q=0.9"),
    (
        "sec-ch-ua",
        "\"Not A(Brand\";v=\"8\", \"Chromium\";v=\"132\", \"Google Chrome\";v=\"132\"",
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Windows\""),
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "same-origin"),
    ("referer", "https://www.douyin.com/"),
];

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub params: OrderedMap,
    pub headers: OrderedMap,
    /// Sent only for non-GET requests. A JSON string goes out verbatim.
    pub body: Option<Value>,
    /// Overrides the configured per-attempt timeout.
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            params: OrderedMap::new(),
            headers: OrderedMap::new(),
            body: None,
            timeout: None,
        }
    }
}

impl RequestOptions {
    pub fn get(params: OrderedMap) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: OrderedMap,
    pub body: Value,
    /// 1 when the first attempt succeeded.
    pub attempts: u32,
}

/// Linear retry schedule: the n-th failure waits n × base.
struct Backoff {
    attempt: u32,
    max_attempts: u32,
    base: Duration,
}

impl Backoff {
    fn new(max_attempts: u32, base: Duration) -> Self {
        Self {
            attempt: 1,
            max_attempts,
            base,
        }
    }

    fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    fn next(&mut self) -> Duration {
        let delay = self.base * self.attempt;
        self.attempt += 1;
        delay
    }
}

/// Browser-shaped HTTP client for the Douyin web API. Owns the session and
/// signs the endpoints that require it.
pub struct HttpRequestClient {
    http: Client,
    session: Mutex<Session>,
    user_agent: String,
    base_url: String,
    max_attempts: u32,
    timeout: Duration,
    retry_delay: Duration,
}

impl HttpRequestClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = HttpClient::new().map_err(CrawlerError::Client)?;
        let session = Session::bootstrap(config);

        debug!(
            "Douyin session ready (webid: {}, cookies: {})",
            session.webid(),
            session.cookies().len()
        );

        Ok(Self {
            http,
            session: Mutex::new(session),
            user_agent: config.user_agent.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_attempts: config.attempts(),
            timeout: Duration::from_millis(config.timeout_ms),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// Caller params, base params, identity, device fingerprint, then
    /// `a_bogus` over everything before it.
    pub fn build_params(&self, endpoint: &str, custom: &OrderedMap) -> OrderedMap {
        let mut params = custom.clone();
        params.extend(BASE_PARAMS);

        {
            let session = self.session.lock();
            params.insert("webid", session.webid());
            params.insert("msToken", session.ms_token());

            for (key, cookie, fallback) in DEVICE_PARAMS {
                params.insert(key, session.cookie(cookie).unwrap_or(fallback));
            }

            if let Some(fp) = session.cookie("s_v_web_id") {
                params.insert("verifyFp", fp);
                params.insert("fp", fp);
            }
        }

        if let Some(signature) = self.sign_request(endpoint, &params) {
            params.insert("a_bogus", signature);
        }

        params
    }

    pub fn sign_request(&self, endpoint: &str, params: &OrderedMap) -> Option<String> {
        let variant = endpoints::sign_variant(endpoint)?;
        let query = build_query_string(params);
        Some(sign::sign(&SignRequest::new(&query, &self.user_agent, variant)))
    }

    /// Header names are lowercased so caller headers replace the defaults
    /// regardless of case.
    pub fn build_headers(&self, custom: &OrderedMap) -> OrderedMap {
        let mut headers: OrderedMap = DEFAULT_HEADERS.into_iter().collect();
        headers.insert("user-agent", self.user_agent.as_str());
        headers.insert("cookie", self.cookie_string());
        headers.extend(custom.iter().map(|(k, v)| (k.to_ascii_lowercase(), v)));
        headers
    }

    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<ApiResponse> {
        let params = self.build_params(endpoint, &options.params);
        let headers = self.build_headers(&options.headers);

        let query = build_query_string(&params);
        let url = if query.is_empty() {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}{}?{}", self.base_url, endpoint, query)
        };

        let mut backoff = Backoff::new(self.max_attempts, self.retry_delay);
        loop {
            let attempt = backoff.attempt;
            let err = match self.send_once(&url, endpoint, &options, &headers, attempt).await {
                Ok(mut response) => {
                    response.attempts = attempt;
                    return Ok(response);
                }
                Err(err) => err,
            };

            if backoff.is_exhausted() || !err.is_retryable() {
                warn!(
                    "{} {} failed after {} attempt(s): {}",
                    options.method, endpoint, attempt, err
                );
                return Err(err);
            }

            let delay = backoff.next();
            warn!(
                "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                attempt, self.max_attempts, endpoint, err, delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn send_once(
        &self,
        url: &str,
        endpoint: &str,
        options: &RequestOptions,
        headers: &OrderedMap,
        attempt: u32,
    ) -> Result<ApiResponse> {
        let transport = |source: reqwest::Error| CrawlerError::Transport {
            url: url.to_string(),
            method: options.method.to_string(),
            attempt,
            source,
        };

        let mut builder = self
            .http
            .request(options.method.clone(), url)
            .timeout(options.timeout.unwrap_or(self.timeout));

        for (key, value) in headers.iter() {
            builder = builder.header(key, value);
        }

        if options.method != Method::GET {
            builder = match &options.body {
                Some(Value::String(raw)) => builder.body(raw.clone()),
                Some(body) => builder.json(body),
                None => builder,
            };
        }

        debug!("{} {} (attempt {})", options.method, url, attempt);

        let response = builder.send().await.map_err(transport)?;
        let status = response.status().as_u16();

        let set_cookies = set_cookie_values(response.headers());
        if !set_cookies.is_empty() {
            self.session
                .lock()
                .apply_set_cookies(set_cookies.iter().map(String::as_str));
        }

        let response_headers: OrderedMap = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str(), v)))
            .collect();

        let raw = response.text().await.map_err(transport)?;
        debug!("{} responded {} ({} bytes)", endpoint, status, raw.len());

        let body: Value = serde_json::from_str(&raw).map_err(|source| CrawlerError::Parse {
            url: url.to_string(),
            endpoint: endpoint.to_string(),
            http_status: status,
            raw: raw.clone(),
            source,
        })?;

        let status_code = body.get("status_code").and_then(Value::as_i64);
        if status_code != Some(0) {
            return Err(CrawlerError::Api {
                status_code,
                status_msg: body
                    .get("status_msg")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                endpoint: endpoint.to_string(),
                params: options.params.to_pairs(),
            });
        }

        Ok(ApiResponse {
            status,
            headers: response_headers,
            body,
            attempts: attempt,
        })
    }

    pub async fn get(&self, endpoint: &str, params: OrderedMap) -> Result<Value> {
        let response = self.request(endpoint, RequestOptions::get(params)).await?;
        Ok(response.body)
    }

    pub async fn post(&self, endpoint: &str, body: Value, params: OrderedMap) -> Result<Value> {
        let options = RequestOptions {
            method: Method::POST,
            params,
            body: Some(body),
            ..RequestOptions::default()
        };
        let response = self.request(endpoint, options).await?;
        Ok(response.body)
    }

    pub fn cookie_string(&self) -> String {
        self.session.lock().cookie_header()
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.session.lock().cookie(name).map(str::to_string)
    }

    pub fn set_cookie(&self, name: &str, value: &str) {
        self.session.lock().set_cookie(name, value);
    }

    pub fn webid(&self) -> String {
        self.session.lock().webid().to_string()
    }

    pub fn ms_token(&self) -> String {
        self.session.lock().ms_token().to_string()
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

/// Every `Set-Cookie` value, decoded lossily so non-ASCII values still land.
fn set_cookie_values(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .collect()
}
