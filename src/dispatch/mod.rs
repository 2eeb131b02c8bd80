//! Named-method boundary in front of [`DouyinApiClient`].
//!
//! A request is `{"method": "getAwemeDetail", "params": ["7372..."]}`; params
//! are positional and trailing ones fall back to the API defaults. Replies
//! are `{"success": true, "data": ...}` or `{"success": false, "error": ...}`
//! where `error` is a pretty-printed JSON diagnostic.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, info};

use crate::{
    common::CrawlerError,
    douyin::{
        DouyinApiClient,
        api::{AWEME_PAGE_SIZE, RELATION_PAGE_SIZE, SEARCH_PAGE_SIZE},
    },
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown method: {0}")]
    UnknownMethod(String),
    #[error("invalid params for {method}: {reason}")]
    InvalidParams { method: String, reason: String },
    #[error(transparent)]
    Crawler(#[from] CrawlerError),
}

impl DispatchError {
    pub fn to_json(&self) -> Value {
        match self {
            Self::Crawler(err) => err.to_json(),
            Self::UnknownMethod(_) => json!({
                "name": "UnknownMethodError",
                "message": self.to_string(),
            }),
            Self::InvalidParams { method, reason } => json!({
                "name": "InvalidParamsError",
                "message": self.to_string(),
                "method": method,
                "reason": reason,
            }),
        }
    }
}

/// A dispatch failure tagged with the request that caused it.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct WorkerError {
    pub correlation_id: String,
    pub method: String,
    pub params: Vec<Value>,
    #[source]
    pub source: DispatchError,
}

impl WorkerError {
    pub fn to_json(&self) -> Value {
        let cause = self.source.to_json();
        json!({
            "name": "WorkerError",
            "message": self.to_string(),
            "correlationId": self.correlation_id,
            "method": self.method,
            "params": self.params,
            "cause": cause.get("message").cloned().unwrap_or(Value::Null),
            "causeName": cause.get("name").cloned().unwrap_or(Value::Null),
        })
    }
}

/// Positional params of one request.
struct Args<'a> {
    method: &'a str,
    params: &'a [Value],
}

impl<'a> Args<'a> {
    fn invalid(&self, reason: String) -> DispatchError {
        DispatchError::InvalidParams {
            method: self.method.to_string(),
            reason,
        }
    }

    /// Ids may arrive as JSON numbers; they are used in their decimal form.
    fn string(&self, index: usize) -> Result<Cow<'a, str>, DispatchError> {
        match self.params.get(index) {
            Some(Value::String(s)) if !s.is_empty() => Ok(Cow::Borrowed(s.as_str())),
            Some(Value::Number(n)) => Ok(Cow::Owned(n.to_string())),
            Some(other) => Err(self.invalid(format!(
                "param {} must be a non-empty string, got {}",
                index, other
            ))),
            None => Err(self.invalid(format!("missing param {}", index))),
        }
    }

    fn int<T>(&self, index: usize, default: T) -> Result<T, DispatchError>
    where
        T: TryFrom<i64> + std::str::FromStr,
    {
        let value = match self.params.get(index) {
            None | Some(Value::Null) => return Ok(default),
            Some(Value::Number(n)) => n.as_i64().and_then(|n| T::try_from(n).ok()),
            Some(Value::String(s)) => s.parse().ok(),
            Some(_) => None,
        };
        value.ok_or_else(|| self.invalid(format!("param {} must be an integer", index)))
    }
}

pub struct Dispatcher {
    client: DouyinApiClient,
}

impl Dispatcher {
    pub fn new(client: DouyinApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &DouyinApiClient {
        &self.client
    }

    /// Runs one request. Failures are logged with the correlation id and
    /// folded into the response rather than returned.
    pub async fn handle(&self, correlation_id: &str, request: DispatchRequest) -> DispatchResponse {
        info!("Processing request {} ({})", request.method, correlation_id);

        match self.call(&request.method, &request.params).await {
            Ok(data) => {
                info!("Request processed successfully: {}", request.method);
                DispatchResponse::ok(data)
            }
            Err(source) => {
                let err = WorkerError {
                    correlation_id: correlation_id.to_string(),
                    method: request.method,
                    params: request.params,
                    source,
                };
                let details = serde_json::to_string_pretty(&err.to_json()).unwrap_or_default();
                error!(
                    "[Worker Error] correlationId={}, method={}: {}",
                    err.correlation_id, err.method, details
                );
                DispatchResponse::failed(
                    serde_json::to_string_pretty(&err.source.to_json())
                        .unwrap_or_else(|_| err.source.to_string()),
                )
            }
        }
    }

    pub async fn call(&self, method: &str, params: &[Value]) -> Result<Value, DispatchError> {
        let args = Args { method, params };
        let client = &self.client;

        let data = match method {
            "getAwemeDetail" => client.get_aweme_detail(&args.string(0)?).await?,
            "getUserAwemeList" => {
                client
                    .get_user_aweme_list(
                        &args.string(0)?,
                        args.int(1, 0)?,
                        args.int(2, AWEME_PAGE_SIZE)?,
                    )
                    .await?
            }
            "getUserFavoriteList" => {
                client
                    .get_user_favorite_list(
                        &args.string(0)?,
                        args.int(1, 0)?,
                        args.int(2, AWEME_PAGE_SIZE)?,
                    )
                    .await?
            }
            "getUserCollectionList" => {
                client
                    .get_user_collection_list(
                        &args.string(0)?,
                        args.int(1, 0)?,
                        args.int(2, AWEME_PAGE_SIZE)?,
                    )
                    .await?
            }
            "getMusicAwemeList" => {
                client
                    .get_music_aweme_list(
                        &args.string(0)?,
                        args.int(1, 0)?,
                        args.int(2, AWEME_PAGE_SIZE)?,
                    )
                    .await?
            }
            "getChallengeAwemeList" => {
                client
                    .get_challenge_aweme_list(
                        &args.string(0)?,
                        args.int(1, 0)?,
                        args.int(2, AWEME_PAGE_SIZE)?,
                    )
                    .await?
            }
            "getMixAwemeList" => {
                client
                    .get_mix_aweme_list(
                        &args.string(0)?,
                        args.int(1, 0)?,
                        args.int(2, AWEME_PAGE_SIZE)?,
                    )
                    .await?
            }
            "searchAweme" => {
                client
                    .search_aweme(
                        &args.string(0)?,
                        args.int(1, 0)?,
                        args.int(2, SEARCH_PAGE_SIZE)?,
                        args.int(3, 0)?,
                    )
                    .await?
            }
            "getUserFollowing" => {
                client
                    .get_user_following(
                        &args.string(0)?,
                        args.int(1, 0)?,
                        args.int(2, RELATION_PAGE_SIZE)?,
                    )
                    .await?
            }
            "getUserFollowers" => {
                client
                    .get_user_followers(
                        &args.string(0)?,
                        args.int(1, 0)?,
                        args.int(2, RELATION_PAGE_SIZE)?,
                    )
                    .await?
            }
            "getAllUserAwemes" => Value::Array(
                client
                    .get_all_user_awemes(&args.string(0)?, args.int(1, 0)?)
                    .await?,
            ),
            "getAllMusicAwemes" => Value::Array(
                client
                    .get_all_music_awemes(&args.string(0)?, args.int(1, 0)?)
                    .await?,
            ),
            "getAllUserFollowers" => Value::Array(
                client
                    .get_all_user_followers(&args.string(0)?, args.int(1, 0)?)
                    .await?,
            ),
            other => return Err(DispatchError::UnknownMethod(other.to_string())),
        };

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::ClientConfig;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(DouyinApiClient::new(&ClientConfig::default()).unwrap())
    }

    #[test]
    fn test_args_parsing() {
        let params = vec![
            json!("MS4w"),
            json!("170"),
            json!(null),
            json!(-1),
            json!(7372484719365098803u64),
            json!(true),
        ];
        let args = Args {
            method: "getUserAwemeList",
            params: &params,
        };

        assert_eq!(args.string(0).unwrap(), "MS4w");
        assert_eq!(args.int::<i64>(1, 0).unwrap(), 170);
        assert_eq!(args.int::<u32>(2, 18).unwrap(), 18);
        assert_eq!(args.int::<u32>(9, 20).unwrap(), 20);
        assert!(matches!(
            args.int::<u32>(3, 0),
            Err(DispatchError::InvalidParams { .. })
        ));
        assert!(args.string(1).is_ok());
        assert!(args.string(2).is_err());
        assert_eq!(args.string(4).unwrap(), "7372484719365098803");
        assert!(args.string(5).is_err());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = dispatcher()
            .handle(
                "corr-1",
                DispatchRequest {
                    method: "deleteEverything".into(),
                    params: vec![],
                },
            )
            .await;

        assert!(!response.success);
        assert!(response.data.is_none());
        let error: Value = serde_json::from_str(response.error.as_deref().unwrap()).unwrap();
        assert_eq!(error["name"], "UnknownMethodError");
    }

    #[tokio::test]
    async fn test_missing_param_is_rejected_before_any_request() {
        let response = dispatcher()
            .handle(
                "corr-2",
                DispatchRequest {
                    method: "getAwemeDetail".into(),
                    params: vec![],
                },
            )
            .await;

        assert!(!response.success);
        let error: Value = serde_json::from_str(response.error.as_deref().unwrap()).unwrap();
        assert_eq!(error["name"], "InvalidParamsError");
        assert_eq!(error["method"], "getAwemeDetail");
    }

    #[test]
    fn test_worker_error_json() {
        let err = WorkerError {
            correlation_id: "c-9".into(),
            method: "getMixAwemeList".into(),
            params: vec![json!("mix")],
            source: DispatchError::Crawler(CrawlerError::Api {
                status_code: Some(2053),
                status_msg: Some("rate limited".into()),
                endpoint: "/aweme/v1/web/mix/aweme/".into(),
                params: vec![],
            }),
        };
        let json = err.to_json();
        assert_eq!(json["name"], "WorkerError");
        assert_eq!(json["correlationId"], "c-9");
        assert_eq!(json["causeName"], "ApiError");
        assert_eq!(json["cause"], "API error 2053: rate limited");
    }

    #[test]
    fn test_response_shape() {
        let ok = serde_json::to_value(DispatchResponse::ok(json!({"a": 1}))).unwrap();
        assert_eq!(ok, json!({"success": true, "data": {"a": 1}}));

        let failed = serde_json::to_value(DispatchResponse::failed("boom".into())).unwrap();
        assert_eq!(failed, json!({"success": false, "error": "boom"}));
    }
}
