pub mod common;
pub mod configs;
pub mod dispatch;
pub mod douyin;
pub mod sign;

pub use common::{CrawlerError, Result};
pub use configs::{ClientConfig, Config};
pub use dispatch::{DispatchRequest, DispatchResponse, Dispatcher};
pub use douyin::{DouyinApiClient, HttpRequestClient};
pub use sign::{sign_detail, sign_reply};
