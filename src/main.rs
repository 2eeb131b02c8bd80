use std::path::Path;

use douyin_crawler::{
    Config, DispatchRequest, Dispatcher, DouyinApiClient, common::logger,
    dispatch::DispatchResponse,
};
use serde_json::Value;
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "config.toml";
const USAGE: &str = "usage: douyin-crawler <method> [json-param ...]";

/// Bare words are taken as strings, anything parseable as JSON as-is.
fn parse_param(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path =
        std::env::var("DOUYIN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = if Path::new(&config_path).exists() {
        Config::load(&config_path)?
    } else {
        Config::from_env()
    };

    logger::init(&config);

    let mut args = std::env::args().skip(1);
    let Some(method) = args.next() else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };
    let params: Vec<Value> = args.map(|a| parse_param(&a)).collect();

    let client = DouyinApiClient::new(&config.client)?;
    let dispatcher = Dispatcher::new(client);

    let correlation_id = uuid::Uuid::new_v4().to_string();
    info!("Dispatching {} as {}", method, correlation_id);

    let response: DispatchResponse = dispatcher
        .handle(&correlation_id, DispatchRequest { method, params })
        .await;

    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.success {
        std::process::exit(1);
    }
    Ok(())
}
