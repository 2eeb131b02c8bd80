use std::future::Future;

use serde_json::Value;
use tracing::debug;

use super::{endpoints::Endpoint, request::HttpRequestClient};
use crate::{
    common::{OrderedMap, Result},
    configs::ClientConfig,
};

pub const AWEME_PAGE_SIZE: u32 = 18;
pub const RELATION_PAGE_SIZE: u32 = 20;
pub const SEARCH_PAGE_SIZE: u32 = 10;

/// Item array of aweme list pages.
pub const AWEME_LIST_KEY: &str = "aweme_list";
/// Item array of follower/following pages.
pub const FOLLOWERS_KEY: &str = "followers";

/// Typed wrappers over the Douyin web endpoints. Every method returns the
/// raw response body once `status_code` is 0.
pub struct DouyinApiClient {
    http: HttpRequestClient,
}

fn cursor_params(id_key: &str, id: &str, max_cursor: i64, count: u32) -> OrderedMap {
    let mut params = OrderedMap::new();
    params.insert(id_key, id);
    params.insert("max_cursor", max_cursor.to_string());
    params.insert("count", count.to_string());
    params
}

impl DouyinApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            http: HttpRequestClient::new(config)?,
        })
    }

    pub fn http(&self) -> &HttpRequestClient {
        &self.http
    }

    pub async fn get_aweme_detail(&self, aweme_id: &str) -> Result<Value> {
        let mut params = OrderedMap::new();
        params.insert("aweme_id", aweme_id);
        self.http.get(Endpoint::AwemeDetail.path(), params).await
    }

    pub async fn get_user_aweme_list(
        &self,
        sec_user_id: &str,
        max_cursor: i64,
        count: u32,
    ) -> Result<Value> {
        let params = cursor_params("sec_user_id", sec_user_id, max_cursor, count);
        self.http.get(Endpoint::UserPost.path(), params).await
    }

    pub async fn get_user_favorite_list(
        &self,
        sec_user_id: &str,
        max_cursor: i64,
        count: u32,
    ) -> Result<Value> {
        let params = cursor_params("sec_user_id", sec_user_id, max_cursor, count);
        self.http.get(Endpoint::UserFavorite.path(), params).await
    }

    pub async fn get_user_collection_list(
        &self,
        sec_user_id: &str,
        max_cursor: i64,
        count: u32,
    ) -> Result<Value> {
        let params = cursor_params("sec_user_id", sec_user_id, max_cursor, count);
        self.http.get(Endpoint::UserCollection.path(), params).await
    }

    pub async fn get_music_aweme_list(
        &self,
        music_id: &str,
        max_cursor: i64,
        count: u32,
    ) -> Result<Value> {
        let params = cursor_params("music_id", music_id, max_cursor, count);
        self.http.get(Endpoint::MusicAweme.path(), params).await
    }

    pub async fn get_challenge_aweme_list(
        &self,
        challenge_id: &str,
        max_cursor: i64,
        count: u32,
    ) -> Result<Value> {
        let params = cursor_params("challenge_id", challenge_id, max_cursor, count);
        self.http.get(Endpoint::ChallengeAweme.path(), params).await
    }

    pub async fn get_mix_aweme_list(
        &self,
        mix_id: &str,
        max_cursor: i64,
        count: u32,
    ) -> Result<Value> {
        let params = cursor_params("mix_id", mix_id, max_cursor, count);
        self.http.get(Endpoint::MixAweme.path(), params).await
    }

    pub async fn search_aweme(
        &self,
        keyword: &str,
        offset: u32,
        count: u32,
        search_type: u32,
    ) -> Result<Value> {
        let mut params = OrderedMap::new();
        params.insert("keyword", keyword);
        params.insert("offset", offset.to_string());
        params.insert("count", count.to_string());
        params.insert("search_type", search_type.to_string());
        self.http.get(Endpoint::SearchItem.path(), params).await
    }

    pub async fn get_user_following(
        &self,
        sec_user_id: &str,
        max_cursor: i64,
        count: u32,
    ) -> Result<Value> {
        let params = cursor_params("sec_user_id", sec_user_id, max_cursor, count);
        self.http.get(Endpoint::UserFollowing.path(), params).await
    }

    pub async fn get_user_followers(
        &self,
        sec_user_id: &str,
        max_cursor: i64,
        count: u32,
    ) -> Result<Value> {
        let params = cursor_params("sec_user_id", sec_user_id, max_cursor, count);
        self.http.get(Endpoint::UserFollower.path(), params).await
    }

    /// Walks a cursor-paginated listing from cursor 0. Items are taken from
    /// `items_key` of each page; the walk stops when `has_more` is falsy,
    /// when a page comes back empty, or once `limit` items are collected
    /// (`0` means no limit).
    pub async fn fetch_all<F, Fut>(
        &self,
        mut fetch: F,
        items_key: &str,
        limit: usize,
    ) -> Result<Vec<Value>>
    where
        F: FnMut(i64) -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let mut results = Vec::new();
        let mut cursor = 0;

        loop {
            let page = fetch(cursor).await?;

            let items = page
                .get(items_key)
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            let page_len = items.len();
            results.extend(items);

            if limit > 0 && results.len() >= limit {
                results.truncate(limit);
                return Ok(results);
            }

            let has_more = page.get("has_more").is_some_and(is_truthy);
            debug!(
                "Fetched page at cursor {} ({} items, has_more: {})",
                cursor, page_len, has_more
            );
            if !has_more || page_len == 0 {
                return Ok(results);
            }

            cursor = page.get("max_cursor").and_then(as_cursor).unwrap_or(0);
        }
    }

    pub async fn get_all_user_awemes(&self, sec_user_id: &str, limit: usize) -> Result<Vec<Value>> {
        self.fetch_all(
            |cursor| self.get_user_aweme_list(sec_user_id, cursor, AWEME_PAGE_SIZE),
            AWEME_LIST_KEY,
            limit,
        )
        .await
    }

    pub async fn get_all_music_awemes(&self, music_id: &str, limit: usize) -> Result<Vec<Value>> {
        self.fetch_all(
            |cursor| self.get_music_aweme_list(music_id, cursor, AWEME_PAGE_SIZE),
            AWEME_LIST_KEY,
            limit,
        )
        .await
    }

    pub async fn get_all_user_followers(
        &self,
        sec_user_id: &str,
        limit: usize,
    ) -> Result<Vec<Value>> {
        self.fetch_all(
            |cursor| self.get_user_followers(sec_user_id, cursor, RELATION_PAGE_SIZE),
            FOLLOWERS_KEY,
            limit,
        )
        .await
    }
}

/// `has_more` arrives as a bool on some endpoints and 0/1 on others.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}

fn as_cursor(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
