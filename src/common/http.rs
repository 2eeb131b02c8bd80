use reqwest::{Client, Error};

use super::OrderedMap;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36";

pub struct HttpClient;

impl HttpClient {
  pub fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
  }

  /// Cookies are managed by the session, and timeouts are set per attempt,
  /// so the client itself carries neither.
  pub fn new() -> Result<Client, Error> {
    Client::builder().gzip(true).deflate(true).build()
  }
}

/// Percent-encodes like the browser's `encodeURIComponent`: everything except
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )` is escaped as UTF-8 `%XX`.
pub fn encode_uri_component(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for b in s.as_bytes() {
    match b {
      b'A'..=b'Z'
      | b'a'..=b'z'
      | b'0'..=b'9'
      | b'-'
      | b'_'
      | b'.'
      | b'!'
      | b'~'
      | b'*'
      | b'\''
      | b'('
      | b')' => out.push(*b as char),
      b => out.push_str(&format!("%{:02X}", b)),
    }
  }
  out
}

/// `key=value` pairs joined by `&`, values encoded, keys verbatim, map order kept.
pub fn build_query_string(params: &OrderedMap) -> String {
  params
    .iter()
    .map(|(k, v)| format!("{}={}", k, encode_uri_component(v)))
    .collect::<Vec<_>>()
    .join("&")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_encode_uri_component_reserved() {
    assert_eq!(encode_uri_component("a b&c=d/e?f"), "a%20b%26c%3Dd%2Fe%3Ff");
    assert_eq!(encode_uri_component("-_.!~*'()"), "-_.!~*'()");
    assert_eq!(encode_uri_component("1%7C"), "1%257C");
    assert_eq!(encode_uri_component("+=,;"), "%2B%3D%2C%3B");
  }

  #[test]
  fn test_encode_uri_component_utf8() {
    assert_eq!(encode_uri_component("抖音"), "%E6%8A%96%E9%9F%B3");
  }

  #[test]
  fn test_query_string_keeps_order() {
    let params: OrderedMap = [("keyword", "cat videos"), ("offset", "0"), ("aid", "6383")]
      .into_iter()
      .collect();
    assert_eq!(
      build_query_string(&params),
      "keyword=cat%20videos&offset=0&aid=6383"
    );
  }
}
