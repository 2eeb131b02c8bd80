use rand::Rng;

use crate::{common::OrderedMap, configs::ClientConfig};

/// Character pool for synthesized `msToken` values, reproduced exactly as
/// the web client uses it (note the doubled `G`/`g` in place of `J`/`j`).
const MS_TOKEN_CHARSET: &[u8] = b"ABCDEFGHIGKLMNOPQRSTUVWXYZabcdefghigklmnopqrstuvwxyz0123456789=";
pub const MS_TOKEN_LEN: usize = 120;

const WEBID_MIN: u64 = 1_000_000_000_000_000_000;
const WEBID_MAX: u64 = 10_000_000_000_000_000_000;

/// Placeholder `ttwid` the server accepts before issuing a real one.
const TTWID_PLACEHOLDER: &str = "1%7C";

/// Cookie jar plus the two identifiers fixed at construction.
#[derive(Debug, Clone)]
pub struct Session {
    cookies: OrderedMap,
    ms_token: String,
    webid: String,
}

impl Session {
    /// `msToken` comes from the cookie, then the config, then is synthesized.
    /// `webid` comes from the config or is synthesized.
    pub fn bootstrap(config: &ClientConfig) -> Self {
        let mut cookies = parse_cookie(&config.cookie);

        let ms_token = cookies
            .get("msToken")
            .map(str::to_string)
            .or_else(|| config.ms_token.clone().filter(|t| !t.is_empty()))
            .unwrap_or_else(generate_ms_token);

        let webid = config
            .webid
            .clone()
            .filter(|w| !w.is_empty())
            .unwrap_or_else(generate_webid);

        if !cookies.contains_key("msToken") {
            cookies.insert("msToken", ms_token.clone());
        }
        if !cookies.contains_key("ttwid") {
            cookies.insert("ttwid", TTWID_PLACEHOLDER);
        }

        Self {
            cookies,
            ms_token,
            webid,
        }
    }

    pub fn ms_token(&self) -> &str {
        &self.ms_token
    }

    pub fn webid(&self) -> &str {
        &self.webid
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name)
    }

    pub fn set_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name, value);
    }

    pub fn cookies(&self) -> &OrderedMap {
        &self.cookies
    }

    /// `k=v; k=v` in jar order.
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Applies `Set-Cookie` header values. Only the leading `name=value`
    /// segment is used; attributes are ignored.
    pub fn apply_set_cookies<'a>(&mut self, headers: impl IntoIterator<Item = &'a str>) {
        for header in headers {
            let pair = header.split(';').next().unwrap_or_default();
            if let Some((key, value)) = split_pair(pair) {
                self.cookies.insert(key, value);
            }
        }
    }
}

fn split_pair(pair: &str) -> Option<(&str, &str)> {
    let (key, value) = pair.trim().split_once('=')?;
    let key = key.trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Parses a `Cookie` header. Pairs with an empty name or value are dropped.
pub fn parse_cookie(raw: &str) -> OrderedMap {
    raw.split(';').filter_map(split_pair).collect()
}

pub fn generate_ms_token() -> String {
    let mut rng = rand::thread_rng();
    (0..MS_TOKEN_LEN)
        .map(|_| MS_TOKEN_CHARSET[rng.gen_range(0..MS_TOKEN_CHARSET.len())] as char)
        .collect()
}

/// 19 decimal digits.
pub fn generate_webid() -> String {
    rand::thread_rng()
        .gen_range(WEBID_MIN..WEBID_MAX)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_skips_empty() {
        let jar = parse_cookie(" a=1; =x ; b= ; c=x=y;d ;e=5");
        assert_eq!(
            jar.to_pairs(),
            vec![
                ("a".to_string(), "1".to_string()),
                ("c".to_string(), "x=y".to_string()),
                ("e".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn test_bootstrap_prefers_cookie_ms_token() {
        let config = ClientConfig {
            ms_token: Some("from-config".into()),
            ..ClientConfig::with_cookie("msToken=from-cookie; sessionid=s")
        };
        let session = Session::bootstrap(&config);
        assert_eq!(session.ms_token(), "from-cookie");
        assert_eq!(
            session.cookie_header(),
            "msToken=from-cookie; sessionid=s; ttwid=1%7C"
        );
    }

    #[test]
    fn test_bootstrap_uses_configured_values() {
        let config = ClientConfig {
            ms_token: Some("from-config".into()),
            webid: Some("7362810250930783783".into()),
            ..ClientConfig::with_cookie("ttwid=1%7Creal")
        };
        let session = Session::bootstrap(&config);
        assert_eq!(session.ms_token(), "from-config");
        assert_eq!(session.webid(), "7362810250930783783");
        assert_eq!(session.cookie("msToken"), Some("from-config"));
        assert_eq!(session.cookie("ttwid"), Some("1%7Creal"));
    }

    #[test]
    fn test_bootstrap_synthesizes_identity() {
        let session = Session::bootstrap(&ClientConfig::default());
        assert_eq!(session.ms_token().len(), MS_TOKEN_LEN);
        assert!(
            session
                .ms_token()
                .bytes()
                .all(|b| MS_TOKEN_CHARSET.contains(&b))
        );
        assert_eq!(session.cookie("msToken"), Some(session.ms_token()));
        assert_eq!(session.cookie("ttwid"), Some(TTWID_PLACEHOLDER));

        let webid = session.webid();
        assert_eq!(webid.len(), 19);
        assert!(webid.bytes().all(|b| b.is_ascii_digit()));
        assert_ne!(&webid[..1], "0");
    }

    #[test]
    fn test_set_cookie_last_write_wins() {
        let mut session = Session::bootstrap(&ClientConfig::default());
        session.apply_set_cookies(["foo=bar; Path=/; HttpOnly"]);
        assert_eq!(session.cookie("foo"), Some("bar"));

        session.apply_set_cookies(["foo=baz; Max-Age=60", "tok=a=b; Secure", "empty=; Path=/"]);
        assert_eq!(session.cookie("foo"), Some("baz"));
        assert_eq!(session.cookie("tok"), Some("a=b"));
        assert_eq!(session.cookie("empty"), None);
    }
}
