//! `a_bogus` request signing.
//!
//! A token is built from an SM3 fingerprint of the query string, suffix and
//! user agent, a fixed-layout slot map, two RC4 passes and the scrambled
//! alphabet encoder. Tokens embed the wall clock and fresh randomness, so two
//! calls with identical inputs never produce the same string.

pub mod alphabet;
pub mod bogus;
pub mod random;
pub mod rc4;
pub mod sm3;

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::trace;

pub use alphabet::Alphabet;
pub use bogus::{RequestDigest, SlotMap};
pub use sm3::{Digest, DigestFormat, HashInput, Sm3};

pub const DEFAULT_SUFFIX: &str = "cus";

/// Screen and viewport descriptor of a 1536x864 Windows desktop browser.
pub const DEFAULT_WINDOW_ENV: &str =
    "1536|747|1536|834|0|30|0|0|1536|834|1536|864|1525|747|24|24|Win32";

/// Argument tuples of the two signing entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignVariant {
    /// Item detail and music list endpoints.
    Detail,
    /// Follower list endpoint.
    Reply,
}

impl SignVariant {
    pub fn args(self) -> [u32; 3] {
        match self {
            Self::Detail => [0, 1, 14],
            Self::Reply => [0, 1, 8],
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignRequest<'a> {
    pub query: &'a str,
    pub user_agent: &'a str,
    pub args: [u32; 3],
    pub suffix: &'a str,
    pub window_env: &'a str,
}

impl<'a> SignRequest<'a> {
    pub fn new(query: &'a str, user_agent: &'a str, variant: SignVariant) -> Self {
        Self {
            query,
            user_agent,
            args: variant.args(),
            suffix: DEFAULT_SUFFIX,
            window_env: DEFAULT_WINDOW_ENV,
        }
    }

    pub fn with_suffix(mut self, suffix: &'a str) -> Self {
        self.suffix = suffix;
        self
    }

    pub fn with_window_env(mut self, window_env: &'a str) -> Self {
        self.window_env = window_env;
        self
    }
}

pub fn sign(request: &SignRequest<'_>) -> String {
    let header = random::random_header();
    let start_ms = now_ms();
    let end_ms = now_ms();
    sign_with(request, header, start_ms, end_ms)
}

/// Assembles a token from an explicit header and timestamps.
pub fn sign_with(
    request: &SignRequest<'_>,
    header: [u8; random::HEADER_LEN],
    start_ms: u64,
    end_ms: u64,
) -> String {
    let digest = RequestDigest::compute(
        request.query,
        request.suffix,
        request.user_agent,
        request.args,
    );

    let env_len = request.window_env.encode_utf16().count();
    let slots = SlotMap::build(request.args, start_ms, end_ms, &digest, env_len);
    let body = bogus::encrypt_body(&slots, request.window_env);

    let mut units: Vec<u16> = header.iter().map(|&b| u16::from(b)).collect();
    units.extend(body);

    let mut token = alphabet::encode_units(&units, Alphabet::S4);
    token.push('=');

    trace!(len = token.len(), args = ?request.args, "a_bogus generated");
    token
}

pub fn sign_detail(query: &str, user_agent: &str) -> String {
    sign(&SignRequest::new(query, user_agent, SignVariant::Detail))
}

pub fn sign_reply(query: &str, user_agent: &str) -> String {
    sign(&SignRequest::new(query, user_agent, SignVariant::Reply))
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
