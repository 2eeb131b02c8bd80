//! Fixed-layout body of the `a_bogus` token.
//!
//! The body is a sparse map of numbered slots. Slot numbers and the order in
//! which they are flattened are what the remote verifier decodes, so both are
//! kept as explicit tables instead of a struct layout.

use super::{
    alphabet::{self, Alphabet},
    rc4,
    sm3::Sm3,
};

pub const SLOT_COUNT: usize = 73;

/// Schema marker, always 44.
pub const SLOT_SCHEMA: usize = 18;
/// Start timestamp, low 32 bits big-endian in 20..=23, high parts in 24 and 25.
pub const SLOT_START: usize = 20;
pub const SLOT_START_HI: usize = 24;
pub const SLOT_START_HI2: usize = 25;
/// Argument tuple slots 26..=37.
pub const SLOT_ARG0: usize = 26;
pub const SLOT_ARG1: usize = 30;
pub const SLOT_ARG2: usize = 34;
pub const SLOT_QUERY_HASH: usize = 38;
pub const SLOT_SUFFIX_HASH: usize = 40;
pub const SLOT_UA_HASH: usize = 42;
/// End timestamp, low 32 bits big-endian in 44..=47, high parts in 49 and 50.
pub const SLOT_END: usize = 44;
pub const SLOT_VERSION: usize = 48;
pub const SLOT_END_HI: usize = 49;
pub const SLOT_END_HI2: usize = 50;
/// Page id, big-endian in 52..=55.
pub const SLOT_PAGE_ID: usize = 52;
/// App id, little-endian in 57..=60.
pub const SLOT_AID: usize = 57;
pub const SLOT_ENV_LEN: usize = 65;
pub const SLOT_TRACK_LEN: usize = 70;
pub const SLOT_CHECKSUM: usize = 72;

const SCHEMA: u32 = 44;
const VERSION: u32 = 3;
const PAGE_ID: u32 = 6241;
const AID: u32 = 6383;

/// Slots folded into the checksum, in fold order. Slot 34 is not part of it.
const CHECKSUM_SLOTS: [usize; 43] = [
    18, 20, 26, 30, 38, 40, 42, 21, 27, 31, 35, 39, 41, 43, 22, 28, 32, 36, 23, 29, 33, 37, 44,
    45, 46, 47, 48, 49, 50, 24, 25, 52, 53, 54, 55, 57, 58, 59, 60, 65, 66, 70, 71,
];

/// Order in which slots are written to the body, before the env descriptor.
const BODY_ORDER: [usize; 44] = [
    18, 20, 52, 26, 30, 34, 58, 38, 40, 53, 42, 21, 27, 54, 55, 31, 35, 57, 39, 41, 43, 22, 28,
    32, 60, 36, 23, 29, 33, 37, 44, 45, 59, 46, 47, 48, 49, 50, 24, 25, 65, 66, 70, 71,
];

const BODY_KEY: [u8; 1] = [121];

/// Hash-derived bytes that bind the token to the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDigest {
    pub query: [u8; 2],
    pub suffix: [u8; 2],
    pub user_agent: [u8; 2],
}

impl RequestDigest {
    pub fn compute(query: &str, suffix: &str, user_agent: &str, args: [u32; 3]) -> Self {
        let query_hash = Sm3::hash(&Sm3::hash(format!("{query}{suffix}").as_bytes()));
        let suffix_hash = Sm3::hash(&Sm3::hash(suffix.as_bytes()));

        let ua_units: Vec<u16> = user_agent.encode_utf16().collect();
        let ua_key = [0, 1, (args[2] & 0xff) as u8];
        let ua_cipher = rc4::encrypt_units(&ua_units, &ua_key);
        let ua_hash = Sm3::hash(alphabet::encode_units(&ua_cipher, Alphabet::S3).as_bytes());

        Self {
            query: [query_hash[21], query_hash[22]],
            suffix: [suffix_hash[21], suffix_hash[22]],
            user_agent: [ua_hash[23], ua_hash[24]],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotMap {
    slots: [u32; SLOT_COUNT],
}

impl SlotMap {
    pub fn build(
        args: [u32; 3],
        start_ms: u64,
        end_ms: u64,
        digest: &RequestDigest,
        env_len: usize,
    ) -> Self {
        let mut s = [0u32; SLOT_COUNT];

        s[SLOT_SCHEMA] = SCHEMA;
        put_timestamp(&mut s, SLOT_START, SLOT_START_HI, start_ms);

        put_be(&mut s, SLOT_ARG0, args[0]);
        s[SLOT_ARG1] = (args[1] / 256) & 0xff;
        s[SLOT_ARG1 + 1] = args[1] % 256;
        s[SLOT_ARG1 + 2] = (args[1] >> 24) & 0xff;
        s[SLOT_ARG1 + 3] = (args[1] >> 16) & 0xff;
        put_be(&mut s, SLOT_ARG2, args[2]);

        s[SLOT_QUERY_HASH] = u32::from(digest.query[0]);
        s[SLOT_QUERY_HASH + 1] = u32::from(digest.query[1]);
        s[SLOT_SUFFIX_HASH] = u32::from(digest.suffix[0]);
        s[SLOT_SUFFIX_HASH + 1] = u32::from(digest.suffix[1]);
        s[SLOT_UA_HASH] = u32::from(digest.user_agent[0]);
        s[SLOT_UA_HASH + 1] = u32::from(digest.user_agent[1]);

        put_timestamp(&mut s, SLOT_END, SLOT_END_HI, end_ms);
        s[SLOT_VERSION] = VERSION;

        put_be(&mut s, SLOT_PAGE_ID, PAGE_ID);
        for (i, b) in AID.to_le_bytes().iter().enumerate() {
            s[SLOT_AID + i] = u32::from(*b);
        }

        let env_len = env_len as u32;
        s[SLOT_ENV_LEN] = env_len & 0xff;
        s[SLOT_ENV_LEN + 1] = (env_len >> 8) & 0xff;
        s[SLOT_TRACK_LEN] = 0;
        s[SLOT_TRACK_LEN + 1] = 0;

        s[SLOT_CHECKSUM] = CHECKSUM_SLOTS.iter().fold(0, |acc, &i| acc ^ s[i]);

        Self { slots: s }
    }

    pub fn get(&self, index: usize) -> u32 {
        self.slots[index]
    }

    pub fn checksum(&self) -> u32 {
        self.slots[SLOT_CHECKSUM]
    }

    /// Ordered slots, then the env descriptor, then the checksum, as code units.
    pub fn flatten(&self, window_env: &str) -> Vec<u16> {
        let mut out: Vec<u16> = BODY_ORDER.iter().map(|&i| self.slots[i] as u16).collect();
        out.extend(window_env.encode_utf16());
        out.push(self.checksum() as u16);
        out
    }
}

/// Low 32 bits big-endian at `low`, then `ts / 2^32` and `ts / 2^40` at
/// `high` and `high + 1`. The high slots are not reduced to a byte.
fn put_timestamp(s: &mut [u32; SLOT_COUNT], low: usize, high: usize, ts: u64) {
    put_be(s, low, ts as u32);
    s[high] = (ts >> 32) as u32;
    s[high + 1] = (ts >> 40) as u32;
}

fn put_be(s: &mut [u32; SLOT_COUNT], at: usize, value: u32) {
    for (i, b) in value.to_be_bytes().iter().enumerate() {
        s[at + i] = u32::from(*b);
    }
}

/// Encrypted token body.
pub fn encrypt_body(slots: &SlotMap, window_env: &str) -> Vec<u16> {
    rc4::encrypt_units(&slots.flatten(window_env), &BODY_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-06-01T00:00:00Z in milliseconds.
    const START: u64 = 1_717_200_000_000;

    fn digest() -> RequestDigest {
        RequestDigest {
            query: [0x11, 0x22],
            suffix: [0x33, 0x44],
            user_agent: [0x55, 0x66],
        }
    }

    #[test]
    fn test_timestamp_slots() {
        let map = SlotMap::build([0, 1, 14], START, START + 3, &digest(), 65);
        let low = (START as u32).to_be_bytes();
        for i in 0..4 {
            assert_eq!(map.get(SLOT_START + i), u32::from(low[i]));
        }
        assert_eq!(map.get(SLOT_START_HI), (START / (1u64 << 32)) as u32);
        assert_eq!(map.get(SLOT_START_HI2), (START / (1u64 << 40)) as u32);
        assert_eq!(map.get(SLOT_END + 3), u32::from((START as u32 + 3) as u8));
        assert!(map.get(SLOT_START_HI) > 255);
    }

    #[test]
    fn test_static_slots() {
        let map = SlotMap::build([0, 1, 14], START, START, &digest(), 65);
        assert_eq!(map.get(SLOT_SCHEMA), 44);
        assert_eq!(map.get(SLOT_VERSION), 3);
        assert_eq!(
            (52..56).map(|i| map.get(i)).collect::<Vec<_>>(),
            vec![0, 0, 0x18, 0x61]
        );
        assert_eq!(
            (57..61).map(|i| map.get(i)).collect::<Vec<_>>(),
            vec![0xef, 0x18, 0, 0]
        );
        assert_eq!(map.get(SLOT_ENV_LEN), 65);
        assert_eq!(map.get(SLOT_ENV_LEN + 1), 0);
    }

    #[test]
    fn test_argument_slots() {
        let detail = SlotMap::build([0, 1, 14], START, START, &digest(), 65);
        let reply = SlotMap::build([0, 1, 8], START, START, &digest(), 65);

        assert_eq!(detail.get(30), 0);
        assert_eq!(detail.get(31), 1);
        assert_eq!(detail.get(37), 14);
        assert_eq!(reply.get(37), 8);
        for i in (0..SLOT_COUNT).filter(|&i| i != 37 && i != SLOT_CHECKSUM) {
            assert_eq!(detail.get(i), reply.get(i), "slot {i}");
        }
        assert_eq!(detail.checksum() ^ reply.checksum(), 14 ^ 8);
    }

    #[test]
    fn test_checksum_skips_slot_34() {
        let map = SlotMap::build([0, 1, 0x0100_0000], START, START + 7, &digest(), 300);
        assert_eq!(map.get(SLOT_ARG2), 1);

        let body = map.flatten("");
        let folded = body[..BODY_ORDER.len()]
            .iter()
            .fold(0u32, |acc, &u| acc ^ u32::from(u));
        assert_eq!(folded ^ map.get(SLOT_ARG2), map.checksum());
    }

    #[test]
    fn test_flatten_layout() {
        let env = "1536|747|Win32";
        let map = SlotMap::build([0, 1, 14], START, START, &digest(), env.len());
        let body = map.flatten(env);

        assert_eq!(body.len(), BODY_ORDER.len() + env.len() + 1);
        assert_eq!(body[0], 44);
        assert_eq!(body[7], 0x11);
        assert_eq!(body[8], 0x33);
        assert_eq!(body[10], 0x55);
        let env_units: Vec<u16> = env.encode_utf16().collect();
        assert_eq!(&body[44..44 + env.len()], &env_units[..]);
        assert_eq!(*body.last().unwrap(), map.checksum() as u16);
    }

    #[test]
    fn test_body_encryption_round_trips() {
        let map = SlotMap::build([0, 1, 8], START, START + 1, &digest(), 5);
        let body = encrypt_body(&map, "Win32");
        assert_eq!(rc4::encrypt_units(&body, &BODY_KEY), map.flatten("Win32"));
    }

    #[test]
    fn test_request_digest_depends_on_inputs() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
        let base = RequestDigest::compute("aweme_id=1", "cus", ua, [0, 1, 14]);

        assert_eq!(base, RequestDigest::compute("aweme_id=1", "cus", ua, [0, 1, 14]));
        let other_query = RequestDigest::compute("aweme_id=2", "cus", ua, [0, 1, 14]);
        assert_eq!(base.suffix, other_query.suffix);
        assert_eq!(base.user_agent, other_query.user_agent);

        let reply = RequestDigest::compute("aweme_id=1", "cus", ua, [0, 1, 8]);
        assert_eq!(base.query, reply.query);
    }

    #[test]
    fn test_suffix_digest_is_double_hash() {
        let d = RequestDigest::compute("", "cus", "", [0, 1, 14]);
        let h = Sm3::hash(&Sm3::hash(b"cus"));
        assert_eq!(d.suffix, [h[21], h[22]]);
        assert_eq!(d.query, d.suffix);
    }
}
