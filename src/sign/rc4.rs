//! RC4 keystream. The permutation is rebuilt for every call.

struct Rc4 {
    s: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    fn new(key: &[u8]) -> Self {
        let mut s = [0u8; 256];
        for (i, v) in s.iter_mut().enumerate() {
            *v = i as u8;
        }

        // An empty key schedules as a single zero byte.
        let key = if key.is_empty() { &[0u8][..] } else { key };

        let mut j = 0u8;
        for i in 0..256 {
            j = j.wrapping_add(s[i]).wrapping_add(key[i % key.len()]);
            s.swap(i, j as usize);
        }

        Self { s, i: 0, j: 0 }
    }

    fn next_byte(&mut self) -> u8 {
        self.i = self.i.wrapping_add(1);
        self.j = self.j.wrapping_add(self.s[self.i as usize]);
        self.s.swap(self.i as usize, self.j as usize);
        let t = self.s[self.i as usize].wrapping_add(self.s[self.j as usize]);
        self.s[t as usize]
    }
}

pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Vec<u8> {
    let mut rc4 = Rc4::new(key);
    plaintext.iter().map(|b| b ^ rc4.next_byte()).collect()
}

/// Same keystream applied to UTF-16 code units; bits above the low byte pass
/// through untouched.
pub fn encrypt_units(plaintext: &[u16], key: &[u8]) -> Vec<u16> {
    let mut rc4 = Rc4::new(key);
    plaintext
        .iter()
        .map(|u| u ^ u16::from(rc4.next_byte()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        assert_eq!(
            hex::encode(encrypt(b"Plaintext", b"Key")),
            "bbf316e8d940af0ad3"
        );
        assert_eq!(hex::encode(encrypt(b"pedia", b"Wiki")), "1021bf0420");
        assert_eq!(
            hex::encode(encrypt(b"Attack at dawn", b"Secret")),
            "45a01f645fc35b383552544b9bf5"
        );
    }

    #[test]
    fn test_involution() {
        let plain: Vec<u8> = (0..=255u8).rev().chain(0..=255u8).collect();
        let keys: [&[u8]; 3] = [b"y", b"\x00\x01\x0e", b"a much longer key than usual"];
        for key in keys {
            let once = encrypt(&plain, key);
            assert_ne!(once, plain);
            assert_eq!(encrypt(&once, key), plain);
        }
    }

    #[test]
    fn test_units_match_bytes_in_low_range() {
        let bytes = b"Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
        let units: Vec<u16> = bytes.iter().map(|&b| u16::from(b)).collect();

        let expected: Vec<u16> = encrypt(bytes, &[121])
            .into_iter()
            .map(u16::from)
            .collect();
        assert_eq!(encrypt_units(&units, &[121]), expected);
    }

    #[test]
    fn test_units_keep_high_bits() {
        let out = encrypt_units(&[400, 0x4e2d], &[121]);
        assert_eq!(out[0] & 0xff00, 400 & 0xff00);
        assert_eq!(out[1] & 0xff00, 0x4e00);
        assert_eq!(encrypt_units(&out, &[121]), vec![400, 0x4e2d]);
    }

    #[test]
    fn test_empty_key_is_zero_byte() {
        assert_eq!(encrypt(b"data", b""), encrypt(b"data", b"\x00"));
    }
}
