//! SM3 256-bit hash (GB/T 32905-2016), streaming.

const IV: [u32; 8] = [
    0x7380_166f,
    0x4914_b2b9,
    0x1724_42d7,
    0xda8a_0600,
    0xa96f_30bc,
    0x1631_38aa,
    0xe38d_ee4d,
    0xb0fb_0e4e,
];

const T_LOW: u32 = 0x79cc_4519;
const T_HIGH: u32 = 0x7a87_9d8a;

const BLOCK_LEN: usize = 64;

/// Output format of [`Sm3::digest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestFormat {
    Hex,
    Bytes,
}

/// Data fed into the hash. Text is expanded to its UTF-8 bytes, which is what
/// percent-encoding a string and reading back the escaped char codes yields.
#[derive(Debug, Clone, Copy)]
pub enum HashInput<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
}

impl<'a> HashInput<'a> {
    fn as_bytes(&self) -> &'a [u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Bytes(b) => b,
        }
    }
}

impl<'a> From<&'a str> for HashInput<'a> {
    fn from(s: &'a str) -> Self {
        Self::Text(s)
    }
}

impl<'a> From<&'a [u8]> for HashInput<'a> {
    fn from(b: &'a [u8]) -> Self {
        Self::Bytes(b)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Digest {
    Hex(String),
    Bytes([u8; 32]),
}

#[derive(Debug, Clone)]
pub struct Sm3 {
    reg: [u32; 8],
    chunk: Vec<u8>,
    size: u64,
}

impl Default for Sm3 {
    fn default() -> Self {
        Self::new()
    }
}

impl Sm3 {
    pub fn new() -> Self {
        Self {
            reg: IV,
            chunk: Vec::with_capacity(BLOCK_LEN),
            size: 0,
        }
    }

    /// One-shot hash of raw bytes.
    pub fn hash(data: &[u8]) -> [u8; 32] {
        let mut sm3 = Self::new();
        sm3.write(HashInput::Bytes(data));
        sm3.finish()
    }

    pub fn reset(&mut self) {
        self.reg = IV;
        self.chunk.clear();
        self.size = 0;
    }

    pub fn write<'a>(&mut self, input: impl Into<HashInput<'a>>) {
        let mut bytes = input.into().as_bytes();
        self.size += bytes.len() as u64;

        while !bytes.is_empty() {
            let take = (BLOCK_LEN - self.chunk.len()).min(bytes.len());
            self.chunk.extend_from_slice(&bytes[..take]);
            bytes = &bytes[take..];

            if self.chunk.len() == BLOCK_LEN {
                let mut block = [0u8; BLOCK_LEN];
                block.copy_from_slice(&self.chunk);
                self.compress(&block);
                self.chunk.clear();
            }
        }
    }

    /// Finalizes and resets. When `input` is given the state is reset first
    /// and only `input` is hashed.
    pub fn digest<'a>(&mut self, format: DigestFormat, input: Option<HashInput<'a>>) -> Digest {
        if let Some(input) = input {
            self.reset();
            self.write(input);
        }

        let out = self.finish();
        match format {
            DigestFormat::Hex => Digest::Hex(hex::encode(out)),
            DigestFormat::Bytes => Digest::Bytes(out),
        }
    }

    fn finish(&mut self) -> [u8; 32] {
        let bit_len = self.size.wrapping_mul(8);

        let mut tail = std::mem::take(&mut self.chunk);
        tail.push(0x80);
        while tail.len() % BLOCK_LEN != 56 {
            tail.push(0);
        }
        tail.extend_from_slice(&bit_len.to_be_bytes());

        for block in tail.chunks_exact(BLOCK_LEN) {
            let mut buf = [0u8; BLOCK_LEN];
            buf.copy_from_slice(block);
            self.compress(&buf);
        }

        let mut out = [0u8; 32];
        for (i, word) in self.reg.iter().enumerate() {
            out[4 * i..4 * i + 4].copy_from_slice(&word.to_be_bytes());
        }

        self.reset();
        out
    }

    fn compress(&mut self, block: &[u8; BLOCK_LEN]) {
        let w = expand(block);
        let mut r = self.reg;

        for j in 0..64 {
            let a12 = r[0].rotate_left(12);
            let ss1 = a12
                .wrapping_add(r[4])
                .wrapping_add(t(j).rotate_left(j as u32 % 32))
                .rotate_left(7);
            let ss2 = ss1 ^ a12;
            let tt1 = ff(j, r[0], r[1], r[2])
                .wrapping_add(r[3])
                .wrapping_add(ss2)
                .wrapping_add(w[j + 68]);
            let tt2 = gg(j, r[4], r[5], r[6])
                .wrapping_add(r[7])
                .wrapping_add(ss1)
                .wrapping_add(w[j]);

            r[3] = r[2];
            r[2] = r[1].rotate_left(9);
            r[1] = r[0];
            r[0] = tt1;
            r[7] = r[6];
            r[6] = r[5].rotate_left(19);
            r[5] = r[4];
            r[4] = p0(tt2);
        }

        for (reg, v) in self.reg.iter_mut().zip(r) {
            *reg ^= v;
        }
    }
}

/// W[0..68] followed by W'[0..64] at offset 68.
fn expand(block: &[u8; BLOCK_LEN]) -> [u32; 132] {
    let mut w = [0u32; 132];

    for (i, word) in block.chunks_exact(4).enumerate() {
        w[i] = u32::from_be_bytes([word[0], word[1], word[2], word[3]]);
    }

    for i in 16..68 {
        let a = w[i - 16] ^ w[i - 9] ^ w[i - 3].rotate_left(15);
        w[i] = p1(a) ^ w[i - 13].rotate_left(7) ^ w[i - 6];
    }

    for i in 0..64 {
        w[i + 68] = w[i] ^ w[i + 4];
    }

    w
}

#[inline]
fn t(j: usize) -> u32 {
    if j < 16 { T_LOW } else { T_HIGH }
}

#[inline]
fn ff(j: usize, x: u32, y: u32, z: u32) -> u32 {
    if j < 16 {
        x ^ y ^ z
    } else {
        (x & y) | (x & z) | (y & z)
    }
}

#[inline]
fn gg(j: usize, x: u32, y: u32, z: u32) -> u32 {
    if j < 16 {
        x ^ y ^ z
    } else {
        (x & y) | (!x & z)
    }
}

#[inline]
fn p0(x: u32) -> u32 {
    x ^ x.rotate_left(9) ^ x.rotate_left(17)
}

#[inline]
fn p1(x: u32) -> u32 {
    x ^ x.rotate_left(15) ^ x.rotate_left(23)
}
