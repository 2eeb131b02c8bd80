/// Lookup tables for the 6-bit group encoder. `S0` is the standard base64
/// table; the rest are the scrambled variants used by the web client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    S0,
    S1,
    S2,
    S3,
    S4,
}

impl Alphabet {
    pub const ALL: [Alphabet; 5] = [Self::S0, Self::S1, Self::S2, Self::S3, Self::S4];

    pub fn table(self) -> &'static [u8] {
        match self {
            Self::S0 => b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=",
            Self::S1 => b"Dkdpgh4ZKsQB80/Mfvw36XI1R25+WUAlEi7NLboqYTOPuzmFjJnryx9HVGcaStCe=",
            Self::S2 => b"Dkdpgh4ZKsQB80/Mfvw36XI1R25-WUAlEi7NLboqYTOPuzmFjJnryx9HVGcaStCe=",
            Self::S3 => b"ckdp1h4ZKsUB80/Mfvw36XIgR25+WQAlEi7NLboqYTOPuzmFjJnryx9HVGDaStCe",
            Self::S4 => b"Dkdpgh2ZmsQB80/MfvV36XI1R45-WUAlEixNLwoqYTOPuzKFjJnry79HbGcaStCe",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::S0 => "s0",
            Self::S1 => "s1",
            Self::S2 => "s2",
            Self::S3 => "s3",
            Self::S4 => "s4",
        }
    }
}

pub fn encode(input: &[u8], alphabet: Alphabet) -> String {
    let units: Vec<u16> = input.iter().map(|&b| u16::from(b)).collect();
    encode_units(&units, alphabet)
}

/// Packs every complete group of three units into four symbols. A trailing
/// group of one or two units produces no output.
pub fn encode_units(input: &[u16], alphabet: Alphabet) -> String {
    let table = alphabet.table();
    let mut out = String::with_capacity(input.len() / 3 * 4);

    for group in input.chunks_exact(3) {
        let n = (u32::from(group[0]) << 16) | (u32::from(group[1]) << 8) | u32::from(group[2]);

        for index in [
            (n & 0x00fc_0000) >> 18,
            (n & 0x0003_f000) >> 12,
            (n & 0x0000_0fc0) >> 6,
            n & 0x3f,
        ] {
            out.push(char::from(table[index as usize]));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    #[test]
    fn test_s0_matches_base64_on_full_groups() {
        let data: Vec<u8> = (0..=255u8).collect();
        let full = &data[..255];
        assert_eq!(encode(full, Alphabet::S0), STANDARD.encode(full));
        assert_eq!(encode(b"Man", Alphabet::S0), "TWFu");
    }

    #[test]
    fn test_incomplete_tail_is_dropped() {
        assert_eq!(encode(b"", Alphabet::S4), "");
        assert_eq!(encode(b"Ma", Alphabet::S0), "");
        assert_eq!(encode(b"Hello", Alphabet::S0), "SGVs");
        for len in 0..20usize {
            let data = vec![0xa5u8; len];
            for alphabet in Alphabet::ALL {
                assert_eq!(encode(&data, alphabet).len(), len / 3 * 4);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let data = b"Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
        for alphabet in Alphabet::ALL {
            assert_eq!(encode(data, alphabet), encode(data, alphabet));
        }
    }

    #[test]
    fn test_s1_and_s2_differ_in_one_symbol() {
        let diff: Vec<usize> = Alphabet::S1
            .table()
            .iter()
            .zip(Alphabet::S2.table())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(diff, vec![27]);
        assert_eq!(Alphabet::S1.table()[27], b'+');
        assert_eq!(Alphabet::S2.table()[27], b'-');
    }

    #[test]
    fn test_tables_have_unique_symbols() {
        for alphabet in Alphabet::ALL {
            let table = &alphabet.table()[..64];
            let mut seen = std::collections::HashSet::new();
            assert!(table.iter().all(|c| seen.insert(*c)), "{}", alphabet.name());
        }
    }

    #[test]
    fn test_wide_units_use_same_masks() {
        // 400 = 0x190: bit 8 lands in the neighbouring symbol.
        let wide = encode_units(&[0, 400, 0], Alphabet::S0);
        let n: u32 = 400 << 8;
        let table = Alphabet::S0.table();
        let expected: String = [
            (n & 0x00fc_0000) >> 18,
            (n & 0x0003_f000) >> 12,
            (n & 0x0000_0fc0) >> 6,
            n & 0x3f,
        ]
        .iter()
        .map(|&i| char::from(table[i as usize]))
        .collect();
        assert_eq!(wide, expected);
        assert_ne!(wide, encode(&[0, 144, 0], Alphabet::S0));
    }
}
