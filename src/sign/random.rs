use rand::Rng;

/// Option bytes mixed into each draw. The pinned bits stay fixed across
/// tokens while the remaining bits carry the random value.
const DRAW_OPTIONS: [[u32; 2]; 3] = [[3, 45], [1, 0], [1, 5]];

pub const HEADER_LEN: usize = 12;

/// Draws three values in `[0, 10000)` and expands them into the token header.
pub fn random_header() -> [u8; HEADER_LEN] {
    let mut rng = rand::thread_rng();
    let draws = [
        rng.gen_range(0..10_000),
        rng.gen_range(0..10_000),
        rng.gen_range(0..10_000),
    ];
    header_from_draws(draws)
}

pub fn header_from_draws(draws: [u32; 3]) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    for (i, (draw, option)) in draws.iter().zip(DRAW_OPTIONS).enumerate() {
        header[i * 4..i * 4 + 4].copy_from_slice(&expand_draw(*draw, option));
    }
    header
}

fn expand_draw(random: u32, option: [u32; 2]) -> [u8; 4] {
    let low = random & 0xff;
    let high = (random >> 8) & 0xff;
    [
        ((low & 0xaa) | (option[0] & 0x55)) as u8,
        ((low & 0x55) | (option[0] & 0xaa)) as u8,
        ((high & 0xaa) | (option[1] & 0x55)) as u8,
        ((high & 0x55) | (option[1] & 0xaa)) as u8,
    ]
}
