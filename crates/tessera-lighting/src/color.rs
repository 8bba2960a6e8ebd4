const EMPHASE_BLUE_WHEN_DARK: [i32; 32] = [
    1, 4, 6, 6, 6, 5, 4, 3, 2, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

const EMPHASE_YELLOW_WHEN_ARTIFICIAL: [i32; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 5, 10, 15, 15, 15];

/// Mixes decoded day and night light by `ratio` (0 = night, 1000 = day).
///
/// Moonlight leans blue and artificial light leans yellow; the result is
/// `[r, g, b]` with `r == g`.
pub fn final_color_blend(day: u8, night: u8, ratio: u32) -> [u8; 3] {
    let ratio = ratio.min(1000) as i32;
    let (day, night) = (i32::from(day), i32::from(night));
    let mut rg = (day * ratio + night * (1000 - ratio)) / 1000;
    let mut b = rg;
    b += (day - night) / 13;
    rg -= (day - night) / 23;
    b += EMPHASE_BLUE_WHEN_DARK[(b.clamp(0, 255) / 8) as usize];
    let b = b.clamp(0, 255);
    rg += EMPHASE_YELLOW_WHEN_ARTIFICIAL[(night / 16) as usize];
    let rg = rg.clamp(0, 255);
    [rg as u8, rg as u8, b as u8]
}

/// Scales a gamma-encoded channel by `factor` in linear space.
#[inline]
pub fn srgb_linear_multiply(c: u8, factor: f32) -> u8 {
    let linear = (f32::from(c) / 255.0).powi(2) * factor;
    (linear.clamp(0.0, 1.0).sqrt() * 255.0).round() as u8
}
