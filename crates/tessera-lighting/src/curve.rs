use tessera_blocks::types::LIGHT_MAX;

/// Maps stored light levels (0..=14) to 8-bit brightness.
#[derive(Clone, Debug, PartialEq)]
pub struct LightCurve {
    gamma: f32,
    table: [u8; LIGHT_MAX as usize + 1],
}

impl Default for LightCurve {
    fn default() -> Self {
        Self::new(2.2)
    }
}

impl LightCurve {
    /// Builds the decode table for `gamma` (clamped to `[1.0, 3.0]`).
    pub fn new(gamma: f32) -> Self {
        let gamma = if gamma.is_finite() { gamma.clamp(1.0, 3.0) } else { 2.2 };
        let step = 255.0 / f32::from(LIGHT_MAX + 1);
        let mut table = [0u8; LIGHT_MAX as usize + 1];
        for (i, slot) in table.iter_mut().enumerate() {
            let brightness = (i as f32 + 1.0) * step / 255.0;
            let v = 255.0 * brightness.powf(1.0 / gamma);
            *slot = v.round().clamp(0.0, 255.0) as u8;
        }
        table[LIGHT_MAX as usize] = 255;
        Self { gamma, table }
    }

    #[inline]
    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// Levels above `LIGHT_MAX` (sunlight) decode as `LIGHT_MAX`.
    #[inline]
    pub fn decode(&self, level: u8) -> u8 {
        self.table[usize::from(level.min(LIGHT_MAX))]
    }
}

/// One step darker; sunlight drops to just below `LIGHT_MAX`.
#[inline]
pub fn diminish_light(level: u8) -> u8 {
    match level {
        0 => 0,
        l if l >= LIGHT_MAX => LIGHT_MAX - 1,
        l => l - 1,
    }
}

/// Inverse of `diminish_light` for levels below `LIGHT_MAX`.
#[inline]
pub fn undiminish_light(level: u8) -> u8 {
    match level {
        0 => 0,
        l if l >= LIGHT_MAX => l,
        l => l + 1,
    }
}
