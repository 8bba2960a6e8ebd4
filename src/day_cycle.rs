use std::f32::consts::TAU;

/// Day/night ratio of full daylight.
pub const RATIO_DAY: u32 = 1000;

/// Simulated time of day driving the day/night vertex blend.
pub struct DayCycle {
    time: f32,
    day_length: f32,
}

impl DayCycle {
    /// Starts at sunrise.
    pub fn new(day_length: f32) -> Self {
        Self {
            time: 0.0,
            day_length: day_length.max(1.0),
        }
    }

    pub fn advance(&mut self, dt: f32) -> u32 {
        self.time = (self.time + dt).rem_euclid(self.day_length);
        self.ratio()
    }

    /// 0 at midnight, `RATIO_DAY` at noon; the curve flattens near noon so
    /// most of the day sits in full light.
    pub fn ratio(&self) -> u32 {
        let phase = (self.time / self.day_length).rem_euclid(1.0) * TAU;
        let sky = 0.5 * (1.0 + phase.sin());
        let brightness = 1.0 - (1.0 - sky).powf(2.0);
        (brightness.clamp(0.0, 1.0) * RATIO_DAY as f32).round() as u32
    }
}
