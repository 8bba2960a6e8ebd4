//! Light curve, flat and smooth face lighting, and day/night vertex colors.
#![forbid(unsafe_code)]

mod color;
mod curve;
mod evaluator;

pub use color::{final_color_blend, srgb_linear_multiply};
pub use curve::{LightCurve, diminish_light, undiminish_light};
pub use evaluator::LightingEvaluator;

/// Two decoded light values packed as `day | night << 8`.
pub type PackedLight = u16;

#[inline]
pub fn pack_light(day: u8, night: u8) -> PackedLight {
    u16::from(day) | (u16::from(night) << 8)
}

#[inline]
pub fn light_day(l: PackedLight) -> u8 {
    (l & 0xff) as u8
}

#[inline]
pub fn light_night(l: PackedLight) -> u8 {
    (l >> 8) as u8
}

#[cfg(test)]
mod tests;
