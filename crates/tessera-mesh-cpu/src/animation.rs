use tessera_blocks::{LayerId, NodeRegistry};
use tessera_lighting::{final_color_blend, srgb_linear_multiply};

use crate::mesh_build::PreMeshBuffer;

/// Brightening applied to up-facing vertices on top of the day/night blend.
pub const UP_FACE_SHADE: f32 = 1.3;

/// Settle timer of a mesh with nothing to animate.
const IDLE_TIMER: u32 = 100_000;

/// Texture state of one buffer: the layer, its crack overlay level and the
/// animation frame the renderer should bind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerFrame {
    pub layer: LayerId,
    pub crack: Option<i32>,
    pub frame: u16,
}

#[derive(Clone, Copy, Debug)]
struct FrameAnimation {
    buffer: usize,
    frame_count: u16,
    frame_ms: u32,
    shown: Option<u16>,
}

#[derive(Clone, Copy, Debug)]
struct DayNightVertex {
    vertex: usize,
    day: u8,
    night: u8,
    up: bool,
}

/// Vertex RGB for a day/night pair at `ratio` (0 = night, 1000 = day).
pub(crate) fn vertex_rgb(day: u8, night: u8, ratio: u32, up: bool) -> [u8; 3] {
    let rgb = final_color_blend(day, night, ratio);
    if up {
        rgb.map(|c| srgb_linear_multiply(c, UP_FACE_SHADE))
    } else {
        rgb
    }
}

/// Crack, texture-frame and day/night transitions of one mesh.
#[derive(Clone, Debug)]
pub struct AnimationController {
    crack_buffers: Vec<usize>,
    frames: Vec<FrameAnimation>,
    day_night: Vec<(usize, Vec<DayNightVertex>)>,
    offset: i64,
    last_crack: i32,
    last_ratio: u32,
    settle_timer: u32,
}

impl AnimationController {
    /// Records what can change and bakes daylight colors into `buffers`.
    ///
    /// Vertices arrive as `[day, night, light_source, alpha]` and leave as RGBA.
    pub(crate) fn new(
        reg: &NodeRegistry,
        buffers: &mut [PreMeshBuffer],
        crack_level: i32,
        offset: i64,
    ) -> (Self, Vec<LayerFrame>) {
        let mut ctl = Self {
            crack_buffers: Vec::new(),
            frames: Vec::new(),
            day_night: Vec::new(),
            offset,
            last_crack: crack_level,
            last_ratio: 1000,
            settle_timer: 0,
        };
        let mut frames = Vec::with_capacity(buffers.len());
        for (bi, buf) in buffers.iter_mut().enumerate() {
            let crack = buf.key.crack && crack_level >= 0;
            if buf.key.crack {
                ctl.crack_buffers.push(bi);
            }
            if let Some(anim) = reg.layer(buf.key.layer).and_then(|l| l.animation) {
                ctl.frames.push(FrameAnimation {
                    buffer: bi,
                    frame_count: anim.frame_count.max(1),
                    frame_ms: anim.frame_length_ms.max(1),
                    shown: Some(0),
                });
            }
            frames.push(LayerFrame {
                layer: buf.key.layer,
                crack: crack.then_some(crack_level),
                frame: 0,
            });

            let mut diffs = Vec::new();
            for (vi, v) in buf.vertices.iter_mut().enumerate() {
                let [day, night, _, alpha] = v.color;
                let up = v.normal.y > 0.5;
                if day != night {
                    diffs.push(DayNightVertex {
                        vertex: vi,
                        day,
                        night,
                        up,
                    });
                }
                let [r, g, b] = vertex_rgb(day, night, 1000, up);
                v.color = [r, g, b, alpha];
            }
            if !diffs.is_empty() {
                ctl.day_night.push((bi, diffs));
            }
        }
        (ctl, frames)
    }

    pub fn has_animation(&self) -> bool {
        !self.crack_buffers.is_empty() || !self.frames.is_empty() || !self.day_night.is_empty()
    }

    /// Ticks left before a settled mesh needs animating again.
    #[inline]
    pub fn settle_timer(&self) -> u32 {
        self.settle_timer
    }

    /// Counts the settle timer down; true once it has run out.
    pub fn count_down(&mut self) -> bool {
        self.settle_timer = self.settle_timer.saturating_sub(1);
        self.settle_timer == 0
    }

    /// Applies whatever changed since the last tick; true if the mesh changed.
    pub fn tick(
        &mut self,
        time: f32,
        crack: i32,
        ratio: u32,
        faraway: bool,
        frames: &mut [LayerFrame],
        buffers: &mut [PreMeshBuffer],
    ) -> bool {
        if !self.has_animation() {
            self.settle_timer = IDLE_TIMER;
            return false;
        }
        self.settle_timer = fastrand::u32(5..=100);
        let mut changed = false;

        if crack != self.last_crack {
            for &b in &self.crack_buffers {
                if let Some(f) = frames.get_mut(b) {
                    f.crack = (crack >= 0).then_some(crack);
                    changed = true;
                }
            }
            for anim in &mut self.frames {
                if self.crack_buffers.contains(&anim.buffer) {
                    anim.shown = None;
                }
            }
            self.last_crack = crack;
        }

        // Far meshes keep their texture frame.
        if !faraway {
            let ms = (f64::from(time.max(0.0)) * 1000.0) as i64;
            for anim in &mut self.frames {
                let count = i64::from(anim.frame_count);
                let frame = (ms / i64::from(anim.frame_ms) + self.offset).rem_euclid(count) as u16;
                if anim.shown == Some(frame) {
                    continue;
                }
                anim.shown = Some(frame);
                if let Some(f) = frames.get_mut(anim.buffer) {
                    f.frame = frame;
                    changed = true;
                }
            }
        }

        let ratio = ratio.min(1000);
        if ratio != self.last_ratio {
            for (bi, diffs) in &self.day_night {
                let Some(buf) = buffers.get_mut(*bi) else {
                    continue;
                };
                for d in diffs {
                    if let Some(v) = buf.vertices.get_mut(d.vertex) {
                        let [r, g, b] = vertex_rgb(d.day, d.night, ratio, d.up);
                        v.color[..3].copy_from_slice(&[r, g, b]);
                        changed = true;
                    }
                }
            }
            self.last_ratio = ratio;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_faces_are_brighter() {
        let flat = vertex_rgb(120, 120, 1000, false);
        let up = vertex_rgb(120, 120, 1000, true);
        assert!(up[0] > flat[0]);
        assert_eq!(vertex_rgb(255, 255, 1000, true), [255, 255, 255]);
    }
}
