use tessera_blocks::{CONTENT_IGNORE, Face, LightBank, Node, NodeRegistry};
use tessera_blocks::types::LIGHT_SUN;
use tessera_chunk::VoxelChunkView;
use tessera_geom::NodePos;

use crate::curve::{LightCurve, diminish_light};
use crate::{PackedLight, pack_light};

// Nodes sharing a corner, subtracted from the corner position.
const CORNER_SAMPLES: [NodePos; 8] = [
    NodePos::new(0, 0, 0),
    NodePos::new(0, 0, 1),
    NodePos::new(0, 1, 0),
    NodePos::new(0, 1, 1),
    NodePos::new(1, 0, 0),
    NodePos::new(1, 1, 0),
    NodePos::new(1, 0, 1),
    NodePos::new(1, 1, 1),
];

const AO_GAMMA: f32 = 2.2;

/// Computes packed day/night light for faces and face corners.
#[derive(Clone, Copy)]
pub struct LightingEvaluator<'a> {
    reg: &'a NodeRegistry,
    curve: &'a LightCurve,
}

impl<'a> LightingEvaluator<'a> {
    pub fn new(reg: &'a NodeRegistry, curve: &'a LightCurve) -> Self {
        Self { reg, curve }
    }

    #[inline]
    pub fn curve(&self) -> &'a LightCurve {
        self.curve
    }

    /// Flat light of the face between `n` and its neighbor `n2` across `face`.
    pub fn face_light(&self, n: Node, n2: Node, face: Face) -> PackedLight {
        let f1 = self.reg.features(n);
        let f2 = self.reg.features(n2);
        let source = f1.light_source.max(f2.light_source);
        let bank = |bank: LightBank| {
            let mut light = f1.light(n, bank).max(f2.light(n2, bank)).max(source);
            match face {
                Face::PosX | Face::NegX | Face::NegY => {
                    light = diminish_light(diminish_light(light));
                }
                Face::PosZ | Face::NegZ => light = diminish_light(light),
                Face::PosY => {}
            }
            self.curve.decode(light)
        };
        pack_light(bank(LightBank::Day), bank(LightBank::Night))
    }

    /// Light of the node itself, used by per-node drawtypes.
    pub fn interior_light(&self, n: Node, increment: i32) -> PackedLight {
        let f = self.reg.features(n);
        let bank = |bank: LightBank| {
            let mut light = f.light(n, bank);
            if light > 0 {
                light = (i32::from(light) + increment).clamp(0, i32::from(LIGHT_SUN)) as u8;
            }
            self.curve.decode(light)
        };
        pack_light(bank(LightBank::Day), bank(LightBank::Night))
    }

    /// Smooth light at the corner of node `p` pointed at by `corner` (components ±1).
    pub fn smooth_corner_light(&self, view: &VoxelChunkView, p: NodePos, corner: NodePos) -> PackedLight {
        let base = NodePos::new(
            p.x + i32::from(corner.x == 1),
            p.y + i32::from(corner.y == 1),
            p.z + i32::from(corner.z == 1),
        );
        self.combined_light(view, base)
    }

    /// Smooth light for the four corners of a face, in corner-table order.
    pub fn smooth_face_light(&self, view: &VoxelChunkView, p: NodePos, corners: &[NodePos; 4]) -> [PackedLight; 4] {
        corners.map(|c| self.smooth_corner_light(view, p, c))
    }

    fn combined_light(&self, view: &VoxelChunkView, corner: NodePos) -> PackedLight {
        let mut day = 0u32;
        let mut night = 0u32;
        let mut count = 0u32;
        let mut ao = 0u32;
        let mut source_max = 0u8;
        for d in CORNER_SAMPLES {
            let n = view.get(corner - d);
            if n.content == CONTENT_IGNORE {
                continue;
            }
            let f = self.reg.features(n);
            source_max = source_max.max(f.light_source);
            if f.light_propagates && f.solidness != 2 {
                day += u32::from(self.curve.decode(n.raw_light(LightBank::Day)));
                night += u32::from(self.curve.decode(n.raw_light(LightBank::Night)));
                count += 1;
            } else {
                ao += 1;
            }
        }
        if count == 0 {
            return pack_light(255, 255);
        }
        let boost = self.curve.decode(source_max);
        let finish = |mean: u32| -> u8 {
            let mean = mean.min(255) as u8;
            if boost >= mean {
                return boost;
            }
            if ao <= 4 {
                return mean;
            }
            let amount = (8 - ao) as f32 / 4.0;
            let linear = (f32::from(mean) / 255.0).powf(AO_GAMMA) * amount;
            let v = linear.powf(1.0 / AO_GAMMA).min(1.0);
            (255.0 * v + 0.5) as u8
        };
        pack_light(finish(day / count), finish(night / count))
    }
}
