use std::sync::Arc;

use proptest::prelude::*;
use tessera_blocks::{Node, NodeRegistry};
use tessera_chunk::{BuildParams, CHUNK_SIZE, ChunkCoord, VoxelChunkView};
use tessera_mesh_cpu::{FaceMeshBuilder, MAX_BUFFER_VERTICES, MeshAssembler, MeshContext, face_contents};

const MATERIALS: &str = r#"
    [materials]
    stone = "stone.png"
    glass = { texture = "glass.png", blend = "clip" }
    water = { texture = "water.png", blend = "blend" }
"#;

const NODES: &str = r#"
    [[nodes]]
    name = "stone"
    tiles = ["stone"]

    [[nodes]]
    name = "glass"
    drawtype = "glasslike"
    tiles = ["glass"]

    [[nodes]]
    name = "water"
    drawtype = "liquid"
    tiles = ["water"]
    liquid_group = "water"

    [[nodes]]
    name = "water_flowing"
    drawtype = "flowing_liquid"
    tiles = ["water"]
    liquid_group = "water"
"#;

fn registry() -> Arc<NodeRegistry> {
    Arc::new(NodeRegistry::from_toml_strs(MATERIALS, NODES).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    // Swapping the two nodes swaps the owner and keeps equivalence
    #[test]
    fn face_contents_is_antisymmetric(a in 0u16..12, b in 0u16..12) {
        let reg = registry();
        let ab = face_contents(&reg, a, b);
        let ba = face_contents(&reg, b, a);
        prop_assert_eq!(ab.is_some(), ba.is_some());
        if let (Some(ab), Some(ba)) = (ab, ba) {
            prop_assert_eq!(ab.owner, ba.owner.flipped());
            prop_assert_eq!(ab.equivalent, ba.equivalent);
        }
        prop_assert!(face_contents(&reg, a, a).is_none());
    }

    // Random terrain: geometry stays inside the chunk and buffers stay well formed
    #[test]
    fn random_chunks_mesh_within_bounds(
        cells in prop::collection::vec(0u16..7, (CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE) as usize),
        smooth in any::<bool>(),
        step in prop::sample::select(vec![1u8, 2, 4]),
    ) {
        let ctx = MeshContext::new(registry());
        let params = BuildParams { smooth_lighting: smooth, ..BuildParams::default() }.with_step(step);
        let n = CHUNK_SIZE;
        let view = VoxelChunkView::from_fn(ChunkCoord::new(-1, 2, 0), params, |p| {
            if (0..n).contains(&p.x) && (0..n).contains(&p.y) && (0..n).contains(&p.z) {
                // Ids 3..=6 are the configured nodes; anything else is air.
                let c = cells[((p.y * n + p.z) * n + p.x) as usize];
                if c >= 3 { Node::new(c) } else { Node::AIR }
            } else {
                Node::AIR
            }
        });
        let mut asm = MeshAssembler::new();
        let quads = FaceMeshBuilder::new(&ctx, &view).build(&mut asm);
        let origin = ChunkCoord::new(-1, 2, 0).origin();
        let total: usize = asm.buffers().iter().map(|b| b.indices.len() / 6).sum();
        prop_assert_eq!(quads, total);
        for b in asm.buffers() {
            prop_assert!(b.vertices.len() <= MAX_BUFFER_VERTICES);
            prop_assert_eq!(b.indices.len() % 6, 0);
            prop_assert!(b.indices.iter().all(|&i| usize::from(i) < b.vertices.len()));
            for v in &b.vertices {
                for (c, o) in [(v.pos.x, origin.x), (v.pos.y, origin.y), (v.pos.z, origin.z)] {
                    let local = c - o as f32;
                    prop_assert!((-0.5..=n as f32 - 0.5).contains(&local));
                    // Faces lie on node boundaries
                    prop_assert_eq!((local + 0.5).fract(), 0.0);
                }
            }
        }
    }
}
