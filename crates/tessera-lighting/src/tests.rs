use super::*;
use tessera_blocks::config::{NodeDef, NodesConfig};
use tessera_blocks::{CONTENT_AIR, DrawType, Face, MaterialCatalog, Node, NodeRegistry};
use tessera_chunk::{BuildParams, ChunkCoord, VoxelChunkView};
use tessera_geom::NodePos;

fn registry() -> NodeRegistry {
    let mut lamp = NodeDef::simple("lamp", DrawType::Glasslike, &[]);
    lamp.light_source = Some(10);
    NodeRegistry::from_configs(
        MaterialCatalog::new(),
        NodesConfig {
            nodes: vec![NodeDef::simple("stone", DrawType::Normal, &[]), lamp],
        },
    )
    .unwrap()
}

fn lit_air(day: u8, night: u8) -> Node {
    Node::with_params(CONTENT_AIR, (night << 4) | day, 0)
}

#[test]
fn curve_is_monotonic_and_tops_out() {
    let curve = LightCurve::default();
    assert_eq!(curve.decode(14), 255);
    assert_eq!(curve.decode(15), 255);
    assert!(curve.decode(0) > 0);
    for l in 1..=14u8 {
        assert!(curve.decode(l) > curve.decode(l - 1), "level {l}");
    }
}

#[test]
fn diminish_steps() {
    assert_eq!(diminish_light(0), 0);
    assert_eq!(diminish_light(15), 13);
    assert_eq!(diminish_light(14), 13);
    assert_eq!(diminish_light(5), 4);
    assert_eq!(undiminish_light(diminish_light(5)), 5);
    assert_eq!(undiminish_light(0), 0);
}

#[test]
fn flat_light_dims_sides() {
    let reg = registry();
    let curve = LightCurve::default();
    let eval = LightingEvaluator::new(&reg, &curve);
    let stone = Node::new(reg.id_by_name("stone").unwrap());
    let air = lit_air(15, 0);

    let top = eval.face_light(stone, air, Face::PosY);
    assert_eq!(light_day(top), 255);
    assert_eq!(light_night(top), curve.decode(0));

    let side = eval.face_light(stone, air, Face::PosX);
    assert_eq!(light_day(side), curve.decode(12));
    let front = eval.face_light(air, stone, Face::NegZ);
    assert_eq!(light_day(front), curve.decode(13));
    let bottom = eval.face_light(stone, air, Face::NegY);
    assert_eq!(light_day(bottom), curve.decode(12));
}

#[test]
fn flat_light_boosted_by_source() {
    let reg = registry();
    let curve = LightCurve::default();
    let eval = LightingEvaluator::new(&reg, &curve);
    let lamp = Node::new(reg.id_by_name("lamp").unwrap());
    let l = eval.face_light(lamp, lit_air(0, 0), Face::PosY);
    assert_eq!(light_day(l), curve.decode(10));
    assert_eq!(light_night(l), curve.decode(10));
}

#[test]
fn interior_light_increments_lit_nodes_only() {
    let reg = registry();
    let curve = LightCurve::default();
    let eval = LightingEvaluator::new(&reg, &curve);
    let l = eval.interior_light(lit_air(5, 0), 2);
    assert_eq!(light_day(l), curve.decode(7));
    assert_eq!(light_night(l), curve.decode(0));
}

#[test]
fn smooth_light_in_open_air() {
    let reg = registry();
    let curve = LightCurve::default();
    let eval = LightingEvaluator::new(&reg, &curve);
    let view = VoxelChunkView::filled(ChunkCoord::default(), BuildParams::default(), lit_air(15, 0), lit_air(15, 0));
    let l = eval.smooth_corner_light(&view, NodePos::new(3, 3, 3), NodePos::new(-1, 1, -1));
    assert_eq!(light_day(l), 255);
    assert_eq!(light_night(l), curve.decode(0));
}

#[test]
fn smooth_light_without_samples_is_full() {
    let reg = registry();
    let curve = LightCurve::default();
    let eval = LightingEvaluator::new(&reg, &curve);
    let stone = Node::new(reg.id_by_name("stone").unwrap());
    let view = VoxelChunkView::filled(ChunkCoord::default(), BuildParams::default(), stone, stone);
    let l = eval.smooth_corner_light(&view, NodePos::new(3, 3, 3), NodePos::new(1, 1, 1));
    assert_eq!(l, pack_light(255, 255));

    let unknown = VoxelChunkView::filled(ChunkCoord::default(), BuildParams::default(), Node::IGNORE, Node::IGNORE);
    let l = eval.smooth_corner_light(&unknown, NodePos::new(3, 3, 3), NodePos::new(1, 1, 1));
    assert_eq!(l, pack_light(255, 255));
}

#[test]
fn smooth_light_darkens_occluded_corners() {
    let reg = registry();
    let curve = LightCurve::default();
    let eval = LightingEvaluator::new(&reg, &curve);
    let stone = Node::new(reg.id_by_name("stone").unwrap());
    // Corner (5,5,5): four stone below, one stone beside, three lit air.
    let view = VoxelChunkView::from_fn(ChunkCoord::default(), BuildParams::default(), |p| {
        if p.y <= 4 || p == NodePos::new(5, 5, 5) { stone } else { lit_air(14, 0) }
    });
    let l = eval.smooth_corner_light(&view, NodePos::new(4, 4, 4), NodePos::new(1, 1, 1));
    assert!(light_day(l) < 255);
    assert!(light_day(l) > 200);

    // Four occluders is not enough to darken.
    let view = VoxelChunkView::from_fn(ChunkCoord::default(), BuildParams::default(), |p| {
        if p.y <= 4 { stone } else { lit_air(14, 0) }
    });
    let l = eval.smooth_corner_light(&view, NodePos::new(4, 4, 4), NodePos::new(1, 1, 1));
    assert_eq!(light_day(l), 255);
}

#[test]
fn smooth_light_source_boosts_every_corner() {
    let reg = registry();
    let curve = LightCurve::default();
    let eval = LightingEvaluator::new(&reg, &curve);
    let lamp = Node::new(reg.id_by_name("lamp").unwrap());
    let view = VoxelChunkView::from_fn(ChunkCoord::default(), BuildParams::default(), |p| {
        if p == NodePos::new(5, 5, 5) { lamp } else { lit_air(0, 0) }
    });
    // Corners touching the lamp from below and from the side
    for (p, corner) in [
        (NodePos::new(4, 5, 4), NodePos::new(1, -1, 1)),
        (NodePos::new(6, 5, 5), NodePos::new(-1, -1, -1)),
        (NodePos::new(5, 4, 5), NodePos::new(1, 1, 1)),
    ] {
        let l = eval.smooth_corner_light(&view, p, corner);
        assert_eq!(light_day(l), curve.decode(10), "corner {corner:?} of {p:?}");
        assert_eq!(light_night(l), curve.decode(10));
    }
}

#[test]
fn color_blend_extremes() {
    assert_eq!(final_color_blend(255, 0, 1000), [244, 244, 255]);
    assert_eq!(final_color_blend(0, 0, 500), [0, 0, 1]);
    assert_eq!(final_color_blend(255, 255, 0), [255, 255, 255]);
}

#[test]
fn linear_multiply_brightens_and_caps() {
    assert_eq!(srgb_linear_multiply(255, 1.3), 255);
    assert_eq!(srgb_linear_multiply(0, 1.3), 0);
    let c = srgb_linear_multiply(100, 1.3);
    assert!(c > 100 && c < 120);
}
