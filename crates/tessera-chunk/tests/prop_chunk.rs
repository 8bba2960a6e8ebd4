use proptest::prelude::*;
use tessera_blocks::Node;
use tessera_chunk::{BuildParams, CHUNK_SIZE, ChunkCoord, ChunkStore, Crack, VoxelChunkView};
use tessera_geom::NodePos;

fn marker(p: NodePos) -> Node {
    // Content encodes the world position so copies can be checked exactly.
    let c = (p.x.rem_euclid(61) * 3 + p.y.rem_euclid(59) * 5 + p.z.rem_euclid(53) * 7) as u16 + 3;
    Node::with_params(c, (p.x & 0xff) as u8, (p.z & 0xff) as u8)
}

fn store_around(center: ChunkCoord) -> ChunkStore {
    let store = ChunkStore::new();
    for dy in -1..=1 {
        for dz in -1..=1 {
            for dx in -1..=1 {
                let c = center.offset(dx, dy, dz);
                let origin = c.origin();
                store.insert_with(c, |p| marker(origin + p));
            }
        }
    }
    store
}

#[test]
fn snapshot_reads_halo_from_neighbors() {
    let center = ChunkCoord::new(2, -1, 5);
    let store = store_around(center);
    let view = VoxelChunkView::snapshot(&store, center, BuildParams::default());
    let origin = center.origin();
    for p in [
        NodePos::new(-1, -1, -1),
        NodePos::new(0, 0, 0),
        NodePos::new(CHUNK_SIZE, 3, 7),
        NodePos::new(5, CHUNK_SIZE, -1),
        NodePos::new(CHUNK_SIZE - 1, CHUNK_SIZE - 1, CHUNK_SIZE - 1),
    ] {
        assert_eq!(view.get(p), marker(origin + p), "at {p:?}");
    }
    // Past the halo
    assert_eq!(view.get(NodePos::new(-2, 0, 0)), Node::IGNORE);
}

#[test]
fn unloaded_neighbors_read_as_ignore() {
    let store = ChunkStore::new();
    let c = ChunkCoord::new(0, 0, 0);
    store.insert_with(c, |_| Node::AIR);
    let view = VoxelChunkView::snapshot(&store, c, BuildParams::default());
    assert_eq!(view.get(NodePos::new(3, 3, 3)), Node::AIR);
    assert_eq!(view.get(NodePos::new(-1, 3, 3)), Node::IGNORE);
    assert!(view.is_all_air());
}

#[test]
fn snapshot_is_isolated_from_later_writes() {
    let store = ChunkStore::new();
    let c = ChunkCoord::new(0, 0, 0);
    store.insert_with(c, |_| Node::AIR);
    let view = VoxelChunkView::snapshot(&store, c, BuildParams::default());
    assert!(store.set_node(NodePos::new(1, 1, 1), Node::new(7)));
    assert_eq!(view.get(NodePos::new(1, 1, 1)), Node::AIR);
    assert_eq!(store.get_node(NodePos::new(1, 1, 1)), Node::new(7));
}

#[test]
fn crack_position_is_chunk_relative() {
    let c = ChunkCoord::new(1, 0, 0);
    let params = BuildParams {
        crack: Some(Crack {
            pos: NodePos::new(CHUNK_SIZE + 2, 4, 9),
            level: 3,
        }),
        ..BuildParams::default()
    };
    let view = VoxelChunkView::filled(c, params, Node::AIR, Node::AIR);
    assert_eq!(view.crack_pos_relative(), Some(NodePos::new(2, 4, 9)));
    assert_eq!(view.crack_level(), 3);

    let elsewhere = VoxelChunkView::filled(ChunkCoord::new(5, 0, 0), params, Node::AIR, Node::AIR);
    assert_eq!(elsewhere.crack_pos_relative(), None);
}

#[test]
fn step_widens_halo_to_one_cell() {
    let c = ChunkCoord::new(0, 0, 0);
    let params = BuildParams::default().with_step(4);
    let view = VoxelChunkView::filled(c, params, Node::new(5), Node::AIR);
    assert_eq!(view.cells(), CHUNK_SIZE / 4);
    assert_eq!(view.get_cell(NodePos::new(-1, 0, 0)), Node::AIR);
    assert_eq!(view.get_cell(NodePos::new(view.cells(), 0, 0)), Node::AIR);
    assert_eq!(view.get_cell(NodePos::new(3, 3, 3)), Node::new(5));
}

proptest! {
    // Step normalization always lands on a supported power of two not above the input
    #[test]
    fn step_normalizes_to_power_of_two(step in any::<u8>()) {
        let s = BuildParams::normalize_step(step);
        prop_assert!([1u8, 2, 4, 8, 16].contains(&s));
        prop_assert!(s <= step.max(1));
    }

    // containing() and origin() agree for any world position
    #[test]
    fn containing_chunk_holds_position(x in -100_000i32..100_000, y in -100_000i32..100_000, z in -100_000i32..100_000) {
        let p = NodePos::new(x, y, z);
        let c = ChunkCoord::containing(p);
        let rel = p - c.origin();
        prop_assert!((0..CHUNK_SIZE).contains(&rel.x));
        prop_assert!((0..CHUNK_SIZE).contains(&rel.y));
        prop_assert!((0..CHUNK_SIZE).contains(&rel.z));
    }

    // set/get round-trip inside the halo, rejection outside
    #[test]
    fn view_set_get(x in -3i32..20, y in -3i32..20, z in -3i32..20, content in 3u16..500) {
        let mut view = VoxelChunkView::filled(ChunkCoord::default(), BuildParams::default(), Node::AIR, Node::AIR);
        let p = NodePos::new(x, y, z);
        let inside_halo = (-1..=CHUNK_SIZE).contains(&x) && (-1..=CHUNK_SIZE).contains(&y) && (-1..=CHUNK_SIZE).contains(&z);
        prop_assert_eq!(view.set(p, Node::new(content)), inside_halo);
        if inside_halo {
            prop_assert_eq!(view.get(p).content, content);
        } else {
            prop_assert_eq!(view.get(p), Node::IGNORE);
        }
        prop_assert_eq!(view.contains_local(p), (0..CHUNK_SIZE).contains(&x) && (0..CHUNK_SIZE).contains(&y) && (0..CHUNK_SIZE).contains(&z));
    }
}
