use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use fastnoise_lite::{FastNoiseLite, NoiseType};
use tessera_blocks::{CONTENT_AIR, LightBank, Node, NodeRegistry};
use tessera_chunk::{BuildParams, ChunkCoord, VoxelChunkView};
use tessera_mesh_cpu::{FaceMeshBuilder, MeshAssembler, MeshContext, build_chunk_mesh};

fn load_registry() -> NodeRegistry {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let assets = root.join("../../assets");
    NodeRegistry::load_from_paths(assets.join("materials.toml"), assets.join("nodes.toml")).unwrap()
}

fn id(reg: &NodeRegistry, name: &str) -> Node {
    Node::new(reg.id_by_name(name).unwrap_or(CONTENT_AIR))
}

// Rolling hills: stone under dirt under grass, water below y = 4, sunlit air above.
fn hills(reg: &NodeRegistry, coord: ChunkCoord, params: BuildParams) -> VoxelChunkView {
    let mut noise = FastNoiseLite::with_seed(1337);
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    noise.set_frequency(Some(0.03));
    let (stone, dirt, grass, water) = (id(reg, "stone"), id(reg, "dirt"), id(reg, "grass"), id(reg, "water"));
    let mut sky = Node::AIR;
    sky.set_light(LightBank::Day, 15);
    let origin = coord.origin();
    VoxelChunkView::from_fn(coord, params, |p| {
        let w = origin + p;
        let h = (8.0 + 6.0 * noise.get_noise_3d(w.x as f32, 0.0, w.z as f32)) as i32;
        match w.y {
            y if y < h - 3 => stone,
            y if y < h => dirt,
            y if y == h => grass,
            y if y < 4 => water,
            _ => sky,
        }
    })
}

fn bench_greedy_uniform(c: &mut Criterion) {
    let mut group = c.benchmark_group("greedy_uniform");
    let reg = load_registry();
    let stone = id(&reg, "stone");
    let ctx = MeshContext::new(Arc::new(reg));
    let view = VoxelChunkView::filled(ChunkCoord::default(), BuildParams::default(), stone, Node::AIR);
    group.bench_function("faces_solid_16", |b| {
        b.iter(|| {
            let mut asm = MeshAssembler::new();
            let quads = FaceMeshBuilder::new(&ctx, &view).build(&mut asm);
            black_box((quads, asm));
        })
    });
    group.finish();
}

fn bench_chunk_mesh_hills(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_mesh_hills");
    let reg = load_registry();
    let coord = ChunkCoord::new(0, 0, 0);
    let smooth = hills(&reg, coord, BuildParams::default());
    let flat = hills(&reg, coord, BuildParams { smooth_lighting: false, ..BuildParams::default() });
    let far = hills(&reg, coord, BuildParams::default().with_step(4));
    let ctx = MeshContext::new(Arc::new(reg));
    group.bench_function("smooth_16", |b| b.iter(|| black_box(build_chunk_mesh(&ctx, &smooth))));
    group.bench_function("flat_16", |b| b.iter(|| black_box(build_chunk_mesh(&ctx, &flat))));
    group.bench_function("step4_16", |b| b.iter(|| black_box(build_chunk_mesh(&ctx, &far))));
    group.finish();
}

fn bench_translucent_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("translucent_order");
    let reg = load_registry();
    let view = hills(&reg, ChunkCoord::new(0, 0, 0), BuildParams::default());
    let ctx = MeshContext::new(Arc::new(reg));
    if let Some(mut mesh) = build_chunk_mesh(&ctx, &view) {
        let eye = tessera_geom::Vec3::new(-10.0, 20.0, 3.0);
        group.bench_function("sort_hills_water", |b| b.iter(|| mesh.sort_translucent(black_box(eye))));
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_greedy_uniform,
    bench_chunk_mesh_hills,
    bench_translucent_order
);
criterion_main!(benches);
