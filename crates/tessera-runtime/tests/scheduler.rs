use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use hashbrown::HashSet;
use tessera_blocks::{Node, NodeRegistry};
use tessera_chunk::{BuildParams, ChunkCoord, VoxelChunkView};
use tessera_mesh_cpu::MeshContext;
use tessera_runtime::{Enqueued, MeshBuildScheduler, SchedulerError};

const WAIT: Duration = Duration::from_secs(10);

fn air_view(coord: ChunkCoord) -> VoxelChunkView {
    VoxelChunkView::filled(coord, BuildParams::default(), Node::AIR, Node::AIR)
}

fn wait_until(sched: &MeshBuildScheduler, done: impl Fn(&MeshBuildScheduler) -> bool) {
    let t0 = Instant::now();
    while !done(sched) {
        assert!(t0.elapsed() < WAIT, "scheduler stalled: {:?}", sched.stats());
        thread::sleep(Duration::from_millis(1));
    }
}

fn idle(s: &MeshBuildScheduler) -> bool {
    let st = s.stats();
    st.queued == 0 && st.in_flight == 0
}

#[test]
fn builds_real_meshes() {
    let reg = NodeRegistry::from_toml_strs(
        r#"
        [materials]
        stone = "stone.png"
        "#,
        r#"
        [[nodes]]
        name = "stone"
        tiles = ["stone"]
        "#,
    )
    .unwrap();
    let stone = Node::new(reg.id_by_name("stone").unwrap());
    let ctx = Arc::new(MeshContext::new(Arc::new(reg)));
    let sched = MeshBuildScheduler::new(ctx, 2).unwrap();
    let solid = ChunkCoord::new(0, 0, 0);
    let empty = ChunkCoord::new(1, 0, 0);
    let view = VoxelChunkView::filled(solid, BuildParams::default(), stone, Node::AIR);
    sched.request_build(solid, view, false).unwrap();
    sched.request_build(empty, air_view(empty), false).unwrap();

    let mut got = Vec::new();
    while got.len() < 2 {
        got.push(sched.wait_result(WAIT).expect("build result"));
    }
    got.sort_by_key(|r| r.coord);
    assert_eq!(got[0].coord, solid);
    assert_eq!(got[0].mesh.as_ref().map(|m| m.quad_count()), Some(6));
    assert_eq!(got[1].coord, empty);
    assert!(got[1].mesh.is_none());
    assert_eq!(sched.stats().built, 2);
}

#[test]
fn zero_workers_is_an_error() {
    let err = MeshBuildScheduler::with_builder(0, |_| None).err();
    assert!(matches!(err, Some(SchedulerError::NoWorkers)));
}

#[test]
fn repeated_requests_coalesce() {
    let gate = Arc::new(AtomicBool::new(false));
    let g = Arc::clone(&gate);
    let sched = MeshBuildScheduler::with_builder(1, move |_| {
        while !g.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(1));
        }
        None
    })
    .unwrap();
    // Occupy the only worker
    let blocker = ChunkCoord::new(-1, 0, 0);
    sched.request_build(blocker, air_view(blocker), false).unwrap();
    wait_until(&sched, |s| s.stats().in_flight == 1);

    let c = ChunkCoord::new(3, 0, 0);
    assert_eq!(sched.request_build(c, air_view(c), false).unwrap(), Enqueued::New);
    for _ in 0..5 {
        assert_eq!(
            sched.request_build(c, air_view(c), false).unwrap(),
            Enqueued::Coalesced
        );
    }
    assert_eq!(sched.stats().queued, 1);
    assert!(sched.is_pending(c));

    gate.store(true, Ordering::Release);
    wait_until(&sched, idle);
    let results = sched.poll_results(usize::MAX, WAIT);
    assert_eq!(results.len(), 2);
    assert_eq!(results.iter().filter(|r| r.coord == c).count(), 1);
    assert!(!sched.is_pending(c));
}

#[test]
fn a_position_is_never_built_twice_at_once() {
    let active: Arc<Mutex<HashSet<ChunkCoord>>> = Arc::default();
    let overlap = Arc::new(AtomicBool::new(false));
    let (a, o) = (Arc::clone(&active), Arc::clone(&overlap));
    let sched = MeshBuildScheduler::with_builder(4, move |view| {
        let coord = view.coord();
        if !a.lock().unwrap().insert(coord) {
            o.store(true, Ordering::SeqCst);
        }
        thread::sleep(Duration::from_millis(2));
        a.lock().unwrap().remove(&coord);
        None
    })
    .unwrap();

    let coords = [
        ChunkCoord::new(0, 0, 0),
        ChunkCoord::new(0, 1, 0),
        ChunkCoord::new(2, 0, -1),
    ];
    for round in 0..40 {
        let c = coords[round % coords.len()];
        sched.request_build(c, air_view(c), round % 7 == 0).unwrap();
        if round % 5 == 0 {
            thread::sleep(Duration::from_millis(1));
        }
    }
    wait_until(&sched, idle);
    assert!(!overlap.load(Ordering::SeqCst));
    let stats = sched.stats();
    let results = sched.poll_results(usize::MAX, WAIT);
    assert_eq!(results.len(), stats.built);
    assert!(results.len() >= coords.len());
}

#[test]
fn worker_survives_a_panicking_build() {
    let bad = ChunkCoord::new(9, 9, 9);
    let sched = MeshBuildScheduler::with_builder(1, move |view| {
        if view.coord() == bad {
            panic!("corrupt chunk");
        }
        None
    })
    .unwrap();
    let good = ChunkCoord::new(0, 0, 0);
    sched.request_build(bad, air_view(bad), false).unwrap();
    sched.request_build(good, air_view(good), false).unwrap();

    let mut seen = Vec::new();
    while seen.len() < 2 {
        let r = sched.wait_result(WAIT).expect("worker died");
        assert!(r.mesh.is_none());
        seen.push(r.coord);
    }
    assert!(seen.contains(&bad) && seen.contains(&good));
    let stats = sched.stats();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.built, 1);
    assert_eq!(stats.in_flight, 0);

    // Still serving requests
    let later = ChunkCoord::new(5, 0, 0);
    sched.request_build(later, air_view(later), false).unwrap();
    assert_eq!(sched.wait_result(WAIT).map(|r| r.coord), Some(later));
}

#[test]
fn urgent_results_are_drained_first() {
    let sched = MeshBuildScheduler::with_builder(2, |_| None).unwrap();
    for x in 0..3 {
        let c = ChunkCoord::new(x, 0, 0);
        sched.request_build(c, air_view(c), false).unwrap();
    }
    wait_until(&sched, |s| s.stats().built == 3 && idle(s));
    let urgent = ChunkCoord::new(0, 5, 0);
    sched.request_build(urgent, air_view(urgent), true).unwrap();
    wait_until(&sched, |s| s.stats().built == 4 && idle(s));

    let first = sched.poll_results(1, WAIT);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].coord, urgent);
    assert!(first[0].urgent);

    // A spent budget still yields one result per call
    let one = sched.poll_results(10, Duration::ZERO);
    assert_eq!(one.len(), 1);
    let rest = sched.poll_results(10, WAIT);
    assert_eq!(rest.len(), 2);
    assert!(rest.iter().all(|r| !r.urgent));
    assert!(sched.poll_results(10, WAIT).is_empty());
}

#[test]
fn shutdown_discards_queued_requests() {
    let mut sched = MeshBuildScheduler::with_builder(1, |_| {
        thread::sleep(Duration::from_millis(20));
        None
    })
    .unwrap();
    for x in 0..10 {
        let c = ChunkCoord::new(x, 0, 0);
        sched.request_build(c, air_view(c), false).unwrap();
    }
    sched.shutdown();
    assert!(sched.is_shut_down());
    let stats = sched.stats();
    assert_eq!(stats.queued, 0);
    assert_eq!(stats.in_flight, 0);
    assert!(stats.built < 10);
    // Finished builds are still delivered
    assert_eq!(sched.poll_results(usize::MAX, WAIT).len(), stats.built);

    let c = ChunkCoord::new(0, 0, 0);
    assert!(matches!(
        sched.request_build(c, air_view(c), false),
        Err(SchedulerError::ShutDown)
    ));
    // A second shutdown is a no-op
    sched.shutdown();
}
