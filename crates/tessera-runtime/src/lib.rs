//! Background mesh building: priority queue, worker pool and result channels.
#![forbid(unsafe_code)]

mod queue;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, select, unbounded};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tessera_chunk::{ChunkCoord, VoxelChunkView};
use tessera_mesh_cpu::{ChunkMesh, MeshContext, build_chunk_mesh};

pub use queue::{BuildQueue, BuildRequest, Enqueued, request_rank};

/// Upper bound on the default worker count.
pub const MAX_DEFAULT_WORKERS: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("scheduler needs at least one worker")]
    NoWorkers,
    #[error("failed to start mesh workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("scheduler is shut down")]
    ShutDown,
}

/// One finished build, delivered to the frame thread.
pub struct BuildResult {
    pub coord: ChunkCoord,
    /// `None` when the chunk has no geometry or its build failed.
    pub mesh: Option<ChunkMesh>,
    pub build_ms: u32,
    pub urgent: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub queued: usize,
    pub in_flight: usize,
    pub built: usize,
    pub failed: usize,
    pub workers: usize,
}

/// Down-sample step for a chunk `range` chunks from the viewer.
///
/// `farmesh == 0` disables far meshes. Past `farmesh` the step doubles every
/// `farmesh_step` chunks, up to 16.
pub fn farmesh_step(range: u32, farmesh: u32, farmesh_step: u32) -> u8 {
    if farmesh == 0 {
        return 1;
    }
    let at = |n: u32| farmesh.saturating_add(farmesh_step.saturating_mul(n));
    if range >= at(3) {
        16
    } else if range >= at(2) {
        8
    } else if range >= at(1) {
        4
    } else if range >= farmesh {
        2
    } else {
        1
    }
}

/// Roughly a third of the machine, between 1 and `MAX_DEFAULT_WORKERS`.
pub fn default_worker_count() -> usize {
    let cores = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    (cores / 3).clamp(1, MAX_DEFAULT_WORKERS)
}

type BuildFn = dyn Fn(&VoxelChunkView) -> Option<ChunkMesh> + Send + Sync;

struct QueueState {
    queue: BuildQueue,
    closed: bool,
}

struct Shared {
    state: Mutex<QueueState>,
    wake: Condvar,
    built: AtomicUsize,
    failed: AtomicUsize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks until a request is available; `None` once the queue is closed.
    fn next_request(&self) -> Option<BuildRequest> {
        let mut state = self.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(req) = state.queue.dequeue() {
                return Some(req);
            }
            state = self
                .wake
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn finish(&self, coord: ChunkCoord) {
        self.lock().queue.complete(coord);
        // A re-request for `coord` may have been waiting on this build.
        self.wake.notify_all();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic"
    }
}

fn process_request(shared: &Shared, build: &BuildFn, req: BuildRequest) -> BuildResult {
    let BuildRequest {
        coord, view, urgent, ..
    } = req;
    let t0 = Instant::now();
    let mesh = match panic::catch_unwind(AssertUnwindSafe(|| build(&view))) {
        Ok(mesh) => {
            shared.built.fetch_add(1, Ordering::Relaxed);
            mesh
        }
        Err(payload) => {
            shared.failed.fetch_add(1, Ordering::Relaxed);
            log::error!(
                target: "scheduler",
                "build panicked coord=({}, {}, {}) step={} msg={}",
                coord.cx,
                coord.cy,
                coord.cz,
                view.step(),
                panic_message(payload.as_ref())
            );
            None
        }
    };
    let build_ms: u32 = t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
    log::trace!(
        target: "scheduler",
        "ms={} built coord=({}, {}, {}) urgent={} empty={}",
        build_ms,
        coord.cx,
        coord.cy,
        coord.cz,
        urgent,
        mesh.is_none()
    );
    BuildResult {
        coord,
        mesh,
        build_ms,
        urgent,
    }
}

/// Owns the build queue and the workers that drain it.
///
/// Requests go in from the frame thread with [`request_build`]; finished
/// meshes come back through [`poll_results`], urgent ones first.
///
/// [`request_build`]: MeshBuildScheduler::request_build
/// [`poll_results`]: MeshBuildScheduler::poll_results
pub struct MeshBuildScheduler {
    shared: Arc<Shared>,
    urgent_rx: Receiver<BuildResult>,
    normal_rx: Receiver<BuildResult>,
    exit_rx: Receiver<()>,
    workers: usize,
    running: usize,
    _pool: ThreadPool,
}

impl MeshBuildScheduler {
    /// Workers mesh every request with [`build_chunk_mesh`].
    pub fn new(ctx: Arc<MeshContext>, workers: usize) -> Result<Self, SchedulerError> {
        Self::with_builder(workers, move |view| build_chunk_mesh(&ctx, view))
    }

    /// Workers call `build` for every request instead of the chunk mesher.
    pub fn with_builder<F>(workers: usize, build: F) -> Result<Self, SchedulerError>
    where
        F: Fn(&VoxelChunkView) -> Option<ChunkMesh> + Send + Sync + 'static,
    {
        if workers == 0 {
            return Err(SchedulerError::NoWorkers);
        }
        let shared = Arc::new(Shared {
            state: Mutex::new(QueueState {
                queue: BuildQueue::new(),
                closed: false,
            }),
            wake: Condvar::new(),
            built: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        });
        let build: Arc<BuildFn> = Arc::new(build);
        let (urgent_tx, urgent_rx) = unbounded::<BuildResult>();
        let (normal_tx, normal_rx) = unbounded::<BuildResult>();
        let (exit_tx, exit_rx) = unbounded::<()>();

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("tessera-mesh-{i}"))
            .build()?;
        for _ in 0..workers {
            let shared = Arc::clone(&shared);
            let build = Arc::clone(&build);
            let urgent_tx: Sender<BuildResult> = urgent_tx.clone();
            let normal_tx: Sender<BuildResult> = normal_tx.clone();
            let exit_tx = exit_tx.clone();
            pool.spawn(move || {
                while let Some(req) = shared.next_request() {
                    let coord = req.coord;
                    let result = process_request(&shared, build.as_ref(), req);
                    let tx = if result.urgent { &urgent_tx } else { &normal_tx };
                    // The receiver only goes away during shutdown.
                    let _ = tx.send(result);
                    shared.finish(coord);
                }
                let _ = exit_tx.send(());
            });
        }
        log::info!(target: "scheduler", "started workers={}", workers);
        Ok(Self {
            shared,
            urgent_rx,
            normal_rx,
            exit_rx,
            workers,
            running: workers,
            _pool: pool,
        })
    }

    /// Queues a build of `coord` from `view`, coalescing with any pending
    /// request for the same position.
    pub fn request_build(
        &self,
        coord: ChunkCoord,
        view: VoxelChunkView,
        urgent: bool,
    ) -> Result<Enqueued, SchedulerError> {
        let mut state = self.shared.lock();
        if state.closed {
            return Err(SchedulerError::ShutDown);
        }
        let status = state.queue.enqueue(BuildRequest::new(coord, view, urgent));
        drop(state);
        self.shared.wake.notify_one();
        Ok(status)
    }

    /// Drops a queued request for `coord`; a build already running still delivers.
    pub fn cancel(&self, coord: ChunkCoord) -> bool {
        self.shared.lock().queue.cancel(coord)
    }

    /// True while `coord` is queued or being built.
    pub fn is_pending(&self, coord: ChunkCoord) -> bool {
        let state = self.shared.lock();
        state.queue.is_queued(coord) || state.queue.is_in_flight(coord)
    }

    fn try_next(&self) -> Option<BuildResult> {
        self.urgent_rx
            .try_recv()
            .or_else(|_| self.normal_rx.try_recv())
            .ok()
    }

    /// Takes up to `max` finished builds, urgent ones first, stopping early
    /// once `budget` has elapsed. One ready result is always taken so a slow
    /// frame still makes progress; the rest wait for the next call.
    pub fn poll_results(&self, max: usize, budget: Duration) -> Vec<BuildResult> {
        let t0 = Instant::now();
        let mut out = Vec::new();
        while out.len() < max {
            let Some(result) = self.try_next() else {
                break;
            };
            out.push(result);
            if t0.elapsed() >= budget {
                break;
            }
        }
        out
    }

    /// Blocks for the next finished build, urgent ones first.
    pub fn wait_result(&self, timeout: Duration) -> Option<BuildResult> {
        if let Some(result) = self.try_next() {
            return Some(result);
        }
        select! {
            recv(self.urgent_rx) -> r => r.ok(),
            recv(self.normal_rx) -> r => r.ok(),
            default(timeout) => None,
        }
    }

    pub fn stats(&self) -> SchedulerStats {
        let (queued, in_flight) = {
            let state = self.shared.lock();
            (state.queue.len(), state.queue.in_flight_len())
        };
        SchedulerStats {
            queued,
            in_flight,
            built: self.shared.built.load(Ordering::Relaxed),
            failed: self.shared.failed.load(Ordering::Relaxed),
            workers: self.workers,
        }
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.lock().closed
    }

    /// Stops accepting requests, discards queued ones and waits for every
    /// worker to finish its current build. Results already produced stay
    /// available to `poll_results`.
    pub fn shutdown(&mut self) {
        let discarded = {
            let mut state = self.shared.lock();
            if state.closed && self.running == 0 {
                return;
            }
            state.closed = true;
            state.queue.clear()
        };
        self.shared.wake.notify_all();
        let t0 = Instant::now();
        while self.running > 0 {
            if self.exit_rx.recv().is_err() {
                break;
            }
            self.running -= 1;
        }
        self.running = 0;
        let ms: u32 = t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
        log::info!(
            target: "scheduler",
            "ms={} shutdown workers={} discarded={}",
            ms,
            self.workers,
            discarded
        );
    }
}

impl Drop for MeshBuildScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn farmesh_step_doubles_per_band() {
        assert_eq!(farmesh_step(100, 0, 10), 1);
        assert_eq!(farmesh_step(4, 5, 10), 1);
        assert_eq!(farmesh_step(5, 5, 10), 2);
        assert_eq!(farmesh_step(14, 5, 10), 2);
        assert_eq!(farmesh_step(15, 5, 10), 4);
        assert_eq!(farmesh_step(25, 5, 10), 8);
        assert_eq!(farmesh_step(35, 5, 10), 16);
        assert_eq!(farmesh_step(u32::MAX, 5, 10), 16);
    }

    #[test]
    fn default_workers_stay_in_range() {
        let n = default_worker_count();
        assert!((1..=MAX_DEFAULT_WORKERS).contains(&n));
    }

    #[test]
    fn panic_messages_are_extracted() {
        let p: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(p.as_ref()), "boom");
        let p: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(p.as_ref()), "bang");
        let p: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(p.as_ref()), "non-string panic");
    }
}
