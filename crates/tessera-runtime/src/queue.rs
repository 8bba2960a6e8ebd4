use std::collections::BTreeMap;

use hashbrown::{HashMap, HashSet};
use tessera_chunk::{ChunkCoord, VoxelChunkView};

/// Rank of a request: lower builds sooner, urgent requests always go first.
pub fn request_rank(view: &VoxelChunkView, urgent: bool) -> u32 {
    if urgent {
        0
    } else {
        1u32.saturating_add(view.distance_rank())
            .saturating_add(u32::from(view.step()) * 10)
    }
}

#[derive(Clone, Debug)]
pub struct BuildRequest {
    pub coord: ChunkCoord,
    pub view: VoxelChunkView,
    pub urgent: bool,
    pub rank: u32,
}

impl BuildRequest {
    pub fn new(coord: ChunkCoord, view: VoxelChunkView, urgent: bool) -> Self {
        let rank = request_rank(&view, urgent);
        Self {
            coord,
            view,
            urgent,
            rank,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Enqueued {
    New,
    /// Replaced the queued request for the same position.
    Coalesced,
}

/// Pending chunk builds keyed by rank then position, plus the positions a
/// worker is currently building.
///
/// A position is queued at most once. A position that is in flight may be
/// queued again but is not handed out until its build completes.
#[derive(Debug, Default)]
pub struct BuildQueue {
    buckets: BTreeMap<u32, HashMap<ChunkCoord, BuildRequest>>,
    ranks: HashMap<ChunkCoord, u32>,
    in_flight: HashSet<ChunkCoord>,
}

impl BuildQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, mut req: BuildRequest) -> Enqueued {
        let status = match self.take(req.coord) {
            Some(old) => {
                req.rank = req.rank.min(old.rank);
                req.urgent |= old.urgent;
                Enqueued::Coalesced
            }
            None => Enqueued::New,
        };
        self.ranks.insert(req.coord, req.rank);
        self.buckets
            .entry(req.rank)
            .or_default()
            .insert(req.coord, req);
        status
    }

    /// Pops the best-ranked request whose position is not being built and
    /// marks that position in flight.
    pub fn dequeue(&mut self) -> Option<BuildRequest> {
        let coord = self
            .buckets
            .values()
            .flat_map(|bucket| bucket.keys())
            .find(|c| !self.in_flight.contains(*c))
            .copied()?;
        let req = self.take(coord)?;
        self.in_flight.insert(coord);
        Some(req)
    }

    /// Clears the in-flight mark; returns false if `coord` was not in flight.
    pub fn complete(&mut self, coord: ChunkCoord) -> bool {
        self.in_flight.remove(&coord)
    }

    fn take(&mut self, coord: ChunkCoord) -> Option<BuildRequest> {
        let rank = self.ranks.remove(&coord)?;
        let bucket = self.buckets.get_mut(&rank)?;
        let req = bucket.remove(&coord);
        if bucket.is_empty() {
            self.buckets.remove(&rank);
        }
        req
    }

    /// Drops a queued request; in-flight builds are unaffected.
    pub fn cancel(&mut self, coord: ChunkCoord) -> bool {
        self.take(coord).is_some()
    }

    /// Discards every queued request, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let n = self.ranks.len();
        self.buckets.clear();
        self.ranks.clear();
        n
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    #[inline]
    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_queued(&self, coord: ChunkCoord) -> bool {
        self.ranks.contains_key(&coord)
    }

    pub fn is_in_flight(&self, coord: ChunkCoord) -> bool {
        self.in_flight.contains(&coord)
    }

    pub fn rank_of(&self, coord: ChunkCoord) -> Option<u32> {
        self.ranks.get(&coord).copied()
    }

    /// Number of distinct ranks with queued requests.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}
