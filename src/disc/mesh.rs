use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

pub mod mesh2d;

pub type BoundaryId = usize;

/// Two boundary ids glued together periodically, plus the direction
/// (0 = x, 1 = y) along which they are matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct PeriodicPair(pub BoundaryId, pub BoundaryId, pub usize);

impl PeriodicPair {
    pub fn contains(&self, boundary_id: BoundaryId) -> bool {
        self.0 == boundary_id || self.1 == boundary_id
    }
}
/// True if `boundary_id` is either side of any of `pairs`.
pub fn is_periodic_boundary(pairs: &[PeriodicPair], boundary_id: BoundaryId) -> bool {
    pairs.iter().any(|pair| pair.contains(boundary_id))
}

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(0);

/// Fresh id for a mesh topology or DOF numbering, unique within the process.
pub fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}
