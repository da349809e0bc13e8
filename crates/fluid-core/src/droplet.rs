use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use glam::Vec3;

use crate::body::{CollisionFilter, RigidBodyState};
use crate::neighbors::{Neighbor, NeighborSet};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable droplet identity. Allocation order doubles as the deterministic
/// tie-break for neighbor ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DropletId(u64);

#[cfg(test)]
impl DropletId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// An independently simulated point-mass taking part in cohesion.
///
/// The body state and the neighbor set sit behind separate locks so pair
/// workers touching one never contend on the other; the per-tick force
/// accumulator lives in the server's droplet record under a third,
/// record-local lock.
pub struct Droplet {
    id: DropletId,
    body: Mutex<RigidBodyState>,
    neighbors: Mutex<NeighborSet>,
}

impl Droplet {
    pub fn new(mass: f32, position: Vec3) -> Self {
        Self {
            id: DropletId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            body: Mutex::new(RigidBodyState::new(mass, position)),
            neighbors: Mutex::new(NeighborSet::new()),
        }
    }

    pub fn id(&self) -> DropletId {
        self.id
    }

    pub fn mass(&self) -> f32 {
        self.body.lock().unwrap().mass
    }

    pub fn position(&self) -> Vec3 {
        self.body.lock().unwrap().position
    }

    pub fn set_position(&self, position: Vec3) {
        self.body.lock().unwrap().position = position;
    }

    pub fn linear_velocity(&self) -> Vec3 {
        self.body.lock().unwrap().linear_velocity
    }

    pub fn set_linear_velocity(&self, velocity: Vec3) {
        self.body.lock().unwrap().linear_velocity = velocity;
    }

    pub fn collision_filter(&self) -> CollisionFilter {
        self.body.lock().unwrap().filter
    }

    pub fn set_collision_filter(&self, filter: CollisionFilter) {
        self.body.lock().unwrap().filter = filter;
    }

    /// Queue an instantaneous central force for the host integrator.
    pub fn apply_central_force(&self, force: Vec3) {
        self.body.lock().unwrap().apply_central_force(force);
    }

    /// Drain the queued force (host integration step).
    pub fn take_applied_force(&self) -> Vec3 {
        self.body.lock().unwrap().take_accumulated_force()
    }

    pub fn is_frozen(&self) -> bool {
        self.body.lock().unwrap().frozen
    }

    /// Freeze the droplet: it stops colliding as a free body, remembering
    /// its filter so [`Droplet::thaw`] can restore it. Idempotent.
    pub fn freeze(&self) {
        let mut body = self.body.lock().unwrap();
        if body.frozen {
            return;
        }
        body.frozen = true;
        body.saved_filter = Some(body.filter);
        body.filter = CollisionFilter::NONE;
    }

    /// Reverse of [`Droplet::freeze`]: restore the saved collision filter
    /// and drop the now-stale neighbor entries. Idempotent.
    pub fn thaw(&self) {
        {
            let mut body = self.body.lock().unwrap();
            if !body.frozen {
                return;
            }
            body.frozen = false;
            if let Some(filter) = body.saved_filter.take() {
                body.filter = filter;
            }
        }
        self.clear_neighbors();
    }

    /// Record `peer` as nearby. With `None` the squared distance is measured
    /// from both droplets' current global positions. Returns whether the
    /// entry was admitted (a full set only admits strictly closer peers).
    pub fn add_neighbor(&self, peer: &Droplet, distance_squared: Option<f32>) -> bool {
        let distance_squared = distance_squared
            .unwrap_or_else(|| self.position().distance_squared(peer.position()));
        self.insert_neighbor(peer.id(), distance_squared)
    }

    pub(crate) fn insert_neighbor(&self, id: DropletId, distance_squared: f32) -> bool {
        self.neighbors.lock().unwrap().insert(id, distance_squared)
    }

    /// Drop the entry for `id`; reports whether it was present.
    pub fn remove_neighbor(&self, id: DropletId) -> bool {
        self.neighbors.lock().unwrap().remove(id)
    }

    pub fn clear_neighbors(&self) {
        self.neighbors.lock().unwrap().clear();
    }

    pub fn neighbor_count(&self) -> usize {
        self.neighbors.lock().unwrap().len()
    }

    pub fn has_neighbor(&self, id: DropletId) -> bool {
        self.neighbors.lock().unwrap().contains(id)
    }

    /// Snapshot of the neighbor entries, ascending by distance.
    pub fn neighbors(&self) -> Vec<Neighbor> {
        self.neighbors.lock().unwrap().iter().copied().collect()
    }

    /// Snapshot of the neighbor ids, ascending by distance.
    pub fn neighbor_ids(&self) -> Vec<DropletId> {
        self.neighbors.lock().unwrap().ids().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let a = Droplet::new(1.0, Vec3::ZERO);
        let b = Droplet::new(1.0, Vec3::ZERO);
        assert_ne!(a.id(), b.id());
        assert!(a.id() < b.id());
    }

    #[test]
    fn test_add_neighbor_auto_distance() {
        let a = Droplet::new(1.0, Vec3::ZERO);
        let b = Droplet::new(1.0, Vec3::new(0.3, 0.0, 0.0));
        assert!(a.add_neighbor(&b, None));
        let entry = a.neighbors()[0];
        assert_eq!(entry.id, b.id());
        assert!((entry.distance_squared - 0.09).abs() < 1e-6);
    }

    #[test]
    fn test_freeze_saves_and_thaw_restores_filter() {
        let droplet = Droplet::new(1.0, Vec3::ZERO);
        let filter = CollisionFilter { layer: 4, mask: 6 };
        droplet.set_collision_filter(filter);

        droplet.freeze();
        assert!(droplet.is_frozen());
        assert_eq!(droplet.collision_filter(), CollisionFilter::NONE);

        // A second freeze must not overwrite the stash with NONE.
        droplet.freeze();

        droplet.thaw();
        assert!(!droplet.is_frozen());
        assert_eq!(droplet.collision_filter(), filter);
    }

    #[test]
    fn test_thaw_clears_neighbors() {
        let a = Droplet::new(1.0, Vec3::ZERO);
        let b = Droplet::new(1.0, Vec3::new(0.1, 0.0, 0.0));
        a.add_neighbor(&b, None);
        a.freeze();
        assert_eq!(a.neighbor_count(), 1, "freezing must keep the entries");
        a.thaw();
        assert_eq!(a.neighbor_count(), 0);
    }
}
