use glam::{Quat, Vec3};

/// Collision layer/mask pair as the host physics engine sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionFilter {
    pub layer: u32,
    pub mask: u32,
}

impl CollisionFilter {
    /// Collides with nothing.
    pub const NONE: CollisionFilter = CollisionFilter { layer: 0, mask: 0 };
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self { layer: 1, mask: 1 }
    }
}

/// The rigid-body surface the fluid core consumes.
///
/// Covers the subset of a host engine body the simulation touches: mass,
/// global transform (translation + orientation, no scale), velocities, a
/// queue for instantaneous central forces drained by the host integrator,
/// and the collision filter with its pre-freeze stash.
#[derive(Clone, Debug)]
pub struct RigidBodyState {
    pub mass: f32,
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub filter: CollisionFilter,
    /// Filter in effect before the body was frozen, restored on thaw.
    pub saved_filter: Option<CollisionFilter>,
    /// Frozen bodies are skipped by host integration.
    pub frozen: bool,
    accumulated_force: Vec3,
}

impl RigidBodyState {
    pub fn new(mass: f32, position: Vec3) -> Self {
        Self {
            mass,
            position,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            filter: CollisionFilter::default(),
            saved_filter: None,
            frozen: false,
            accumulated_force: Vec3::ZERO,
        }
    }

    /// Queue an instantaneous force through the center of mass.
    pub fn apply_central_force(&mut self, force: Vec3) {
        self.accumulated_force += force;
    }

    /// Drain the queued force. The host integrator calls this once per frame.
    pub fn take_accumulated_force(&mut self) -> Vec3 {
        std::mem::replace(&mut self.accumulated_force, Vec3::ZERO)
    }

    /// World point to body-local point.
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        self.orientation.inverse() * (point - self.position)
    }

    /// Body-local point to world point.
    pub fn to_global(&self, point: Vec3) -> Vec3 {
        self.position + self.orientation * point
    }
}
