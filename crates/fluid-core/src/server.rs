use std::sync::Arc;

use crate::cluster;
use crate::cohesion::{self, DropletRecord};
use crate::config::FluidConfig;
use crate::droplet::{Droplet, DropletId};
use crate::ice::{IceBody, IceTemplate};
use crate::visual::{self, NeighborBlock};

/// Global phase of the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Liquid,
    Solid,
}

/// Owns the droplet registry and drives the Liquid/Solid state machine:
/// cohesion ticks while liquid, aggregate creation and dissolution at the
/// transitions.
///
/// Ticks and phase transitions all take `&mut self`, so a transition can
/// never overlap an in-flight tick. Registry and aggregates live and die
/// with the server.
pub struct FluidServer {
    records: Vec<DropletRecord>,
    ice_bodies: Vec<IceBody>,
    ice_template: IceTemplate,
    phase: Phase,
    force_magnitude: f32,
    force_effective_distance: f32,
    force_effective_distance_squared: f32,
}

impl FluidServer {
    pub fn new(config: FluidConfig) -> Self {
        let distance = config.force_effective_distance.max(0.0);
        Self {
            records: Vec::new(),
            ice_bodies: Vec::new(),
            ice_template: IceTemplate {
                droplet_radius: config.frozen_droplet_radius,
            },
            phase: Phase::Liquid,
            force_magnitude: config.force_magnitude,
            force_effective_distance: distance,
            force_effective_distance_squared: distance * distance,
        }
    }

    // ---------- registry ----------

    /// Register a droplet. Returns false (registry unchanged) if it is
    /// already present. While solid the newcomer is frozen into its own
    /// single-member aggregate rather than merged with a neighbor's.
    pub fn add_droplet(&mut self, droplet: Arc<Droplet>) -> bool {
        if self.find(droplet.id()).is_some() {
            return false;
        }
        if self.phase == Phase::Solid {
            let mut ice = IceBody::new(&self.ice_template, droplet.position());
            ice.add_droplet(&droplet);
            self.ice_bodies.push(ice);
        }
        log::trace!("droplet {:?} registered", droplet.id());
        self.records.push(DropletRecord::new(droplet));
        true
    }

    /// Unregister a droplet. While solid it is detached from its aggregate,
    /// every peer named in its neighbor set drops the reciprocal entry, and
    /// it is thawed. Its own neighbor set is always cleared. Returns false
    /// if the droplet was never registered.
    pub fn remove_droplet(&mut self, droplet: &Droplet) -> bool {
        let Some(at) = self.find(droplet.id()) else {
            return false;
        };
        self.records.remove(at);
        if self.phase == Phase::Solid {
            for ice in &mut self.ice_bodies {
                ice.remove_droplet(droplet.id());
            }
            // The relation is near-symmetric: the departing droplet's own
            // entries name the peers that still point back at it.
            for id in droplet.neighbor_ids() {
                if let Some(peer) = self.records.iter().find(|r| r.droplet().id() == id) {
                    peer.droplet().remove_neighbor(droplet.id());
                }
            }
            droplet.thaw();
        }
        droplet.clear_neighbors();
        log::trace!("droplet {:?} unregistered", droplet.id());
        true
    }

    fn find(&self, id: DropletId) -> Option<usize> {
        self.records.iter().position(|r| r.droplet().id() == id)
    }

    pub fn contains(&self, id: DropletId) -> bool {
        self.find(id).is_some()
    }

    pub fn droplet_count(&self) -> usize {
        self.records.len()
    }

    /// Registered droplets in registration order.
    pub fn droplets(&self) -> impl Iterator<Item = &Arc<Droplet>> {
        self.records.iter().map(|r| r.droplet())
    }

    // ---------- tick ----------

    /// One physics frame. Runs the cohesion pass while liquid; a frozen
    /// fluid does not tick.
    pub fn tick(&mut self) {
        if self.phase == Phase::Solid {
            return;
        }
        cohesion::apply_cohesion(
            &mut self.records,
            self.force_magnitude,
            self.force_effective_distance_squared,
        );
    }

    // ---------- phase transitions ----------

    /// Freeze the whole fluid: partition the registry into neighbor-graph
    /// clusters and merge each into one rigid aggregate. No-op while solid.
    pub fn solidify(&mut self) {
        if self.phase == Phase::Solid {
            return;
        }
        let droplets: Vec<Arc<Droplet>> =
            self.records.iter().map(|r| Arc::clone(r.droplet())).collect();
        let clusters = cluster::build_clusters(&droplets);
        log::debug!(
            "solidify: {} droplets -> {} aggregates",
            droplets.len(),
            clusters.len()
        );
        for cluster in &clusters {
            self.ice_bodies
                .push(IceBody::from_cluster(&self.ice_template, cluster));
        }
        self.phase = Phase::Solid;
    }

    /// Melt the whole fluid: dissolve every aggregate, handing each member
    /// its rigid-body release velocity. No-op while liquid.
    pub fn liquefy(&mut self) {
        if self.phase == Phase::Liquid {
            return;
        }
        log::debug!("liquefy: dissolving {} aggregates", self.ice_bodies.len());
        for ice in self.ice_bodies.drain(..) {
            ice.dissolve();
        }
        self.phase = Phase::Liquid;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_solid(&self) -> bool {
        self.phase == Phase::Solid
    }

    pub fn ice_bodies(&self) -> &[IceBody] {
        &self.ice_bodies
    }

    /// Mutable aggregate access for the host integrator.
    pub fn ice_bodies_mut(&mut self) -> &mut [IceBody] {
        &mut self.ice_bodies
    }

    // ---------- configuration ----------

    pub fn force_magnitude(&self) -> f32 {
        self.force_magnitude
    }

    pub fn set_force_magnitude(&mut self, magnitude: f32) {
        self.force_magnitude = magnitude;
    }

    pub fn force_effective_distance(&self) -> f32 {
        self.force_effective_distance
    }

    /// Negative distances clamp to zero; the squared value used by the pair
    /// test is kept in step.
    pub fn set_force_effective_distance(&mut self, distance: f32) {
        self.force_effective_distance = distance.max(0.0);
        self.force_effective_distance_squared =
            self.force_effective_distance * self.force_effective_distance;
    }

    pub fn frozen_droplet_radius(&self) -> f32 {
        self.ice_template.droplet_radius
    }

    pub fn set_frozen_droplet_radius(&mut self, radius: f32) {
        self.ice_template.droplet_radius = radius;
    }

    // ---------- visualization ----------

    /// Shader block of `droplet`'s current neighbors, positions resolved
    /// through the registry. Output-only; the physics never reads it.
    pub fn neighbor_block(&self, droplet: &Droplet) -> NeighborBlock {
        visual::neighbor_block(droplet, &self.records)
    }
}

impl Default for FluidServer {
    fn default() -> Self {
        Self::new(FluidConfig::default())
    }
}
