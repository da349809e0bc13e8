use std::sync::{Arc, Mutex};

use glam::Vec3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::droplet::Droplet;

/// Per-droplet working state for one cohesion tick.
///
/// `position` is the tick-start snapshot every pair test reads; `force` is
/// the pair accumulator, behind its own lock so concurrently evaluated
/// pairs may write to the same droplet.
pub struct DropletRecord {
    pub(crate) droplet: Arc<Droplet>,
    pub(crate) position: Vec3,
    pub(crate) force: Mutex<Vec3>,
}

impl DropletRecord {
    pub(crate) fn new(droplet: Arc<Droplet>) -> Self {
        let position = droplet.position();
        Self {
            droplet,
            position,
            force: Mutex::new(Vec3::ZERO),
        }
    }

    pub fn droplet(&self) -> &Arc<Droplet> {
        &self.droplet
    }
}

/// One cohesion tick over the live droplet population.
///
/// Snapshots positions (clearing last tick's neighbor sets), evaluates every
/// unordered pair exactly once, accumulates equal-and-opposite
/// constant-magnitude attraction for pairs inside the effective radius, then
/// applies each droplet's total as an instantaneous central force and resets
/// the accumulator.
///
/// With the `parallel` feature both pair loops and the apply pass run on the
/// rayon pool; per-droplet locks keep the shared accumulators and neighbor
/// sets consistent without a global lock.
pub fn apply_cohesion(records: &mut [DropletRecord], magnitude: f32, radius_squared: f32) {
    for record in records.iter_mut() {
        record.position = record.droplet.position();
        record.droplet.clear_neighbors();
    }
    let records: &[DropletRecord] = records;

    #[cfg(feature = "parallel")]
    {
        records.par_iter().enumerate().for_each(|(i, a)| {
            records[i + 1..]
                .par_iter()
                .for_each(|b| pair_interaction(a, b, magnitude, radius_squared));
        });
    }

    #[cfg(not(feature = "parallel"))]
    {
        for (i, a) in records.iter().enumerate() {
            for b in &records[i + 1..] {
                pair_interaction(a, b, magnitude, radius_squared);
            }
        }
    }

    #[cfg(feature = "parallel")]
    {
        records.par_iter().for_each(apply_accumulated);
    }

    #[cfg(not(feature = "parallel"))]
    {
        for record in records {
            apply_accumulated(record);
        }
    }
}

/// Evaluate one unordered pair against the snapshots.
fn pair_interaction(a: &DropletRecord, b: &DropletRecord, magnitude: f32, radius_squared: f32) {
    let distance_squared = a.position.distance_squared(b.position);
    if distance_squared >= radius_squared {
        return;
    }
    // Constant magnitude inside the radius; a is pulled toward b and b
    // toward a. Coincident snapshots normalize to zero, not NaN.
    let direction = (a.position - b.position).normalize_or_zero();
    *a.force.lock().unwrap() -= direction * magnitude;
    *b.force.lock().unwrap() += direction * magnitude;
    a.droplet.insert_neighbor(b.droplet.id(), distance_squared);
    b.droplet.insert_neighbor(a.droplet.id(), distance_squared);
}

fn apply_accumulated(record: &DropletRecord) {
    let force = std::mem::replace(&mut *record.force.lock().unwrap(), Vec3::ZERO);
    record.droplet.apply_central_force(force);
}
