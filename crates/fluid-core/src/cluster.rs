use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use glam::Vec3;

use crate::droplet::{Droplet, DropletId};

/// A connected component of the neighbor graph, with the arithmetic mean of
/// its members' positions.
pub struct Cluster {
    pub members: Vec<Arc<Droplet>>,
    pub center: Vec3,
}

/// Partition `droplets` into connected components of the neighbor relation.
///
/// Neighbor entries form a directed adjacency (a saturated peer may not link
/// back), and traversal follows outgoing entries only; adjacency is never
/// re-derived from raw distance. Ids that do not resolve to a droplet in the
/// input are skipped. For a given snapshot the result is deterministic:
/// components are discovered in input order, members in depth-first order.
pub fn build_clusters(droplets: &[Arc<Droplet>]) -> Vec<Cluster> {
    let by_id: HashMap<DropletId, &Arc<Droplet>> =
        droplets.iter().map(|d| (d.id(), d)).collect();
    let mut visited: HashSet<DropletId> = HashSet::with_capacity(droplets.len());
    let mut clusters = Vec::new();

    for droplet in droplets {
        if visited.contains(&droplet.id()) {
            continue;
        }
        let mut members: Vec<Arc<Droplet>> = Vec::new();
        let mut center = Vec3::ZERO;
        // Explicit worklist; stack depth stays bounded for large dense
        // components.
        let mut stack = vec![Arc::clone(droplet)];
        while let Some(current) = stack.pop() {
            if !visited.insert(current.id()) {
                continue;
            }
            // Running mean over the members found so far.
            let n = members.len() as f32 + 1.0;
            center = (center * (n - 1.0) + current.position()) / n;
            let neighbor_ids = current.neighbor_ids();
            members.push(current);
            // Reverse push keeps pop order equal to recursive descent order
            // (nearest neighbor first).
            for id in neighbor_ids.into_iter().rev() {
                if !visited.contains(&id) {
                    if let Some(peer) = by_id.get(&id) {
                        stack.push(Arc::clone(peer));
                    }
                }
            }
        }
        clusters.push(Cluster { members, center });
    }

    clusters
}
