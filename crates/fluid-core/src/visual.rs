use crate::cohesion::DropletRecord;
use crate::droplet::Droplet;
use crate::neighbors::NEARBY_DROPLET_MAX;

/// Uniform block describing a droplet's current neighbors, in the layout the
/// droplet material consumes: xyz position plus squared distance in w per
/// entry, live count in the trailing vector. 208 bytes, std140-compatible.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NeighborBlock {
    pub neighbors: [[f32; 4]; NEARBY_DROPLET_MAX],
    pub count: u32,
    pub _pad: [u32; 3],
}

impl NeighborBlock {
    pub const fn empty() -> Self {
        Self {
            neighbors: [[0.0; 4]; NEARBY_DROPLET_MAX],
            count: 0,
            _pad: [0; 3],
        }
    }
}

impl Default for NeighborBlock {
    fn default() -> Self {
        Self::empty()
    }
}

/// Resolve `droplet`'s neighbor entries against the registry and pack them
/// for upload, nearest first. Entries whose peer has left the registry are
/// skipped.
pub(crate) fn neighbor_block(droplet: &Droplet, records: &[DropletRecord]) -> NeighborBlock {
    let mut block = NeighborBlock::empty();
    for neighbor in droplet.neighbors() {
        let Some(peer) = records.iter().find(|r| r.droplet().id() == neighbor.id) else {
            continue;
        };
        let position = peer.droplet().position();
        block.neighbors[block.count as usize] =
            [position.x, position.y, position.z, neighbor.distance_squared];
        block.count += 1;
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use glam::Vec3;

    #[test]
    fn test_block_matches_shader_layout() {
        assert_eq!(std::mem::size_of::<NeighborBlock>(), 208);
        assert_eq!(std::mem::align_of::<NeighborBlock>(), 4);
    }

    #[test]
    fn test_block_packs_nearest_first_and_skips_gone_peers() {
        let center = Arc::new(Droplet::new(1.0, Vec3::ZERO));
        let near = Arc::new(Droplet::new(1.0, Vec3::new(0.1, 0.0, 0.0)));
        let far = Arc::new(Droplet::new(1.0, Vec3::new(0.4, 0.0, 0.0)));
        let gone = Arc::new(Droplet::new(1.0, Vec3::new(0.2, 0.0, 0.0)));
        center.add_neighbor(&far, None);
        center.add_neighbor(&near, None);
        center.add_neighbor(&gone, None);

        let records = vec![
            DropletRecord::new(Arc::clone(&near)),
            DropletRecord::new(Arc::clone(&far)),
        ];
        let block = neighbor_block(&center, &records);

        assert_eq!(block.count, 2, "unresolvable peer must be skipped");
        assert!((block.neighbors[0][0] - 0.1).abs() < 1e-6, "nearest first");
        assert!((block.neighbors[0][3] - 0.01).abs() < 1e-6);
        assert!((block.neighbors[1][0] - 0.4).abs() < 1e-6);
    }
}
