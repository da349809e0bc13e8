/// Tunables for the fluid server.
#[derive(Clone, Copy, Debug)]
pub struct FluidConfig {
    /// Magnitude of the pairwise attraction between nearby droplets.
    pub force_magnitude: f32,
    /// Distance inside which two droplets attract each other.
    pub force_effective_distance: f32,
    /// Collision-sphere radius each frozen droplet contributes to its
    /// aggregate.
    pub frozen_droplet_radius: f32,
}

impl Default for FluidConfig {
    fn default() -> Self {
        Self {
            force_magnitude: 25.0,
            force_effective_distance: 0.5,
            frozen_droplet_radius: 0.5,
        }
    }
}
