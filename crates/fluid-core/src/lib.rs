//! Cohesive droplet simulation with a reversible solid phase.
//!
//! Many independent point-mass droplets attract each other with a
//! constant-magnitude force inside a fixed radius, tracking their nearest
//! neighbors as they go. On demand the whole fluid freezes: connected
//! clusters of droplets merge into rigid aggregates that conserve mass,
//! linear momentum and angular momentum. Melting hands every droplet back
//! its share of the aggregate's rigid-body velocity field.
//!
//! The crate is headless: droplet and aggregate bodies expose the small
//! rigid-body surface a host engine integrates ([`body::RigidBodyState`]),
//! and [`server::FluidServer`] expects to be ticked once per fixed physics
//! frame.

pub mod body;
pub mod cluster;
pub mod cohesion;
pub mod config;
pub mod droplet;
pub mod ice;
pub mod neighbors;
pub mod server;
pub mod visual;

pub use body::{CollisionFilter, RigidBodyState};
pub use cluster::Cluster;
pub use config::FluidConfig;
pub use droplet::{Droplet, DropletId};
pub use ice::{IceBody, IceTemplate};
pub use neighbors::{Neighbor, NeighborSet, NEARBY_DROPLET_MAX};
pub use server::{FluidServer, Phase};
pub use visual::NeighborBlock;
