//! Headless driver for the fluid core.
//!
//! Plays the part of the host engine: spawns a blob of droplets plus one
//! stray, ticks the server at a fixed step while integrating the forces it
//! applies, freezes the fluid mid-run and melts it again.

use std::sync::Arc;

use fluid_core::{Droplet, FluidConfig, FluidServer};
use glam::{Quat, Vec3};

const DT: f32 = 1.0 / 60.0;

fn main() {
    env_logger::init();

    let mut server = FluidServer::new(FluidConfig::default());
    let mut droplets: Vec<Arc<Droplet>> = Vec::new();

    // 3x3x3 lattice spaced inside the cohesion radius, so the blob freezes
    // as one aggregate.
    for x in 0..3 {
        for y in 0..3 {
            for z in 0..3 {
                let position = Vec3::new(x as f32, y as f32, z as f32) * 0.35;
                let droplet = Arc::new(Droplet::new(1.0, position));
                server.add_droplet(Arc::clone(&droplet));
                droplets.push(droplet);
            }
        }
    }
    // A stray droplet outside the blob's reach; it freezes alone.
    let stray = Arc::new(Droplet::new(1.0, Vec3::new(4.0, 0.0, 0.0)));
    stray.set_linear_velocity(Vec3::new(-0.5, 0.0, 0.0));
    server.add_droplet(Arc::clone(&stray));
    droplets.push(stray);

    log::info!("spawned {} droplets", server.droplet_count());

    for frame in 0..240 {
        server.tick();
        integrate(&mut server, &droplets);

        match frame {
            119 => {
                server.solidify();
                for (i, ice) in server.ice_bodies().iter().enumerate() {
                    log::info!(
                        "aggregate {i}: {} droplets, mass {:.2}, v {:.3}, w {:.3}",
                        ice.member_count(),
                        ice.mass(),
                        ice.linear_velocity(),
                        ice.angular_velocity()
                    );
                }
            }
            179 => server.liquefy(),
            _ => {}
        }
    }

    let blob_center: Vec3 =
        droplets.iter().map(|d| d.position()).sum::<Vec3>() / droplets.len() as f32;
    let mean_speed: f32 =
        droplets.iter().map(|d| d.linear_velocity().length()).sum::<f32>() / droplets.len() as f32;
    log::info!("done: center {blob_center:.3}, mean speed {mean_speed:.3}");
    println!(
        "{} droplets, center of mass {:.3}, mean speed {:.3}",
        droplets.len(),
        blob_center,
        mean_speed
    );
}

/// The integration the host engine would do: semi-implicit Euler on free
/// droplets, rigid motion on aggregates. Frozen droplets are carried by
/// their aggregate.
fn integrate(server: &mut FluidServer, droplets: &[Arc<Droplet>]) {
    for droplet in droplets {
        let force = droplet.take_applied_force();
        if droplet.is_frozen() {
            continue;
        }
        let mass = droplet.mass().max(1e-6);
        let velocity = droplet.linear_velocity() + force / mass * DT;
        droplet.set_linear_velocity(velocity);
        droplet.set_position(droplet.position() + velocity * DT);
    }

    for ice in server.ice_bodies_mut() {
        let body = ice.body_mut();
        body.position += body.linear_velocity * DT;
        let spin = body.angular_velocity * DT;
        if spin.length_squared() > 0.0 {
            body.orientation = (Quat::from_scaled_axis(spin) * body.orientation).normalize();
        }
    }
}
