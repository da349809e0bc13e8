use std::sync::Arc;

use glam::{Mat3, Vec3};

use crate::body::RigidBodyState;
use crate::cluster::Cluster;
use crate::droplet::{Droplet, DropletId};

/// Blueprint for aggregates created at solidify time; the headless stand-in
/// for the host's instantiable aggregate scene.
#[derive(Clone, Copy, Debug)]
pub struct IceTemplate {
    /// Radius of the collision sphere each frozen droplet contributes.
    pub droplet_radius: f32,
}

impl Default for IceTemplate {
    fn default() -> Self {
        Self { droplet_radius: 0.5 }
    }
}

/// A member droplet and the body-local offset of its collision sphere.
struct FrozenDroplet {
    droplet: Arc<Droplet>,
    offset: Vec3,
}

/// Rigid aggregate formed from frozen droplets.
///
/// Aggregate mass equals the sum of member masses while members are only
/// added; removal subtracts mass but leaves center of mass and velocity at
/// their last values.
pub struct IceBody {
    body: RigidBodyState,
    /// Center of mass in the body-local frame.
    center_of_mass: Vec3,
    droplet_radius: f32,
    members: Vec<FrozenDroplet>,
}

impl IceBody {
    pub fn new(template: &IceTemplate, position: Vec3) -> Self {
        Self {
            body: RigidBodyState::new(0.0, position),
            center_of_mass: Vec3::ZERO,
            droplet_radius: template.droplet_radius,
            members: Vec::new(),
        }
    }

    /// Merge a whole cluster at once, conserving mass, linear momentum and
    /// angular momentum about the cluster center. Members are frozen as
    /// they are folded in.
    pub fn from_cluster(template: &IceTemplate, cluster: &Cluster) -> Self {
        let mut ice = IceBody::new(template, cluster.center);
        let mut mass = 0.0;
        let mut linear_momentum = Vec3::ZERO;
        let mut angular_momentum = Vec3::ZERO;
        for droplet in &cluster.members {
            let droplet_mass = droplet.mass();
            let momentum = droplet.linear_velocity() * droplet_mass;
            let offset = droplet.position() - cluster.center;
            mass += droplet_mass;
            linear_momentum += momentum;
            angular_momentum += offset.cross(momentum);
            ice.attach(droplet);
            droplet.freeze();
        }
        ice.body.mass = mass;
        if mass > 0.0 {
            ice.body.linear_velocity = linear_momentum / mass;
        }
        // The tensor reflects the merged shape, so it is queried only after
        // every member and the total mass are in place.
        ice.body.angular_velocity = ice.inverse_inertia_tensor() * angular_momentum;
        ice
    }

    /// Attach a member and its collision sphere without touching the
    /// aggregate physics; [`IceBody::from_cluster`] folds the totals itself.
    fn attach(&mut self, droplet: &Arc<Droplet>) {
        let offset = self.body.to_local(droplet.position());
        self.members.push(FrozenDroplet {
            droplet: Arc::clone(droplet),
            offset,
        });
    }

    /// Add one droplet to an existing aggregate. Mass, center of mass and
    /// linear velocity are updated in O(1), conserving momentum, and the
    /// droplet is frozen. Returns false if it is already a member.
    pub fn add_droplet(&mut self, droplet: &Arc<Droplet>) -> bool {
        if self.contains(droplet.id()) {
            return false;
        }
        let offset = self.body.to_local(droplet.position());
        self.members.push(FrozenDroplet {
            droplet: Arc::clone(droplet),
            offset,
        });
        let old_mass = if self.members.len() > 1 { self.body.mass } else { 0.0 };
        let droplet_mass = droplet.mass();
        let new_mass = old_mass + droplet_mass;
        self.body.mass = new_mass;
        if new_mass > 0.0 {
            self.center_of_mass =
                (self.center_of_mass * old_mass + offset * droplet_mass) / new_mass;
            self.body.linear_velocity = (self.body.linear_velocity * old_mass
                + droplet.linear_velocity() * droplet_mass)
                / new_mass;
        }
        droplet.freeze();
        true
    }

    /// Detach one droplet and its collision sphere, subtracting its mass.
    /// Center of mass and velocity keep their last values. Returns false if
    /// the droplet is not a member.
    pub fn remove_droplet(&mut self, id: DropletId) -> bool {
        match self.members.iter().position(|m| m.droplet.id() == id) {
            Some(at) => {
                let member = self.members.remove(at);
                self.body.mass -= member.droplet.mass();
                true
            }
            None => false,
        }
    }

    /// Release every member with the velocity of a rigid-body point at its
    /// position (`v + ω × r`), repositioned through the current body
    /// transform and thawed. Consumes the aggregate.
    pub fn dissolve(self) -> Vec<Arc<Droplet>> {
        let linear = self.body.linear_velocity;
        let angular = self.body.angular_velocity;
        let mut released = Vec::with_capacity(self.members.len());
        for member in self.members {
            let position = self.body.to_global(member.offset);
            member.droplet.set_position(position);
            member
                .droplet
                .set_linear_velocity(linear + angular.cross(position - self.body.position));
            member.droplet.thaw();
            released.push(member.droplet);
        }
        released
    }

    /// Inverse inertia tensor of the merged shape: solid member spheres of
    /// radius [`IceBody::droplet_radius`] summed about the center of mass.
    /// A singular tensor inverts to zero, which stalls rotation instead of
    /// blowing it up.
    pub fn inverse_inertia_tensor(&self) -> Mat3 {
        let mut inertia = Mat3::ZERO;
        let sphere = 0.4 * self.droplet_radius * self.droplet_radius;
        for member in &self.members {
            let mass = member.droplet.mass();
            let d = member.offset - self.center_of_mass;
            let diag = Mat3::from_diagonal(Vec3::splat(d.length_squared() + sphere));
            let outer = Mat3::from_cols(d * d.x, d * d.y, d * d.z);
            inertia += (diag - outer) * mass;
        }
        if inertia.determinant().abs() > 1.0e-9 {
            inertia.inverse()
        } else {
            Mat3::ZERO
        }
    }

    pub fn contains(&self, id: DropletId) -> bool {
        self.members.iter().any(|m| m.droplet.id() == id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Member ids in attach order.
    pub fn member_ids(&self) -> Vec<DropletId> {
        self.members.iter().map(|m| m.droplet.id()).collect()
    }

    pub fn mass(&self) -> f32 {
        self.body.mass
    }

    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    /// Center of mass in the body-local frame.
    pub fn center_of_mass(&self) -> Vec3 {
        self.center_of_mass
    }

    pub fn linear_velocity(&self) -> Vec3 {
        self.body.linear_velocity
    }

    pub fn angular_velocity(&self) -> Vec3 {
        self.body.angular_velocity
    }

    pub fn droplet_radius(&self) -> f32 {
        self.droplet_radius
    }

    pub fn set_droplet_radius(&mut self, radius: f32) {
        self.droplet_radius = radius;
    }

    pub fn body(&self) -> &RigidBodyState {
        &self.body
    }

    /// Mutable body access for the host integrator.
    pub fn body_mut(&mut self) -> &mut RigidBodyState {
        &mut self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn droplet(mass: f32, position: Vec3, velocity: Vec3) -> Arc<Droplet> {
        let d = Arc::new(Droplet::new(mass, position));
        d.set_linear_velocity(velocity);
        d
    }

    #[test]
    fn test_incremental_add_conserves_momentum() {
        let template = IceTemplate::default();
        let mut ice = IceBody::new(&template, Vec3::ZERO);

        let a = droplet(2.0, Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let b = droplet(1.0, Vec3::new(0.3, 0.0, 0.0), Vec3::new(-2.0, 0.0, 0.0));
        assert!(ice.add_droplet(&a));
        assert!(ice.add_droplet(&b));

        assert_eq!(ice.mass(), 3.0);
        // p = 2*1 + 1*(-2) = 0
        assert!(
            ice.linear_velocity().length() < 1e-6,
            "total momentum is zero, velocity must be too"
        );
        let expected_com = Vec3::new(0.1, 0.0, 0.0);
        assert!(ice.center_of_mass().distance(expected_com) < 1e-6);
        assert!(a.is_frozen() && b.is_frozen());
    }

    #[test]
    fn test_add_rejects_existing_member() {
        let mut ice = IceBody::new(&IceTemplate::default(), Vec3::ZERO);
        let a = droplet(1.0, Vec3::ZERO, Vec3::ZERO);
        assert!(ice.add_droplet(&a));
        assert!(!ice.add_droplet(&a));
        assert_eq!(ice.member_count(), 1);
        assert_eq!(ice.mass(), 1.0);
    }

    #[test]
    fn test_remove_subtracts_mass_only() {
        let mut ice = IceBody::new(&IceTemplate::default(), Vec3::ZERO);
        let a = droplet(2.0, Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let b = droplet(1.0, Vec3::new(0.3, 0.0, 0.0), Vec3::ZERO);
        ice.add_droplet(&a);
        ice.add_droplet(&b);
        let velocity = ice.linear_velocity();
        let com = ice.center_of_mass();

        assert!(ice.remove_droplet(b.id()));
        assert!(!ice.remove_droplet(b.id()));
        assert_eq!(ice.mass(), 2.0);
        assert_eq!(ice.linear_velocity(), velocity);
        assert_eq!(ice.center_of_mass(), com);
    }

    #[test]
    fn test_single_sphere_tensor_is_invertible() {
        let mut ice = IceBody::new(&IceTemplate { droplet_radius: 0.5 }, Vec3::ZERO);
        ice.add_droplet(&droplet(2.0, Vec3::ZERO, Vec3::ZERO));

        let inverse = ice.inverse_inertia_tensor();
        // Solid sphere: I = 2/5 m r^2 on the diagonal.
        let expected = 1.0 / (0.4 * 2.0 * 0.25);
        assert!((inverse.col(0).x - expected).abs() < 1e-4);
        assert!((inverse.col(1).y - expected).abs() < 1e-4);
        assert!((inverse.col(2).z - expected).abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_tensor_inverts_to_zero() {
        let mut ice = IceBody::new(&IceTemplate { droplet_radius: 0.0 }, Vec3::ZERO);
        ice.add_droplet(&droplet(1.0, Vec3::ZERO, Vec3::ZERO));
        assert_eq!(ice.inverse_inertia_tensor(), Mat3::ZERO);
    }

    #[test]
    fn test_dissolve_releases_rigid_velocity_field() {
        let template = IceTemplate::default();
        let a = droplet(1.0, Vec3::new(0.2, 0.0, 0.0), Vec3::ZERO);
        let cluster = Cluster {
            members: vec![Arc::clone(&a)],
            center: Vec3::ZERO,
        };
        let mut ice = IceBody::from_cluster(&template, &cluster);
        ice.body_mut().linear_velocity = Vec3::new(1.0, 0.0, 0.0);
        ice.body_mut().angular_velocity = Vec3::new(0.0, 0.0, 2.0);

        let released = ice.dissolve();
        assert_eq!(released.len(), 1);
        assert!(!a.is_frozen());
        // v + w x r with r = (0.2, 0, 0): (1, 0.4, 0)
        let expected = Vec3::new(1.0, 0.4, 0.0);
        assert!(
            a.linear_velocity().distance(expected) < 1e-5,
            "release velocity {} != {}",
            a.linear_velocity(),
            expected
        );
    }
}
