//! Rigid body integration.

use glam::{DMat3, DQuat, DVec3};

use stardrift_core::components::Body;

/// Add a force in body coordinates.
pub fn add_rel_force(body: &mut Body, force: DVec3) {
    body.force += force;
}

/// Add a torque in body coordinates.
pub fn add_rel_torque(body: &mut Body, torque: DVec3) {
    body.torque += torque;
}

/// Moment of inertia of a uniform sphere.
pub fn sphere_inertia(mass: f64, radius: f64) -> f64 {
    0.4 * mass * radius * radius
}

/// Semi-implicit Euler step. Consumes the accumulated force and torque.
pub fn integrate(body: &mut Body, dt: f64) {
    if body.mass > 0.0 {
        let accel = body.orient * body.force / body.mass;
        body.velocity += accel * dt;
    }
    if body.angular_inertia > 0.0 {
        let ang_accel = body.orient * body.torque / body.angular_inertia;
        body.angular_velocity += ang_accel * dt;
    }
    body.position += body.velocity * dt;

    let spin = body.angular_velocity * dt;
    let angle = spin.length();
    if angle > 0.0 {
        let rot = DQuat::from_axis_angle(spin / angle, angle);
        // Renormalize through a quaternion to keep the basis orthonormal.
        let orient = (rot * DQuat::from_mat3(&body.orient)).normalize();
        body.orient = DMat3::from_quat(orient);
    }

    body.force = DVec3::ZERO;
    body.torque = DVec3::ZERO;
}
