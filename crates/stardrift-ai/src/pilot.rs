//! Plain-data input and output of one autopilot step.

use glam::{DMat3, DVec3};

/// Kinematic state of the body being piloted, in its own frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PilotContext {
    pub position: DVec3,
    pub velocity: DVec3,
    pub angular_velocity: DVec3,
    pub orient: DMat3,
    /// Forward acceleration available at full thrust (m/s^2).
    pub accel_fwd: f64,
    /// Remaining fuel fraction.
    pub fuel: f64,
    pub time_step: f64,
    /// State of the command's target, `None` if it is gone.
    pub target: Option<TargetState>,
}

/// Kinematic state of a command's target, relative to the pilot's frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetState {
    pub position: DVec3,
    pub velocity: DVec3,
}

/// Thruster demand for the next step, each axis in [-1, 1] in body frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PilotUpdate {
    pub lin_thrust: DVec3,
    pub ang_thrust: DVec3,
    /// The command is finished and should be discarded.
    pub done: bool,
}

impl PilotUpdate {
    pub fn finished() -> Self {
        Self {
            done: true,
            ..Default::default()
        }
    }
}

/// Forward axis of every hull in body coordinates.
pub const FORWARD: DVec3 = DVec3::NEG_Z;

/// Angular demand that turns the nose toward `dir` (frame coordinates),
/// damped by the current spin.
pub fn face_direction(ctx: &PilotContext, dir: DVec3) -> DVec3 {
    const TURN_GAIN: f64 = 4.0;
    const SPIN_DAMPING: f64 = 1.5;

    let local = ctx.orient.transpose() * dir;
    let Some(local) = local.try_normalize() else {
        return DVec3::ZERO;
    };
    let axis = FORWARD.cross(local);
    let angle = FORWARD.dot(local).clamp(-1.0, 1.0).acos();
    let axis = match axis.try_normalize() {
        Some(a) => a,
        // Pointing straight away: any perpendicular axis works.
        None if angle > 1.0 => DVec3::Y,
        None => DVec3::ZERO,
    };
    let spin = ctx.orient.transpose() * ctx.angular_velocity;
    (axis * angle * TURN_GAIN - spin * SPIN_DAMPING).clamp(DVec3::splat(-1.0), DVec3::splat(1.0))
}

/// Linear demand that matches `target_vel` (frame coordinates) as fast as
/// thrust allows.
pub fn accel_to_velocity(ctx: &PilotContext, target_vel: DVec3) -> DVec3 {
    let max_dv = ctx.accel_fwd * ctx.time_step;
    if max_dv <= 0.0 {
        return DVec3::ZERO;
    }
    let diff = ctx.orient.transpose() * (target_vel - ctx.velocity);
    (diff / max_dv).clamp(DVec3::splat(-1.0), DVec3::splat(1.0))
}
