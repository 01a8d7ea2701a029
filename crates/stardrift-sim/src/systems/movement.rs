//! Integration of every non-missile body.
//!
//! Bodies with propulsion get their thrust applied and burn fuel; the rest
//! drift.

use stardrift_core::components::{Body, Dead};

use crate::dynamics;
use crate::missile::Missile;
use crate::propulsion::Propulsion;
use crate::space::Space;

pub fn run(space: &mut Space, dt: f64) {
    for (_entity, (body, propulsion)) in space
        .world
        .query_mut::<(&mut Body, Option<&mut Propulsion>)>()
        .without::<&Missile>()
        .without::<&Dead>()
    {
        if let Some(propulsion) = propulsion {
            dynamics::add_rel_force(body, propulsion.actual_lin_thrust());
            dynamics::add_rel_torque(body, propulsion.actual_ang_thrust());
            dynamics::integrate(body, dt);
            propulsion.update_fuel(dt);
        } else {
            dynamics::integrate(body, dt);
        }
    }
}
