//! Thrusters and fuel.
//!
//! Thruster demand is set per axis in [-1, 1] in body coordinates; actual
//! thrust scales the demand by the hull's thrust table and drops to zero
//! once the tank is empty.

use glam::DVec3;
use serde_json::{json, Map, Value};

use stardrift_core::constants::TONNES_TO_KG;
use stardrift_core::enums::Thruster;
use stardrift_core::error::CorruptSaveError;
use stardrift_core::serial;
use stardrift_core::ship_type::{LinearThrust, ShipType};

pub const SAVE_KEY: &str = "propulsion";

#[derive(Debug, Clone, PartialEq)]
pub struct Propulsion {
    /// Remaining fuel fraction, 0..=1.
    fuel: f64,
    /// Fraction the autopilot keeps back.
    fuel_reserve: f64,
    /// Tank mass in kg.
    tank_mass: f64,
    effective_exhaust_velocity: f64,
    lin_thrust: LinearThrust,
    ang_thrust: f64,
    lin_thruster_state: DVec3,
    ang_thruster_state: DVec3,
}

impl Propulsion {
    pub fn new(ship_type: &ShipType) -> Self {
        let mut propulsion = Self {
            fuel: 1.0,
            fuel_reserve: 0.0,
            tank_mass: 0.0,
            effective_exhaust_velocity: 0.0,
            lin_thrust: ship_type.lin_thrust,
            ang_thrust: 0.0,
            lin_thruster_state: DVec3::ZERO,
            ang_thruster_state: DVec3::ZERO,
        };
        propulsion.init(ship_type);
        propulsion
    }

    /// Load the hull's thrust tables. Fuel and thruster state are kept.
    pub fn init(&mut self, ship_type: &ShipType) {
        self.tank_mass = ship_type.fuel_tank_mass * TONNES_TO_KG;
        self.effective_exhaust_velocity = ship_type.effective_exhaust_velocity;
        self.lin_thrust = ship_type.lin_thrust;
        self.ang_thrust = ship_type.ang_thrust;
    }

    pub fn fuel(&self) -> f64 {
        self.fuel
    }

    pub fn set_fuel(&mut self, fuel: f64) {
        self.fuel = fuel.clamp(0.0, 1.0);
    }

    pub fn fuel_reserve(&self) -> f64 {
        self.fuel_reserve
    }

    pub fn set_fuel_reserve(&mut self, reserve: f64) {
        self.fuel_reserve = reserve.clamp(0.0, 1.0);
    }

    pub fn lin_thruster_state(&self) -> DVec3 {
        self.lin_thruster_state
    }

    pub fn ang_thruster_state(&self) -> DVec3 {
        self.ang_thruster_state
    }

    pub fn set_lin_thruster_state(&mut self, demand: DVec3) {
        self.lin_thruster_state = demand.clamp(DVec3::splat(-1.0), DVec3::splat(1.0));
    }

    pub fn set_ang_thruster_state(&mut self, demand: DVec3) {
        self.ang_thruster_state = demand.clamp(DVec3::splat(-1.0), DVec3::splat(1.0));
    }

    pub fn clear_lin_thruster_state(&mut self) {
        self.lin_thruster_state = DVec3::ZERO;
    }

    pub fn clear_ang_thruster_state(&mut self) {
        self.ang_thruster_state = DVec3::ZERO;
    }

    pub fn clear_thruster_state(&mut self) {
        self.clear_lin_thruster_state();
        self.clear_ang_thruster_state();
    }

    pub fn is_thrusting(&self) -> bool {
        self.lin_thruster_state.length_squared() != 0.0
    }

    /// Max thrust along one body axis for a demand sign.
    fn axis_thrust(&self, demand: f64, positive: Thruster, negative: Thruster) -> f64 {
        if demand > 0.0 {
            demand * self.lin_thrust.get(positive)
        } else {
            demand * self.lin_thrust.get(negative)
        }
    }

    /// Linear thrust in newtons, body coordinates. Forward is -Z.
    pub fn actual_lin_thrust(&self) -> DVec3 {
        if self.fuel <= 0.0 {
            return DVec3::ZERO;
        }
        let s = self.lin_thruster_state;
        DVec3::new(
            self.axis_thrust(s.x, Thruster::Right, Thruster::Left),
            self.axis_thrust(s.y, Thruster::Up, Thruster::Down),
            self.axis_thrust(s.z, Thruster::Reverse, Thruster::Forward),
        )
    }

    pub fn actual_ang_thrust(&self) -> DVec3 {
        if self.fuel <= 0.0 {
            return DVec3::ZERO;
        }
        self.ang_thruster_state * self.ang_thrust
    }

    /// Forward acceleration at full thrust for a body of `mass` kg.
    pub fn accel_fwd(&self, mass: f64) -> f64 {
        if mass <= 0.0 {
            return 0.0;
        }
        self.lin_thrust.forward / mass
    }

    /// Burn fuel for the thrust applied over `dt`.
    pub fn update_fuel(&mut self, dt: f64) {
        if self.tank_mass <= 0.0 || self.effective_exhaust_velocity <= 0.0 {
            return;
        }
        let thrust = self.actual_lin_thrust().length();
        let used = thrust / self.effective_exhaust_velocity * dt / self.tank_mass;
        self.fuel = (self.fuel - used).max(0.0);
    }

    pub fn save_to_json(&self, obj: &mut Map<String, Value>) {
        obj.insert(
            SAVE_KEY.to_string(),
            json!({
                "fuel": self.fuel,
                "reserve": self.fuel_reserve,
                "thrusters": serial::vec3_to_json(self.lin_thruster_state),
                "ang_thrusters": serial::vec3_to_json(self.ang_thruster_state),
            }),
        );
    }

    /// Restore fuel and thruster state. Thrust tables come from the hull
    /// type, loaded separately.
    pub fn load_from_json(obj: &Value, ship_type: &ShipType) -> Result<Self, CorruptSaveError> {
        let saved = serial::field(obj, SAVE_KEY)?;
        let mut propulsion = Self::new(ship_type);
        propulsion.set_fuel(serial::get_f64(saved, "fuel")?);
        propulsion.set_fuel_reserve(serial::get_f64(saved, "reserve")?);
        propulsion.set_lin_thruster_state(serial::get_vec3(saved, "thrusters")?);
        propulsion.set_ang_thruster_state(serial::get_vec3(saved, "ang_thrusters")?);
        Ok(propulsion)
    }
}
