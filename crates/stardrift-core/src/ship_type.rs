//! Ship and missile type table.
//!
//! Consolidates per-type hull, model and thruster parameters. Types are
//! referenced in save files by their string id.

use serde::{Deserialize, Serialize};

use crate::enums::Thruster;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipTypeId {
    MissileUnguided,
    MissileGuided,
    MissileSmart,
    MissileNaval,
    Shuttle,
    Frigate,
}

impl ShipTypeId {
    pub const ALL: [ShipTypeId; 6] = [
        ShipTypeId::MissileUnguided,
        ShipTypeId::MissileGuided,
        ShipTypeId::MissileSmart,
        ShipTypeId::MissileNaval,
        ShipTypeId::Shuttle,
        ShipTypeId::Frigate,
    ];

    /// Stable string id written to save files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipTypeId::MissileUnguided => "missile_unguided",
            ShipTypeId::MissileGuided => "missile_guided",
            ShipTypeId::MissileSmart => "missile_smart",
            ShipTypeId::MissileNaval => "missile_naval",
            ShipTypeId::Shuttle => "shuttle",
            ShipTypeId::Frigate => "frigate",
        }
    }

    pub fn from_id(id: &str) -> Option<ShipTypeId> {
        Self::ALL.into_iter().find(|t| t.as_str() == id)
    }

    /// Power rank a missile of this type gets when none is given:
    /// guided 1, smart 2, naval 3, everything else 0.
    pub fn default_missile_power(&self) -> u8 {
        match self {
            ShipTypeId::MissileGuided => 1,
            ShipTypeId::MissileSmart => 2,
            ShipTypeId::MissileNaval => 3,
            _ => 0,
        }
    }
}

/// Maximum thrust (N) per linear thruster direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearThrust {
    pub forward: f64,
    pub reverse: f64,
    pub up: f64,
    pub down: f64,
    pub left: f64,
    pub right: f64,
}

impl LinearThrust {
    pub fn get(&self, thruster: Thruster) -> f64 {
        match thruster {
            Thruster::Forward => self.forward,
            Thruster::Reverse => self.reverse,
            Thruster::Up => self.up,
            Thruster::Down => self.down,
            Thruster::Left => self.left,
            Thruster::Right => self.right,
        }
    }

    fn uniform(main: f64, lateral: f64) -> Self {
        Self {
            forward: main,
            reverse: lateral,
            up: lateral,
            down: lateral,
            left: lateral,
            right: lateral,
        }
    }
}

/// Static description of a hull.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipType {
    pub id: ShipTypeId,
    pub name: &'static str,
    pub model_name: &'static str,
    /// Hull mass in tonnes.
    pub hull_mass: f64,
    /// Fuel tank mass in tonnes.
    pub fuel_tank_mass: f64,
    /// Exhaust velocity (m/s), drives fuel use per unit thrust.
    pub effective_exhaust_velocity: f64,
    pub lin_thrust: LinearThrust,
    /// Maximum torque (N*m).
    pub ang_thrust: f64,
    /// Bounding radius of the model (m).
    pub model_radius: f64,
    /// Hull integrity for ship types; missiles have none.
    pub hull_integrity: Option<f64>,
}

impl ShipType {
    pub fn is_missile(&self) -> bool {
        matches!(
            self.id,
            ShipTypeId::MissileUnguided
                | ShipTypeId::MissileGuided
                | ShipTypeId::MissileSmart
                | ShipTypeId::MissileNaval
        )
    }
}

/// Get the type descriptor for a given id.
pub fn ship_type(id: ShipTypeId) -> ShipType {
    match id {
        ShipTypeId::MissileUnguided => ShipType {
            id,
            name: "Unguided Rocket",
            model_name: "missile_unguided",
            hull_mass: 0.5,
            fuel_tank_mass: 0.3,
            effective_exhaust_velocity: 2_500.0,
            lin_thrust: LinearThrust::uniform(60_000.0, 0.0),
            ang_thrust: 0.0,
            model_radius: 2.0,
            hull_integrity: None,
        },
        ShipTypeId::MissileGuided => ShipType {
            id,
            name: "Guided Missile",
            model_name: "missile",
            hull_mass: 1.0,
            fuel_tank_mass: 0.5,
            effective_exhaust_velocity: 3_000.0,
            lin_thrust: LinearThrust::uniform(120_000.0, 20_000.0),
            ang_thrust: 8_000.0,
            model_radius: 2.5,
            hull_integrity: None,
        },
        ShipTypeId::MissileSmart => ShipType {
            id,
            name: "Smart Missile",
            model_name: "missile",
            hull_mass: 1.0,
            fuel_tank_mass: 0.6,
            effective_exhaust_velocity: 3_500.0,
            lin_thrust: LinearThrust::uniform(150_000.0, 30_000.0),
            ang_thrust: 12_000.0,
            model_radius: 2.5,
            hull_integrity: None,
        },
        ShipTypeId::MissileNaval => ShipType {
            id,
            name: "Naval Missile",
            model_name: "missile_naval",
            hull_mass: 2.0,
            fuel_tank_mass: 1.2,
            effective_exhaust_velocity: 4_000.0,
            lin_thrust: LinearThrust::uniform(320_000.0, 60_000.0),
            ang_thrust: 30_000.0,
            model_radius: 3.5,
            hull_integrity: None,
        },
        ShipTypeId::Shuttle => ShipType {
            id,
            name: "Shuttle",
            model_name: "shuttle",
            hull_mass: 20.0,
            fuel_tank_mass: 10.0,
            effective_exhaust_velocity: 9_000.0,
            lin_thrust: LinearThrust::uniform(800_000.0, 300_000.0),
            ang_thrust: 200_000.0,
            model_radius: 12.0,
            hull_integrity: Some(20_000.0),
        },
        ShipTypeId::Frigate => ShipType {
            id,
            name: "Frigate",
            model_name: "frigate",
            hull_mass: 180.0,
            fuel_tank_mass: 60.0,
            effective_exhaust_velocity: 12_000.0,
            lin_thrust: LinearThrust::uniform(6_000_000.0, 2_000_000.0),
            ang_thrust: 3_000_000.0,
            model_radius: 45.0,
            hull_integrity: Some(180_000.0),
        },
    }
}
