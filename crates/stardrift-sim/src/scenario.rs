//! Scripted engagement used by the headless runner and the long tests.
//!
//! A frigate fires at a shuttle. The shuttle's ECM defeats the first,
//! weaker missile; the second one gets through.

use glam::DVec3;
use hecs::Entity;

use stardrift_core::commands::SimCommand;
use stardrift_core::constants::TICK_RATE;
use stardrift_core::ship_type::ShipTypeId;
use stardrift_core::types::FrameId;

use crate::engine::SimulationEngine;

/// ECM strength fitted to the shuttle.
pub const SHUTTLE_ECM_POWER: u8 = 2;

/// Range between the ships at the start (m).
const SEPARATION: f64 = 3000.0;

/// Delay between launch and arming, so the fuse clears the launcher.
const ARM_DELAY_TICKS: u64 = 2 * TICK_RATE as u64;

const SECOND_LAUNCH_TICK: u64 = 5 * TICK_RATE as u64;
const ECM_TICKS: [u64; 2] = [4 * TICK_RATE as u64, 8 * TICK_RATE as u64];

#[derive(Debug, Clone)]
pub struct Engagement {
    pub frigate: Entity,
    pub shuttle: Entity,
    /// Missiles launched so far, with their launch tick.
    pub missiles: Vec<(Entity, u64)>,
    /// Last tick whose actions were issued; time stands still while paused.
    last_step: Option<u64>,
}

impl Engagement {
    /// Spawn both ships in the root frame.
    pub fn setup(engine: &mut SimulationEngine) -> Self {
        let frigate = engine.spawn_ship(ShipTypeId::Frigate, FrameId::ROOT, DVec3::ZERO);
        let shuttle = engine.spawn_ship(
            ShipTypeId::Shuttle,
            FrameId::ROOT,
            DVec3::new(0.0, 0.0, -SEPARATION),
        );
        engine.fit_ecm(shuttle, SHUTTLE_ECM_POWER);
        Self {
            frigate,
            shuttle,
            missiles: Vec::new(),
            last_step: None,
        }
    }

    /// Issue this tick's scripted actions. Call before `engine.tick()`.
    pub fn step(&mut self, engine: &mut SimulationEngine) {
        let tick = engine.time().tick;
        if self.last_step == Some(tick) {
            return;
        }
        self.last_step = Some(tick);
        let launch = match tick {
            0 => Some(ShipTypeId::MissileGuided),
            SECOND_LAUNCH_TICK => Some(ShipTypeId::MissileSmart),
            _ => None,
        };
        if let Some(type_id) = launch {
            if let Some(missile) =
                engine.launch_missile(self.frigate, type_id, None, Some(self.shuttle))
            {
                self.missiles.push((missile, tick));
            }
        }
        for &(missile, launched) in &self.missiles {
            if tick == launched + ARM_DELAY_TICKS {
                engine.queue_command(SimCommand::ArmMissile { missile });
            }
        }
        if ECM_TICKS.contains(&tick) {
            engine.queue_command(SimCommand::FireEcm { ship: self.shuttle });
        }
    }
}
