//! Simulation engine.
//!
//! `SimulationEngine` owns the space, processes queued commands, runs all
//! systems at a fixed step and produces `SpaceSnapshot`s. Completely
//! headless; rendering goes through whatever `Renderer` the caller passes.

use std::collections::VecDeque;

use glam::{DMat3, DVec3};
use hecs::Entity;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use stardrift_core::commands::SimCommand;
use stardrift_core::components::{Body, Ecm, Hull};
use stardrift_core::constants::{DT, TONNES_TO_KG};
use stardrift_core::enums::BodyKind;
use stardrift_core::error::CorruptSaveError;
use stardrift_core::events::{GameEvent, SfxEvent};
use stardrift_core::properties::Properties;
use stardrift_core::serial;
use stardrift_core::ship_type::{ship_type, ShipTypeId};
use stardrift_core::state::SpaceSnapshot;
use stardrift_core::types::{FrameId, SimTime};
use stardrift_graphics::{Color, RenderResult, Renderer, RendererError};

use crate::dynamics;
use crate::events::EventQueue;
use crate::missile::{self, Missile};
use crate::propulsion::Propulsion;
use crate::render::{self, Camera, MissileGraphics};
use crate::save;
use crate::space::Space;
use crate::systems;

/// Configuration for starting a new simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
    /// Seconds simulated per tick at time scale 1.0.
    pub time_step: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            time_step: DT,
        }
    }
}

/// The simulation engine. Owns the space and all sim state.
pub struct SimulationEngine {
    space: Space,
    time: SimTime,
    paused: bool,
    time_scale: f64,
    time_step: f64,
    rng: ChaCha8Rng,
    command_queue: VecDeque<SimCommand>,
    events: EventQueue,
    last_events: Vec<GameEvent>,
}

impl SimulationEngine {
    /// Create a new simulation engine with the given config.
    pub fn new(config: SimConfig) -> Self {
        Self::with_space(config, Space::new(), SimTime::default())
    }

    fn with_space(config: SimConfig, space: Space, time: SimTime) -> Self {
        Self {
            space,
            time,
            paused: false,
            time_scale: 1.0,
            time_step: config.time_step,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            command_queue: VecDeque::new(),
            events: EventQueue::default(),
            last_events: Vec::new(),
        }
    }

    /// Restore an engine from `save` output.
    pub fn from_save(config: SimConfig, doc: &Value) -> Result<Self, CorruptSaveError> {
        let time: SimTime = serde_json::from_value(serial::field(doc, "time")?.clone())
            .map_err(|_| CorruptSaveError::WrongType {
                field: "time".into(),
                expected: "a simulation time",
            })?;
        let space = save::load_space(serial::field(doc, "space")?)?;
        info!(tick = time.tick, bodies = space.index().len(), "save loaded");
        Ok(Self::with_space(config, space, time))
    }

    /// Serialize the simulation. Queued commands are not saved.
    pub fn save(&self) -> Value {
        json!({
            "time": self.time,
            "space": save::save_space(&self.space),
        })
    }

    /// Queue a command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: SimCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = SimCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance the simulation by one tick and return the resulting snapshot.
    pub fn tick(&mut self) -> SpaceSnapshot {
        self.process_commands();

        let dt = self.time_step * self.time_scale;
        if !self.paused && dt > 0.0 {
            self.run_systems(dt);
            self.time.advance(dt);
        }
        // Commands can kill bodies even while paused.
        systems::cleanup::run(&mut self.space, &mut self.events);

        self.last_events = self.events.take_game_events();
        let changes = systems::snapshot::take_property_changes(&mut self.space);
        systems::snapshot::build_snapshot(
            &self.space,
            &self.time,
            self.paused,
            &self.last_events,
            changes,
        )
    }

    /// Draw the scene into one frame. Once `begin_frame` succeeds the frame
    /// is always ended, so a failure here never blocks the next tick's frame.
    /// A failed draw discards the frame without presenting it.
    pub fn render(
        &self,
        renderer: &mut dyn Renderer,
        gfx: &MissileGraphics,
        camera: &Camera,
    ) -> RenderResult {
        if let Err(err) = renderer.begin_frame() {
            warn!(error = %err, "frame skipped");
            return Err(err);
        }
        let drawn = self.draw_scene(renderer, gfx, camera);
        renderer.end_frame()?;
        if let Err(err) = drawn {
            warn!(error = %err, "frame discarded");
            return Err(err);
        }
        renderer.swap_buffers()
    }

    fn draw_scene(
        &self,
        renderer: &mut dyn Renderer,
        gfx: &MissileGraphics,
        camera: &Camera,
    ) -> RenderResult {
        skip_unsupported(renderer.set_clear_color(Color::BLACK))?;
        skip_unsupported(renderer.clear_screen())?;
        let aspect = renderer.display_aspect();
        skip_unsupported(renderer.set_perspective_projection(60.0, aspect, 1.0, 1.0e7))?;
        render::render_missiles(&self.space, renderer, gfx, camera)
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn space(&self) -> &Space {
        &self.space
    }

    pub fn space_mut(&mut self) -> &mut Space {
        &mut self.space
    }

    /// Game events raised during the last tick.
    pub fn last_events(&self) -> &[GameEvent] {
        &self.last_events
    }

    /// Effects requested since the last call.
    pub fn take_sfx(&mut self) -> Vec<SfxEvent> {
        self.events.take_sfx()
    }

    pub fn add_frame(&mut self, origin: DVec3) -> FrameId {
        self.space.add_frame(origin)
    }

    /// Spawn a ship hull with full fuel and undamaged hull.
    pub fn spawn_ship(&mut self, type_id: ShipTypeId, frame: FrameId, position: DVec3) -> Entity {
        let st = ship_type(type_id);
        let mut body = Body::new(BodyKind::Ship, st.name, frame, position);
        body.mass = st.hull_mass * TONNES_TO_KG;
        body.angular_inertia = dynamics::sphere_inertia(body.mass, st.model_radius);
        body.orient = DMat3::IDENTITY;

        let hull = Hull::new(st.hull_integrity.unwrap_or(body.mass));
        let entity = self.space.spawn(
            body,
            (type_id, hull, Propulsion::new(&st), Properties::new()),
        );
        debug!(?entity, type_id = type_id.as_str(), "ship spawned");
        entity
    }

    /// Spawn a passive body such as a star or cargo pod.
    pub fn spawn_body(&mut self, body: Body) -> Entity {
        self.space.spawn(body, (Properties::new(),))
    }

    /// Fit an ECM of `power` to a ship.
    pub fn fit_ecm(&mut self, ship: Entity, power: u8) -> bool {
        self.space.world.insert_one(ship, Ecm { power }).is_ok()
    }

    /// Launch a disarmed missile from `firer`, flying a kamikaze run at
    /// `target` if one is given.
    pub fn launch_missile(
        &mut self,
        firer: Entity,
        type_id: ShipTypeId,
        power: Option<u8>,
        target: Option<Entity>,
    ) -> Option<Entity> {
        let Some(launched) = missile::launch(&mut self.space, firer, type_id, power) else {
            warn!(?firer, "launch from a missing body ignored");
            return None;
        };
        if let Some(target) = target {
            if let Ok(mut m) = self.space.world.get::<&mut Missile>(launched) {
                m.ai_kamikaze(target);
            }
        }
        info!(?firer, missile = ?launched, type_id = type_id.as_str(), "missile launched");
        Some(launched)
    }

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    /// Handle a single command.
    fn handle_command(&mut self, command: SimCommand) {
        match command {
            SimCommand::FireMissile {
                firer,
                ship_type,
                power,
                target,
            } => {
                self.launch_missile(firer, ship_type, power, target);
            }
            SimCommand::ArmMissile { missile } => {
                missile::arm(&mut self.space, missile);
            }
            SimCommand::DisarmMissile { missile } => {
                missile::disarm(&mut self.space, missile);
            }
            SimCommand::Kamikaze {
                missile: entity,
                target,
            } => {
                if let Ok(mut m) = self.space.world.get::<&mut Missile>(entity) {
                    m.ai_kamikaze(target);
                }
            }
            SimCommand::FireEcm { ship } => {
                systems::ecm::fire(&mut self.space, ship, &mut self.events);
            }
            SimCommand::SetTimeScale { scale } => {
                self.time_scale = scale.clamp(0.0, 4.0);
            }
            SimCommand::Pause => {
                self.paused = true;
            }
            SimCommand::Resume => {
                self.paused = false;
            }
        }
    }

    /// Run all systems in order.
    fn run_systems(&mut self, dt: f64) {
        // 1. Autopilots and thrust smoke
        systems::autopilot::run(&mut self.space, dt, &mut self.rng, &mut self.events);
        // 2. Ships and passive bodies
        systems::movement::run(&mut self.space, dt);
        // 3. Missile integration, owner check, proximity fuse
        systems::missile_flight::run(&mut self.space, dt, &mut self.events);
    }
}

/// A state setter the backend lacks leaves its effect out of the frame.
fn skip_unsupported(result: RenderResult) -> RenderResult {
    match result {
        Err(RendererError::Unsupported { operation }) => {
            warn!(operation, "renderer state skipped");
            Ok(())
        }
        other => other,
    }
}
