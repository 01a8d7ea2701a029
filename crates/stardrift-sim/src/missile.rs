//! Self-propelled, self-detonating projectiles.
//!
//! A missile is a dynamic body with propulsion, a proximity fuse and an
//! optional autopilot. It starts disarmed. Once armed, it detonates when
//! any other body comes within `MISSILE_DETECTION_RADIUS`, damaging every
//! body of its frame within `MISSILE_DAMAGE_RADIUS`. A missile whose firer
//! has left the world detonates on its next step whether armed or not.

use std::collections::VecDeque;

use glam::{DMat3, DVec3};
use hecs::Entity;
use rand::Rng;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use stardrift_ai::{AiCommand, AiError, Kamikaze, PilotContext, TargetState};
use stardrift_core::components::Body;
use stardrift_core::constants::*;
use stardrift_core::enums::BodyKind;
use stardrift_core::error::CorruptSaveError;
use stardrift_core::events::{GameEvent, SfxEvent};
use stardrift_core::properties::Properties;
use stardrift_core::serial::{self, BodyIndexer};
use stardrift_core::ship_type::{ship_type, ShipType, ShipTypeId};
use stardrift_core::types::FrameId;

use crate::damage::{self, DamageOutcome};
use crate::dynamics;
use crate::events::EventQueue;
use crate::propulsion::Propulsion;
use crate::space::Space;

pub const SAVE_KEY: &str = "missile";

#[derive(Debug)]
pub struct Missile {
    ship_type: ShipTypeId,
    power: u8,
    armed: bool,
    /// Firer. Not owned; cleared when the firer is removed.
    owner: Option<Entity>,
    /// Saved owner index awaiting fixup.
    owner_index: Option<i64>,
    ai: Option<Box<dyn AiCommand>>,
    ai_message: AiError,
    decelerating: bool,
    /// Seconds since the last smoke puff.
    smoke_accum: f64,
}

impl Missile {
    /// A disarmed missile without autopilot. With no explicit `power` the
    /// rank comes from the type.
    pub fn new(ship_type: ShipTypeId, owner: Option<Entity>, power: Option<u8>) -> Self {
        Self {
            ship_type,
            power: power.unwrap_or_else(|| ship_type.default_missile_power()),
            armed: false,
            owner,
            owner_index: None,
            ai: None,
            ai_message: AiError::None,
            decelerating: false,
            smoke_accum: 0.0,
        }
    }

    pub fn ship_type(&self) -> ShipTypeId {
        self.ship_type
    }

    pub fn power(&self) -> u8 {
        self.power
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn owner(&self) -> Option<Entity> {
        self.owner
    }

    pub fn ai(&self) -> Option<&dyn AiCommand> {
        self.ai.as_deref()
    }

    pub fn ai_message(&self) -> AiError {
        self.ai_message
    }

    pub fn is_decelerating(&self) -> bool {
        self.decelerating
    }

    pub fn arm(&mut self, props: &mut Properties) {
        self.armed = true;
        props.set(PROPERTY_IS_ARMED, true);
    }

    pub fn disarm(&mut self, props: &mut Properties) {
        self.armed = false;
        props.set(PROPERTY_IS_ARMED, false);
    }

    /// Replace the autopilot with a pursuit-to-impact run on `target`.
    pub fn ai_kamikaze(&mut self, target: Entity) {
        self.ai = Some(Box::new(Kamikaze::new(target)));
    }

    /// A body left the world. Returns true if it was this missile's firer.
    pub fn notify_removed(&mut self, removed: Entity) -> bool {
        if let Some(cmd) = self.ai.as_mut() {
            cmd.on_deleted(removed);
        }
        if self.owner == Some(removed) {
            self.owner = None;
            return true;
        }
        false
    }

    pub fn save_to_json(&self, obj: &mut Map<String, Value>, indexer: &dyn BodyIndexer) {
        let mut missile = Map::new();
        if let Some(cmd) = &self.ai {
            cmd.save_to_json(&mut missile, indexer);
        }
        missile.insert("ai_message".into(), json!(self.ai_message.code()));
        missile.insert(
            "index_for_body".into(),
            json!(indexer.index_for_body(self.owner)),
        );
        missile.insert("power".into(), json!(self.power));
        missile.insert("armed".into(), json!(self.armed));
        missile.insert("ship_type_id".into(), json!(self.ship_type.as_str()));
        obj.insert(SAVE_KEY.to_string(), Value::Object(missile));
    }

    /// Restore from a body's save object. The owner stays unresolved until
    /// `post_load_fixup`.
    pub fn load_from_json(obj: &Value) -> Result<Self, CorruptSaveError> {
        let missile = serial::field(obj, SAVE_KEY)?;
        let type_id = serial::get_str(missile, "ship_type_id")?;
        let ship_type = ShipTypeId::from_id(type_id)
            .ok_or_else(|| CorruptSaveError::UnknownShipType(type_id.to_string()))?;
        let ai = stardrift_ai::load_from_json(missile)?;
        let ai_message = AiError::from_code(serial::get_i64(missile, "ai_message")?).ok_or(
            CorruptSaveError::WrongType {
                field: "ai_message".into(),
                expected: "an AI error code",
            },
        )?;
        let owner_index = serial::get_i64(missile, "index_for_body")?;
        let power = u8::try_from(serial::get_i64(missile, "power")?).map_err(|_| {
            CorruptSaveError::WrongType {
                field: "power".into(),
                expected: "a power rank",
            }
        })?;
        let armed = serial::get_bool(missile, "armed")?;

        Ok(Self {
            ship_type,
            power,
            armed,
            owner: None,
            owner_index: Some(owner_index),
            ai,
            ai_message,
            decelerating: false,
            smoke_accum: 0.0,
        })
    }

    pub fn post_load_fixup(&mut self, indexer: &dyn BodyIndexer) -> Result<(), CorruptSaveError> {
        if let Some(index) = self.owner_index.take() {
            self.owner = indexer.body_by_index(index)?;
        }
        if let Some(cmd) = self.ai.as_mut() {
            cmd.post_load_fixup(indexer)?;
        }
        Ok(())
    }
}

/// Physics body for a fresh missile of `ship_type`.
pub fn missile_body(ship_type: &ShipType, frame: FrameId, position: DVec3) -> Body {
    let mut body = Body::new(BodyKind::Missile, MISSILE_LABEL, frame, position);
    body.mass = ship_type.hull_mass * TONNES_TO_KG;
    body.angular_inertia = dynamics::sphere_inertia(body.mass, ship_type.model_radius);
    body
}

/// Spawn a disarmed missile with a full tank.
#[allow(clippy::too_many_arguments)]
pub fn spawn(
    space: &mut Space,
    type_id: ShipTypeId,
    owner: Option<Entity>,
    power: Option<u8>,
    frame: FrameId,
    position: DVec3,
    velocity: DVec3,
    orient: DMat3,
) -> Entity {
    let st = ship_type(type_id);
    let mut body = missile_body(&st, frame, position);
    body.velocity = velocity;
    body.orient = orient;

    let mut propulsion = Propulsion::new(&st);
    propulsion.set_fuel(1.0);
    propulsion.set_fuel_reserve(0.0);

    let mut missile = Missile::new(type_id, owner, power);
    let mut props = Properties::new();
    missile.disarm(&mut props);

    let entity = space.spawn(body, (missile, propulsion, props));
    debug!(?entity, type_id = type_id.as_str(), "missile spawned");
    entity
}

/// Launch a missile from under `firer`'s hull, matching its velocity.
pub fn launch(
    space: &mut Space,
    firer: Entity,
    type_id: ShipTypeId,
    power: Option<u8>,
) -> Option<Entity> {
    if !space.is_alive(firer) {
        return None;
    }
    let (frame, position, velocity, orient) = {
        let body = space.world.get::<&Body>(firer).ok()?;
        (body.frame, body.position, body.velocity, body.orient)
    };
    let drop = space
        .world
        .get::<&ShipTypeId>(firer)
        .map(|t| ship_type(*t).model_radius)
        .unwrap_or(0.0);
    let position = position + orient * DVec3::new(0.0, -drop, 0.0);
    Some(spawn(
        space,
        type_id,
        Some(firer),
        power,
        frame,
        position,
        velocity,
        orient,
    ))
}

pub fn arm(space: &mut Space, missile: Entity) -> bool {
    match space
        .world
        .query_one_mut::<(&mut Missile, &mut Properties)>(missile)
    {
        Ok((m, props)) => {
            m.arm(props);
            true
        }
        Err(_) => false,
    }
}

pub fn disarm(space: &mut Space, missile: Entity) -> bool {
    match space
        .world
        .query_one_mut::<(&mut Missile, &mut Properties)>(missile)
    {
        Ok((m, props)) => {
            m.disarm(props);
            true
        }
        Err(_) => false,
    }
}

/// Autopilot input for `missile`, with its target looked up in `space`.
fn pilot_context(space: &Space, missile: Entity, dt: f64) -> Option<PilotContext> {
    let body = space.world.get::<&Body>(missile).ok()?;
    let propulsion = space.world.get::<&Propulsion>(missile).ok()?;
    let m = space.world.get::<&Missile>(missile).ok()?;

    let target = m
        .ai()
        .and_then(|cmd| cmd.target())
        .filter(|t| space.is_alive(*t))
        .and_then(|t| {
            let position = space.absolute_position(t)?;
            let velocity = space.world.get::<&Body>(t).ok()?.velocity;
            Some(TargetState { position, velocity })
        });

    Some(PilotContext {
        position: space.frame_origin(body.frame) + body.position,
        velocity: body.velocity,
        angular_velocity: body.angular_velocity,
        orient: body.orient,
        accel_fwd: propulsion.accel_fwd(body.mass),
        fuel: propulsion.fuel(),
        time_step: dt,
        target,
    })
}

/// Per-tick autopilot step and thrust smoke.
pub fn static_update<R: Rng>(
    space: &mut Space,
    missile: Entity,
    dt: f64,
    rng: &mut R,
    events: &mut EventQueue,
) {
    if !space.is_alive(missile) {
        return;
    }
    let ctx = pilot_context(space, missile, dt);
    let Ok((body, m, propulsion)) = space
        .world
        .query_one_mut::<(&Body, &mut Missile, &mut Propulsion)>(missile)
    else {
        return;
    };

    let finished = match (m.ai.as_mut(), ctx) {
        (Some(cmd), Some(ctx)) => {
            let update = cmd.time_step_update(&ctx);
            if !update.done {
                propulsion.set_lin_thruster_state(update.lin_thrust);
                propulsion.set_ang_thruster_state(update.ang_thrust);
            }
            update.done
        }
        _ => {
            propulsion.clear_thruster_state();
            false
        }
    };
    if finished {
        debug!(?missile, "autopilot finished");
        m.ai = None;
        events.raise(GameEvent::AiCommandComplete { body: missile });
    }

    m.smoke_accum += dt;
    if propulsion.is_thrusting()
        && (m.smoke_accum > SMOKE_THROTTLE_SECS || SMOKE_RANDOM_SCALE * rng.gen::<f64>() < dt)
    {
        m.smoke_accum = 0.0;
        let offset = body.orient * MISSILE_EXHAUST_OFFSET;
        let thrust_z = propulsion.lin_thruster_state().z.abs();
        let speed =
            (SMOKE_SPEED_SCALE * body.velocity.length() * thrust_z.max(1.0)).min(SMOKE_SPEED_CAP);
        events.add_sfx(SfxEvent::ThrustSmoke {
            body: missile,
            speed: speed as f32,
            offset,
        });
    }
}

/// Integrate thrust, burn fuel, then check the owner and the fuse.
pub fn time_step_update(space: &mut Space, missile: Entity, dt: f64, events: &mut EventQueue) {
    if !space.is_alive(missile) {
        return;
    }
    let (owner, armed) = {
        let Ok((body, m, propulsion)) = space
            .world
            .query_one_mut::<(&mut Body, &Missile, &mut Propulsion)>(missile)
        else {
            return;
        };
        dynamics::add_rel_force(body, propulsion.actual_lin_thrust());
        dynamics::add_rel_torque(body, propulsion.actual_ang_thrust());
        dynamics::integrate(body, dt);
        propulsion.update_fuel(dt);
        (m.owner, m.armed)
    };

    if owner.is_none() {
        debug!(?missile, "no owner, self-destructing");
        explode(space, missile, events);
    } else if armed {
        let Some(position) = space.absolute_position(missile) else {
            return;
        };
        for body in space.bodies_maybe_near(position, MISSILE_DETECTION_RADIUS) {
            if body == missile {
                continue;
            }
            let Some(other) = space.absolute_position(body) else {
                continue;
            };
            if other.distance(position) < MISSILE_DETECTION_RADIUS {
                explode(space, missile, events);
                break;
            }
        }
    }
}

/// Collisions always detonate a live missile.
pub fn on_collision(space: &mut Space, missile: Entity, _other: Entity, events: &mut EventQueue) -> bool {
    if space.is_alive(missile) {
        explode(space, missile, events);
    }
    true
}

/// Any damage detonates a live missile, whatever the amount.
pub fn on_damage(
    space: &mut Space,
    missile: Entity,
    _attacker: Option<Entity>,
    _amount: f64,
    events: &mut EventQueue,
) -> bool {
    if space.is_alive(missile) {
        explode(space, missile, events);
    }
    true
}

/// An ECM burst of `power` defeats missiles of lower rank.
pub fn ecm_attack(space: &mut Space, missile: Entity, power: u8, events: &mut EventQueue) {
    let rank = match space.world.get::<&Missile>(missile) {
        Ok(m) => m.power,
        Err(_) => return,
    };
    if power > rank {
        on_damage(space, missile, None, ECM_NOMINAL_DAMAGE, events);
    }
}

/// Detonate `missile`. Missiles caught in the blast detonate after this
/// sweep, one sweep each.
pub fn explode(space: &mut Space, missile: Entity, events: &mut EventQueue) {
    let mut pending = VecDeque::from([missile]);
    while let Some(next) = pending.pop_front() {
        sweep(space, next, events, &mut pending);
    }
}

fn sweep(space: &mut Space, missile: Entity, events: &mut EventQueue, pending: &mut VecDeque<Entity>) {
    if !space.is_alive(missile) {
        return;
    }
    let (frame, position, owner) = {
        let (Ok(body), Ok(m)) = (
            space.world.get::<&Body>(missile),
            space.world.get::<&Missile>(missile),
        ) else {
            return;
        };
        (body.frame, body.position, m.owner)
    };
    space.kill_body(missile);
    info!(?missile, %frame, "missile detonated");

    let center = space.frame_origin(frame) + position;
    for candidate in space.bodies_maybe_near(center, MISSILE_DAMAGE_RADIUS) {
        if !space.is_alive(candidate) {
            continue;
        }
        let (candidate_frame, candidate_pos, kind) = match space.world.get::<&Body>(candidate) {
            Ok(b) => (b.frame, b.position, b.kind),
            Err(_) => continue,
        };
        if candidate_frame != frame {
            continue;
        }
        let dist = candidate_pos.distance(position);
        if dist < MISSILE_DAMAGE_RADIUS {
            let amount = MISSILE_BASE_DAMAGE * (MISSILE_DAMAGE_RADIUS - dist) / MISSILE_DAMAGE_RADIUS;
            if damage::apply(space, candidate, owner, amount) == DamageOutcome::Detonate {
                pending.push_back(candidate);
            }
            if kind.is_ship() {
                events.raise(GameEvent::ShipHit {
                    ship: candidate,
                    attacker: owner,
                });
            }
        }
    }

    events.add_sfx(SfxEvent::Explosion { position, frame });
    events.raise(GameEvent::Detonated {
        missile,
        position,
        frame,
    });
}
