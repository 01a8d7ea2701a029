//! Tests for missiles, the space, save/load, rendering and the engine.

use std::rc::Rc;

use glam::{DMat3, DVec3, Mat4};
use hecs::Entity;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;

use stardrift_ai::CommandKind;
use stardrift_core::commands::SimCommand;
use stardrift_core::components::{Body, Hull};
use stardrift_core::constants::*;
use stardrift_core::enums::BodyKind;
use stardrift_core::error::CorruptSaveError;
use stardrift_core::events::{GameEvent, SfxEvent};
use stardrift_core::properties::Properties;
use stardrift_core::serial::BodyIndexer;
use stardrift_core::ship_type::ShipTypeId;
use stardrift_core::state::SpaceSnapshot;
use stardrift_core::types::FrameId;
use stardrift_graphics::headless::{DrawCommand, HeadlessRenderer};
use stardrift_graphics::{MatrixMode, Renderer, RendererError};

use crate::engine::{SimConfig, SimulationEngine};
use crate::events::EventQueue;
use crate::missile::{self, Missile};
use crate::propulsion::Propulsion;
use crate::render::{self, Camera, MissileGraphics};
use crate::save;
use crate::scenario::Engagement;
use crate::space::Space;
use crate::systems;

const TARGET_HULL: f64 = 180_000.0;

// ---- Helpers ----

fn spawn_hull(space: &mut Space, frame: FrameId, position: DVec3) -> Entity {
    let mut body = Body::new(BodyKind::Ship, "target", frame, position);
    body.mass = 100_000.0;
    space.spawn(body, (Hull::new(TARGET_HULL), Properties::new()))
}

fn spawn_cargo(space: &mut Space, position: DVec3) -> Entity {
    space.spawn(
        Body::new(BodyKind::Cargo, "cargo", FrameId::ROOT, position),
        (),
    )
}

fn spawn_missile_at(space: &mut Space, owner: Option<Entity>, position: DVec3) -> Entity {
    missile::spawn(
        space,
        ShipTypeId::MissileGuided,
        owner,
        None,
        FrameId::ROOT,
        position,
        DVec3::ZERO,
        DMat3::IDENTITY,
    )
}

/// A space with a distant owner ship and one missile at the origin.
fn space_with_missile() -> (Space, Entity, Entity) {
    let mut space = Space::new();
    let owner = spawn_hull(&mut space, FrameId::ROOT, DVec3::new(0.0, 0.0, 10_000.0));
    let m = spawn_missile_at(&mut space, Some(owner), DVec3::ZERO);
    (space, owner, m)
}

fn integrity(space: &Space, e: Entity) -> f64 {
    space.world.get::<&Hull>(e).map(|h| h.integrity).unwrap_or(f64::NAN)
}

fn detonations(events: &[GameEvent]) -> Vec<Entity> {
    events
        .iter()
        .filter_map(|e| match e {
            GameEvent::Detonated { missile, .. } => Some(*missile),
            _ => None,
        })
        .collect()
}

fn find_missile(space: &Space) -> Entity {
    space
        .world
        .query::<&Missile>()
        .iter()
        .map(|(e, _)| e)
        .next()
        .expect("a missile")
}

// ---- Construction and arming ----

#[test]
fn test_power_resolution() {
    let tiers = [
        (ShipTypeId::MissileGuided, 1),
        (ShipTypeId::MissileSmart, 2),
        (ShipTypeId::MissileNaval, 3),
        (ShipTypeId::MissileUnguided, 0),
    ];
    for (type_id, rank) in tiers {
        assert_eq!(Missile::new(type_id, None, None).power(), rank);
        assert_eq!(Missile::new(type_id, None, Some(2)).power(), 2);
    }
}

#[test]
fn test_fresh_missile_state() {
    let (space, owner, m) = space_with_missile();
    let missile = space.world.get::<&Missile>(m).unwrap();
    assert!(!missile.is_armed());
    assert!(missile.ai().is_none());
    assert_eq!(missile.owner(), Some(owner));
    assert!(!missile.is_decelerating());

    let props = space.world.get::<&Properties>(m).unwrap();
    assert_eq!(props.get_bool(PROPERTY_IS_ARMED), Some(false));

    let propulsion = space.world.get::<&Propulsion>(m).unwrap();
    assert_eq!(propulsion.fuel(), 1.0);
    assert_eq!(propulsion.fuel_reserve(), 0.0);

    let body = space.world.get::<&Body>(m).unwrap();
    assert_eq!(body.mass, 1000.0);
    assert_eq!(body.label, MISSILE_LABEL);
}

#[test]
fn test_arm_disarm_idempotent() {
    let (mut space, _, m) = space_with_missile();
    assert!(missile::arm(&mut space, m));
    assert!(missile::arm(&mut space, m));
    {
        let missile = space.world.get::<&Missile>(m).unwrap();
        let props = space.world.get::<&Properties>(m).unwrap();
        assert!(missile.is_armed());
        assert_eq!(props.get_bool(PROPERTY_IS_ARMED), Some(true));
    }

    missile::disarm(&mut space, m);
    missile::arm(&mut space, m);
    missile::disarm(&mut space, m);
    let missile = space.world.get::<&Missile>(m).unwrap();
    let props = space.world.get::<&Properties>(m).unwrap();
    assert!(!missile.is_armed());
    assert_eq!(props.get_bool(PROPERTY_IS_ARMED), Some(false));
}

// ---- Proximity fuse ----

#[test]
fn test_detonation_radius_is_exclusive() {
    let (mut space, _, m) = space_with_missile();
    missile::arm(&mut space, m);
    spawn_cargo(&mut space, DVec3::new(MISSILE_DETECTION_RADIUS, 0.0, 0.0));
    let mut events = EventQueue::default();

    missile::time_step_update(&mut space, m, DT, &mut events);
    assert!(space.is_alive(m));
    assert!(detonations(events.game_events()).is_empty());
}

#[test]
fn test_detonation_just_inside_radius() {
    let (mut space, _, m) = space_with_missile();
    missile::arm(&mut space, m);
    spawn_cargo(&mut space, DVec3::new(MISSILE_DETECTION_RADIUS - 1e-6, 0.0, 0.0));
    let mut events = EventQueue::default();

    missile::time_step_update(&mut space, m, DT, &mut events);
    assert!(!space.is_alive(m));
    assert_eq!(detonations(events.game_events()), vec![m]);
}

#[test]
fn test_disarmed_missile_ignores_neighbours() {
    let (mut space, _, m) = space_with_missile();
    spawn_cargo(&mut space, DVec3::new(1.0, 0.0, 0.0));
    let mut events = EventQueue::default();
    missile::time_step_update(&mut space, m, DT, &mut events);
    assert!(space.is_alive(m));
}

#[test]
fn test_fuse_uses_root_frame_distance() {
    let (mut space, _, m) = space_with_missile();
    missile::arm(&mut space, m);
    // Same local coordinates, but the frame sits far away.
    let far = space.add_frame(DVec3::new(50_000.0, 0.0, 0.0));
    spawn_hull(&mut space, far, DVec3::new(10.0, 0.0, 0.0));
    let mut events = EventQueue::default();
    missile::time_step_update(&mut space, m, DT, &mut events);
    assert!(space.is_alive(m));
}

// ---- Warhead ----

#[test]
fn test_damage_decays_linearly() {
    let (mut space, owner, m) = space_with_missile();
    let distances = [0.0, 50.0, 150.0, 199.9];
    let ships: Vec<Entity> = distances
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            let dir = match i % 3 {
                0 => DVec3::X,
                1 => DVec3::Y,
                _ => DVec3::NEG_Y,
            };
            spawn_hull(&mut space, FrameId::ROOT, dir * d)
        })
        .collect();
    let outside = [
        spawn_hull(&mut space, FrameId::ROOT, DVec3::new(-MISSILE_DAMAGE_RADIUS, 0.0, 0.0)),
        spawn_hull(&mut space, FrameId::ROOT, DVec3::new(0.0, 0.0, -250.0)),
    ];

    let mut events = EventQueue::default();
    missile::explode(&mut space, m, &mut events);

    for (&ship, &d) in ships.iter().zip(&distances) {
        let expected = MISSILE_BASE_DAMAGE * (MISSILE_DAMAGE_RADIUS - d) / MISSILE_DAMAGE_RADIUS;
        let taken = TARGET_HULL - integrity(&space, ship);
        assert!((taken - expected).abs() < 1e-9, "d={d}: took {taken}, expected {expected}");
    }
    for ship in outside {
        assert_eq!(integrity(&space, ship), TARGET_HULL);
    }

    let hits: Vec<_> = events
        .game_events()
        .iter()
        .filter(|e| matches!(e, GameEvent::ShipHit { .. }))
        .collect();
    assert_eq!(hits.len(), ships.len());
    assert!(hits.iter().all(|e| matches!(
        e,
        GameEvent::ShipHit { attacker: Some(a), .. } if *a == owner
    )));
    assert!(events
        .sfx()
        .iter()
        .any(|s| matches!(s, SfxEvent::Explosion { .. })));
}

#[test]
fn test_damage_at_ground_zero_is_full() {
    let (mut space, _, m) = space_with_missile();
    let ship = spawn_hull(&mut space, FrameId::ROOT, DVec3::ZERO);
    missile::explode(&mut space, m, &mut EventQueue::default());
    assert_eq!(TARGET_HULL - integrity(&space, ship), MISSILE_BASE_DAMAGE);
}

#[test]
fn test_other_frames_take_no_damage() {
    let (mut space, _, m) = space_with_missile();
    // A second frame sharing the root origin: same raw position, other frame.
    let other = space.add_frame(DVec3::ZERO);
    let shielded = spawn_hull(&mut space, other, DVec3::new(10.0, 0.0, 0.0));
    let exposed = spawn_hull(&mut space, FrameId::ROOT, DVec3::new(10.0, 0.0, 0.0));

    let mut events = EventQueue::default();
    missile::explode(&mut space, m, &mut events);

    assert_eq!(integrity(&space, shielded), TARGET_HULL);
    assert!(integrity(&space, exposed) < TARGET_HULL);
    assert!(!events
        .game_events()
        .iter()
        .any(|e| matches!(e, GameEvent::ShipHit { ship, .. } if *ship == shielded)));
}

#[test]
fn test_cargo_is_not_a_ship_hit() {
    let (mut space, _, m) = space_with_missile();
    spawn_cargo(&mut space, DVec3::new(5.0, 0.0, 0.0));
    let mut events = EventQueue::default();
    missile::explode(&mut space, m, &mut events);
    assert!(!events
        .game_events()
        .iter()
        .any(|e| matches!(e, GameEvent::ShipHit { .. })));
}

#[test]
fn test_weak_hull_is_destroyed() {
    let (mut space, _, m) = space_with_missile();
    let mut body = Body::new(BodyKind::Ship, "skiff", FrameId::ROOT, DVec3::new(1.0, 0.0, 0.0));
    body.mass = 1000.0;
    let skiff = space.spawn(body, (Hull::new(500.0),));
    missile::explode(&mut space, m, &mut EventQueue::default());
    assert!(!space.is_alive(skiff));
}

#[test]
fn test_blast_detonates_nearby_missile_after_sweep() {
    let (mut space, owner, first) = space_with_missile();
    let second = spawn_missile_at(&mut space, Some(owner), DVec3::new(150.0, 0.0, 0.0));
    let ship = spawn_hull(&mut space, FrameId::ROOT, DVec3::new(300.0, 0.0, 0.0));

    let mut events = EventQueue::default();
    missile::explode(&mut space, first, &mut events);

    assert!(!space.is_alive(first));
    assert!(!space.is_alive(second));
    assert_eq!(detonations(events.game_events()), vec![first, second]);
    // Only the second blast reaches the ship, 150 m out.
    let expected = MISSILE_BASE_DAMAGE * (MISSILE_DAMAGE_RADIUS - 150.0) / MISSILE_DAMAGE_RADIUS;
    assert!((TARGET_HULL - integrity(&space, ship) - expected).abs() < 1e-9);
}

#[test]
fn test_handlers_detonate_once() {
    let (mut space, owner, m) = space_with_missile();
    let mut events = EventQueue::default();

    assert!(missile::on_collision(&mut space, m, owner, &mut events));
    assert!(missile::on_collision(&mut space, m, owner, &mut events));
    assert!(missile::on_damage(&mut space, m, Some(owner), 5.0, &mut events));
    assert_eq!(detonations(events.game_events()), vec![m]);
}

#[test]
fn test_explode_dead_missile_is_noop() {
    let (mut space, _, m) = space_with_missile();
    let ship = spawn_hull(&mut space, FrameId::ROOT, DVec3::new(20.0, 0.0, 0.0));
    space.kill_body(m);
    let mut events = EventQueue::default();
    missile::explode(&mut space, m, &mut events);
    assert!(events.game_events().is_empty());
    assert_eq!(integrity(&space, ship), TARGET_HULL);
}

// ---- ECM ----

#[test]
fn test_ecm_defeats_only_weaker_missiles() {
    let mut space = Space::new();
    let owner = spawn_hull(&mut space, FrameId::ROOT, DVec3::new(0.0, 0.0, 10_000.0));
    let smart = missile::spawn(
        &mut space,
        ShipTypeId::MissileSmart,
        Some(owner),
        None,
        FrameId::ROOT,
        DVec3::ZERO,
        DVec3::ZERO,
        DMat3::IDENTITY,
    );
    let mut events = EventQueue::default();

    missile::ecm_attack(&mut space, smart, 1, &mut events);
    missile::ecm_attack(&mut space, smart, 2, &mut events);
    assert!(space.is_alive(smart));

    missile::ecm_attack(&mut space, smart, 3, &mut events);
    assert!(!space.is_alive(smart));
}

#[test]
fn test_ecm_burst_reaches_missiles_in_range() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    let frigate = engine.spawn_ship(ShipTypeId::Frigate, FrameId::ROOT, DVec3::ZERO);
    let shuttle = engine.spawn_ship(
        ShipTypeId::Shuttle,
        FrameId::ROOT,
        DVec3::new(0.0, 0.0, -2000.0),
    );
    assert!(engine.fit_ecm(shuttle, 2));
    let guided = engine
        .launch_missile(frigate, ShipTypeId::MissileGuided, None, None)
        .unwrap();
    // Far enough from the guided missile to stay out of its blast.
    let escort = engine.spawn_ship(
        ShipTypeId::Frigate,
        FrameId::ROOT,
        DVec3::new(1000.0, 0.0, 0.0),
    );
    let naval = engine
        .launch_missile(escort, ShipTypeId::MissileNaval, None, None)
        .unwrap();

    engine.queue_command(SimCommand::FireEcm { ship: shuttle });
    engine.tick();

    assert_eq!(detonations(engine.last_events()), vec![guided]);
    assert!(engine.space().is_alive(naval));
    // A ship without ECM cannot fire one.
    let mut events = EventQueue::default();
    assert!(!systems::ecm::fire(engine.space_mut(), frigate, &mut events));
}

// ---- Owner and removal ----

#[test]
fn test_owner_loss_detonates_unarmed_missile() {
    let mut space = Space::new();
    let m = spawn_missile_at(&mut space, None, DVec3::ZERO);
    let mut events = EventQueue::default();

    missile::time_step_update(&mut space, m, DT, &mut events);
    assert!(!space.is_alive(m));
    assert_eq!(detonations(events.game_events()), vec![m]);
}

#[test]
fn test_owner_removal_clears_owner_then_detonates() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    let frigate = engine.spawn_ship(ShipTypeId::Frigate, FrameId::ROOT, DVec3::ZERO);
    let m = engine
        .launch_missile(frigate, ShipTypeId::MissileGuided, None, None)
        .unwrap();

    engine.space_mut().kill_body(frigate);
    engine.tick();
    assert!(engine
        .last_events()
        .contains(&GameEvent::OwnerLost { missile: m }));
    assert!(engine.space().is_alive(m));
    assert_eq!(
        engine.space().world.get::<&Missile>(m).unwrap().owner(),
        None
    );

    engine.tick();
    assert_eq!(detonations(engine.last_events()), vec![m]);
    engine.tick();
    assert!(!engine.space().world.contains(m));
}

#[test]
fn test_dead_target_ends_autopilot() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    let frigate = engine.spawn_ship(ShipTypeId::Frigate, FrameId::ROOT, DVec3::ZERO);
    let shuttle = engine.spawn_ship(
        ShipTypeId::Shuttle,
        FrameId::ROOT,
        DVec3::new(0.0, 0.0, -5000.0),
    );
    let m = engine
        .launch_missile(frigate, ShipTypeId::MissileGuided, None, Some(shuttle))
        .unwrap();

    engine.tick();
    engine.space_mut().kill_body(shuttle);
    engine.tick();
    assert!(engine
        .last_events()
        .contains(&GameEvent::AiCommandComplete { body: m }));
    let missile = engine.space().world.get::<&Missile>(m).unwrap();
    assert!(missile.ai().is_none());
}

#[test]
fn test_cleanup_drops_removed_target() {
    let (mut space, _, m) = space_with_missile();
    let target = spawn_hull(&mut space, FrameId::ROOT, DVec3::new(0.0, 0.0, -3000.0));
    space.world.get::<&mut Missile>(m).unwrap().ai_kamikaze(target);

    space.kill_body(target);
    let mut events = EventQueue::default();
    systems::cleanup::run(&mut space, &mut events);

    assert!(!space.world.contains(target));
    let missile = space.world.get::<&Missile>(m).unwrap();
    assert_eq!(missile.ai().and_then(|cmd| cmd.target()), None);
    assert!(missile.owner().is_some());
    assert!(events.game_events().is_empty());
}

// ---- Autopilot and smoke ----

#[test]
fn test_no_autopilot_clears_thrusters() {
    let (mut space, _, m) = space_with_missile();
    space
        .world
        .get::<&mut Propulsion>(m)
        .unwrap()
        .set_lin_thruster_state(DVec3::NEG_Z);
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut events = EventQueue::default();

    missile::static_update(&mut space, m, DT, &mut rng, &mut events);
    let propulsion = space.world.get::<&Propulsion>(m).unwrap();
    assert_eq!(propulsion.lin_thruster_state(), DVec3::ZERO);
    assert!(events.sfx().is_empty());
}

#[test]
fn test_kamikaze_thrusts_and_smokes() {
    let (mut space, _, m) = space_with_missile();
    let target = spawn_hull(&mut space, FrameId::ROOT, DVec3::new(0.0, 0.0, -3000.0));
    space
        .world
        .get::<&mut Missile>(m)
        .unwrap()
        .ai_kamikaze(target);
    space.world.get::<&mut Body>(m).unwrap().velocity = DVec3::new(0.0, 0.0, -50.0);
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut events = EventQueue::default();

    // A step longer than the throttle always emits.
    missile::static_update(&mut space, m, SMOKE_THROTTLE_SECS + 0.5, &mut rng, &mut events);

    let propulsion = space.world.get::<&Propulsion>(m).unwrap();
    assert!(propulsion.lin_thruster_state().z < 0.0);
    let smoke: Vec<_> = events
        .sfx()
        .iter()
        .filter_map(|s| match s {
            SfxEvent::ThrustSmoke { body, speed, offset } => Some((*body, *speed, *offset)),
            _ => None,
        })
        .collect();
    assert_eq!(smoke.len(), 1);
    let (body, speed, offset) = smoke[0];
    assert_eq!(body, m);
    assert_eq!(speed, SMOKE_SPEED_CAP as f32);
    assert_eq!(offset, MISSILE_EXHAUST_OFFSET);
}

// ---- Save / load ----

#[test]
fn test_save_round_trip_with_kamikaze() {
    let mut space = Space::new();
    let owner = spawn_hull(&mut space, FrameId::ROOT, DVec3::new(0.0, 0.0, 10_000.0));
    let target = spawn_hull(&mut space, FrameId::ROOT, DVec3::new(400.0, 0.0, -3000.0));
    let m = spawn_missile_at(&mut space, Some(owner), DVec3::ZERO);
    missile::arm(&mut space, m);
    space.world.get::<&mut Missile>(m).unwrap().ai_kamikaze(target);

    let doc = save::save_space(&space);
    let mut loaded = save::load_space(&doc).unwrap();
    let lm = find_missile(&loaded);

    {
        let restored = loaded.world.get::<&Missile>(lm).unwrap();
        assert_eq!(restored.power(), 1);
        assert!(restored.is_armed());
        assert_eq!(restored.ship_type(), ShipTypeId::MissileGuided);
        let cmd = restored.ai().expect("autopilot restored");
        assert_eq!(cmd.kind(), CommandKind::Kamikaze);

        let lt = cmd.target().expect("target resolved");
        let body = loaded.world.get::<&Body>(lt).unwrap();
        assert_eq!(body.position, DVec3::new(400.0, 0.0, -3000.0));
        let lo = restored.owner().expect("owner resolved");
        assert_eq!(loaded.index().index_for_body(Some(lo)), 1);
    }

    let mut rng_a = ChaCha8Rng::seed_from_u64(9);
    let mut rng_b = ChaCha8Rng::seed_from_u64(9);
    missile::static_update(&mut space, m, DT, &mut rng_a, &mut EventQueue::default());
    missile::static_update(&mut loaded, lm, DT, &mut rng_b, &mut EventQueue::default());
    let original = space.world.get::<&Propulsion>(m).unwrap();
    let restored = loaded.world.get::<&Propulsion>(lm).unwrap();
    assert_ne!(original.lin_thruster_state(), DVec3::ZERO);
    assert_eq!(original.lin_thruster_state(), restored.lin_thruster_state());
    assert_eq!(original.ang_thruster_state(), restored.ang_thruster_state());
}

fn missile_save_object(doc: &mut Value) -> &mut serde_json::Map<String, Value> {
    doc["bodies"]
        .as_array_mut()
        .unwrap()
        .iter_mut()
        .find_map(|b| b.get_mut(missile::SAVE_KEY))
        .and_then(Value::as_object_mut)
        .expect("missile object")
}

#[test]
fn test_missing_armed_is_corrupt() {
    let (space, _, _) = space_with_missile();
    let mut doc = save::save_space(&space);
    missile_save_object(&mut doc).remove("armed");

    assert_eq!(
        save::load_space(&doc).err(),
        Some(CorruptSaveError::MissingField("armed".into()))
    );
}

#[test]
fn test_corrupt_missile_fields_are_rejected() {
    let (space, _, _) = space_with_missile();
    let doc = save::save_space(&space);

    let mut bad_type = doc.clone();
    missile_save_object(&mut bad_type).insert("ship_type_id".into(), "missile_photon".into());
    assert_eq!(
        save::load_space(&bad_type).err(),
        Some(CorruptSaveError::UnknownShipType("missile_photon".into()))
    );

    let mut bad_owner = doc.clone();
    missile_save_object(&mut bad_owner).insert("index_for_body".into(), 42.into());
    assert_eq!(
        save::load_space(&bad_owner).err(),
        Some(CorruptSaveError::BadBodyIndex(42))
    );

    let mut bad_armed = doc;
    missile_save_object(&mut bad_armed).insert("armed".into(), 1.into());
    assert!(matches!(
        save::load_space(&bad_armed),
        Err(CorruptSaveError::WrongType { .. })
    ));
}

#[test]
fn test_ownerless_missile_saves_index_zero() {
    let mut space = Space::new();
    spawn_missile_at(&mut space, None, DVec3::ZERO);
    let mut doc = save::save_space(&space);
    assert_eq!(
        missile_save_object(&mut doc)["index_for_body"],
        Value::from(NO_BODY_INDEX)
    );
    let loaded = save::load_space(&doc).unwrap();
    let m = find_missile(&loaded);
    assert_eq!(loaded.world.get::<&Missile>(m).unwrap().owner(), None);
}

#[test]
fn test_engine_save_restores_ships_and_frames() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    let mut engagement = Engagement::setup(&mut engine);
    for _ in 0..90 {
        engagement.step(&mut engine);
        engine.tick();
    }
    let doc = engine.save();
    let restored = SimulationEngine::from_save(SimConfig::default(), &doc).unwrap();

    assert_eq!(restored.time(), engine.time());
    assert_eq!(restored.space().index().len(), engine.space().index().len());
    assert_eq!(restored.save(), doc);
}

// ---- Rendering ----

#[test]
fn test_render_skips_dead_missiles_and_restores_matrix() {
    let (mut space, owner, live) = space_with_missile();
    let dead = spawn_missile_at(&mut space, Some(owner), DVec3::new(0.0, 0.0, 500.0));
    space.kill_body(dead);

    let mut r = HeadlessRenderer::new(640, 480);
    let gfx = MissileGraphics::new(&mut r);
    r.begin_frame().unwrap();
    r.translate(1.0, 2.0, 3.0);
    let before = r.current_model_view();
    render::render_missiles(&space, &mut r, &gfx, &Camera::looking_from(DVec3::new(0.0, 0.0, 100.0)))
        .unwrap();
    r.end_frame().unwrap();

    assert_eq!(r.current_model_view(), before);
    assert_eq!(r.matrix_mode(), MatrixMode::ModelView);
    let buffers: Vec<_> = r
        .commands()
        .iter()
        .filter(|c| matches!(c, DrawCommand::Buffer { .. }))
        .collect();
    assert_eq!(buffers.len(), 1);
    // No thrust, no flare.
    assert!(!r
        .commands()
        .iter()
        .any(|c| matches!(c, DrawCommand::PointSprites { .. })));
    assert!(space.is_alive(live));
}

#[test]
fn test_thrusting_missile_draws_flare() {
    let (space, _, m) = space_with_missile();
    space
        .world
        .get::<&mut Propulsion>(m)
        .unwrap()
        .set_lin_thruster_state(DVec3::NEG_Z);

    let mut r = HeadlessRenderer::new(640, 480);
    let gfx = MissileGraphics::new(&mut r);
    r.begin_frame().unwrap();
    render::render_missiles(&space, &mut r, &gfx, &Camera::looking_from(DVec3::ZERO)).unwrap();

    let model_view = match r.commands().first() {
        Some(DrawCommand::PointSprites { count: 1, model_view }) => *model_view,
        other => panic!("expected a flare first, got {other:?}"),
    };
    assert_eq!(model_view, Mat4::IDENTITY);
    assert_eq!(r.current_model_view(), Mat4::IDENTITY);
}

#[test]
fn test_missile_graphics_share_cached_flare() {
    let mut r = HeadlessRenderer::new(640, 480);
    let first = MissileGraphics::new(&mut r);
    let second = MissileGraphics::new(&mut r);
    assert!(Rc::ptr_eq(first.flare_texture(), second.flare_texture()));
    assert_eq!(r.base().cached_texture_count(), 1);
}

#[test]
fn test_failed_frame_is_retried_next_tick() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    Engagement::setup(&mut engine);
    let mut r = HeadlessRenderer::new(640, 480);
    let gfx = MissileGraphics::new(&mut r);
    let camera = Camera::looking_from(DVec3::new(0.0, 500.0, 0.0));

    r.fail_next_frames(1);
    assert!(matches!(
        engine.render(&mut r, &gfx, &camera),
        Err(RendererError::FrameFailed(_))
    ));
    engine.tick();
    engine.render(&mut r, &gfx, &camera).unwrap();
    assert_eq!(r.frames_presented(), 1);
}

#[test]
fn test_unsupported_state_setters_do_not_block_frames() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    let mut engagement = Engagement::setup(&mut engine);
    engagement.step(&mut engine);
    let mut r = HeadlessRenderer::new(640, 480);
    let gfx = MissileGraphics::new(&mut r);
    let camera = Camera::looking_from(DVec3::new(0.0, 500.0, 0.0));
    r.reject_operation("clear color");
    r.reject_operation("perspective projection");

    engine.render(&mut r, &gfx, &camera).unwrap();
    engine.tick();
    engine.render(&mut r, &gfx, &camera).unwrap();

    assert_eq!(r.frames_presented(), 2);
    assert_eq!(r.current_projection(), Mat4::IDENTITY);
    // The missile was still drawn.
    assert!(r
        .commands()
        .iter()
        .any(|c| matches!(c, DrawCommand::Buffer { .. })));
}

// ---- Engine ----

#[test]
fn test_determinism_same_seed() {
    let run = |seed: u64| {
        let mut engine = SimulationEngine::new(SimConfig {
            seed,
            ..Default::default()
        });
        let mut engagement = Engagement::setup(&mut engine);
        let mut snapshots = Vec::new();
        for _ in 0..600 {
            engagement.step(&mut engine);
            snapshots.push(serde_json::to_string(&engine.tick()).unwrap());
        }
        (snapshots, engine.take_sfx())
    };
    let (a, sfx_a) = run(12345);
    let (b, sfx_b) = run(12345);
    assert_eq!(a, b, "snapshots diverged with same seed");
    assert_eq!(sfx_a, sfx_b);
}

#[test]
fn test_engagement_ecm_defeats_guided_only() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    let mut engagement = Engagement::setup(&mut engine);
    let mut events = Vec::new();
    for _ in 0..(9 * TICK_RATE) {
        engagement.step(&mut engine);
        engine.tick();
        events.extend_from_slice(engine.last_events());
    }

    assert_eq!(engagement.missiles.len(), 2);
    let (guided, _) = engagement.missiles[0];
    let (smart, _) = engagement.missiles[1];
    assert_eq!(detonations(&events), vec![guided]);
    assert!(engine.space().is_alive(smart));
    assert!(engine.space().is_alive(engagement.shuttle));
}

#[test]
fn test_engagement_smart_missile_hits_shuttle() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    let mut engagement = Engagement::setup(&mut engine);
    let mut hit = false;
    for _ in 0..(30 * TICK_RATE) {
        engagement.step(&mut engine);
        let snapshot = engine.tick();
        hit |= engine.last_events().iter().any(|e| {
            matches!(e, GameEvent::ShipHit { ship, attacker }
                if *ship == engagement.shuttle && *attacker == Some(engagement.frigate))
        });
        if hit {
            assert!(snapshot.events.iter().any(|n| n == "onShipHit"));
            break;
        }
    }
    assert!(hit, "the smart missile never reached the shuttle");
    let hull = engine.space().world.get::<&Hull>(engagement.shuttle).unwrap();
    assert!(hull.integrity < hull.max_integrity);
}

#[test]
fn test_pause_and_time_scale() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    engine.tick();
    assert_eq!(engine.time().tick, 1);

    engine.queue_command(SimCommand::Pause);
    let snap = engine.tick();
    assert!(snap.paused);
    assert_eq!(engine.time().tick, 1);

    engine.queue_commands([SimCommand::Resume, SimCommand::SetTimeScale { scale: 10.0 }]);
    engine.tick();
    assert_eq!(engine.time_scale(), 4.0);
    assert!((engine.time().elapsed_secs - 5.0 * DT).abs() < 1e-12);
}

#[test]
fn test_spawned_ship_mass_in_kilograms() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    let shuttle = engine.spawn_ship(ShipTypeId::Shuttle, FrameId::ROOT, DVec3::ZERO);
    let body = engine.space().world.get::<&Body>(shuttle).unwrap();
    // 20 tonnes.
    assert_eq!(body.mass, 20_000.0);
    assert_eq!(body.mass, 20.0 * TONNES_TO_KG);
}

#[test]
fn test_snapshot_reports_missiles() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    let frigate = engine.spawn_ship(ShipTypeId::Frigate, FrameId::ROOT, DVec3::ZERO);
    let m = engine
        .launch_missile(frigate, ShipTypeId::MissileNaval, Some(1), None)
        .unwrap();
    let snap = engine.tick();

    assert_eq!(snap.bodies.len(), 2);
    let view = snap
        .bodies
        .iter()
        .find(|b| b.id == m.to_bits().get())
        .and_then(|b| b.missile.clone())
        .unwrap();
    assert_eq!(view.ship_type, "missile_naval");
    assert_eq!(view.power, 1);
    assert!(!view.armed);
    assert!(!view.has_autopilot);
    let ship = snap.bodies.iter().find(|b| b.kind == BodyKind::Ship).unwrap();
    assert_eq!(ship.hull_percent, Some(100.0));
}

#[test]
fn test_snapshot_publishes_property_changes_once() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    let frigate = engine.spawn_ship(ShipTypeId::Frigate, FrameId::ROOT, DVec3::ZERO);
    let m = engine
        .launch_missile(frigate, ShipTypeId::MissileNaval, Some(1), None)
        .unwrap();
    let id = m.to_bits().get();
    let is_armed = |snap: &SpaceSnapshot| {
        snap.property_changes
            .iter()
            .filter(|c| c.body == id && c.key == PROPERTY_IS_ARMED)
            .count()
    };

    // Launch disarms the new missile.
    engine.queue_command(SimCommand::Pause);
    assert_eq!(is_armed(&engine.tick()), 1);
    assert!(engine.tick().property_changes.is_empty());

    // Arming while paused keeps the missile next to its launcher intact.
    engine.queue_command(SimCommand::ArmMissile { missile: m });
    let snap = engine.tick();
    assert_eq!(snap.property_changes.len(), 1);
    assert_eq!(is_armed(&snap), 1);
    assert!(engine.tick().property_changes.is_empty());
}
