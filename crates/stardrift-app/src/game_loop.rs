//! Game loop thread: runs the scripted engagement, renders each tick with
//! the headless backend and publishes snapshots.
//!
//! The engine and renderer are created inside the thread; the renderer's
//! texture cache is not `Send`. Commands arrive via `mpsc` channel.

use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use glam::DVec3;
use serde_json::Value;
use tracing::{debug, info};

use stardrift_core::constants::TICK_RATE;
use stardrift_core::events::GameEvent;
use stardrift_graphics::HeadlessRenderer;
use stardrift_sim::engine::{SimConfig, SimulationEngine};
use stardrift_sim::render::{Camera, MissileGraphics};
use stardrift_sim::scenario::Engagement;

use crate::options::RunOptions;
use crate::state::{LoopCommand, SharedSnapshot};

/// Nominal duration of one tick at 1x speed.
const TICK_DURATION: Duration = Duration::from_nanos(1_000_000_000 / TICK_RATE as u64);

const VIEW_WIDTH: u32 = 1280;
const VIEW_HEIGHT: u32 = 720;

/// What happened during a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Simulation ticks advanced (paused ticks excluded).
    pub ticks: u64,
    pub detonations: usize,
    pub ships_hit: usize,
    pub frames_presented: u64,
    pub frames_failed: u64,
    /// Save document taken when the loop stopped.
    pub save: Value,
}

/// Spawn the game loop in a new thread.
///
/// Returns the command sender and a handle yielding the run summary.
pub fn spawn_game_loop(
    options: RunOptions,
    latest_snapshot: SharedSnapshot,
) -> Result<(mpsc::Sender<LoopCommand>, JoinHandle<RunSummary>), String> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<LoopCommand>();
    let handle = std::thread::Builder::new()
        .name("stardrift-game-loop".into())
        .spawn(move || run_game_loop(&options, &cmd_rx, &latest_snapshot))
        .map_err(|e| format!("failed to spawn game loop thread: {e}"))?;
    Ok((cmd_tx, handle))
}

/// Run until `options.ticks` loop iterations, a Shutdown command, or the
/// channel disconnecting.
pub fn run_game_loop(
    options: &RunOptions,
    cmd_rx: &mpsc::Receiver<LoopCommand>,
    latest_snapshot: &SharedSnapshot,
) -> RunSummary {
    let mut engine = SimulationEngine::new(SimConfig {
        seed: options.seed,
        ..Default::default()
    });
    let mut engagement = Engagement::setup(&mut engine);
    let mut renderer = HeadlessRenderer::new(VIEW_WIDTH, VIEW_HEIGHT);
    let gfx = MissileGraphics::new(&mut renderer);
    // Above and behind the frigate, looking down the firing line.
    let camera = Camera::looking_from(DVec3::new(0.0, 300.0, 1500.0));

    let mut summary = RunSummary::default();
    let mut next_tick_time = Instant::now();
    let mut disconnected = false;

    'outer: for _ in 0..options.ticks {
        // 1. Drain all pending commands
        while !disconnected {
            match cmd_rx.try_recv() {
                Ok(LoopCommand::Sim(cmd)) => engine.queue_command(cmd),
                Ok(LoopCommand::Shutdown) => {
                    info!("shutdown requested");
                    break 'outer;
                }
                Err(mpsc::TryRecvError::Empty) => break,
                // A dropped sender is not a shutdown; the run has a tick budget.
                Err(mpsc::TryRecvError::Disconnected) => disconnected = true,
            }
        }

        // 2. Scripted actions, then one tick
        engagement.step(&mut engine);
        let snapshot = engine.tick();
        for event in engine.last_events() {
            match event {
                GameEvent::Detonated { .. } => summary.detonations += 1,
                GameEvent::ShipHit { .. } => summary.ships_hit += 1,
                _ => {}
            }
        }
        let sfx = engine.take_sfx();
        if !sfx.is_empty() {
            debug!(count = sfx.len(), "effects requested");
        }

        // 3. Draw; a failed frame is retried on the next tick
        if engine.render(&mut renderer, &gfx, &camera).is_err() {
            summary.frames_failed += 1;
        }

        // 4. Publish
        if let Ok(mut lock) = latest_snapshot.lock() {
            *lock = Some(snapshot);
        }

        if options.realtime {
            pace(&mut next_tick_time, engine.time_scale());
        }
    }

    summary.ticks = engine.time().tick;
    summary.frames_presented = renderer.frames_presented();
    summary.save = engine.save();
    info!(
        ticks = summary.ticks,
        detonations = summary.detonations,
        ships_hit = summary.ships_hit,
        "game loop finished"
    );
    summary
}

/// Sleep until the next tick, adjusting for time scale.
fn pace(next_tick_time: &mut Instant, time_scale: f64) {
    let effective_tick_duration = if time_scale > 0.001 {
        TICK_DURATION.div_f64(time_scale)
    } else {
        TICK_DURATION
    };

    *next_tick_time += effective_tick_duration;
    let now = Instant::now();
    if *next_tick_time > now {
        std::thread::sleep(*next_tick_time - now);
    } else if now - *next_tick_time > effective_tick_duration * 2 {
        // Too far behind; reset to avoid a catch-up spiral
        *next_tick_time = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stardrift_core::commands::SimCommand;

    use crate::state::shared_snapshot;

    fn options(ticks: u64) -> RunOptions {
        RunOptions {
            ticks,
            ..Default::default()
        }
    }

    #[test]
    fn test_command_channel_round_trip() {
        let (tx, rx) = mpsc::channel::<LoopCommand>();

        tx.send(LoopCommand::Sim(SimCommand::Pause)).unwrap();
        tx.send(LoopCommand::Sim(SimCommand::Resume)).unwrap();
        tx.send(LoopCommand::Shutdown).unwrap();

        let mut commands = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            commands.push(cmd);
        }

        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[0], LoopCommand::Sim(SimCommand::Pause)));
        assert!(matches!(commands[1], LoopCommand::Sim(SimCommand::Resume)));
        assert!(matches!(commands[2], LoopCommand::Shutdown));
    }

    #[test]
    fn test_run_renders_every_tick() {
        let (_tx, rx) = mpsc::channel::<LoopCommand>();
        let latest = shared_snapshot();
        let summary = run_game_loop(&options(120), &rx, &latest);

        assert_eq!(summary.ticks, 120);
        assert_eq!(summary.frames_presented, 120);
        assert_eq!(summary.frames_failed, 0);
        let snapshot = latest.lock().unwrap().clone().unwrap();
        assert_eq!(snapshot.time.tick, 120);
        // Frigate, shuttle and the first missile.
        assert_eq!(snapshot.bodies.len(), 3);
        assert!(summary.save.get("space").is_some());
    }

    #[test]
    fn test_shutdown_stops_before_budget() {
        let (tx, rx) = mpsc::channel::<LoopCommand>();
        tx.send(LoopCommand::Shutdown).unwrap();
        let summary = run_game_loop(&options(600), &rx, &shared_snapshot());
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.frames_presented, 0);
    }

    #[test]
    fn test_pause_command_holds_time() {
        let (tx, rx) = mpsc::channel::<LoopCommand>();
        tx.send(LoopCommand::Sim(SimCommand::Pause)).unwrap();
        drop(tx);
        let summary = run_game_loop(&options(30), &rx, &shared_snapshot());
        assert_eq!(summary.ticks, 0);
        // Paused ticks still draw.
        assert_eq!(summary.frames_presented, 30);
    }

    #[test]
    fn test_spawned_loop_joins_with_summary() {
        let (tx, handle) = spawn_game_loop(options(60), shared_snapshot()).unwrap();
        drop(tx);
        let summary = handle.join().unwrap();
        assert_eq!(summary.ticks, 60);
    }

    #[test]
    fn test_tick_duration_constant() {
        // 60Hz = 16.666ms per tick
        let expected_nanos = 1_000_000_000u64 / 60;
        assert_eq!(TICK_DURATION.as_nanos(), expected_nanos as u128);
    }
}
