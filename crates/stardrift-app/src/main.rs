use std::fs;
use std::path::Path;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stardrift_app::game_loop::{spawn_game_loop, RunSummary};
use stardrift_app::options::RunOptions;
use stardrift_app::state::{shared_snapshot, LoopCommand};
use stardrift_core::commands::SimCommand;
use stardrift_sim::engine::{SimConfig, SimulationEngine};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options = RunOptions::parse();
    if let Err(message) = run(options) {
        error!("{message}");
        std::process::exit(1);
    }
}

fn run(options: RunOptions) -> Result<(), String> {
    info!(seed = options.seed, ticks = options.ticks, "starting engagement");

    let latest = shared_snapshot();
    let (cmd_tx, handle) = spawn_game_loop(options.clone(), latest.clone())?;
    if let Some(scale) = options.time_scale {
        cmd_tx
            .send(LoopCommand::Sim(SimCommand::SetTimeScale { scale }))
            .map_err(|e| format!("game loop stopped early: {e}"))?;
    }
    drop(cmd_tx);

    let summary = handle
        .join()
        .map_err(|_| "game loop thread panicked".to_string())?;
    report(&summary);
    if let Ok(lock) = latest.lock() {
        if let Some(snapshot) = lock.as_ref() {
            info!(bodies = snapshot.bodies.len(), paused = snapshot.paused, "final state");
        }
    }

    if let Some(path) = &options.save {
        write_and_verify(path, &summary, &options)?;
    }
    Ok(())
}

fn report(summary: &RunSummary) {
    info!(
        ticks = summary.ticks,
        detonations = summary.detonations,
        ships_hit = summary.ships_hit,
        frames = summary.frames_presented,
        failed_frames = summary.frames_failed,
        "run complete"
    );
}

/// Write the save, read it back and restore an engine from it.
fn write_and_verify(path: &Path, summary: &RunSummary, options: &RunOptions) -> Result<(), String> {
    let text = serde_json::to_string_pretty(&summary.save)
        .map_err(|e| format!("cannot encode save: {e}"))?;
    fs::write(path, text).map_err(|e| format!("cannot write {}: {e}", path.display()))?;

    let text = fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let doc: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| format!("{} is not JSON: {e}", path.display()))?;
    let config = SimConfig {
        seed: options.seed,
        ..Default::default()
    };
    let engine = SimulationEngine::from_save(config, &doc).map_err(|e| e.to_string())?;
    info!(
        path = %path.display(),
        tick = engine.time().tick,
        bodies = engine.space().index().len(),
        "save written and verified"
    );
    Ok(())
}
