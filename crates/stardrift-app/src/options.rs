//! Command-line options for the headless runner.

use std::path::PathBuf;

use clap::Parser;

/// Run the scripted frigate/shuttle engagement headless.
#[derive(Debug, Clone, PartialEq, Parser)]
#[command(name = "stardrift", version)]
pub struct RunOptions {
    /// RNG seed; same seed, same run.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
    /// Ticks to run before stopping (60 per simulated second).
    #[arg(long, default_value_t = 1800)]
    pub ticks: u64,
    /// Write the final save here, then load it back to verify it.
    #[arg(long)]
    pub save: Option<PathBuf>,
    /// Sleep between ticks to keep wall-clock pace.
    #[arg(long)]
    pub realtime: bool,
    /// Simulation speed, clamped to 0..=4 by the engine.
    #[arg(long)]
    pub time_scale: Option<f64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            ticks: 1800,
            save: None,
            realtime: false,
            time_scale: None,
        }
    }
}
