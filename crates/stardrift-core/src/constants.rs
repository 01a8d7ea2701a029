//! Simulation constants and tuning parameters.

use glam::DVec3;

/// Physics tick rate (Hz).
pub const TICK_RATE: u32 = 60;

/// Seconds per tick.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

// --- Missile fuse and warhead ---

/// Distance at which an armed missile's proximity fuse triggers.
pub const MISSILE_DETECTION_RADIUS: f64 = 100.0;

/// Radius of the area-damage sweep on detonation.
pub const MISSILE_DAMAGE_RADIUS: f64 = 200.0;

/// Damage delivered at ground zero (kg equivalent). Falls off linearly
/// to zero at `MISSILE_DAMAGE_RADIUS`.
pub const MISSILE_BASE_DAMAGE: f64 = 10_000.0;

/// Ship type masses are in tonnes; bodies carry kilograms.
pub const TONNES_TO_KG: f64 = 1000.0;

/// Label given to every freshly launched missile.
pub const MISSILE_LABEL: &str = "MISSILE";

/// Property key mirroring the armed flag for scripts and UI.
pub const PROPERTY_IS_ARMED: &str = "isArmed";

// --- Thrust smoke ---

/// Seconds after which a thrusting missile always emits smoke.
pub const SMOKE_THROTTLE_SECS: f64 = 4.0;

/// Scale applied to the uniform roll compared against the step size.
/// With `0.1 * roll < dt`, a step of 0.1s or more always emits.
pub const SMOKE_RANDOM_SCALE: f64 = 0.1;

/// Speed multiplier for the smoke effect.
pub const SMOKE_SPEED_SCALE: f64 = 10.0;

/// Cap on the smoke effect intensity.
pub const SMOKE_SPEED_CAP: f64 = 100.0;

/// Exhaust position in the missile's body frame.
pub const MISSILE_EXHAUST_OFFSET: DVec3 = DVec3::new(0.0, 0.0, 5.0);

// --- ECM ---

/// Damage applied by an ECM burst that defeats a missile.
pub const ECM_NOMINAL_DAMAGE: f64 = 1.0;

/// Range of a ship's ECM burst.
pub const ECM_RANGE: f64 = 4000.0;

// --- Save indices ---

/// Body index written for "no body" in save files.
pub const NO_BODY_INDEX: i64 = 0;
