//! World configuration and tuning constants.

/// Target tick cadence of the simulation loop.
pub const TICK_HZ: u32 = 60;

/// Upper bound on per-tick delta time, to absorb scheduler hiccups.
pub const DT_MAX_SECS: f64 = 0.1;

/// Intent vectors at or below this magnitude count as idle.
pub const IDLE_INTENT: f64 = 1.0;

/// Radius of the per-minion angular spread added to the intent vector.
pub const SPREAD_OFFSET: f64 = 20.0;

/// Reflection coefficient of the soft-bounce at the world walls.
pub const BOUNCE_RESTITUTION: f64 = 0.1;

/// Minimum wait between two adjudications of the same minion pair.
pub const PAIR_COOLDOWN_SECS: f64 = 1.0;

/// Post-infection window during which a minion cannot take part in
/// another infection at all.
pub const INFECTION_GRACE_SECS: f64 = 2.0;

/// Window after being infected during which a minion may defend but
/// not attack.
pub const QUIESCENCE_SECS: f64 = 1.5;

/// Player-level shield granted on explicit respawn. Reserved: the
/// minion collision machine does not consult it yet.
pub const RESPAWN_SHIELD_SECS: f64 = 3.0;

/// Upper bound on oracle adjudications in flight at once; pairs beyond
/// it are dropped for the tick and re-fire after the pair cooldown.
pub const MAX_INFLIGHT_ADJUDICATIONS: usize = 64;

/// Static parameters of a world instance.
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// World width in pixels.
    pub width: f64,

    /// World height in pixels.
    pub height: f64,

    /// Diameter of every minion.
    pub minion_size: f64,

    /// Minions spawned per fresh fleet.
    pub fleet_size: usize,

    /// Fleet size at which infections turn into annihilations.
    pub max_fleet_size: usize,

    /// Top fleet speed in pixels per second. Speeds are always per
    /// second, never per tick.
    pub base_max_speed: f64,

    /// Radius of the circle a fresh fleet spawns on.
    pub spawn_radius: f64,

    /// Master seed for the world RNG (0 = seed from entropy).
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 4000.0,
            height: 3000.0,
            minion_size: 45.0,
            fleet_size: 5,
            max_fleet_size: 50,
            base_max_speed: 270.0,
            spawn_radius: 50.0,
            seed: 0,
        }
    }
}
