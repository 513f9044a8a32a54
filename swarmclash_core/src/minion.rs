//! Minions: the atomic mobile units that make up a fleet.

use crate::config::{INFECTION_GRACE_SECS, QUIESCENCE_SECS};
use crate::events::MinionSnapshot;
use crate::player::PlayerId;
use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Stable token identifying a minion for its whole life. Never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MinionId(pub String);

impl MinionId {
    /// Builds the id for the `index`-th minion of a fleet spawned at
    /// `spawn_micros` (microseconds of simulation time).
    pub fn new(owner: &PlayerId, index: usize, spawn_micros: u64) -> Self {
        Self(format!("{owner}-{index}-{spawn_micros}"))
    }
}

impl std::fmt::Display for MinionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A mobile disk with an identity and an allegiance.
#[derive(Debug, Clone)]
pub struct Minion {
    /// Stable unique token.
    pub id: MinionId,

    /// The textual identity the oracle adjudicates on. Mutates only on
    /// infection, when it takes the winner's name.
    pub original_name: String,

    /// The player currently controlling this minion.
    pub owner_id: PlayerId,

    /// Center position, continuous, soft-clamped to the world.
    pub pos: DVec2,

    /// Disk diameter.
    pub size: f64,

    /// Tracks the owner's palette color.
    pub color: String,

    /// Time of the most recent infection affecting this minion.
    /// `f64::NEG_INFINITY` for a minion that was never infected.
    pub last_infection_time: f64,

    /// Time before which this minion may not be the attacker in an
    /// infection.
    pub can_infect_after: f64,
}

impl Minion {
    /// True while the post-infection grace window blocks this minion
    /// from participating in any infection.
    pub fn is_invulnerable(&self, now: f64) -> bool {
        now - self.last_infection_time < INFECTION_GRACE_SECS
    }

    /// True once the quiescence window has passed and this minion may
    /// attack again.
    pub fn can_infect(&self, now: f64) -> bool {
        now >= self.can_infect_after
    }

    /// Marks this minion as just infected: starts the grace window and
    /// the attacker quiescence.
    pub fn stamp_infected(&mut self, now: f64) {
        self.last_infection_time = now;
        self.can_infect_after = now + QUIESCENCE_SECS;
    }

    /// Wire-facing view of this minion at `now`.
    pub fn snapshot(&self, now: f64) -> MinionSnapshot {
        MinionSnapshot {
            id: self.id.clone(),
            original_name: self.original_name.clone(),
            owner_id: self.owner_id,
            x: self.pos.x,
            y: self.pos.y,
            size: self.size,
            color: self.color.clone(),
            is_invulnerable: self.is_invulnerable(now),
            can_infect: self.can_infect(now),
        }
    }
}
