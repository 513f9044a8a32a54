//! The authoritative world: players, minions, and collision bookkeeping.
//!
//! All game state lives in one owned `World` value threaded through the
//! simulation; nothing here is global.

use crate::config::{PAIR_COOLDOWN_SECS, WorldConfig};
use crate::events::{MinionSnapshot, PlayerSnapshot, WorldDims};
use crate::minion::{Minion, MinionId};
use crate::player::{PASTEL_PALETTE, Player, PlayerId};
use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use thiserror::Error;

/// Why a requested name was rejected. The display text is the exact
/// message sent back in `join_failed` / `name_change_failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameRejection {
    #[error("Please enter a name.")]
    Empty,

    #[error("That name is already taken.")]
    Taken,

    #[error("Please pick a kinder, game-friendly name.")]
    Inappropriate,
}

/// Orderless key for the collision-cooldown table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey(MinionId, MinionId);

impl PairKey {
    pub fn new(a: &MinionId, b: &MinionId) -> Self {
        if a <= b {
            Self(a.clone(), b.clone())
        } else {
            Self(b.clone(), a.clone())
        }
    }
}

/// The single owned world value.
pub struct World {
    pub config: WorldConfig,
    players: HashMap<PlayerId, Player>,
    minions: HashMap<MinionId, Minion>,
    cooldowns: HashMap<PairKey, f64>,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates an empty world. Seed 0 draws one from entropy.
    pub fn new(config: WorldConfig) -> Self {
        let rng = if config.seed == 0 {
            ChaCha8Rng::from_entropy()
        } else {
            ChaCha8Rng::seed_from_u64(config.seed)
        };
        Self {
            config,
            players: HashMap::new(),
            minions: HashMap::new(),
            cooldowns: HashMap::new(),
            rng,
        }
    }

    // ─── Players ───

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Player ids in a stable order.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self.players.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Validates a candidate name against the given session (which is
    /// allowed to already hold it). Moderation is the caller's concern.
    pub fn validate_name(&self, name: &str, me: Option<&PlayerId>) -> Result<(), NameRejection> {
        if name.trim().is_empty() {
            return Err(NameRejection::Empty);
        }
        let taken = self
            .players
            .values()
            .any(|p| p.name == name && Some(&p.id) != me);
        if taken {
            return Err(NameRejection::Taken);
        }
        Ok(())
    }

    /// Inserts a joined player and spawns its first fleet.
    pub fn add_player(&mut self, id: PlayerId, name: String, now: f64) -> Vec<MinionId> {
        let color = self.roll_color();
        self.players.insert(id, Player::new(id, name, color));
        self.create_fleet(&id, now)
    }

    /// Removes a session entirely: the player plus every minion owned
    /// by it or still bearing its name.
    pub fn remove_player(&mut self, id: &PlayerId) -> Option<(Player, usize)> {
        let player = self.players.remove(id)?;
        let purged = self.purge_remnants(id, &player.name);
        Some((player, purged))
    }

    /// Renames a player and every minion in the world still carrying
    /// the old identity.
    pub fn rename_player(&mut self, id: &PlayerId, new_name: &str) -> Option<String> {
        let player = self.players.get_mut(id)?;
        let old_name = std::mem::replace(&mut player.name, new_name.to_string());
        for minion in self.minions.values_mut() {
            if minion.original_name == old_name {
                minion.original_name = new_name.to_string();
            }
        }
        Some(old_name)
    }

    /// Rolls a palette color.
    pub fn roll_color(&mut self) -> String {
        PASTEL_PALETTE[self.rng.gen_range(0..PASTEL_PALETTE.len())].to_string()
    }

    /// Re-rolls the player's color (respawn) and recolors nothing: a
    /// respawning player owns no minions yet.
    pub fn reroll_color(&mut self, id: &PlayerId) {
        let color = self.roll_color();
        if let Some(player) = self.players.get_mut(id) {
            player.color = color;
        }
    }

    // ─── Minions ───

    pub fn minion(&self, id: &MinionId) -> Option<&Minion> {
        self.minions.get(id)
    }

    pub fn minion_mut(&mut self, id: &MinionId) -> Option<&mut Minion> {
        self.minions.get_mut(id)
    }

    pub fn minions(&self) -> impl Iterator<Item = &Minion> {
        self.minions.values()
    }

    pub fn minion_count(&self) -> usize {
        self.minions.len()
    }

    pub fn remove_minion(&mut self, id: &MinionId) -> Option<Minion> {
        self.minions.remove(id)
    }

    /// All minion ids in a stable order.
    pub fn minion_ids(&self) -> Vec<MinionId> {
        let mut ids: Vec<MinionId> = self.minions.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of minions owned by the player.
    pub fn owned_count(&self, owner: &PlayerId) -> usize {
        self.minions.values().filter(|m| &m.owner_id == owner).count()
    }

    /// Ids and positions of a player's fleet, sorted by id so spread
    /// indices are stable within a tick.
    pub fn fleet(&self, owner: &PlayerId) -> Vec<(MinionId, DVec2)> {
        let mut fleet: Vec<(MinionId, DVec2)> = self
            .minions
            .values()
            .filter(|m| &m.owner_id == owner)
            .map(|m| (m.id.clone(), m.pos))
            .collect();
        fleet.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        fleet
    }

    /// Centroid of a player's fleet, if it owns any minions.
    pub fn fleet_center(&self, owner: &PlayerId) -> Option<DVec2> {
        let fleet = self.fleet(owner);
        if fleet.is_empty() {
            return None;
        }
        let sum: DVec2 = fleet.iter().map(|(_, p)| *p).sum();
        Some(sum / fleet.len() as f64)
    }

    /// Spawns a fresh fleet for the player in a circle around a random
    /// valid center. Fresh minions are vulnerable and may attack at
    /// once.
    pub fn create_fleet(&mut self, owner: &PlayerId, now: f64) -> Vec<MinionId> {
        let Some(player) = self.players.get(owner) else {
            return Vec::new();
        };
        let (name, color) = (player.name.clone(), player.color.clone());
        let center = self.random_spawn_center();
        let spawn_micros = (now * 1_000_000.0) as u64;
        let count = self.config.fleet_size;

        let mut ids = Vec::with_capacity(count);
        for index in 0..count {
            let theta = std::f64::consts::TAU * index as f64 / count as f64;
            let offset = DVec2::new(theta.cos(), theta.sin()) * self.config.spawn_radius;
            let id = MinionId::new(owner, index, spawn_micros);
            let minion = Minion {
                id: id.clone(),
                original_name: name.clone(),
                owner_id: *owner,
                pos: self.clamp_to_world(center + offset),
                size: self.config.minion_size,
                color: color.clone(),
                last_infection_time: f64::NEG_INFINITY,
                can_infect_after: 0.0,
            };
            self.minions.insert(id.clone(), minion);
            ids.push(id);
        }
        ids
    }

    /// Defensive dual sweep: removes every minion owned by the session
    /// *or* still named after it. Returns how many were removed.
    pub fn purge_remnants(&mut self, owner: &PlayerId, name: &str) -> usize {
        let before = self.minions.len();
        self.minions
            .retain(|_, m| &m.owner_id != owner && m.original_name != name);
        before - self.minions.len()
    }

    fn random_spawn_center(&mut self) -> DVec2 {
        let margin = self.config.minion_size / 2.0 + self.config.spawn_radius;
        let x = self.rng.gen_range(margin..self.config.width - margin);
        let y = self.rng.gen_range(margin..self.config.height - margin);
        DVec2::new(x, y)
    }

    fn clamp_to_world(&self, pos: DVec2) -> DVec2 {
        let margin = self.config.minion_size / 2.0;
        DVec2::new(
            pos.x.clamp(margin, self.config.width - margin),
            pos.y.clamp(margin, self.config.height - margin),
        )
    }

    // ─── Collision cooldowns ───

    /// True while the pair is still inside the re-fire window.
    pub fn pair_on_cooldown(&self, a: &MinionId, b: &MinionId, now: f64) -> bool {
        self.cooldowns
            .get(&PairKey::new(a, b))
            .is_some_and(|t| now - t < PAIR_COOLDOWN_SECS)
    }

    /// Records a collision event for the pair at `now`.
    pub fn touch_pair(&mut self, a: &MinionId, b: &MinionId, now: f64) {
        self.cooldowns.insert(PairKey::new(a, b), now);
    }

    /// Drops cooldown entries that can no longer suppress anything.
    pub fn prune_cooldowns(&mut self, now: f64) {
        self.cooldowns.retain(|_, t| now - *t < PAIR_COOLDOWN_SECS);
    }

    // ─── Snapshots ───

    /// Wire view of one player and its fleet.
    pub fn player_snapshot(&self, id: &PlayerId, now: f64) -> Option<PlayerSnapshot> {
        let player = self.players.get(id)?;
        let fleet_ids = self.fleet(id);
        let minions: Vec<MinionSnapshot> = fleet_ids
            .iter()
            .filter_map(|(mid, _)| self.minions.get(mid))
            .map(|m| m.snapshot(now))
            .collect();
        let center = self.fleet_center(id).unwrap_or(DVec2::ZERO);
        Some(PlayerSnapshot {
            id: player.id,
            name: player.name.clone(),
            color: player.color.clone(),
            minion_count: minions.len(),
            fleet_center_x: center.x,
            fleet_center_y: center.y,
            minions,
        })
    }

    /// All player snapshots in a stable order.
    pub fn all_player_snapshots(&self, now: f64) -> Vec<PlayerSnapshot> {
        self.player_ids()
            .iter()
            .filter_map(|id| self.player_snapshot(id, now))
            .collect()
    }

    /// All minion snapshots in a stable order.
    pub fn all_minion_snapshots(&self, now: f64) -> Vec<MinionSnapshot> {
        self.minion_ids()
            .iter()
            .filter_map(|id| self.minions.get(id))
            .map(|m| m.snapshot(now))
            .collect()
    }

    /// Dimensions as sent to clients.
    pub fn dims(&self) -> WorldDims {
        WorldDims {
            width: self.config.width,
            height: self.config.height,
        }
    }
}
