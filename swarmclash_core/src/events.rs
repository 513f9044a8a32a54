//! Wire events.
//!
//! Both directions of the transport speak JSON frames shaped as
//! `{"event": <name>, "data": <payload>}`; the internally-tagged enums
//! here are those frames.

use crate::minion::MinionId;
use crate::player::PlayerId;
use serde::{Deserialize, Serialize};

/// World dimensions as sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldDims {
    pub width: f64,
    pub height: f64,
}

/// Wire-facing view of a minion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinionSnapshot {
    pub id: MinionId,
    pub original_name: String,
    pub owner_id: PlayerId,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: String,
    pub is_invulnerable: bool,
    pub can_infect: bool,
}

/// Wire-facing view of a player and its fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    pub minion_count: usize,
    pub fleet_center_x: f64,
    pub fleet_center_y: f64,
    pub minions: Vec<MinionSnapshot>,
}

/// Intents a client may send.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Request to enter the game under the given name.
    JoinGame { name: String },

    /// Latest movement intent: a (typically non-normalized) vector
    /// from the fleet center toward the cursor.
    MovePlayer { dx: f64, dy: f64 },

    /// Rename request; the flag marks system-generated names that skip
    /// moderation.
    ChangeName {
        name: String,
        #[serde(default)]
        from_adjective_collection: bool,
    },

    /// Respawn request; only meaningful for eliminated sessions.
    RespawnPlayer {},
}

/// Events the server fans out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Full snapshot, session-targeted on join and respawn.
    GameState {
        players: Vec<PlayerSnapshot>,
        world: WorldDims,
        all_minions: Vec<MinionSnapshot>,
    },

    /// Per-tick (and post-event) broadcast snapshot.
    UpdateGameState {
        players: Vec<PlayerSnapshot>,
        all_minions: Vec<MinionSnapshot>,
    },

    PlayerJoined(PlayerSnapshot),

    PlayerLeft {
        player_id: PlayerId,
    },

    PlayerNameChanged {
        player_id: PlayerId,
        old_name: String,
        new_name: String,
    },

    PlayerRespawned {
        player_id: PlayerId,
        player_name: String,
    },

    PlayerEliminated {
        player_id: PlayerId,
        player_name: String,
        eliminated_by: String,
    },

    /// The loser snapshot is taken before the identity transfer so
    /// clients can animate the change.
    InfectionHappened {
        winner: MinionSnapshot,
        loser: MinionSnapshot,
        max_fleet_kill: bool,
    },

    JoinFailed {
        message: String,
    },

    NameChangeFailed {
        message: String,
    },
}
