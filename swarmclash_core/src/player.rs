//! Player sessions and the spawn palette.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Matplotlib Pastel1 palette used for fleet colors.
pub const PASTEL_PALETTE: [&str; 8] = [
    "#fbb4ae", // light pink
    "#b3cde3", // light blue
    "#ccebc5", // light green
    "#decbe4", // light purple
    "#fed9a6", // light orange
    "#ffffcc", // light yellow
    "#e5d8bd", // light beige
    "#fddaec", // light magenta
];

/// Unique identifier of a player session.
///
/// This is the transport session token; it lives exactly as long as the
/// connection that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Creates a new random session id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a deterministic id from a seed (for tests).
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&seed.to_le_bytes());
        bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A joined player session.
///
/// Everything positional about a player is derived from its minions;
/// the session itself only carries identity, color, and the latest
/// movement intent reported by the client.
#[derive(Debug, Clone)]
pub struct Player {
    /// Session token.
    pub id: PlayerId,

    /// Display name, unique among live players.
    pub name: String,

    /// Palette color shared by the whole fleet.
    pub color: String,

    /// Latest client-reported intent: a non-normalized vector from the
    /// fleet center toward the cursor.
    pub direction: DVec2,

    /// Shield stamp set on explicit respawn. Reserved for a future
    /// player-level mechanic; nothing reads it today.
    pub invulnerable_until: f64,
}

impl Player {
    /// Creates a session with an idle intent.
    pub fn new(id: PlayerId, name: String, color: String) -> Self {
        Self {
            id,
            name,
            color,
            direction: DVec2::ZERO,
            invulnerable_until: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_from_seed_is_deterministic() {
        assert_eq!(PlayerId::from_seed(7), PlayerId::from_seed(7));
        assert_ne!(PlayerId::from_seed(7), PlayerId::from_seed(8));
    }

    #[test]
    fn test_palette_has_eight_distinct_entries() {
        let mut colors: Vec<&str> = PASTEL_PALETTE.to_vec();
        colors.sort_unstable();
        colors.dedup();
        assert_eq!(colors.len(), 8);
    }
}
