//! SwarmClash server: the authoritative game process.
//!
//! One world, one actor task, many sessions. Clients connect over a
//! WebSocket, send intents (`join_game`, `move_player`, `change_name`,
//! `respawn_player`), and receive snapshot and event broadcasts back.
//! Collisions are settled by the oracle pipeline without ever stalling
//! the 60 Hz tick.

pub mod hub;
mod session;
pub mod simulation;
pub mod transport;

pub use hub::{EventSink, Hub, RecordingSink, Target};
pub use simulation::{Command, ServerStats, Simulation};
pub use transport::{AppState, router};
