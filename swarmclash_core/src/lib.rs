//! SwarmClash core: authoritative state and rules for a world of
//! name-battling minion fleets.
//!
//! Players steer fleets of small disks ("minions") across a shared 2D
//! world. Fleets flock: they follow the player's cursor intent while
//! cohering around their centroid and keeping out of each other's way.
//! When rival minions touch, an external judge decides which *name*
//! wins; the loser is converted to the winner's identity, or removed
//! outright when the winner's fleet is full.
//!
//! This crate is transport- and runtime-free: it owns the [`World`]
//! value, the physics, and the infection state machine, and leaves the
//! tick cadence, sockets, and oracle I/O to the server crate.

pub mod collision;
pub mod config;
pub mod events;
pub mod minion;
pub mod physics;
pub mod player;
pub mod world;

pub use collision::{CollisionPair, Elimination, InfectionOutcome, apply_verdict, detect_pairs};
pub use config::WorldConfig;
pub use events::{ClientEvent, MinionSnapshot, PlayerSnapshot, ServerEvent, WorldDims};
pub use minion::{Minion, MinionId};
pub use player::{PASTEL_PALETTE, Player, PlayerId};
pub use world::{NameRejection, World};
