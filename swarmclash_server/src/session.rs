//! Session lifecycle: join, move, rename, respawn, disconnect.
//!
//! Name moderation already happened on the connection task by the time
//! a command reaches the actor, so nothing here ever waits on the
//! oracle. Validation failures answer the originator with a `*_failed`
//! event and change no state.

use crate::simulation::Simulation;
use glam::DVec2;
use swarmclash_core::config::RESPAWN_SHIELD_SECS;
use swarmclash_core::{PlayerId, ServerEvent};
use tracing::{debug, info};

impl Simulation {
    pub(crate) fn handle_join(&mut self, session: PlayerId, name: String, now: f64) {
        if self.world().player(&session).is_some() {
            debug!(%session, "duplicate join ignored");
            return;
        }
        let name = name.trim().to_string();
        if let Err(rejection) = self.world().validate_name(&name, None) {
            self.sink().emit(
                &session,
                &ServerEvent::JoinFailed {
                    message: rejection.to_string(),
                },
            );
            return;
        }

        self.world_mut().add_player(session, name.clone(), now);
        info!(%session, name, "player joined");

        // Full snapshot to the joiner, then the update and the joined
        // notice to everyone else.
        let snapshot = ServerEvent::GameState {
            players: self.world().all_player_snapshots(now),
            world: self.world().dims(),
            all_minions: self.world().all_minion_snapshots(now),
        };
        self.sink().emit(&session, &snapshot);
        self.sink().broadcast_except(
            &session,
            &ServerEvent::UpdateGameState {
                players: self.world().all_player_snapshots(now),
                all_minions: self.world().all_minion_snapshots(now),
            },
        );
        if let Some(joined) = self.world().player_snapshot(&session, now) {
            self.sink()
                .broadcast_except(&session, &ServerEvent::PlayerJoined(joined));
        }
    }

    pub(crate) fn handle_move(&mut self, session: PlayerId, dx: f64, dy: f64) {
        if let Some(player) = self.world_mut().player_mut(&session) {
            player.direction = DVec2::new(dx, dy);
        }
    }

    pub(crate) fn handle_rename(&mut self, session: PlayerId, name: String, now: f64) {
        let name = name.trim().to_string();
        if name.is_empty() {
            return;
        }
        let Some(player) = self.world().player(&session) else {
            return;
        };
        // Renaming to the current name is a no-op: no broadcast, no
        // state change.
        if player.name == name {
            return;
        }
        if let Err(rejection) = self.world().validate_name(&name, Some(&session)) {
            self.sink().emit(
                &session,
                &ServerEvent::NameChangeFailed {
                    message: rejection.to_string(),
                },
            );
            return;
        }

        if self.world().owned_count(&session) == 0 {
            // An eliminated session renaming is a respawn under the
            // new identity.
            let old_name = self
                .world_mut()
                .rename_player(&session, &name)
                .unwrap_or_default();
            info!(%session, old_name, new_name = name, "rename-respawn");
            self.respawn_fleet(session, now);
            return;
        }

        let old_name = self
            .world_mut()
            .rename_player(&session, &name)
            .unwrap_or_default();
        info!(%session, old_name, new_name = name, "player renamed");
        self.broadcast_update(now);
        self.sink().broadcast(&ServerEvent::PlayerNameChanged {
            player_id: session,
            old_name,
            new_name: name,
        });
    }

    pub(crate) fn handle_respawn(&mut self, session: PlayerId, now: f64) {
        let Some(player) = self.world().player(&session) else {
            return;
        };
        // Only meaningful for eliminated sessions.
        if self.world().owned_count(&session) > 0 {
            debug!(%session, "respawn ignored for a live fleet");
            return;
        }
        let name = player.name.clone();
        info!(%session, name, "player respawn");
        self.respawn_fleet(session, now);
        if let Some(player) = self.world_mut().player_mut(&session) {
            player.invulnerable_until = now + RESPAWN_SHIELD_SECS;
        }
    }

    /// Shared tail of rename-respawn and explicit respawn: purge any
    /// residue of the old fleet, roll a fresh color, spawn, announce.
    fn respawn_fleet(&mut self, session: PlayerId, now: f64) {
        let Some(player) = self.world().player(&session) else {
            return;
        };
        let name = player.name.clone();

        self.world_mut().purge_remnants(&session, &name);
        self.world_mut().reroll_color(&session);
        self.world_mut().create_fleet(&session, now);

        self.sink().broadcast(&ServerEvent::PlayerRespawned {
            player_id: session,
            player_name: name,
        });
        let snapshot = ServerEvent::GameState {
            players: self.world().all_player_snapshots(now),
            world: self.world().dims(),
            all_minions: self.world().all_minion_snapshots(now),
        };
        self.sink().emit(&session, &snapshot);
        self.broadcast_update(now);
    }

    pub(crate) fn handle_disconnect(&mut self, session: PlayerId, now: f64) {
        let Some((player, purged)) = self.world_mut().remove_player(&session) else {
            debug!(%session, "disconnect for a session that never joined");
            return;
        };
        info!(%session, name = player.name, purged, "player left");
        self.sink()
            .broadcast(&ServerEvent::PlayerLeft { player_id: session });
        self.broadcast_update(now);
    }
}
