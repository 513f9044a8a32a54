//! The world actor: one task owns all authoritative state.
//!
//! Session handlers and the tick share a single timeline through the
//! command channel, so no mutation ever races another. The only slow
//! thing in the system, the oracle, runs on detached worker tasks
//! whose results re-enter the actor as commands and are applied under
//! the staleness re-check.

use crate::hub::EventSink;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use swarmclash_core::config::{DT_MAX_SECS, MAX_INFLIGHT_ADJUDICATIONS, TICK_HZ};
use swarmclash_core::{MinionId, PlayerId, ServerEvent, World, collision};
use swarmclash_oracle::{Adjudicator, Ruling};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Everything that can happen to the world, in arrival order.
#[derive(Debug)]
pub enum Command {
    Join { session: PlayerId, name: String },
    Move { session: PlayerId, dx: f64, dy: f64 },
    Rename { session: PlayerId, name: String },
    Respawn { session: PlayerId },
    Disconnect { session: PlayerId },
    /// A detached oracle worker finished adjudicating a pair.
    Adjudicated {
        a: MinionId,
        b: MinionId,
        ruling: Ruling,
    },
    Shutdown,
}

/// Live counters exposed by `GET /test`.
#[derive(Debug, Default)]
pub struct ServerStats {
    pub players: AtomicUsize,
    pub minions: AtomicUsize,
    pub ticks: AtomicU64,
}

/// The single-world actor.
pub struct Simulation {
    world: World,
    sink: Arc<dyn EventSink>,
    adjudicator: Arc<Adjudicator>,
    /// Sender handed to oracle workers so results come back in-band.
    commands: mpsc::UnboundedSender<Command>,
    /// Minion pairs currently waiting on an oracle worker.
    inflight: HashSet<(MinionId, MinionId)>,
    stats: Arc<ServerStats>,
}

impl Simulation {
    pub fn new(
        world: World,
        sink: Arc<dyn EventSink>,
        adjudicator: Arc<Adjudicator>,
        commands: mpsc::UnboundedSender<Command>,
    ) -> Self {
        Self {
            world,
            sink,
            adjudicator,
            commands,
            inflight: HashSet::new(),
            stats: Arc::new(ServerStats::default()),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn stats(&self) -> Arc<ServerStats> {
        self.stats.clone()
    }

    pub(crate) fn sink(&self) -> &dyn EventSink {
        self.sink.as_ref()
    }

    /// Runs the actor until a `Shutdown` command arrives. Ticks at the
    /// target cadence; commands are interleaved between ticks.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut interval =
            tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(TICK_HZ)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let start = Instant::now();
        let mut last_tick = start;

        info!(tick_hz = TICK_HZ, "simulation started");
        loop {
            tokio::select! {
                maybe_command = commands.recv() => {
                    let now = start.elapsed().as_secs_f64();
                    match maybe_command {
                        Some(Command::Shutdown) | None => break,
                        Some(command) => self.handle_command(command, now),
                    }
                }
                _ = interval.tick() => {
                    let wall = Instant::now();
                    let dt = (wall - last_tick).as_secs_f64().min(DT_MAX_SECS);
                    last_tick = wall;
                    self.tick(start.elapsed().as_secs_f64(), dt);
                }
            }
        }
        info!("simulation stopped");
    }

    /// Applies one command at simulation time `now`.
    pub fn handle_command(&mut self, command: Command, now: f64) {
        match command {
            Command::Join { session, name } => self.handle_join(session, name, now),
            Command::Move { session, dx, dy } => self.handle_move(session, dx, dy),
            Command::Rename { session, name } => self.handle_rename(session, name, now),
            Command::Respawn { session } => self.handle_respawn(session, now),
            Command::Disconnect { session } => self.handle_disconnect(session, now),
            Command::Adjudicated { a, b, ruling } => self.apply_adjudication(&a, &b, ruling, now),
            Command::Shutdown => {}
        }
    }

    /// One tick: movement first, then collisions, then the snapshot.
    pub fn tick(&mut self, now: f64, dt: f64) {
        swarmclash_core::physics::advance(&mut self.world, dt);

        for pair in collision::detect_pairs(&self.world, now) {
            let key = ordered(&pair.a, &pair.b);
            if self.inflight.contains(&key) {
                continue;
            }
            if let Some(verdict) = self.adjudicator.lookup(&pair.a_name, &pair.b_name) {
                // Known pair: settled synchronously inside the tick.
                self.world.touch_pair(&pair.a, &pair.b, now);
                self.apply_adjudication(&pair.a, &pair.b, Ruling::Cached(verdict), now);
            } else if self.inflight.len() < MAX_INFLIGHT_ADJUDICATIONS {
                self.world.touch_pair(&pair.a, &pair.b, now);
                self.inflight.insert(key);
                self.dispatch_adjudication(pair);
            } else {
                // Backpressure: dropped for this tick; the pair
                // re-fires once past its cooldown.
                debug!("adjudication backlog full; dropping pair");
            }
        }

        self.world.prune_cooldowns(now);
        self.publish_stats();

        if self.world.player_count() > 0 {
            self.broadcast_update(now);
        }
        self.stats.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Hands a collision to an oracle worker; the result returns as a
    /// command and is re-checked before it touches the world.
    fn dispatch_adjudication(&self, pair: collision::CollisionPair) {
        let adjudicator = self.adjudicator.clone();
        let commands = self.commands.clone();
        tokio::spawn(async move {
            let ruling = adjudicator.adjudicate(&pair.a_name, &pair.b_name).await;
            let _ = commands.send(Command::Adjudicated {
                a: pair.a,
                b: pair.b,
                ruling,
            });
        });
    }

    fn apply_adjudication(&mut self, a: &MinionId, b: &MinionId, ruling: Ruling, now: f64) {
        self.inflight.remove(&ordered(a, b));
        let winner_name = ruling.winner().to_string();

        let Some(outcome) = collision::apply_verdict(&mut self.world, a, b, &winner_name, now)
        else {
            debug!("stale adjudication dropped");
            return;
        };

        info!(
            winner = %outcome.winner.original_name,
            loser = %outcome.loser_before.original_name,
            max_fleet_kill = outcome.max_fleet_kill,
            "infection"
        );
        self.sink.broadcast(&ServerEvent::InfectionHappened {
            winner: outcome.winner,
            loser: outcome.loser_before,
            max_fleet_kill: outcome.max_fleet_kill,
        });

        if let Some(elimination) = outcome.elimination {
            warn!(player = %elimination.player_name, by = %elimination.eliminated_by, "player eliminated");
            self.sink.broadcast(&ServerEvent::PlayerEliminated {
                player_id: elimination.player_id,
                player_name: elimination.player_name,
                eliminated_by: elimination.eliminated_by,
            });
            self.broadcast_update(now);
        }
    }

    pub(crate) fn broadcast_update(&self, now: f64) {
        self.sink.broadcast(&ServerEvent::UpdateGameState {
            players: self.world.all_player_snapshots(now),
            all_minions: self.world.all_minion_snapshots(now),
        });
    }

    fn publish_stats(&self) {
        self.stats
            .players
            .store(self.world.player_count(), Ordering::Relaxed);
        self.stats
            .minions
            .store(self.world.minion_count(), Ordering::Relaxed);
    }
}

fn ordered(a: &MinionId, b: &MinionId) -> (MinionId, MinionId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}
