//! Collision detection and the infection state machine.
//!
//! Detection walks all unordered minion pairs after movement; eligible
//! pairs go to the oracle pipeline. Because the oracle is slow, the
//! verdict is applied later under a full re-check of the pair, since a
//! lot can happen between enqueue and resolve.

use crate::events::MinionSnapshot;
use crate::minion::MinionId;
use crate::player::PlayerId;
use crate::world::World;

/// An adjudicable collision between two rival minions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionPair {
    pub a: MinionId,
    pub b: MinionId,
    pub a_name: String,
    pub b_name: String,
}

/// A player knocked down to zero minions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Elimination {
    pub player_id: PlayerId,
    pub player_name: String,
    pub eliminated_by: String,
}

/// The applied outcome of one adjudicated collision.
#[derive(Debug, Clone, PartialEq)]
pub struct InfectionOutcome {
    pub winner: MinionSnapshot,
    /// Loser as it was *before* the identity transfer.
    pub loser_before: MinionSnapshot,
    /// True when the winner's fleet was at cap and the loser was
    /// removed instead of converted.
    pub max_fleet_kill: bool,
    pub elimination: Option<Elimination>,
}

/// Finds every pair eligible for adjudication right now: overlapping,
/// rival-owned, past the pair cooldown, with both minions out of grace
/// and quiescence.
pub fn detect_pairs(world: &World, now: f64) -> Vec<CollisionPair> {
    let ids = world.minion_ids();
    let mut pairs = Vec::new();

    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            let (Some(a), Some(b)) = (world.minion(&ids[i]), world.minion(&ids[j])) else {
                continue;
            };
            if a.owner_id == b.owner_id {
                continue;
            }
            if a.pos.distance(b.pos) >= (a.size + b.size) / 2.0 {
                continue;
            }
            if world.pair_on_cooldown(&a.id, &b.id, now) {
                continue;
            }
            if a.is_invulnerable(now) || b.is_invulnerable(now) {
                continue;
            }
            if !a.can_infect(now) || !b.can_infect(now) {
                continue;
            }
            pairs.push(CollisionPair {
                a: a.id.clone(),
                b: b.id.clone(),
                a_name: a.original_name.clone(),
                b_name: b.original_name.clone(),
            });
        }
    }
    pairs
}

/// Applies an oracle verdict to a pair, re-checking eligibility against
/// the *current* state first. Returns `None` when the result is stale
/// and was dropped.
pub fn apply_verdict(
    world: &mut World,
    a_id: &MinionId,
    b_id: &MinionId,
    winner_name: &str,
    now: f64,
) -> Option<InfectionOutcome> {
    // Re-check: both still exist, rivals, vulnerable, and quiescent.
    {
        let (a, b) = (world.minion(a_id)?, world.minion(b_id)?);
        if a.owner_id == b.owner_id {
            return None;
        }
        if a.is_invulnerable(now) || b.is_invulnerable(now) {
            return None;
        }
        if !a.can_infect(now) || !b.can_infect(now) {
            return None;
        }
    }

    let (winner_id, loser_id) = {
        let (a, b) = (world.minion(a_id)?, world.minion(b_id)?);
        if a.original_name == winner_name {
            (a_id.clone(), b_id.clone())
        } else if b.original_name == winner_name {
            (b_id.clone(), a_id.clone())
        } else {
            // Neither minion carries the adjudicated name any more.
            return None;
        }
    };

    world.touch_pair(a_id, b_id, now);

    let winner = world.minion(&winner_id)?.clone();
    let loser_before = world.minion(&loser_id)?.snapshot(now);
    let loser_owner = world.minion(&loser_id)?.owner_id;

    let max_fleet_kill = world.owned_count(&winner.owner_id) >= world.config.max_fleet_size;
    if max_fleet_kill {
        world.remove_minion(&loser_id);
    } else {
        let (owner, name, color) = (winner.owner_id, winner.original_name.clone(), winner.color.clone());
        let loser = world.minion_mut(&loser_id)?;
        loser.owner_id = owner;
        loser.original_name = name;
        loser.color = color;
        loser.stamp_infected(now);
    }

    let elimination = eliminate_if_empty(world, &loser_owner, &winner.owner_id);

    Some(InfectionOutcome {
        winner: winner.snapshot(now),
        loser_before,
        max_fleet_kill,
        elimination,
    })
}

/// Runs the elimination check for a player that just lost a minion:
/// at zero owned minions, the defensive dual sweep removes everything
/// still tied to that identity.
fn eliminate_if_empty(
    world: &mut World,
    owner: &PlayerId,
    winner_owner: &PlayerId,
) -> Option<Elimination> {
    if world.owned_count(owner) > 0 {
        return None;
    }
    let player_name = world.player(owner)?.name.clone();
    world.purge_remnants(owner, &player_name);
    let eliminated_by = world
        .player(winner_owner)
        .map(|p| p.name.clone())
        .unwrap_or_default();
    Some(Elimination {
        player_id: *owner,
        player_name,
        eliminated_by,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::world::World;
    use glam::DVec2;

    fn world() -> World {
        World::new(WorldConfig {
            seed: 42,
            ..WorldConfig::default()
        })
    }

    fn join(world: &mut World, seed: u64, name: &str) -> PlayerId {
        let id = PlayerId::from_seed(seed);
        world.add_player(id, name.to_string(), 0.0);
        id
    }

    /// Parks two rival minions on top of each other and returns them.
    fn stage_contact(world: &mut World, a_owner: &PlayerId, b_owner: &PlayerId) -> (MinionId, MinionId) {
        let a = world.fleet(a_owner)[0].0.clone();
        let b = world.fleet(b_owner)[0].0.clone();
        world.minion_mut(&a).unwrap().pos = DVec2::new(500.0, 500.0);
        world.minion_mut(&b).unwrap().pos = DVec2::new(510.0, 500.0);
        // Park the rest of both fleets in far-apart grids.
        for (idx, (id, _)) in world.fleet(a_owner).into_iter().enumerate() {
            if id != a {
                world.minion_mut(&id).unwrap().pos = DVec2::new(
                    1000.0 + 100.0 * (idx % 25) as f64,
                    200.0 + 100.0 * (idx / 25) as f64,
                );
            }
        }
        for (idx, (id, _)) in world.fleet(b_owner).into_iter().enumerate() {
            if id != b {
                world.minion_mut(&id).unwrap().pos = DVec2::new(
                    1000.0 + 100.0 * (idx % 25) as f64,
                    2400.0 + 100.0 * (idx / 25) as f64,
                );
            }
        }
        (a, b)
    }

    fn sorted(a: &MinionId, b: &MinionId) -> (MinionId, MinionId) {
        if a <= b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        }
    }

    #[test]
    fn test_detects_only_rival_overlaps() {
        let mut w = world();
        let rock = join(&mut w, 1, "Rock");
        let paper = join(&mut w, 2, "Paper");
        let (a, b) = stage_contact(&mut w, &rock, &paper);

        let pairs = detect_pairs(&w, 0.0);
        assert_eq!(pairs.len(), 1);
        assert_eq!(sorted(&pairs[0].a, &pairs[0].b), sorted(&a, &b));
    }

    #[test]
    fn test_grace_blocks_detection() {
        let mut w = world();
        let rock = join(&mut w, 1, "Rock");
        let paper = join(&mut w, 2, "Paper");
        let (a, b) = stage_contact(&mut w, &rock, &paper);

        // Both mid-grace: ignored entirely.
        w.minion_mut(&a).unwrap().last_infection_time = 9.0;
        w.minion_mut(&b).unwrap().last_infection_time = 9.5;
        assert!(detect_pairs(&w, 10.0).is_empty(), "mid-grace pair detected");
        // One still mid-grace: still ignored.
        assert!(detect_pairs(&w, 11.2).is_empty());
        // Both past grace.
        assert!(!detect_pairs(&w, 11.5).is_empty());
    }

    #[test]
    fn test_quiescence_blocks_detection() {
        let mut w = world();
        let rock = join(&mut w, 1, "Rock");
        let paper = join(&mut w, 2, "Paper");
        let (a, _) = stage_contact(&mut w, &rock, &paper);

        w.minion_mut(&a).unwrap().can_infect_after = 10.0;
        assert!(detect_pairs(&w, 9.9).is_empty());
        assert!(!detect_pairs(&w, 10.0).is_empty());
    }

    #[test]
    fn test_pair_cooldown_blocks_detection() {
        let mut w = world();
        let rock = join(&mut w, 1, "Rock");
        let paper = join(&mut w, 2, "Paper");
        let (a, b) = stage_contact(&mut w, &rock, &paper);

        w.touch_pair(&a, &b, 5.0);
        assert!(detect_pairs(&w, 5.5).is_empty());
        assert_eq!(detect_pairs(&w, 6.0).len(), 1);
    }

    #[test]
    fn test_conversion_transfers_identity() {
        let mut w = world();
        let rock = join(&mut w, 1, "Rock");
        let paper = join(&mut w, 2, "Paper");
        let (a, b) = stage_contact(&mut w, &rock, &paper);

        let outcome = apply_verdict(&mut w, &a, &b, "Paper", 1.0).unwrap();
        assert!(!outcome.max_fleet_kill);
        assert_eq!(outcome.winner.original_name, "Paper");
        assert_eq!(outcome.loser_before.original_name, "Rock");
        assert!(outcome.elimination.is_none());

        let converted = w.minion(&a).unwrap();
        assert_eq!(converted.owner_id, paper);
        assert_eq!(converted.original_name, "Paper");
        assert_eq!(converted.color, w.player(&paper).unwrap().color);
        assert!(converted.is_invulnerable(1.5));
        assert!(!converted.can_infect(2.0));
        assert_eq!(w.owned_count(&paper), 6);
        assert_eq!(w.owned_count(&rock), 4);
    }

    #[test]
    fn test_max_fleet_kill_removes_loser() {
        // Spawn both players directly at the fleet cap.
        let mut w = World::new(WorldConfig {
            seed: 42,
            fleet_size: 50,
            ..WorldConfig::default()
        });
        let rock = join(&mut w, 1, "Rock");
        let paper = join(&mut w, 2, "Paper");
        let (a, b) = stage_contact(&mut w, &rock, &paper);
        let cap = w.config.max_fleet_size;
        assert_eq!(w.owned_count(&paper), cap);

        let outcome = apply_verdict(&mut w, &a, &b, "Paper", 1.0).unwrap();
        assert!(outcome.max_fleet_kill);
        assert!(w.minion(&a).is_none(), "annihilated minion still present");
        assert_eq!(w.owned_count(&paper), cap);
        assert_eq!(w.owned_count(&rock), cap - 1);
    }

    #[test]
    fn test_elimination_sweeps_and_reports() {
        let mut w = world();
        let rock = join(&mut w, 1, "Rock");
        let paper = join(&mut w, 2, "Paper");
        let (a, b) = stage_contact(&mut w, &rock, &paper);

        // Rock is down to its last minion.
        for (id, _) in w.fleet(&rock) {
            if id != a {
                w.remove_minion(&id);
            }
        }

        let outcome = apply_verdict(&mut w, &a, &b, "Paper", 1.0).unwrap();
        let elim = outcome.elimination.expect("expected an elimination");
        assert_eq!(elim.player_name, "Rock");
        assert_eq!(elim.eliminated_by, "Paper");
        assert_eq!(w.owned_count(&rock), 0);
        assert!(w.minions().all(|m| m.original_name != "Rock"));
        // The session itself survives for a rename-respawn.
        assert!(w.player(&rock).is_some());
    }

    #[test]
    fn test_stale_verdict_is_dropped() {
        let mut w = world();
        let rock = join(&mut w, 1, "Rock");
        let paper = join(&mut w, 2, "Paper");
        let (a, b) = stage_contact(&mut w, &rock, &paper);

        // The "Rock" minion was renamed while the oracle was thinking.
        w.minion_mut(&a).unwrap().original_name = "Scissors".to_string();
        assert!(apply_verdict(&mut w, &a, &b, "Rock", 1.0).is_none());

        // Or it vanished entirely.
        w.remove_minion(&a);
        assert!(apply_verdict(&mut w, &a, &b, "Paper", 1.0).is_none());
    }
}
