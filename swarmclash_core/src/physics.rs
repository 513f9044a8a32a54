//! Flocking physics: movement, cohesion, separation, wall bounce.
//!
//! Everything is delta-time based; speeds are pixels per second. One
//! call to [`advance`] moves every fleet for one tick. Collision work
//! never happens here: all movement completes before the simulation
//! looks at overlaps.

use crate::config::{BOUNCE_RESTITUTION, DT_MAX_SECS, IDLE_INTENT, SPREAD_OFFSET};
use crate::player::PlayerId;
use crate::world::World;
use glam::DVec2;

/// Fleet-size speed multiplier, the mild curve: a full fleet still
/// moves at 95% of a small fleet's speed. Stays within [0.5, 2.0].
pub fn speed_multiplier(fleet_size: usize) -> f64 {
    match fleet_size {
        0..=3 => 1.0,
        4..=8 => 1.0 - (fleet_size as f64 - 3.0) * 0.005,
        _ => (0.975 - (fleet_size as f64 - 8.0) * 0.002).max(0.95),
    }
}

/// Soft-bounce wall reflection: a position past a margin comes back in
/// by 10% of the overshoot, so minions never stick to walls.
pub fn soft_bounce(pos: DVec2, size: f64, width: f64, height: f64) -> DVec2 {
    let margin = size / 2.0;
    let reflect = |v: f64, lo: f64, hi: f64| -> f64 {
        let v = if v < lo {
            lo + (lo - v) * BOUNCE_RESTITUTION
        } else if v > hi {
            hi - (v - hi) * BOUNCE_RESTITUTION
        } else {
            v
        };
        v.clamp(lo, hi)
    };
    DVec2::new(
        reflect(pos.x, margin, width - margin),
        reflect(pos.y, margin, height - margin),
    )
}

/// Advances every fleet by `dt` seconds (clamped to 0.1 s).
pub fn advance(world: &mut World, dt: f64) {
    let dt = dt.clamp(0.0, DT_MAX_SECS);
    for player_id in world.player_ids() {
        advance_fleet(world, &player_id, dt);
    }
}

fn advance_fleet(world: &mut World, player_id: &PlayerId, dt: f64) {
    let Some(player) = world.player(player_id) else {
        return;
    };
    let intent = player.direction;

    // Positions are snapshotted once so the update is order-independent
    // within the fleet.
    let fleet = world.fleet(player_id);
    let count = fleet.len();
    if count == 0 {
        return;
    }
    let center = fleet.iter().map(|(_, p)| *p).sum::<DVec2>() / count as f64;

    let moving = intent.length() > IDLE_INTENT;
    let disp = world.config.base_max_speed * dt * speed_multiplier(count);
    let size = world.config.minion_size;
    let (width, height) = (world.config.width, world.config.height);

    for (index, (id, pos)) in fleet.iter().enumerate() {
        let cohesion = cohesion_pull(*pos, center, disp);
        let separation = separation_push(*pos, &fleet, id, size, disp);

        let delta = if moving {
            let theta = std::f64::consts::TAU * index as f64 / count as f64;
            let target = intent + DVec2::new(theta.cos(), theta.sin()) * SPREAD_OFFSET;
            let steer = target.normalize_or_zero() * disp;
            let (coh_w, sep_w) = if count > 20 { (0.45, 0.2) } else { (0.4, 0.15) };
            steer * 0.7 + cohesion * coh_w + separation * sep_w
        } else {
            cohesion * 0.5 + separation * 0.3
        };

        let next = soft_bounce(*pos + delta, size, width, height);
        if let Some(minion) = world.minion_mut(id) {
            minion.pos = next;
        }
    }
}

/// Pull toward the fleet centroid. The strength ramps with distance and
/// is softer inside the cluster radius.
fn cohesion_pull(pos: DVec2, center: DVec2, disp: f64) -> DVec2 {
    let to_center = center - pos;
    let dist = to_center.length();
    if dist <= f64::EPSILON {
        return DVec2::ZERO;
    }
    let strength = if dist < 80.0 {
        (dist / 120.0).min(0.6)
    } else {
        (dist / 100.0).min(0.7)
    };
    to_center / dist * strength * disp
}

/// Repulsion from fleet-mates closer than 1.3 diameters, proportional
/// to overlap depth, harder when the overlap is severe.
fn separation_push(
    pos: DVec2,
    fleet: &[(crate::minion::MinionId, DVec2)],
    me: &crate::minion::MinionId,
    size: f64,
    disp: f64,
) -> DVec2 {
    let reach = 1.3 * size;
    let mut push = DVec2::ZERO;
    for (other_id, other_pos) in fleet {
        if other_id == me {
            continue;
        }
        let away = pos - *other_pos;
        let dist = away.length();
        if dist >= reach || dist <= f64::EPSILON {
            continue;
        }
        let overlap = (reach - dist) / reach;
        let factor = if dist < 0.8 * size { 0.4 } else { 0.2 };
        push += away / dist * overlap * factor * disp;
    }
    push
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use approx::assert_relative_eq;

    fn world_with_player(name: &str, seed: u64) -> (World, PlayerId) {
        let mut world = World::new(WorldConfig {
            seed,
            ..WorldConfig::default()
        });
        let id = PlayerId::from_seed(seed);
        world.add_player(id, name.to_string(), 0.0);
        (world, id)
    }

    #[test]
    fn test_speed_multiplier_curve() {
        assert_relative_eq!(speed_multiplier(1), 1.0);
        assert_relative_eq!(speed_multiplier(3), 1.0);
        assert_relative_eq!(speed_multiplier(4), 0.995, epsilon = 1e-12);
        assert_relative_eq!(speed_multiplier(8), 0.975, epsilon = 1e-12);
        assert_relative_eq!(speed_multiplier(9), 0.973, epsilon = 1e-12);
        assert_relative_eq!(speed_multiplier(50), 0.95, epsilon = 1e-12);
        for n in 0..200 {
            let m = speed_multiplier(n);
            assert!((0.5..=2.0).contains(&m), "multiplier {m} out of envelope");
        }
    }

    #[test]
    fn test_soft_bounce_reflects_inside() {
        let size = 45.0;
        let margin = size / 2.0;

        // Pushed 10 px past the left wall: reflected 1 px inside.
        let bounced = soft_bounce(DVec2::new(margin - 10.0, 500.0), size, 4000.0, 3000.0);
        assert_relative_eq!(bounced.x, margin + 1.0, epsilon = 1e-9);
        assert!(bounced.x > margin);

        // Symmetric on the bottom edge.
        let bounced = soft_bounce(DVec2::new(500.0, 3000.0 - margin + 10.0), size, 4000.0, 3000.0);
        assert_relative_eq!(bounced.y, 3000.0 - margin - 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_moving_fleet_advances_toward_intent() {
        let (mut world, id) = world_with_player("Alice", 42);
        let before = world.fleet_center(&id).unwrap();
        world.player_mut(&id).unwrap().direction = DVec2::new(200.0, 0.0);

        for _ in 0..30 {
            advance(&mut world, 1.0 / 60.0);
        }

        let after = world.fleet_center(&id).unwrap();
        assert!(after.x > before.x + 10.0, "fleet did not move with intent");
    }

    #[test]
    fn test_idle_fleet_only_regroups() {
        let (mut world, id) = world_with_player("Alice", 42);
        let before = world.fleet_center(&id).unwrap();

        for _ in 0..30 {
            advance(&mut world, 1.0 / 60.0);
        }

        // Cohesion and separation may jiggle minions, but the centroid
        // stays put without an intent.
        let after = world.fleet_center(&id).unwrap();
        assert!(before.distance(after) < 5.0);
    }

    #[test]
    fn test_positions_stay_inside_world() {
        let (mut world, id) = world_with_player("Alice", 7);
        // Slam the fleet into a corner for a while.
        world.player_mut(&id).unwrap().direction = DVec2::new(-10_000.0, -10_000.0);

        for _ in 0..600 {
            advance(&mut world, 1.0 / 60.0);
        }

        let margin = world.config.minion_size / 2.0;
        for minion in world.minions() {
            assert!(minion.pos.x >= margin && minion.pos.x <= world.config.width - margin);
            assert!(minion.pos.y >= margin && minion.pos.y <= world.config.height - margin);
        }
    }

    #[test]
    fn test_dt_is_clamped() {
        let (mut world, id) = world_with_player("Alice", 42);
        world.player_mut(&id).unwrap().direction = DVec2::new(500.0, 0.0);
        let before = world.fleet_center(&id).unwrap();

        // A 10-second stall still advances by at most 0.1 s of motion.
        advance(&mut world, 10.0);

        let after = world.fleet_center(&id).unwrap();
        let travelled = before.distance(after);
        assert!(travelled <= world.config.base_max_speed * DT_MAX_SECS + 1.0);
    }
}
