//! Collision & Scoring Engine

use serde::Serialize;
use shared::{check_collision, Alien, Projectile, Ship};

/// Per-alien point values for one session. Base points track the current
/// wave; penalty and bonus are fetched once at login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoringRules {
    pub base_points: i64,
    pub penalty: i64,
    pub bonus: i64,
}

impl ScoringRules {
    /// Saturates at the `i64` bounds; point values grow without limit
    /// across waves.
    pub fn points_for(&self, kills: usize) -> i64 {
        let count = i64::try_from(kills).unwrap_or(i64::MAX);
        self.base_points
            .saturating_mul(count)
            .saturating_sub(self.penalty.saturating_mul(count))
            .saturating_add(self.bonus.saturating_mul(count))
    }
}

/// Removes every projectile that hit an alien together with every alien it
/// hit, and returns the destroyed aliens with their last kinematics.
///
/// Aliens destroyed by an earlier projectile are out of play for the later
/// ones, so a second projectile on the same alien keeps flying.
pub fn resolve_projectile_alien_collisions(
    projectiles: &mut Vec<Projectile>,
    fleet: &mut Vec<Alien>,
) -> Vec<Alien> {
    if projectiles.is_empty() || fleet.is_empty() {
        return Vec::new();
    }

    let mut hit = vec![false; fleet.len()];
    projectiles.retain(|projectile| {
        let bounds = projectile.bounds();
        let mut struck = false;
        for (i, alien) in fleet.iter().enumerate() {
            if !hit[i] && check_collision(&bounds, &alien.bounds()) {
                hit[i] = true;
                struck = true;
            }
        }
        !struck
    });

    let mut destroyed = Vec::new();
    let mut index = 0;
    fleet.retain(|alien| {
        let was_hit = hit[index];
        index += 1;
        if was_hit {
            destroyed.push(*alien);
        }
        !was_hit
    });
    destroyed
}

pub fn resolve_ship_alien_collision(ship: &Ship, fleet: &[Alien], opponent_fleet: &[Alien]) -> bool {
    let bounds = ship.bounds();
    fleet
        .iter()
        .chain(opponent_fleet.iter())
        .any(|alien| check_collision(&bounds, &alien.bounds()))
}

pub fn check_bottom_breach(fleet: &[Alien], screen_height: f32) -> bool {
    fleet.iter().any(|alien| alien.bounds().bottom >= screen_height)
}
