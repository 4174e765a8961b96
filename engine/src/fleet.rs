//! Fleet Controller: wave layout, shared fleet motion and difficulty scaling.

use log::{debug, info};
use serde::Serialize;
use shared::{Alien, Settings};

/// Motion shared by every alien of one fleet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FleetState {
    /// +1 moves right, -1 moves left.
    pub direction: f32,
    pub drop_speed: f32,
}

impl FleetState {
    pub fn new(drop_speed: f32) -> Self {
        Self {
            direction: 1.0,
            drop_speed,
        }
    }
}

/// Values that compound on every wave clear.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Difficulty {
    pub alien_speed: f32,
    pub projectile_speed: f32,
    pub ship_speed: f32,
    pub alien_points: i64,
    /// Product of every speed-up applied since the session started.
    pub multiplier: f32,
}

impl Difficulty {
    fn initial(settings: &Settings) -> Self {
        Self {
            alien_speed: settings.alien_speed,
            projectile_speed: settings.projectile_speed,
            ship_speed: settings.ship_speed,
            alien_points: settings.alien_points,
            multiplier: 1.0,
        }
    }
}

/// Checks the edges, then moves every alien by its speed in the fleet
/// direction. When any alien sits on the edge the fleet is heading into, the
/// whole fleet drops and reverses before moving, once per call. Returns
/// whether the fleet bounced.
pub fn advance(aliens: &mut [Alien], state: &mut FleetState, screen_width: f32) -> bool {
    let bounced = aliens
        .iter()
        .any(|a| a.faces_edge(screen_width, state.direction));
    if bounced {
        for alien in aliens.iter_mut() {
            alien.y += state.drop_speed;
        }
        state.direction = -state.direction;
    }

    for alien in aliens.iter_mut() {
        alien.x += alien.speed * state.direction;
    }
    bounced
}

#[derive(Debug, Clone)]
pub struct FleetController {
    settings: Settings,
    local: FleetState,
    mirror: FleetState,
    difficulty: Difficulty,
}

impl FleetController {
    pub fn new(settings: &Settings) -> Self {
        Self {
            settings: settings.clone(),
            local: FleetState::new(settings.fleet_drop_speed),
            mirror: FleetState::new(settings.fleet_drop_speed),
            difficulty: Difficulty::initial(settings),
        }
    }

    /// Restores the wave-1 values. Only a session restart does this.
    pub fn reset(&mut self) {
        *self = Self::new(&self.settings);
    }

    pub fn local_state(&self) -> &FleetState {
        &self.local
    }

    pub fn mirror_state(&self) -> &FleetState {
        &self.mirror
    }

    pub fn difficulty(&self) -> &Difficulty {
        &self.difficulty
    }

    /// Tiles a fresh wave from the top-left margin, one alien-size gap
    /// between neighbours. Every alien lies wholly inside
    /// `[w, W - 2w] x [h, H - 3h]`.
    pub fn spawn_wave(&self) -> Vec<Alien> {
        let s = &self.settings;
        let (width, height) = (s.alien_width, s.alien_height);
        let max_right = s.screen_width - 2.0 * width;
        let max_bottom = s.screen_height - 3.0 * height;
        let mut aliens = Vec::new();

        let mut y = height;
        while y + height <= max_bottom {
            let mut x = width;
            while x + width <= max_right {
                aliens.push(Alien::new(x, y, width, height, self.difficulty.alien_speed));
                x += 2.0 * width;
            }
            y += 2.0 * height;
        }

        debug!(
            "Spawned wave of {} aliens at speed {:.3}",
            aliens.len(),
            self.difficulty.alien_speed
        );
        aliens
    }

    pub fn advance_local(&mut self, aliens: &mut [Alien]) -> bool {
        advance(aliens, &mut self.local, self.settings.screen_width)
    }

    pub fn advance_mirror(&mut self, aliens: &mut [Alien]) -> bool {
        advance(aliens, &mut self.mirror, self.settings.screen_width)
    }

    /// Applies one wave-clear speed-up. With `max_difficulty_scale` set, the
    /// compounded multiplier is clamped and the speeds stop growing there.
    pub fn increase_difficulty(&mut self) {
        let s = &self.settings;
        let mut scale = s.speedup_scale;
        if let Some(cap) = s.max_difficulty_scale {
            let next = (self.difficulty.multiplier * scale).min(cap);
            scale = next / self.difficulty.multiplier;
        }

        self.difficulty.multiplier *= scale;
        self.difficulty.alien_speed *= scale;
        self.difficulty.projectile_speed *= scale;
        self.difficulty.ship_speed *= scale;
        self.difficulty.alien_points =
            (self.difficulty.alien_points as f64 * s.score_scale as f64) as i64;

        info!(
            "Difficulty raised: x{:.3} speed, {} points per alien",
            self.difficulty.multiplier, self.difficulty.alien_points
        );
    }
}
