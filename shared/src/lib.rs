use serde::{Deserialize, Serialize};

pub mod protocol;
pub mod settings;

pub use protocol::{AlienSpawn, PeerMessage, ProtocolError};
pub use settings::{ConfigError, Settings};

pub const SCREEN_WIDTH: f32 = 1200.0;
pub const SCREEN_HEIGHT: f32 = 800.0;

pub const SHIP_WIDTH: f32 = 60.0;
pub const SHIP_HEIGHT: f32 = 48.0;
pub const SHIP_SPEED: f32 = 1.5;

pub const PROJECTILE_WIDTH: f32 = 3.0;
pub const PROJECTILE_HEIGHT: f32 = 15.0;
pub const PROJECTILE_SPEED: f32 = 2.5;
pub const PROJECTILES_ALLOWED: usize = 3;

pub const ALIEN_WIDTH: f32 = 60.0;
pub const ALIEN_HEIGHT: f32 = 58.0;
pub const ALIEN_SPEED: f32 = 1.0;
pub const FLEET_DROP_SPEED: f32 = 10.0;
pub const ALIEN_POINTS: i64 = 50;

pub const STARTING_LIVES: u32 = 3;
pub const SPEEDUP_SCALE: f32 = 1.1;
pub const SCORE_SCALE: f32 = 1.5;

pub const TICK_RATE: u32 = 60;
/// Highest tick rate a loop will run at; faster periods round to nothing.
pub const MAX_TICK_RATE: u32 = 10_000;
pub const RESPAWN_PAUSE_TICKS: u32 = 30;
pub const PEER_SEND_TIMEOUT_MS: u64 = 250;
pub const PING_INTERVAL_TICKS: u32 = 120;

/// Axis-aligned bounding box in screen coordinates (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            left: x,
            top: y,
            right: x + width,
            bottom: y + height,
        }
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }
}

/// Edges that merely touch do not count as a collision.
pub fn check_collision(a: &Bounds, b: &Bounds) -> bool {
    !(a.right <= b.left || b.right <= a.left || a.bottom <= b.top || b.bottom <= a.top)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    pub moving_left: bool,
    pub moving_right: bool,
}

impl Ship {
    /// Creates a stationary ship at the bottom centre of the playfield.
    pub fn new(settings: &Settings) -> Self {
        let mut ship = Self {
            x: 0.0,
            y: 0.0,
            width: settings.ship_width,
            height: settings.ship_height,
            speed: settings.ship_speed,
            moving_left: false,
            moving_right: false,
        };
        ship.center(settings.screen_width, settings.screen_height);
        ship
    }

    pub fn center(&mut self, screen_width: f32, screen_height: f32) {
        self.x = (screen_width - self.width) / 2.0;
        self.y = screen_height - self.height;
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    pub fn update(&mut self, screen_width: f32) {
        let bounds = self.bounds();
        if self.moving_right && bounds.right < screen_width {
            self.x = (self.x + self.speed).min(screen_width - self.width);
        }
        if self.moving_left && bounds.left > 0.0 {
            self.x = (self.x - self.speed).max(0.0);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
}

impl Projectile {
    /// Spawns a projectile centred on the ship's top edge.
    pub fn from_ship(ship: &Ship, width: f32, height: f32, speed: f32) -> Self {
        let bounds = ship.bounds();
        Self {
            x: bounds.center_x() - width / 2.0,
            y: bounds.top,
            width,
            height,
            speed,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    pub fn update(&mut self) {
        self.y -= self.speed;
    }

    pub fn is_off_screen(&self) -> bool {
        self.bounds().bottom <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Alien {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Horizontal speed magnitude; the sign comes from the owning fleet.
    pub speed: f32,
}

impl Alien {
    pub fn new(x: f32, y: f32, width: f32, height: f32, speed: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            speed,
        }
    }

    pub fn from_spawn(spawn: &AlienSpawn, width: f32, height: f32) -> Self {
        Self::new(spawn.x, spawn.y, width, height, spawn.speed)
    }

    pub fn to_spawn(&self) -> AlienSpawn {
        AlienSpawn {
            x: self.x,
            y: self.y,
            speed: self.speed,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.x, self.y, self.width, self.height)
    }

    pub fn touches_edge(&self, screen_width: f32) -> bool {
        let bounds = self.bounds();
        bounds.right >= screen_width || bounds.left <= 0.0
    }

    /// Whether the alien is on the edge it is heading into. An alien on the
    /// far edge is moving away from it and does not count.
    pub fn faces_edge(&self, screen_width: f32, direction: f32) -> bool {
        let bounds = self.bounds();
        if direction > 0.0 {
            bounds.right >= screen_width
        } else {
            bounds.left <= 0.0
        }
    }

    /// Pulls the alien back inside `[0, screen_width - width]`.
    pub fn clamp_to_playfield(&mut self, screen_width: f32) {
        self.x = self.x.max(0.0).min((screen_width - self.width).max(0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_bounds_creation() {
        let bounds = Bounds::new(50.0, 75.0, 10.0, 20.0);
        assert_eq!(bounds.left, 50.0);
        assert_eq!(bounds.top, 75.0);
        assert_eq!(bounds.right, 60.0);
        assert_eq!(bounds.bottom, 95.0);
        assert_eq!(bounds.center_x(), 55.0);
    }

    #[test]
    fn test_collision_detection_no_collision() {
        let a = Bounds::new(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::new(100.0, 100.0, 10.0, 10.0);
        assert!(!check_collision(&a, &b));
    }

    #[test]
    fn test_collision_detection_overlap() {
        let a = Bounds::new(0.0, 0.0, 32.0, 32.0);
        let b = Bounds::new(16.0, 16.0, 32.0, 32.0);
        assert!(check_collision(&a, &b));
        assert!(check_collision(&b, &a));
    }

    #[test]
    fn test_collision_detection_exact_touch() {
        let a = Bounds::new(0.0, 0.0, 32.0, 32.0);
        let b = Bounds::new(32.0, 0.0, 32.0, 32.0);
        assert!(!check_collision(&a, &b));
    }

    #[test]
    fn test_ship_starts_centered() {
        let settings = Settings::default();
        let ship = Ship::new(&settings);
        assert_approx_eq!(ship.bounds().center_x(), SCREEN_WIDTH / 2.0);
        assert_eq!(ship.bounds().bottom, SCREEN_HEIGHT);
        assert!(!ship.moving_left);
        assert!(!ship.moving_right);
    }

    #[test]
    fn test_ship_movement_stays_on_screen() {
        let settings = Settings::default();
        let mut ship = Ship::new(&settings);
        ship.x = SCREEN_WIDTH - SHIP_WIDTH - 0.5;
        ship.moving_right = true;
        ship.update(SCREEN_WIDTH);
        assert_eq!(ship.bounds().right, SCREEN_WIDTH);
        ship.update(SCREEN_WIDTH);
        assert_eq!(ship.bounds().right, SCREEN_WIDTH);

        ship.moving_right = false;
        ship.moving_left = true;
        ship.x = 1.0;
        ship.update(SCREEN_WIDTH);
        assert_eq!(ship.x, 0.0);
        ship.update(SCREEN_WIDTH);
        assert_eq!(ship.x, 0.0);
    }

    #[test]
    fn test_opposite_flags_cancel() {
        let settings = Settings::default();
        let mut ship = Ship::new(&settings);
        let start = ship.x;
        ship.moving_left = true;
        ship.moving_right = true;
        ship.update(SCREEN_WIDTH);
        assert_approx_eq!(ship.x, start);
    }

    #[test]
    fn test_projectile_leaves_from_ship_top() {
        let settings = Settings::default();
        let ship = Ship::new(&settings);
        let mut projectile =
            Projectile::from_ship(&ship, PROJECTILE_WIDTH, PROJECTILE_HEIGHT, PROJECTILE_SPEED);
        assert_approx_eq!(projectile.bounds().center_x(), ship.bounds().center_x());
        assert_eq!(projectile.y, ship.y);

        projectile.update();
        assert_approx_eq!(projectile.y, ship.y - PROJECTILE_SPEED);
        assert!(!projectile.is_off_screen());

        projectile.y = -PROJECTILE_HEIGHT;
        assert!(projectile.is_off_screen());
    }

    #[test]
    fn test_alien_edges() {
        let alien = Alien::new(0.0, 100.0, ALIEN_WIDTH, ALIEN_HEIGHT, ALIEN_SPEED);
        assert!(alien.touches_edge(SCREEN_WIDTH));

        let alien = Alien::new(SCREEN_WIDTH - ALIEN_WIDTH, 100.0, ALIEN_WIDTH, ALIEN_HEIGHT, 1.0);
        assert!(alien.touches_edge(SCREEN_WIDTH));

        let alien = Alien::new(500.0, 100.0, ALIEN_WIDTH, ALIEN_HEIGHT, 1.0);
        assert!(!alien.touches_edge(SCREEN_WIDTH));
    }

    #[test]
    fn test_alien_faces_edge_only_in_travel_direction() {
        let left = Alien::new(0.0, 100.0, ALIEN_WIDTH, ALIEN_HEIGHT, 1.0);
        assert!(left.faces_edge(SCREEN_WIDTH, -1.0));
        assert!(!left.faces_edge(SCREEN_WIDTH, 1.0));

        let right = Alien::new(SCREEN_WIDTH - ALIEN_WIDTH, 100.0, ALIEN_WIDTH, ALIEN_HEIGHT, 1.0);
        assert!(right.faces_edge(SCREEN_WIDTH, 1.0));
        assert!(!right.faces_edge(SCREEN_WIDTH, -1.0));
    }

    #[test]
    fn test_alien_clamp_to_playfield() {
        let mut alien = Alien::new(1500.0, 100.0, ALIEN_WIDTH, ALIEN_HEIGHT, 1.0);
        alien.clamp_to_playfield(SCREEN_WIDTH);
        assert_eq!(alien.x, SCREEN_WIDTH - ALIEN_WIDTH);

        alien.x = -40.0;
        alien.clamp_to_playfield(SCREEN_WIDTH);
        assert_eq!(alien.x, 0.0);

        alien.x = 300.0;
        alien.clamp_to_playfield(SCREEN_WIDTH);
        assert_eq!(alien.x, 300.0);
    }

    #[test]
    fn test_alien_spawn_conversion() {
        let alien = Alien::new(100.0, 50.0, ALIEN_WIDTH, ALIEN_HEIGHT, 1.5);
        let spawn = alien.to_spawn();
        assert_eq!(spawn.x, 100.0);
        assert_eq!(spawn.y, 50.0);
        assert_eq!(spawn.speed, 1.5);

        let mirrored = Alien::from_spawn(&spawn, ALIEN_WIDTH, ALIEN_HEIGHT);
        assert_eq!(mirrored, alien);
    }
}
