use log::debug;
use shared::{Alien, AlienSpawn, Projectile, Settings, Ship};

/// Every live entity of one local session.
///
/// The local fleet is owned by collision and wave logic. The opponent fleet
/// is only ever filled from peer events and is never the target of
/// projectiles.
#[derive(Debug, Clone)]
pub struct EntityStore {
    pub ship: Ship,
    pub projectiles: Vec<Projectile>,
    pub fleet: Vec<Alien>,
    pub opponent_fleet: Vec<Alien>,
}

impl EntityStore {
    pub fn new(settings: &Settings) -> Self {
        Self {
            ship: Ship::new(settings),
            projectiles: Vec::new(),
            fleet: Vec::new(),
            opponent_fleet: Vec::new(),
        }
    }

    /// Fires a projectile from the ship. Returns false without changing
    /// anything when `cap` projectiles are already in flight.
    pub fn fire(&mut self, settings: &Settings, speed: f32) -> bool {
        if self.projectiles.len() >= settings.projectiles_allowed {
            return false;
        }

        self.projectiles.push(Projectile::from_ship(
            &self.ship,
            settings.projectile_width,
            settings.projectile_height,
            speed,
        ));
        true
    }

    /// Moves projectiles up and drops those that left the top of the screen.
    pub fn update_projectiles(&mut self) {
        for projectile in &mut self.projectiles {
            projectile.update();
        }

        let before = self.projectiles.len();
        self.projectiles.retain(|p| !p.is_off_screen());
        let culled = before - self.projectiles.len();
        if culled > 0 {
            debug!("Culled {} projectile(s) past the top edge", culled);
        }
    }

    pub fn clear_projectiles(&mut self) {
        self.projectiles.clear();
    }

    pub fn clear_fleets(&mut self) {
        self.fleet.clear();
        self.opponent_fleet.clear();
    }

    /// Adds a peer's destroyed alien to the mirror fleet, pulled back inside
    /// the playfield if the peer reported it past an edge.
    pub fn inject_opponent(&mut self, spawn: &AlienSpawn, settings: &Settings) {
        let mut alien = Alien::from_spawn(spawn, settings.alien_width, settings.alien_height);
        alien.clamp_to_playfield(settings.screen_width);
        if alien.x != spawn.x {
            debug!("Clamped opponent alien from x={} to x={}", spawn.x, alien.x);
        }
        self.opponent_fleet.push(alien);
    }

    pub fn center_ship(&mut self, settings: &Settings) {
        self.ship.center(settings.screen_width, settings.screen_height);
    }
}
