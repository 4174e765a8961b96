use crate::collision::{
    check_bottom_breach, resolve_projectile_alien_collisions, resolve_ship_alien_collision,
    ScoringRules,
};
use crate::entity::EntityStore;
use crate::fleet::FleetController;
use crate::input::InputEvent;
use crate::scores::{Profile, ScoreStore};
use log::{debug, info, warn};
use serde::Serialize;
use shared::{AlienSpawn, PeerMessage, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GamePhase {
    Idle,
    Playing,
    RespawnPause { ticks_remaining: u32 },
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub score: i64,
    pub lives: u32,
    pub wave: u32,
    pub high_score: i64,
}

impl SessionStats {
    fn new(lives: u32, high_score: i64) -> Self {
        Self {
            score: 0,
            lives,
            wave: 1,
            high_score,
        }
    }
}

/// What happened during one call to [`Session::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub kills: usize,
    pub points: i64,
    pub wave_cleared: bool,
    pub life_lost: bool,
    pub game_over: bool,
}

/// One local player's game: entities, fleet, stats and the phase machine.
pub struct Session<S: ScoreStore> {
    settings: Settings,
    profile: Profile,
    scores: S,
    phase: GamePhase,
    stats: SessionStats,
    entities: EntityStore,
    fleet: FleetController,
    multiplayer: bool,
    outbox: Vec<PeerMessage>,
    paused: bool,
    quit_requested: bool,
    score_submitted: bool,
    tick: u64,
}

impl<S: ScoreStore> Session<S> {
    pub fn new(settings: Settings, profile: Profile, scores: S) -> Self {
        let entities = EntityStore::new(&settings);
        let fleet = FleetController::new(&settings);
        let stats = SessionStats::new(settings.starting_lives, 0);
        Self {
            settings,
            profile,
            scores,
            phase: GamePhase::Idle,
            stats,
            entities,
            fleet,
            multiplayer: false,
            outbox: Vec::new(),
            paused: false,
            quit_requested: false,
            score_submitted: false,
            tick: 0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn score_store(&self) -> &S {
        &self.scores
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityStore {
        &mut self.entities
    }

    pub fn fleet(&self) -> &FleetController {
        &self.fleet
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// In multiplayer mode kills and game over produce outbound peer messages.
    pub fn set_multiplayer(&mut self, enabled: bool) {
        self.multiplayer = enabled;
        if !enabled {
            self.outbox.clear();
        }
    }

    pub fn is_multiplayer(&self) -> bool {
        self.multiplayer
    }

    /// Messages queued for the peer since the last call.
    pub fn take_outbound(&mut self) -> Vec<PeerMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Resets stats, clears every collection and spawns wave 1.
    pub fn start_session(&mut self) {
        self.fleet.reset();
        self.stats = SessionStats::new(self.settings.starting_lives, self.stats.high_score);
        self.entities.clear_projectiles();
        self.entities.clear_fleets();
        self.entities.fleet = self.fleet.spawn_wave();
        self.entities.ship.speed = self.fleet.difficulty().ship_speed;
        self.entities.ship.moving_left = false;
        self.entities.ship.moving_right = false;
        self.entities.center_ship(&self.settings);
        self.outbox.clear();
        self.paused = false;
        self.quit_requested = false;
        self.score_submitted = false;
        self.phase = GamePhase::Playing;

        info!(
            "Session started for {} with {} lives",
            self.profile.username, self.stats.lives
        );
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::StartLeft => self.entities.ship.moving_left = true,
            InputEvent::StopLeft => self.entities.ship.moving_left = false,
            InputEvent::StartRight => self.entities.ship.moving_right = true,
            InputEvent::StopRight => self.entities.ship.moving_right = false,
            InputEvent::Fire => {
                if self.phase == GamePhase::Playing && !self.paused {
                    let speed = self.fleet.difficulty().projectile_speed;
                    if !self.entities.fire(&self.settings, speed) {
                        debug!("Fire ignored: projectile cap reached");
                    }
                }
            }
            InputEvent::Pause => {
                self.paused = !self.paused;
                info!("Game {}", if self.paused { "paused" } else { "resumed" });
            }
            InputEvent::Quit => self.quit_requested = true,
        }
    }

    /// Adds an alien destroyed by the opponent to the local mirror fleet.
    pub fn inject_opponent_alien(&mut self, spawn: &AlienSpawn) {
        if matches!(self.phase, GamePhase::Idle | GamePhase::GameOver) {
            debug!("Dropping opponent alien outside of play");
            return;
        }
        self.entities.inject_opponent(spawn, &self.settings);
    }

    pub fn scoring_rules(&self) -> ScoringRules {
        ScoringRules {
            base_points: self.fleet.difficulty().alien_points,
            penalty: self.profile.penalty,
            bonus: self.profile.bonus,
        }
    }

    /// Advances the session by one fixed timestep.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        if self.paused {
            return report;
        }

        match self.phase {
            GamePhase::Idle | GamePhase::GameOver => return report,
            GamePhase::RespawnPause { ticks_remaining } => {
                self.tick += 1;
                self.phase = if ticks_remaining <= 1 {
                    GamePhase::Playing
                } else {
                    GamePhase::RespawnPause {
                        ticks_remaining: ticks_remaining - 1,
                    }
                };
                return report;
            }
            GamePhase::Playing => {}
        }
        self.tick += 1;

        self.entities.ship.update(self.settings.screen_width);
        self.entities.update_projectiles();

        let destroyed = resolve_projectile_alien_collisions(
            &mut self.entities.projectiles,
            &mut self.entities.fleet,
        );
        if !destroyed.is_empty() {
            report.kills = destroyed.len();
            report.points = self.scoring_rules().points_for(destroyed.len());
            self.stats.score = self.stats.score.saturating_add(report.points);
            if self.stats.score > self.stats.high_score {
                self.stats.high_score = self.stats.score;
            }
            if self.multiplayer {
                self.outbox.extend(
                    destroyed
                        .iter()
                        .map(|alien| PeerMessage::Alien(alien.to_spawn())),
                );
            }
        }

        if self.entities.fleet.is_empty() {
            self.clear_wave();
            report.wave_cleared = true;
        }

        self.fleet.advance_local(&mut self.entities.fleet);
        self.fleet.advance_mirror(&mut self.entities.opponent_fleet);

        let screen_height = self.settings.screen_height;
        let struck = resolve_ship_alien_collision(
            &self.entities.ship,
            &self.entities.fleet,
            &self.entities.opponent_fleet,
        );
        let breached = check_bottom_breach(&self.entities.fleet, screen_height)
            || check_bottom_breach(&self.entities.opponent_fleet, screen_height);
        if struck || breached {
            report.life_lost = true;
            report.game_over = self.ship_hit();
        }

        debug_assert!(
            self.is_game_over() || !self.entities.fleet.is_empty(),
            "local fleet empty after tick"
        );
        debug_assert!(self.entities.projectiles.len() <= self.settings.projectiles_allowed);
        report
    }

    fn clear_wave(&mut self) {
        self.entities.clear_projectiles();
        self.fleet.increase_difficulty();
        self.entities.ship.speed = self.fleet.difficulty().ship_speed;
        self.stats.wave += 1;
        self.entities.fleet = self.fleet.spawn_wave();
        info!("Wave cleared, starting wave {}", self.stats.wave);
    }

    /// Returns true when the hit ended the game.
    fn ship_hit(&mut self) -> bool {
        assert!(self.stats.lives > 0, "ship hit with no lives remaining");
        self.stats.lives -= 1;

        if self.stats.lives == 0 {
            self.game_over();
            return true;
        }

        self.entities.clear_projectiles();
        self.entities.clear_fleets();
        self.entities.fleet = self.fleet.spawn_wave();
        self.entities.center_ship(&self.settings);
        self.phase = if self.settings.respawn_pause_ticks == 0 {
            GamePhase::Playing
        } else {
            GamePhase::RespawnPause {
                ticks_remaining: self.settings.respawn_pause_ticks,
            }
        };

        info!(
            "Ship hit, {} {} left",
            self.stats.lives,
            if self.stats.lives == 1 { "life" } else { "lives" }
        );
        false
    }

    fn game_over(&mut self) {
        self.phase = GamePhase::GameOver;
        info!(
            "Game over for {}: score {}, wave {}",
            self.profile.username, self.stats.score, self.stats.wave
        );

        if !self.score_submitted {
            self.score_submitted = true;
            match self
                .scores
                .submit_score(&self.profile.username, self.stats.score)
            {
                Ok(ack) => debug!("Score submission acknowledged: {:?}", ack),
                Err(e) => warn!("Score submission failed: {}", e),
            }
        }

        if self.multiplayer {
            self.outbox.push(PeerMessage::GameOver);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scores::MemoryScoreStore;
    use shared::{Alien, Projectile};

    fn test_session() -> Session<MemoryScoreStore> {
        Session::new(
            Settings::default(),
            Profile::guest("tester"),
            MemoryScoreStore::new(),
        )
    }

    fn projectile_on(alien: &Alien) -> Projectile {
        Projectile {
            x: alien.x + alien.width / 2.0,
            // Lands inside the alien after one update.
            y: alien.y + 10.0,
            width: 3.0,
            height: 15.0,
            speed: 2.5,
        }
    }

    fn crash_into_ship(session: &mut Session<MemoryScoreStore>) {
        let ship = session.entities().ship;
        let alien = Alien::new(ship.x, ship.y - 20.0, 60.0, 58.0, 0.0);
        session.entities_mut().fleet.push(alien);
    }

    #[test]
    fn test_new_session_is_idle() {
        let mut session = test_session();
        assert_eq!(session.phase(), GamePhase::Idle);
        assert_eq!(session.tick(), TickReport::default());
        assert!(session.entities().fleet.is_empty());
    }

    #[test]
    fn test_start_session() {
        let mut session = test_session();
        session.start_session();

        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.stats().score, 0);
        assert_eq!(session.stats().lives, 3);
        assert_eq!(session.stats().wave, 1);
        assert_eq!(session.entities().fleet.len(), 45);
        assert!(session.entities().projectiles.is_empty());
    }

    #[test]
    fn test_fire_cap() {
        let mut session = test_session();
        session.start_session();

        for _ in 0..10 {
            session.handle_input(InputEvent::Fire);
        }
        assert_eq!(session.entities().projectiles.len(), 3);
    }

    #[test]
    fn test_fire_ignored_when_idle() {
        let mut session = test_session();
        session.handle_input(InputEvent::Fire);
        assert!(session.entities().projectiles.is_empty());
    }

    #[test]
    fn test_kill_scores_points() {
        let mut session = test_session();
        session.start_session();
        let target = session.entities().fleet[0];
        session.entities_mut().projectiles.push(projectile_on(&target));

        let report = session.tick();

        assert_eq!(report.kills, 1);
        assert_eq!(report.points, 50);
        assert_eq!(session.stats().score, 50);
        assert_eq!(session.stats().high_score, 50);
        assert_eq!(session.entities().fleet.len(), 44);
        assert!(session.take_outbound().is_empty());
    }

    #[test]
    fn test_kill_in_multiplayer_queues_spawn() {
        let mut session = test_session();
        session.start_session();
        session.set_multiplayer(true);
        let target = session.entities().fleet[3];
        session.entities_mut().projectiles.push(projectile_on(&target));

        session.tick();

        let outbound = session.take_outbound();
        assert_eq!(outbound, vec![PeerMessage::Alien(target.to_spawn())]);
        assert!(session.take_outbound().is_empty());
    }

    #[test]
    fn test_score_saturates_instead_of_overflowing() {
        let mut session = test_session();
        session.start_session();
        session.profile.bonus = i64::MAX;

        for i in 0..2 {
            let target = session.entities().fleet[i];
            session.entities_mut().projectiles.push(projectile_on(&target));
            let report = session.tick();
            assert_eq!(report.kills, 1);
        }

        assert_eq!(session.stats().score, i64::MAX);
        assert_eq!(session.stats().high_score, i64::MAX);
    }

    #[test]
    fn test_wave_clear() {
        let mut session = test_session();
        session.start_session();
        let speed_before = session.fleet().difficulty().alien_speed;
        let projectile_speed_before = session.fleet().difficulty().projectile_speed;

        let last = session.entities().fleet[0];
        session.entities_mut().fleet.truncate(1);
        session.entities_mut().projectiles.push(projectile_on(&last));
        session.entities_mut().projectiles.push(Projectile {
            x: 5.0,
            y: 600.0,
            width: 3.0,
            height: 15.0,
            speed: 2.5,
        });

        let report = session.tick();

        assert!(report.wave_cleared);
        assert_eq!(report.points, 50);
        assert_eq!(session.stats().wave, 2);
        assert!(session.entities().projectiles.is_empty());
        assert_eq!(session.entities().fleet.len(), 45);
        assert!(session.fleet().difficulty().alien_speed > speed_before);
        assert!(session.fleet().difficulty().projectile_speed > projectile_speed_before);
        assert_eq!(session.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_non_fatal_hit_respawns_at_current_wave() {
        let mut session = test_session();
        session.start_session();
        session.fleet.increase_difficulty();
        session.stats.wave = 2;
        let speed = session.fleet().difficulty().alien_speed;
        session.entities_mut().projectiles.push(Projectile {
            x: 5.0,
            y: 600.0,
            width: 3.0,
            height: 15.0,
            speed: 2.5,
        });
        session.inject_opponent_alien(&AlienSpawn {
            x: 10.0,
            y: 10.0,
            speed: 1.0,
        });
        crash_into_ship(&mut session);

        let report = session.tick();

        assert!(report.life_lost);
        assert!(!report.game_over);
        assert_eq!(session.stats().lives, 2);
        assert_eq!(session.stats().wave, 2);
        assert!(session.entities().projectiles.is_empty());
        assert!(session.entities().opponent_fleet.is_empty());
        assert_eq!(session.entities().fleet.len(), 45);
        assert!(session.entities().fleet.iter().all(|a| a.speed == speed));
        assert_eq!(
            session.phase(),
            GamePhase::RespawnPause {
                ticks_remaining: 30
            }
        );

        for _ in 0..30 {
            session.tick();
        }
        assert_eq!(session.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_pause_holds_respawn_countdown() {
        let mut session = test_session();
        session.start_session();
        crash_into_ship(&mut session);
        session.tick();
        session.tick();
        let phase = session.phase();
        assert_eq!(phase, GamePhase::RespawnPause { ticks_remaining: 29 });

        session.handle_input(InputEvent::Pause);
        for _ in 0..50 {
            session.tick();
        }
        assert_eq!(session.phase(), phase);

        session.handle_input(InputEvent::Pause);
        session.tick();
        assert_eq!(session.phase(), GamePhase::RespawnPause { ticks_remaining: 28 });
    }

    #[test]
    fn test_respawn_pause_freezes_entities() {
        let mut session = test_session();
        session.start_session();
        crash_into_ship(&mut session);
        session.tick();

        let fleet = session.entities().fleet.clone();
        session.tick();
        assert_eq!(session.entities().fleet, fleet);
    }

    #[test]
    fn test_last_life_ends_game_and_submits_once() {
        let mut session = test_session();
        session.start_session();
        session.stats.lives = 1;
        session.stats.score = 1234;
        session.set_multiplayer(true);
        crash_into_ship(&mut session);

        let report = session.tick();

        assert!(report.game_over);
        assert!(session.is_game_over());
        assert_eq!(session.stats().lives, 0);
        assert_eq!(
            session.score_store().submissions(),
            &[("tester".to_string(), 1234)]
        );
        assert_eq!(session.take_outbound(), vec![PeerMessage::GameOver]);

        for _ in 0..10 {
            assert_eq!(session.tick(), TickReport::default());
        }
        assert_eq!(session.score_store().submissions().len(), 1);
    }

    #[test]
    fn test_bottom_breach_costs_a_life() {
        let mut session = test_session();
        session.start_session();
        let breach_y = session.settings().screen_height - 58.0;
        session
            .entities_mut()
            .fleet
            .push(Alien::new(10.0, breach_y, 60.0, 58.0, 0.0));

        let report = session.tick();

        assert!(report.life_lost);
        assert_eq!(session.stats().lives, 2);
    }

    #[test]
    fn test_opponent_alien_hits_ship() {
        let mut session = test_session();
        session.start_session();
        let ship = session.entities().ship;
        session.inject_opponent_alien(&AlienSpawn {
            x: ship.x,
            y: ship.y - 20.0,
            speed: 0.0,
        });

        let report = session.tick();

        assert!(report.life_lost);
        assert_eq!(session.stats().score, 0);
    }

    #[test]
    fn test_opponent_alien_on_edge_does_not_sink() {
        let mut session = test_session();
        session.start_session();
        let right_edge = session.settings().screen_width - session.settings().alien_width;
        session.inject_opponent_alien(&AlienSpawn {
            x: right_edge,
            y: 50.0,
            speed: 1.0,
        });

        for _ in 0..100 {
            let report = session.tick();
            assert!(!report.life_lost);
        }

        assert_eq!(session.stats().lives, 3);
        let mirror = session.entities().opponent_fleet[0];
        assert_eq!(mirror.y, 60.0);
        assert!(mirror.x < right_edge);
    }

    #[test]
    fn test_opponent_alien_dropped_when_idle() {
        let mut session = test_session();
        session.inject_opponent_alien(&AlienSpawn {
            x: 100.0,
            y: 50.0,
            speed: 1.5,
        });
        assert!(session.entities().opponent_fleet.is_empty());
    }

    #[test]
    fn test_pause_freezes_play() {
        let mut session = test_session();
        session.start_session();
        session.handle_input(InputEvent::Pause);
        let fleet = session.entities().fleet.clone();

        session.tick();
        assert_eq!(session.entities().fleet, fleet);
        session.handle_input(InputEvent::Fire);
        assert!(session.entities().projectiles.is_empty());

        session.handle_input(InputEvent::Pause);
        session.tick();
        assert_ne!(session.entities().fleet, fleet);
    }

    #[test]
    fn test_restart_keeps_high_score() {
        let mut session = test_session();
        session.start_session();
        session.stats.lives = 1;
        let target = session.entities().fleet[0];
        session.entities_mut().projectiles.push(projectile_on(&target));
        session.tick();
        crash_into_ship(&mut session);
        session.tick();
        assert!(session.is_game_over());

        session.start_session();

        assert_eq!(session.stats().score, 0);
        assert_eq!(session.stats().high_score, 50);
        assert_eq!(session.stats().lives, 3);
        assert_eq!(session.fleet().difficulty().multiplier, 1.0);
    }

    #[test]
    fn test_quit_request() {
        let mut session = test_session();
        session.start_session();
        session.handle_input(InputEvent::Quit);
        assert!(session.quit_requested());
    }

    #[test]
    fn test_penalty_and_bonus_apply_per_alien() {
        let mut session = Session::new(
            Settings::default(),
            Profile {
                username: "tester".to_string(),
                penalty: 20,
                bonus: 10,
            },
            MemoryScoreStore::new(),
        );
        session.start_session();
        let targets = [session.entities().fleet[0], session.entities().fleet[1]];
        for target in &targets {
            session.entities_mut().projectiles.push(projectile_on(target));
        }

        let report = session.tick();

        assert_eq!(report.kills, 2);
        assert_eq!(session.stats().score, 2 * (50 - 20 + 10));
    }
}
