//! Runtime game configuration.
//!
//! [`Settings`] mirrors every constant in the crate root. A TOML file may
//! override any subset of fields; missing keys fall back to the compile-time
//! defaults, so a minimal file only needs the values being tuned.

use crate::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Playfield
    pub screen_width: f32,
    pub screen_height: f32,

    // Ship and projectiles
    pub ship_width: f32,
    pub ship_height: f32,
    pub ship_speed: f32,
    pub projectile_width: f32,
    pub projectile_height: f32,
    pub projectile_speed: f32,
    pub projectiles_allowed: usize,

    // Fleet
    pub alien_width: f32,
    pub alien_height: f32,
    pub alien_speed: f32,
    pub fleet_drop_speed: f32,
    pub alien_points: i64,

    // Progression
    pub starting_lives: u32,
    pub speedup_scale: f32,
    pub score_scale: f32,
    /// Upper bound for the compounded speed multiplier. `None` leaves
    /// difficulty growth unbounded.
    pub max_difficulty_scale: Option<f32>,

    // Timing
    pub tick_rate: u32,
    pub respawn_pause_ticks: u32,

    // Peer link
    pub peer_send_timeout_ms: u64,
    pub ping_interval_ticks: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,
            ship_width: SHIP_WIDTH,
            ship_height: SHIP_HEIGHT,
            ship_speed: SHIP_SPEED,
            projectile_width: PROJECTILE_WIDTH,
            projectile_height: PROJECTILE_HEIGHT,
            projectile_speed: PROJECTILE_SPEED,
            projectiles_allowed: PROJECTILES_ALLOWED,
            alien_width: ALIEN_WIDTH,
            alien_height: ALIEN_HEIGHT,
            alien_speed: ALIEN_SPEED,
            fleet_drop_speed: FLEET_DROP_SPEED,
            alien_points: ALIEN_POINTS,
            starting_lives: STARTING_LIVES,
            speedup_scale: SPEEDUP_SCALE,
            score_scale: SCORE_SCALE,
            max_difficulty_scale: None,
            tick_rate: TICK_RATE,
            respawn_pause_ticks: RESPAWN_PAUSE_TICKS,
            peer_send_timeout_ms: PEER_SEND_TIMEOUT_MS,
            ping_interval_ticks: PING_INTERVAL_TICKS,
        }
    }
}

impl Settings {
    /// Parses a TOML document and validates the result.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(contents).map_err(ConfigError::Parse)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml_str(&contents)
    }

    /// Rejects configurations the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dimensions = [
            ("screen_width", self.screen_width),
            ("screen_height", self.screen_height),
            ("ship_width", self.ship_width),
            ("ship_height", self.ship_height),
            ("projectile_width", self.projectile_width),
            ("projectile_height", self.projectile_height),
            ("alien_width", self.alien_width),
            ("alien_height", self.alien_height),
        ];
        for (name, value) in dimensions {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!("{} must be positive", name)));
            }
        }

        let speeds = [
            ("ship_speed", self.ship_speed),
            ("projectile_speed", self.projectile_speed),
            ("alien_speed", self.alien_speed),
            ("fleet_drop_speed", self.fleet_drop_speed),
        ];
        for (name, value) in speeds {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{} must be positive", name)));
            }
        }

        if self.screen_width < 4.0 * self.alien_width
            || self.screen_height < 5.0 * self.alien_height
        {
            return Err(ConfigError::Invalid(
                "playfield too small to hold a single alien row".to_string(),
            ));
        }
        if self.speedup_scale <= 1.0 || self.score_scale <= 1.0 {
            return Err(ConfigError::Invalid(
                "scale factors must be greater than 1".to_string(),
            ));
        }
        if let Some(cap) = self.max_difficulty_scale {
            if cap < 1.0 {
                return Err(ConfigError::Invalid(
                    "max_difficulty_scale must be at least 1".to_string(),
                ));
            }
        }
        if self.projectiles_allowed == 0 {
            return Err(ConfigError::Invalid(
                "projectiles_allowed must be at least 1".to_string(),
            ));
        }
        if self.starting_lives == 0 {
            return Err(ConfigError::Invalid(
                "starting_lives must be at least 1".to_string(),
            ));
        }
        if self.tick_rate == 0 || self.tick_rate > MAX_TICK_RATE {
            return Err(ConfigError::Invalid(format!(
                "tick_rate must be between 1 and {}",
                MAX_TICK_RATE
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config: {}", e),
            ConfigError::Parse(e) => write!(f, "failed to parse config: {}", e),
            ConfigError::Invalid(reason) => write!(f, "invalid config: {}", reason),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}
