//! Score persistence collaborator.
//!
//! The session only ever talks to a [`ScoreStore`]: it submits the final
//! score once per game over and reads the player's penalty and bonus once at
//! login. Failures are never fatal; callers fall back to zero and log.

use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Points added or removed per report on file for a player.
pub const POINTS_PER_REPORT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitAck {
    Created,
    Updated,
    /// The stored score was higher or equal and was kept.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    Unavailable(String),
    Banned(String),
    InvalidUsername,
}

impl fmt::Display for ScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreError::Unavailable(reason) => write!(f, "score service unavailable: {}", reason),
            ScoreError::Banned(user) => write!(f, "user {} is banned", user),
            ScoreError::InvalidUsername => write!(f, "username is required"),
        }
    }
}

impl std::error::Error for ScoreError {}

pub trait ScoreStore {
    fn submit_score(&mut self, username: &str, score: i64) -> Result<SubmitAck, ScoreError>;
    fn load_penalty(&self, username: &str) -> Result<i64, ScoreError>;
    fn load_bonus(&self, username: &str) -> Result<i64, ScoreError>;
}

/// The logged-in player and the per-alien adjustments fetched at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub username: String,
    pub penalty: i64,
    pub bonus: i64,
}

impl Profile {
    pub fn guest(username: &str) -> Self {
        Self {
            username: username.to_string(),
            penalty: 0,
            bonus: 0,
        }
    }

    /// Fetches penalty and bonus, defaulting each to zero on failure.
    pub fn load<S: ScoreStore>(username: &str, store: &S) -> Self {
        let penalty = store.load_penalty(username).unwrap_or_else(|e| {
            warn!("Could not load penalty for {}: {}; using 0", username, e);
            0
        });
        let bonus = store.load_bonus(username).unwrap_or_else(|e| {
            warn!("Could not load bonus for {}: {}; using 0", username, e);
            0
        });

        info!(
            "Loaded profile for {} (penalty {}, bonus {})",
            username, penalty, bonus
        );
        Self {
            username: username.to_string(),
            penalty,
            bonus,
        }
    }
}

/// In-process leaderboard with the service's rules: best score per user,
/// banned users rejected, adjustments derived from report counts.
#[derive(Debug, Clone)]
pub struct MemoryScoreStore {
    scores: HashMap<String, i64>,
    banned: HashSet<String>,
    negative_reports: HashMap<String, u32>,
    positive_reports: HashMap<String, u32>,
    submissions: Vec<(String, i64)>,
    reachable: bool,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self {
            scores: HashMap::new(),
            banned: HashSet::new(),
            negative_reports: HashMap::new(),
            positive_reports: HashMap::new(),
            submissions: Vec::new(),
            reachable: true,
        }
    }

    /// Simulates the service going away; every call fails while unreachable.
    pub fn set_reachable(&mut self, reachable: bool) {
        self.reachable = reachable;
    }

    pub fn ban(&mut self, username: &str) {
        self.banned.insert(username.to_string());
    }

    pub fn unban(&mut self, username: &str) {
        self.banned.remove(username);
    }

    pub fn report(&mut self, username: &str, positive: bool) {
        let reports = if positive {
            &mut self.positive_reports
        } else {
            &mut self.negative_reports
        };
        *reports.entry(username.to_string()).or_insert(0) += 1;
    }

    pub fn score_of(&self, username: &str) -> Option<i64> {
        self.scores.get(username).copied()
    }

    /// Every submission attempt that reached the store, in order.
    pub fn submissions(&self) -> &[(String, i64)] {
        &self.submissions
    }

    /// Highest scores first; ties broken by name.
    pub fn top(&self, n: usize) -> Vec<(String, i64)> {
        let mut ranked: Vec<(String, i64)> = self
            .scores
            .iter()
            .map(|(name, score)| (name.clone(), *score))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    fn ensure_reachable(&self) -> Result<(), ScoreError> {
        if self.reachable {
            Ok(())
        } else {
            Err(ScoreError::Unavailable("store offline".to_string()))
        }
    }

    fn adjustment(reports: &HashMap<String, u32>, username: &str) -> i64 {
        reports.get(username).copied().unwrap_or(0) as i64 * POINTS_PER_REPORT
    }
}

impl Default for MemoryScoreStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn submit_score(&mut self, username: &str, score: i64) -> Result<SubmitAck, ScoreError> {
        self.ensure_reachable()?;
        if username.is_empty() {
            return Err(ScoreError::InvalidUsername);
        }
        self.submissions.push((username.to_string(), score));
        if self.banned.contains(username) {
            return Err(ScoreError::Banned(username.to_string()));
        }

        match self.scores.get_mut(username) {
            Some(existing) if score > *existing => {
                *existing = score;
                info!("Score updated for {} to {}", username, score);
                Ok(SubmitAck::Updated)
            }
            Some(_) => Ok(SubmitAck::Unchanged),
            None => {
                self.scores.insert(username.to_string(), score);
                info!("New score added for {}: {}", username, score);
                Ok(SubmitAck::Created)
            }
        }
    }

    fn load_penalty(&self, username: &str) -> Result<i64, ScoreError> {
        self.ensure_reachable()?;
        if username.is_empty() {
            return Err(ScoreError::InvalidUsername);
        }
        Ok(Self::adjustment(&self.negative_reports, username))
    }

    fn load_bonus(&self, username: &str) -> Result<i64, ScoreError> {
        self.ensure_reachable()?;
        if username.is_empty() {
            return Err(ScoreError::InvalidUsername);
        }
        Ok(Self::adjustment(&self.positive_reports, username))
    }
}
