//! # Alien Invasion Engine
//!
//! This library provides the simulation core of a fixed-timestep alien
//! shooter with an optional two-player versus mode. It owns every entity on
//! the playfield, moves the alien fleet, resolves collisions, keeps score and
//! exchanges destroyed aliens with a remote opponent.
//!
//! ## Core Responsibilities
//!
//! ### Deterministic Simulation
//! A session advances in discrete ticks (60 per second by default). Nothing
//! inside a tick suspends or reads the clock, so the same inputs always
//! produce the same fleet positions, kills and score.
//!
//! ### Versus Mode
//! Every alien destroyed locally is sent to the opponent, who receives it as
//! an extra obstacle in a mirror fleet. The first player to lose all lives
//! tells the other, and the match is settled.
//!
//! ## Architecture Design
//!
//! ### Single Writer
//! The tick loop is the only code that mutates session state. The network
//! receive task never touches the session directly; it forwards decoded
//! messages over a channel that the loop drains once per tick.
//!
//! ### Synchronous Core, Async Edges
//! [`game::Session`] is plain synchronous code and can be driven tick by tick
//! from tests. Outbound peer messages are queued on the session and flushed
//! by [`runner::run_game_loop`], which is the only async piece besides the
//! peer link itself.
//!
//! ## Module Organization
//!
//! ### Entity Store (`entity`)
//! The ship, live projectiles, the local fleet and the opponent mirror fleet.
//!
//! ### Fleet Controller (`fleet`)
//! Wave layout, edge bounce and drop, and per-wave difficulty scaling.
//!
//! ### Collision & Scoring (`collision`)
//! Projectile/alien hits, ship/alien contact, bottom breach and the
//! per-kill point formula.
//!
//! ### Game State Machine (`game`)
//! `Idle`, `Playing`, `RespawnPause` and `GameOver`, plus lives, waves and
//! the high score.
//!
//! ### Peer Sync (`network`)
//! Host/client TCP link speaking the newline-framed text protocol from
//! [`shared::protocol`], with the win/loss tally.
//!
//! ### Collaborators (`scores`, `input`)
//! Score persistence behind the [`scores::ScoreStore`] trait and input
//! behind [`input::InputSource`].
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use engine::input::Autopilot;
//! use engine::runner::run_game_loop;
//! use engine::scores::{MemoryScoreStore, Profile};
//! use engine::game::Session;
//! use shared::Settings;
//!
//! #[tokio::main]
//! async fn main() {
//!     let settings = Settings::default();
//!     let store = MemoryScoreStore::new();
//!     let profile = Profile::load("player", &store);
//!     let mut session = Session::new(settings, profile, store);
//!     let mut input = Autopilot::new(1);
//!
//!     // Single player, at most one minute of play
//!     let summary = run_game_loop(&mut session, &mut input, None, 60, Some(3600)).await;
//!     println!("Final score: {}", summary.stats.score);
//! }
//! ```

pub mod collision;
pub mod entity;
pub mod fleet;
pub mod game;
pub mod input;
pub mod network;
pub mod runner;
pub mod scores;
