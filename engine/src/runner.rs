//! Fixed-rate tick loop tying input, session and peer link together

use crate::game::{GamePhase, Session, SessionStats};
use crate::input::InputSource;
use crate::network::{MatchOutcome, MatchReport, PeerSession};
use crate::scores::ScoreStore;
use log::{debug, info, warn};
use serde::Serialize;
use shared::{PeerMessage, MAX_TICK_RATE};
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    /// Loop iterations, including paused ones.
    pub ticks: u64,
    pub stats: SessionStats,
    pub phase: GamePhase,
    pub match_report: Option<MatchReport>,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    GameOver,
    Quit,
    MatchEnded(MatchOutcome),
    TickLimit,
}

/// Runs the session until game over, quit, the end of the match or
/// `max_ticks` iterations, whichever comes first.
///
/// Each iteration drains the peer, applies input, advances the session one
/// step and flushes whatever the session queued for the peer. An idle session
/// is started first. The peer link, if any, is closed before returning.
pub async fn run_game_loop<S, I>(
    session: &mut Session<S>,
    input: &mut I,
    mut peer: Option<PeerSession>,
    tick_rate: u32,
    max_ticks: Option<u64>,
) -> RunSummary
where
    S: ScoreStore,
    I: InputSource + ?Sized,
{
    let period = Duration::from_secs_f64(1.0 / tick_rate.clamp(1, MAX_TICK_RATE) as f64);
    let ping_interval = session.settings().ping_interval_ticks;

    session.set_multiplayer(peer.is_some());
    if session.phase() == GamePhase::Idle {
        session.start_session();
    }

    let mut interval_timer = interval(period);
    interval_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    // Skip the first tick since it fires immediately
    interval_timer.tick().await;

    let mut ticks: u64 = 0;
    let exit = loop {
        if max_ticks.map_or(false, |max| ticks >= max) {
            break Exit::TickLimit;
        }
        interval_timer.tick().await;
        let started = Instant::now();
        ticks += 1;

        if let Some(link) = peer.as_mut() {
            let update = link.drain();
            for spawn in &update.spawns {
                session.inject_opponent_alien(spawn);
            }
            if let Some(outcome) = update.ended {
                break Exit::MatchEnded(outcome);
            }
        }

        for event in input.poll(session.entities()) {
            session.handle_input(event);
        }

        let report = session.tick();
        if report.kills > 0 {
            debug!(
                "Tick {}: {} kills for {} points",
                session.ticks(),
                report.kills,
                report.points
            );
        }

        let outbound = session.take_outbound();
        if let Some(link) = peer.as_mut() {
            for message in &outbound {
                if let Err(e) = link.send(message).await {
                    warn!("Failed to send {:?} to peer: {}", message, e);
                }
            }
            if ping_interval > 0 && ticks % ping_interval as u64 == 0 {
                if let Err(e) = link.send(&PeerMessage::Ping).await {
                    debug!("Liveness ping failed: {}", e);
                }
            }
        }

        if session.is_game_over() {
            break Exit::GameOver;
        }
        if session.quit_requested() {
            break Exit::Quit;
        }

        let elapsed = started.elapsed();
        if elapsed > period {
            warn!(
                "Tick {} took {:.3}s, longer than the {:.3}s period",
                ticks,
                elapsed.as_secs_f32(),
                period.as_secs_f32()
            );
        }
    };

    info!("Game loop stopped after {} ticks: {:?}", ticks, exit);

    let match_report = match peer {
        Some(mut link) => {
            match exit {
                Exit::GameOver => link.end_match(MatchOutcome::Lost),
                Exit::Quit => {
                    // Leaving counts as losing; the peer is told the same way.
                    if link.is_running() {
                        if let Err(e) = link.send(&PeerMessage::GameOver).await {
                            warn!("Failed to notify peer of quit: {}", e);
                        }
                    }
                    link.end_match(MatchOutcome::Lost);
                }
                Exit::MatchEnded(_) | Exit::TickLimit => {}
            }
            Some(link.close().await)
        }
        None => None,
    };

    RunSummary {
        ticks,
        stats: *session.stats(),
        phase: session.phase(),
        match_report,
    }
}
