//! Input sources feeding discrete events into the session once per tick

use crate::entity::EntityStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    StartLeft,
    StopLeft,
    StartRight,
    StopRight,
    Fire,
    Pause,
    Quit,
}

/// Anything that can produce the input events for one tick: keyboard,
/// gamepad, network or a bot.
pub trait InputSource {
    fn poll(&mut self, entities: &EntityStore) -> Vec<InputEvent>;
}

/// Replays a fixed per-tick script, then stays silent.
#[derive(Debug, Default, Clone)]
pub struct ScriptedInput {
    script: VecDeque<Vec<InputEvent>>,
}

impl ScriptedInput {
    pub fn new(script: Vec<Vec<InputEvent>>) -> Self {
        Self {
            script: script.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, _entities: &EntityStore) -> Vec<InputEvent> {
        self.script.pop_front().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Steering {
    Idle,
    Left,
    Right,
}

/// Demo bot: steers under the closest alien column and fires when lined up.
///
/// Only state changes are emitted, the same way a keyboard produces a single
/// press and a single release per key.
#[derive(Debug, Clone)]
pub struct Autopilot {
    rng: StdRng,
    steering: Steering,
    /// Chance per tick to fire when lined up.
    trigger_chance: f64,
    /// Horizontal distance treated as lined up.
    tolerance: f32,
}

impl Autopilot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            steering: Steering::Idle,
            trigger_chance: 0.35,
            tolerance: 12.0,
        }
    }

    fn target_x(entities: &EntityStore) -> Option<f32> {
        let ship_x = entities.ship.bounds().center_x();
        entities
            .fleet
            .iter()
            .chain(entities.opponent_fleet.iter())
            .map(|alien| alien.bounds().center_x())
            .min_by(|a, b| {
                (a - ship_x)
                    .abs()
                    .partial_cmp(&(b - ship_x).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    fn steer(&mut self, wanted: Steering, events: &mut Vec<InputEvent>) {
        if wanted == self.steering {
            return;
        }
        match self.steering {
            Steering::Left => events.push(InputEvent::StopLeft),
            Steering::Right => events.push(InputEvent::StopRight),
            Steering::Idle => {}
        }
        match wanted {
            Steering::Left => events.push(InputEvent::StartLeft),
            Steering::Right => events.push(InputEvent::StartRight),
            Steering::Idle => {}
        }
        self.steering = wanted;
    }
}

impl InputSource for Autopilot {
    fn poll(&mut self, entities: &EntityStore) -> Vec<InputEvent> {
        let mut events = Vec::new();
        let ship_x = entities.ship.bounds().center_x();

        let wanted = match Self::target_x(entities) {
            Some(target) if target < ship_x - self.tolerance => Steering::Left,
            Some(target) if target > ship_x + self.tolerance => Steering::Right,
            _ => Steering::Idle,
        };
        self.steer(wanted, &mut events);

        if wanted == Steering::Idle && self.rng.gen_bool(self.trigger_chance) {
            events.push(InputEvent::Fire);
        }
        events
    }
}
