//! Fixed timestep simulation tick
//!
//! Core race loop that advances the simulation deterministically.

use serde::{Deserialize, Serialize};

use super::collision::{crossed_row, first_collision};
use super::difficulty::DifficultyCurve;
use super::scoring::{accrue_distance, award_pass, distance_delta};
use super::spawn::update_spawning;
use super::state::{EndReason, RacePhase, RaceState};
use super::vehicle::OpponentKind;
use crate::tuning::Tuning;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    /// Steer one half-lane left (fires on press)
    pub steer_left: bool,
    /// Steer one half-lane right (fires on press)
    pub steer_right: bool,
    /// Brake instead of accelerating
    pub brake: bool,
}

/// What happened during one tick
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    /// Meters covered this tick
    pub distance_delta: f32,
    /// Difficulty multiplier in effect
    pub multiplier: f32,
    pub spawned: usize,
    /// Kinds passed this tick, in opponent order
    pub passed: Vec<OpponentKind>,
    /// Set on the tick the race ends
    pub ended: Option<EndReason>,
}

/// Advance the race by one fixed timestep
///
/// Does nothing unless the race is running.
pub fn tick(state: &mut RaceState, input: &TickInput, tuning: &Tuning, curve: &DifficultyCurve, dt: f32) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    if !state.is_running() {
        return outcome;
    }

    state.time_ticks += 1;
    state.elapsed += dt;
    state.time_remaining -= dt;

    // Player
    state
        .player
        .update(dt, input.steer_left, input.steer_right, input.brake, &tuning.player);
    state.camping.observe_lane(state.player.lane);

    outcome.distance_delta = distance_delta(state.player.speed, &tuning.race, dt);
    state.distance += outcome.distance_delta;

    let multiplier = curve.multiplier(state.elapsed);
    outcome.multiplier = multiplier;

    if tuning.spawn.enabled {
        outcome.spawned = update_spawning(state, &tuning.spawn, multiplier, dt);
    }

    // Opponents, with one-shot pass detection on the player's row
    let player_row = state.player.pos.y;
    for opp in &mut state.opponents {
        let old_y = opp.pos.y;
        opp.update(dt, multiplier, &tuning.opponent);
        if !opp.passed && crossed_row(old_y, opp.pos.y, player_row) {
            opp.passed = true;
            outcome.passed.push(opp.kind);
        }
    }
    for &kind in &outcome.passed {
        award_pass(state, kind, &tuning.score);
        state.camping.record_pass(tuning.spawn.camping_passes);
    }
    state.opponents.retain(|opp| opp.active);

    if !state.traffic_seen && state.traffic_on_screen() {
        state.traffic_seen = true;
        log::debug!("First traffic on screen at {:.2}s", state.elapsed);
    }

    let collided = first_collision(&state.player, &state.opponents).map(|opp| opp.kind);

    accrue_distance(state, outcome.distance_delta, multiplier, &tuning.score);

    // Collision beats victory beats timeout
    let ended = if let Some(kind) = collided {
        Some(EndReason::Collision(kind))
    } else if state.distance >= tuning.race.target_distance {
        Some(EndReason::Victory)
    } else if state.time_remaining <= 0.0 {
        Some(EndReason::Timeout)
    } else {
        None
    };

    if let Some(reason) = ended {
        state.phase = RacePhase::Ended(reason);
        log::info!(
            "Race ended ({}) at {:.2}s: distance {:.1}m, score {}, passed {}",
            reason.as_str(),
            state.elapsed,
            state.distance,
            state.score,
            state.passes.total()
        );
    }
    outcome.ended = ended;
    outcome
}
