//! HUD score and per-tick reward
//!
//! The score is what a human player sees. The reward is what a learning
//! policy sees; it only ever depends on what happened during the current
//! tick, never on cumulative progress.

use super::state::{EndReason, RaceState};
use super::tick::TickOutcome;
use super::vehicle::OpponentKind;
use crate::tuning::{RaceTuning, RewardTuning, ScoreTuning};

/// Meters covered in `dt` at `speed` km/h
#[inline]
pub fn distance_delta(speed: f32, race: &RaceTuning, dt: f32) -> f32 {
    speed / race.speed_to_mps * dt
}

/// Add a tick's distance to the weighted score accumulator
pub fn accrue_distance(state: &mut RaceState, delta: f32, multiplier: f32, tuning: &ScoreTuning) {
    state.weighted_distance += f64::from(delta * tuning.distance_weight * multiplier);
    refresh_score(state);
}

/// Count a pass and credit its bonus
pub fn award_pass(state: &mut RaceState, kind: OpponentKind, tuning: &ScoreTuning) {
    state.passes.record(kind);
    state.pass_bonus += u64::from(tuning.pass_bonus.get(kind));
    refresh_score(state);
}

fn refresh_score(state: &mut RaceState) {
    state.score = state.weighted_distance.floor() as u64 + state.pass_bonus;
}

/// Reward for one tick
///
/// Shaping terms wait for the first on-screen opponent when
/// `wait_for_traffic` is set. Terminal terms always apply.
pub fn tick_reward(outcome: &TickOutcome, state: &RaceState, tuning: &RewardTuning) -> f32 {
    let mut reward = 0.0;

    if !tuning.wait_for_traffic || state.traffic_seen {
        reward += outcome.distance_delta * tuning.progress_weight;
        reward += tuning.survival_bonus;
        if state.player.speed > tuning.speed_bonus_threshold {
            reward += tuning.speed_bonus;
        }
        if state.camping.active {
            reward += tuning.camping_penalty;
        }
        if state.player.is_changing_lane() {
            reward += tuning.lane_change_penalty;
        }
    }

    match outcome.ended {
        Some(EndReason::Collision(kind)) => reward += tuning.collision_penalty.get(kind),
        Some(EndReason::Victory) => reward += tuning.victory_bonus,
        Some(EndReason::Timeout) => reward += tuning.timeout_penalty,
        None => {}
    }
    reward
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    fn running_state() -> (RaceState, Tuning) {
        let tuning = Tuning::default();
        let mut state = RaceState::new(0, &tuning);
        state.reset(&tuning);
        (state, tuning)
    }

    fn outcome(distance_delta: f32, ended: Option<EndReason>) -> TickOutcome {
        TickOutcome {
            distance_delta,
            ended,
            ..Default::default()
        }
    }

    #[test]
    fn test_distance_conversion() {
        let race = RaceTuning::default();
        // 36 km/h for one second is ten meters
        assert!((distance_delta(36.0, &race, 1.0) - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_score_combines_distance_and_bonus() {
        let (mut state, tuning) = running_state();
        accrue_distance(&mut state, 10.55, 1.0, &tuning.score);
        assert_eq!(state.score, 105);
        accrue_distance(&mut state, 10.0, 2.0, &tuning.score);
        assert_eq!(state.score, 305);

        award_pass(&mut state, OpponentKind::Red, &tuning.score);
        award_pass(&mut state, OpponentKind::Yellow, &tuning.score);
        assert_eq!(state.score, 313);
        assert_eq!(state.passes.red, 1);
        assert_eq!(state.passes.total(), 2);
    }

    #[test]
    fn test_shaping_waits_for_traffic() {
        let (mut state, tuning) = running_state();
        let tick = outcome(1.0, None);
        assert_eq!(tick_reward(&tick, &state, &tuning.reward), 0.0);

        state.traffic_seen = true;
        let reward = tick_reward(&tick, &state, &tuning.reward);
        assert!((reward - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_terminal_terms_are_never_gated() {
        let (state, tuning) = running_state();
        let collision = outcome(0.5, Some(EndReason::Collision(OpponentKind::Green)));
        assert_eq!(tick_reward(&collision, &state, &tuning.reward), -50.0);
        let victory = outcome(0.5, Some(EndReason::Victory));
        assert_eq!(tick_reward(&victory, &state, &tuning.reward), 1000.0);
        let timeout = outcome(0.5, Some(EndReason::Timeout));
        assert_eq!(tick_reward(&timeout, &state, &tuning.reward), -500.0);
    }

    #[test]
    fn test_reward_ignores_cumulative_distance() {
        let (mut state, tuning) = running_state();
        state.traffic_seen = true;
        let tick = outcome(0.8, None);
        let early = tick_reward(&tick, &state, &tuning.reward);
        state.distance = 9000.0;
        state.weighted_distance = 90_000.0;
        let late = tick_reward(&tick, &state, &tuning.reward);
        assert_eq!(early, late);
    }

    #[test]
    fn test_behavior_penalties() {
        let (mut state, tuning) = running_state();
        state.traffic_seen = true;
        let tick = outcome(0.0, None);
        let baseline = tick_reward(&tick, &state, &tuning.reward);

        state.camping.active = true;
        let camping = tick_reward(&tick, &state, &tuning.reward);
        assert!((camping - baseline + 0.5).abs() < 1e-6);

        state.player.speed = 280.0;
        let fast = tick_reward(&tick, &state, &tuning.reward);
        assert!((fast - camping - 0.5).abs() < 1e-6);
    }
}
