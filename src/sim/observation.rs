//! Flat state vector for learning policies

use super::state::RaceState;
use crate::consts::*;
use crate::tuning::Tuning;

/// Fixed-length observation (player, global progress, nearest opponents)
pub type Observation = [f32; OBS_LEN];

/// Slot contents when fewer opponents than slots are on the road
pub const EMPTY_SLOT: [f32; OBS_OPPONENT_FEATURES] = [0.0, -2.0, 0.0, 0.0, 0.0];

/// Build the observation for the current state
pub fn observe(state: &RaceState, tuning: &Tuning, multiplier: f32) -> Observation {
    let mut obs = [0.0; OBS_LEN];
    let player = &state.player;

    obs[0] = player.pos.x / SCREEN_WIDTH;
    obs[1] = player.speed / tuning.player.max_speed;
    obs[2] = player.lane as f32 / (NUM_LANES - 1) as f32;
    obs[3] = if player.is_changing_lane() { 1.0 } else { 0.0 };

    obs[4] = state.time_remaining / tuning.race.time_limit;
    obs[5] = (state.distance / tuning.race.target_distance).min(1.0);
    obs[6] = multiplier / 2.0;

    let forward_speed = tuning.opponent.forward_rate * multiplier / tuning.player.max_speed;

    let mut nearest: Vec<(f32, u32, [f32; OBS_OPPONENT_FEATURES])> = state
        .opponents
        .iter()
        .filter(|opp| opp.active)
        .map(|opp| {
            let dx = (opp.pos.x - player.pos.x) / SCREEN_WIDTH;
            let dy = (opp.pos.y - player.pos.y) / SCREEN_HEIGHT;
            let features = [dx, dy, opp.kind.obs_code(), opp.lateral_direction(), forward_speed];
            (dx.hypot(dy), opp.id, features)
        })
        .collect();
    nearest.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let base = OBS_PLAYER_FEATURES + OBS_GLOBAL_FEATURES;
    for slot in 0..OBS_OPPONENT_SLOTS {
        let features = nearest.get(slot).map_or(EMPTY_SLOT, |entry| entry.2);
        let start = base + slot * OBS_OPPONENT_FEATURES;
        obs[start..start + OBS_OPPONENT_FEATURES].copy_from_slice(&features);
    }
    obs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::RaceState;
    use crate::sim::vehicle::{Lateral, OpponentCar, OpponentKind};

    fn running_state() -> (RaceState, Tuning) {
        let tuning = Tuning::default();
        let mut state = RaceState::new(0, &tuning);
        state.reset(&tuning);
        (state, tuning)
    }

    #[test]
    fn test_empty_road_observation() {
        let (state, tuning) = running_state();
        let obs = observe(&state, &tuning, 1.0);
        assert_eq!(obs.len(), 32);
        assert!((obs[0] - 270.0 / 1100.0).abs() < 1e-6);
        assert_eq!(obs[1], 0.5);
        assert!((obs[2] - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(obs[3], 0.0);
        assert_eq!(obs[4], 1.0);
        assert_eq!(obs[5], 0.0);
        assert_eq!(obs[6], 0.5);
        for slot in obs[7..].chunks(OBS_OPPONENT_FEATURES) {
            assert_eq!(slot, EMPTY_SLOT);
        }
    }

    #[test]
    fn test_nearest_opponents_first() {
        let (mut state, tuning) = running_state();
        let far = OpponentCar::new(1, OpponentKind::Green, 0, 0.0, Lateral::Straight);
        let near = OpponentCar::new(2, OpponentKind::Red, 1, 400.0, Lateral::Bounce { direction: -1.0 });
        state.opponents = vec![far, near];

        let obs = observe(&state, &tuning, 1.5);
        let first = &obs[7..12];
        assert_eq!(first[0], 0.0);
        assert!((first[1] - (400.0 - PLAYER_Y) / SCREEN_HEIGHT).abs() < 1e-6);
        assert_eq!(first[2], 1.0);
        assert_eq!(first[3], -1.0);
        assert!((first[4] - 0.6).abs() < 1e-6);

        let second = &obs[12..17];
        assert_eq!(second[2], 0.0);
        assert_eq!(second[3], 0.0);
        assert_eq!(&obs[17..22], &EMPTY_SLOT);
    }

    #[test]
    fn test_progress_saturates() {
        let (mut state, tuning) = running_state();
        state.distance = 20_000.0;
        assert_eq!(observe(&state, &tuning, 1.0)[5], 1.0);
    }
}
