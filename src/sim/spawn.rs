//! Opponent spawn scheduler
//!
//! Random draws happen in a fixed order within an attempt (blocking roll,
//! pattern choice, lane, kind, lateral state) so a seed fully determines the
//! traffic for a given input sequence.

use rand::Rng;

use super::state::RaceState;
use super::vehicle::{Lateral, OpponentCar, OpponentKind};
use crate::consts::*;
use crate::tuning::SpawnTuning;

/// Advance the spawn timer and place opponents when it elapses
///
/// Returns the number of opponents placed this tick. The timer only resets
/// when something was actually placed.
pub fn update_spawning(state: &mut RaceState, tuning: &SpawnTuning, multiplier: f32, dt: f32) -> usize {
    state.spawn.since_last_spawn += dt;
    if state.spawn.since_last_spawn < tuning.base_interval / multiplier {
        return 0;
    }

    let blocking_roll: f32 = state.rng.random();
    let active = state.opponents.iter().filter(|opp| opp.active).count();

    let mut placed = 0;
    if blocking_roll < tuning.blocking_chance && active < tuning.blocking_max_active {
        placed = spawn_blocking_pattern(state, tuning);
    }
    if placed == 0 && spawn_single(state, tuning) {
        placed = 1;
    }
    if placed > 0 {
        state.spawn.since_last_spawn = 0.0;
    }
    placed
}

/// Whether a new opponent at `y` keeps the vertical spacing to every other car
pub fn row_clear(opponents: &[OpponentCar], y: f32, min_spacing: f32) -> bool {
    opponents.iter().all(|opp| (opp.pos.y - y).abs() >= min_spacing)
}

fn random_lane_except(state: &mut RaceState, excluded: usize) -> usize {
    let lane = state.rng.random_range(0..NUM_LANES - 1);
    if lane >= excluded { lane + 1 } else { lane }
}

/// Kind for the next spawn, honoring the consecutive-kind cap
fn choose_kind(state: &mut RaceState, tuning: &SpawnTuning) -> OpponentKind {
    match state.spawn.last_kind {
        Some(last) if state.spawn.same_kind_run >= tuning.max_same_kind_run => {
            let others: Vec<OpponentKind> = OpponentKind::ALL.into_iter().filter(|kind| *kind != last).collect();
            others[state.rng.random_range(0..others.len())]
        }
        _ => OpponentKind::from_roll(state.rng.random(), &tuning.kind_weights),
    }
}

/// Green or yellow, still honoring the consecutive-kind cap
fn choose_non_red(state: &mut RaceState, tuning: &SpawnTuning) -> OpponentKind {
    let capped = state
        .spawn
        .last_kind
        .filter(|_| state.spawn.same_kind_run >= tuning.max_same_kind_run);
    let options: Vec<OpponentKind> = [OpponentKind::Green, OpponentKind::Yellow]
        .into_iter()
        .filter(|kind| Some(*kind) != capped)
        .collect();
    options[state.rng.random_range(0..options.len())]
}

fn spawn_single(state: &mut RaceState, tuning: &SpawnTuning) -> bool {
    let y = tuning.spawn_y;
    if !row_clear(&state.opponents, y, tuning.min_spacing) {
        log::trace!("Single spawn rejected: row {y} too close to traffic");
        return false;
    }

    let camping = state.camping.active;
    let mut lane = if camping {
        state.camping.lane.min(NUM_LANES - 1)
    } else {
        state.rng.random_range(0..NUM_LANES)
    };

    if state.spawn.lane_run_capped(lane, tuning.max_same_lane_run) {
        lane = random_lane_except(state, lane);
    }

    let kind = choose_kind(state, tuning);

    if kind == OpponentKind::Red
        && let Some(red_lane) = state.spawn.red_too_close(lane, tuning.min_red_lane_gap)
    {
        let candidates: Vec<usize> = (0..NUM_LANES)
            .filter(|l| l.abs_diff(red_lane) >= tuning.min_red_lane_gap)
            .collect();
        lane = candidates[state.rng.random_range(0..candidates.len())];
    }

    place(state, kind, lane, y);
    if camping {
        log::debug!("Camping counter-measure fired in lane {}", state.camping.lane);
        state.camping.clear();
    }
    true
}

/// Lane pair for a blocking pattern; under camping, one containing the camped lane
fn choose_lane_pair(state: &mut RaceState, tuning: &SpawnTuning) -> [usize; 2] {
    if state.camping.active {
        let camped = state.camping.lane;
        let containing: Vec<[usize; 2]> = tuning
            .lane_pairs
            .iter()
            .filter(|pair| pair.contains(&camped))
            .map(|&[a, b]| if a == camped { [a, b] } else { [b, a] })
            .collect();
        if !containing.is_empty() {
            return containing[state.rng.random_range(0..containing.len())];
        }
    }
    tuning.lane_pairs[state.rng.random_range(0..tuning.lane_pairs.len())]
}

fn spawn_blocking_pattern(state: &mut RaceState, tuning: &SpawnTuning) -> usize {
    if tuning.lane_pairs.is_empty() {
        return 0;
    }
    let pair = choose_lane_pair(state, tuning);

    let mut placed = 0;
    for (i, lane) in pair.into_iter().enumerate() {
        let y = tuning.spawn_y - i as f32 * tuning.blocking_stagger;
        if !row_clear(&state.opponents, y, tuning.min_spacing) {
            log::trace!("Pattern car {i} rejected: row {y} too close to traffic");
            continue;
        }
        if state.spawn.lane_run_capped(lane, tuning.max_same_lane_run) {
            log::trace!("Pattern car {i} skipped: lane {lane} run capped");
            continue;
        }

        let mut kind = choose_kind(state, tuning);
        if kind == OpponentKind::Red && state.spawn.red_too_close(lane, tuning.min_red_lane_gap).is_some() {
            kind = choose_non_red(state, tuning);
        }
        place(state, kind, lane, y);
        placed += 1;
    }
    if placed > 0 {
        log::debug!("Blocking pattern in lanes {pair:?} placed {placed} car(s)");
    }
    placed
}

fn lateral_for(state: &mut RaceState, kind: OpponentKind, lane: usize) -> Lateral {
    match kind {
        OpponentKind::Green => Lateral::Straight,
        OpponentKind::Yellow => Lateral::weave(lane, state.rng.random_bool(0.5)),
        OpponentKind::Red => Lateral::Bounce {
            direction: if state.rng.random_bool(0.5) { 1.0 } else { -1.0 },
        },
    }
}

fn place(state: &mut RaceState, kind: OpponentKind, lane: usize, y: f32) {
    let lateral = lateral_for(state, kind, lane);
    let id = state.next_entity_id();
    state.opponents.push(OpponentCar::new(id, kind, lane, y, lateral));
    state.spawn.record(kind, lane);
    log::debug!("Spawned {} #{id} in lane {lane} at y={y}", kind.as_str());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    fn running_state(seed: u64) -> (RaceState, Tuning) {
        let tuning = Tuning::default();
        let mut state = RaceState::new(seed, &tuning);
        state.reset(&tuning);
        (state, tuning)
    }

    /// Drive the scheduler alone, scrolling traffic so spawns keep coming
    fn run_scheduler(state: &mut RaceState, tuning: &Tuning, ticks: usize, spawned: &mut Vec<(OpponentKind, usize)>) {
        for _ in 0..ticks {
            let before = state.opponents.len();
            update_spawning(state, &tuning.spawn, 1.0, SIM_DT);
            for opp in &state.opponents[before..] {
                spawned.push((opp.kind, opp.lane));
            }
            for opp in &mut state.opponents {
                opp.pos.y += 240.0 * SIM_DT;
            }
            state.opponents.retain(|opp| opp.pos.y < SCREEN_HEIGHT);
        }
    }

    #[test]
    fn test_timer_waits_for_interval() {
        let (mut state, tuning) = running_state(3);
        let mut spawned = 0;
        for _ in 0..120 {
            spawned += update_spawning(&mut state, &tuning.spawn, 1.0, SIM_DT);
        }
        assert_eq!(spawned, 0);
        for _ in 0..30 {
            spawned += update_spawning(&mut state, &tuning.spawn, 1.0, SIM_DT);
        }
        assert!(spawned >= 1);
        assert!(state.spawn.since_last_spawn < 2.0);
    }

    #[test]
    fn test_blocked_row_keeps_timer_running() {
        let (mut state, mut tuning) = running_state(3);
        tuning.spawn.blocking_chance = 0.0;
        state
            .opponents
            .push(OpponentCar::new(99, OpponentKind::Green, 0, tuning.spawn.spawn_y + 10.0, Lateral::Straight));
        state.spawn.since_last_spawn = 10.0;
        let placed = update_spawning(&mut state, &tuning.spawn, 1.0, SIM_DT);
        assert_eq!(placed, 0);
        assert!(state.spawn.since_last_spawn > 10.0);
    }

    #[test]
    fn test_camping_targets_camped_lane() {
        let (mut state, tuning) = running_state(11);
        state.camping.observe_lane(2);
        state.camping.record_pass(2);
        state.camping.record_pass(2);
        assert!(state.camping.active);

        assert!(spawn_single(&mut state, &tuning.spawn));
        assert_eq!(state.opponents[0].lane, 2);
        assert!(!state.camping.active);
    }

    #[test]
    fn test_lane_cap_reroutes() {
        let (mut state, tuning) = running_state(5);
        state.spawn.record(OpponentKind::Green, 1);
        state.spawn.record(OpponentKind::Yellow, 1);
        state.camping.observe_lane(1);
        state.camping.record_pass(2);
        state.camping.record_pass(2);

        assert!(spawn_single(&mut state, &tuning.spawn));
        assert_ne!(state.opponents[0].lane, 1);
    }

    #[test]
    fn test_kind_cap_forces_change() {
        let (mut state, tuning) = running_state(5);
        for seed in 0..50 {
            state.rng = rand::SeedableRng::seed_from_u64(seed);
            state.spawn = Default::default();
            state.spawn.record(OpponentKind::Red, 0);
            state.spawn.record(OpponentKind::Red, 3);
            assert_ne!(choose_kind(&mut state, &tuning.spawn), OpponentKind::Red);
        }
    }

    #[test]
    fn test_camping_pattern_contains_camped_lane() {
        let (mut state, tuning) = running_state(8);
        state.camping.observe_lane(2);
        state.camping.record_pass(2);
        state.camping.record_pass(2);
        for _ in 0..20 {
            assert_eq!(choose_lane_pair(&mut state, &tuning.spawn), [2, 0]);
        }
    }

    #[test]
    fn test_blocking_pattern_staggers_and_leaves_gap() {
        let (mut state, tuning) = running_state(21);
        let placed = spawn_blocking_pattern(&mut state, &tuning.spawn);
        assert_eq!(placed, 2);
        let (a, b) = (&state.opponents[0], &state.opponents[1]);
        assert_eq!(b.pos.y, a.pos.y - tuning.spawn.blocking_stagger);
        assert!(a.lane.abs_diff(b.lane) >= 2);
    }

    #[test]
    fn test_same_seed_same_traffic() {
        let (mut a, tuning) = running_state(1234);
        let (mut b, _) = running_state(1234);
        let (mut spawned_a, mut spawned_b) = (Vec::new(), Vec::new());
        run_scheduler(&mut a, &tuning, 3000, &mut spawned_a);
        run_scheduler(&mut b, &tuning, 3000, &mut spawned_b);
        assert!(!spawned_a.is_empty());
        assert_eq!(spawned_a, spawned_b);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_runs_never_exceed_two(seed in any::<u64>()) {
            let (mut state, tuning) = running_state(seed);
            let mut spawned = Vec::new();
            run_scheduler(&mut state, &tuning, 6000, &mut spawned);

            for window in spawned.windows(3) {
                let same_kind = window.iter().all(|(kind, _)| *kind == window[0].0);
                let same_lane = window.iter().all(|(_, lane)| *lane == window[0].1);
                prop_assert!(!same_kind, "three {:?} in a row", window[0].0);
                prop_assert!(!same_lane, "three spawns in lane {}", window[0].1);
            }
        }

        #[test]
        fn prop_spawns_respect_spacing(seed in any::<u64>()) {
            let (mut state, tuning) = running_state(seed);
            for _ in 0..3000 {
                let before = state.opponents.len();
                update_spawning(&mut state, &tuning.spawn, 1.5, SIM_DT);
                for (i, new) in state.opponents.iter().enumerate().skip(before) {
                    for other in &state.opponents[..i] {
                        prop_assert!((new.pos.y - other.pos.y).abs() >= tuning.spawn.min_spacing);
                    }
                }
                for opp in &mut state.opponents {
                    opp.pos.y += 180.0 * SIM_DT;
                }
                state.opponents.retain(|opp| opp.pos.y < SCREEN_HEIGHT);
            }
        }

        #[test]
        fn prop_consecutive_reds_are_separated(seed in any::<u64>()) {
            let (mut state, tuning) = running_state(seed);
            let mut spawned = Vec::new();
            run_scheduler(&mut state, &tuning, 6000, &mut spawned);
            for pair in spawned.windows(2) {
                if pair[0].0 == OpponentKind::Red && pair[1].0 == OpponentKind::Red {
                    prop_assert!(pair[0].1.abs_diff(pair[1].1) >= tuning.spawn.min_red_lane_gap);
                }
            }
        }
    }
}
