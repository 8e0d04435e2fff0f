//! Reset/step facade
//!
//! `Simulation` owns a validated `Tuning`, the difficulty curve and the race
//! state, and exposes the fixed-timestep contract used by learning harnesses
//! and renderers alike:
//!
//! ```
//! use lane_racer::{Action, Simulation, Tuning};
//!
//! let mut sim = Simulation::new(Tuning::default(), 42).unwrap();
//! let obs = sim.reset();
//! assert_eq!(obs.len(), 32);
//! let result = sim.step_action(Action::Right);
//! assert!(!result.done);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::{
    Aabb, DifficultyCurve, EndReason, Lateral, Observation, OpponentCar, OpponentKind, PLAYER_COLOR, PassCounts,
    RacePhase, RaceState, TickInput, observe, tick, tick_reward,
};
use crate::tuning::{Tuning, TuningError};

/// Discrete action space for policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Idle = 0,
    Left = 1,
    Right = 2,
    Brake = 3,
}

/// Action index outside the action space
#[derive(Debug, Error)]
#[error("action index {0} is outside 0..{count}", count = Action::COUNT)]
pub struct InvalidAction(pub usize);

impl Action {
    pub const COUNT: usize = 4;

    /// Control booleans for this action
    pub fn controls(self) -> TickInput {
        TickInput {
            steer_left: self == Action::Left,
            steer_right: self == Action::Right,
            brake: self == Action::Brake,
        }
    }
}

impl TryFrom<usize> for Action {
    type Error = InvalidAction;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Action::Idle),
            1 => Ok(Action::Left),
            2 => Ok(Action::Right),
            3 => Ok(Action::Brake),
            other => Err(InvalidAction(other)),
        }
    }
}

impl From<Action> for TickInput {
    fn from(action: Action) -> Self {
        action.controls()
    }
}

/// Diagnostics returned with every step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepInfo {
    pub distance: f32,
    pub score: u64,
    pub victory: bool,
    pub end_reason: Option<EndReason>,
    pub passes: PassCounts,
    pub time_remaining: f32,
    pub difficulty: f32,
    pub total_spawned: u32,
    pub total_passed: u32,
    /// Kind of the opponent that ended the race, if any
    pub collided_with: Option<OpponentKind>,
    /// Lane camping counter-measure armed
    pub camping: bool,
}

/// Result of one `step`
#[derive(Debug, Clone)]
pub struct StepResult {
    pub observation: Observation,
    /// Summed over every tick in the frame-skip batch
    pub reward: f32,
    pub done: bool,
    pub info: StepInfo,
}

/// Scalars a HUD draws
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hud {
    pub score: u64,
    pub time_remaining: f32,
    pub distance: f32,
    pub target_distance: f32,
    /// km/h
    pub speed: f32,
    pub multiplier: f32,
    pub passes: PassCounts,
    pub end_reason: Option<EndReason>,
}

/// One drawable rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sprite {
    pub rect: Aabb,
    pub color: [u8; 3],
    /// `None` for the player
    pub kind: Option<OpponentKind>,
}

/// Headless race simulation with a reset/step contract
pub struct Simulation {
    tuning: Tuning,
    curve: DifficultyCurve,
    state: RaceState,
    last_observation: Observation,
}

impl Simulation {
    /// Validate `tuning` and build an idle simulation; call `reset` to race
    pub fn new(tuning: Tuning, seed: u64) -> Result<Self, TuningError> {
        tuning.validate()?;
        let curve = DifficultyCurve::new(&tuning.difficulty)?;
        let state = RaceState::new(seed, &tuning);
        let last_observation = observe(&state, &tuning, curve.multiplier(0.0));
        log::info!("Simulation created (seed {seed}, frame skip {})", tuning.frame_skip);
        Ok(Self {
            tuning,
            curve,
            state,
            last_observation,
        })
    }

    /// Start a new race, continuing the RNG stream
    pub fn reset(&mut self) -> Observation {
        self.state.reset(&self.tuning);
        self.started()
    }

    /// Start a new race with the RNG restarted from `seed`
    pub fn reset_with_seed(&mut self, seed: u64) -> Observation {
        self.state.reset_with_seed(seed, &self.tuning);
        self.started()
    }

    fn started(&mut self) -> Observation {
        log::info!("Race started (seed {})", self.state.seed);
        self.last_observation = self.observation();
        self.last_observation
    }

    /// Advance `frame_skip` ticks with the same controls
    ///
    /// After the race ends this returns the final observation with zero
    /// reward until the next reset.
    pub fn step(&mut self, input: TickInput) -> StepResult {
        match self.state.phase {
            RacePhase::Idle => {
                log::warn!("step called before reset; ignoring");
                return self.frozen_result(false);
            }
            RacePhase::Ended(_) => return self.frozen_result(true),
            RacePhase::Running => {}
        }

        let mut reward = 0.0;
        for _ in 0..self.tuning.frame_skip {
            let outcome = tick(&mut self.state, &input, &self.tuning, &self.curve, SIM_DT);
            reward += tick_reward(&outcome, &self.state, &self.tuning.reward);
            if !self.state.is_running() {
                break;
            }
        }

        self.last_observation = self.observation();
        StepResult {
            observation: self.last_observation,
            reward,
            done: !self.state.is_running(),
            info: self.info(),
        }
    }

    /// `step` with a discrete action
    pub fn step_action(&mut self, action: Action) -> StepResult {
        self.step(action.controls())
    }

    fn frozen_result(&self, done: bool) -> StepResult {
        StepResult {
            observation: self.last_observation,
            reward: 0.0,
            done,
            info: self.info(),
        }
    }

    /// Difficulty multiplier at the current race time
    pub fn multiplier(&self) -> f32 {
        self.curve.multiplier(self.state.elapsed)
    }

    pub fn observation(&self) -> Observation {
        observe(&self.state, &self.tuning, self.multiplier())
    }

    pub fn info(&self) -> StepInfo {
        let state = &self.state;
        let end_reason = state.end_reason();
        StepInfo {
            distance: state.distance,
            score: state.score,
            victory: state.victory(),
            end_reason,
            passes: state.passes,
            time_remaining: state.time_remaining,
            difficulty: self.multiplier(),
            total_spawned: state.spawn.total_spawned,
            total_passed: state.passes.total(),
            collided_with: match end_reason {
                Some(EndReason::Collision(kind)) => Some(kind),
                _ => None,
            },
            camping: state.camping.active,
        }
    }

    pub fn hud(&self) -> Hud {
        let state = &self.state;
        Hud {
            score: state.score,
            time_remaining: state.time_remaining.max(0.0),
            distance: state.distance,
            target_distance: self.tuning.race.target_distance,
            speed: state.player.speed,
            multiplier: self.multiplier(),
            passes: state.passes,
            end_reason: state.end_reason(),
        }
    }

    /// Player and active opponents, player first
    pub fn sprites(&self) -> Vec<Sprite> {
        let player = Sprite {
            rect: self.state.player.rect(),
            color: PLAYER_COLOR,
            kind: None,
        };
        std::iter::once(player)
            .chain(self.state.opponents.iter().filter(|opp| opp.active).map(|opp| Sprite {
                rect: opp.rect(),
                color: opp.kind.color(),
                kind: Some(opp.kind),
            }))
            .collect()
    }

    /// Put an opponent on the road outside the scheduler
    ///
    /// Lateral motion starts deterministically (weavers head right, bouncers
    /// right) and no random numbers are drawn. Returns the new ID, or `None`
    /// for a lane off the road.
    pub fn place_opponent(&mut self, kind: OpponentKind, lane: usize, y: f32) -> Option<u32> {
        if lane >= NUM_LANES {
            return None;
        }
        let lateral = match kind {
            OpponentKind::Green => Lateral::Straight,
            OpponentKind::Yellow => Lateral::weave(lane, true),
            OpponentKind::Red => Lateral::Bounce { direction: 1.0 },
        };
        let id = self.state.next_entity_id();
        self.state.opponents.push(OpponentCar::new(id, kind, lane, y, lateral));
        log::debug!("Placed {} #{id} in lane {lane} at y={y}", kind.as_str());
        Some(id)
    }

    pub fn state(&self) -> &RaceState {
        &self.state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state.phase, RacePhase::Ended(_))
    }
}
