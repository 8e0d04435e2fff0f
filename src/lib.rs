//! Lane Racer - headless lane racing simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (kinematics, spawning, collisions, scoring)
//! - `env`: Step/reset facade consumed by renderers and learning harnesses
//! - `tuning`: Data-driven game balance

pub mod env;
pub mod sim;
pub mod tuning;

pub use env::{Action, Hud, InvalidAction, Simulation, Sprite, StepInfo, StepResult};
pub use sim::{EndReason, Observation, OpponentKind, TickInput};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Visible play area
    pub const SCREEN_WIDTH: f32 = 1100.0;
    pub const SCREEN_HEIGHT: f32 = 800.0;

    /// Road layout: four lanes, indexed 0-3 left to right
    pub const NUM_LANES: usize = 4;
    pub const LANE_WIDTH: f32 = 100.0;
    pub const ROAD_LEFT_EDGE: f32 = 150.0;
    pub const ROAD_RIGHT_EDGE: f32 = ROAD_LEFT_EDGE + NUM_LANES as f32 * LANE_WIDTH;

    /// Player car
    pub const PLAYER_WIDTH: f32 = 60.0;
    pub const PLAYER_HEIGHT: f32 = 100.0;
    pub const PLAYER_START_LANE: usize = 1;
    /// Player row (0.5 car height gap above the bottom of the screen)
    pub const PLAYER_Y: f32 = SCREEN_HEIGHT - PLAYER_HEIGHT - 50.0;

    /// Opponent cars
    pub const OPPONENT_WIDTH: f32 = 60.0;
    pub const OPPONENT_HEIGHT: f32 = 100.0;

    /// Observation layout
    pub const OBS_PLAYER_FEATURES: usize = 4;
    pub const OBS_GLOBAL_FEATURES: usize = 3;
    pub const OBS_OPPONENT_SLOTS: usize = 5;
    pub const OBS_OPPONENT_FEATURES: usize = 5;
    pub const OBS_LEN: usize =
        OBS_PLAYER_FEATURES + OBS_GLOBAL_FEATURES + OBS_OPPONENT_SLOTS * OBS_OPPONENT_FEATURES;
}

use consts::*;

/// Horizontal center of a lane
#[inline]
pub fn lane_center(lane: usize) -> f32 {
    ROAD_LEFT_EDGE + LANE_WIDTH * lane as f32 + LANE_WIDTH / 2.0
}

/// Left x of a car of `width` centered in `lane`
#[inline]
pub fn lane_x(lane: usize, width: f32) -> f32 {
    lane_center(lane) - width / 2.0
}

/// Lane containing a horizontal center, or `None` when off the road
pub fn lane_at(center_x: f32) -> Option<usize> {
    if !(ROAD_LEFT_EDGE..ROAD_RIGHT_EDGE).contains(&center_x) {
        return None;
    }
    let lane = ((center_x - ROAD_LEFT_EDGE) / LANE_WIDTH) as usize;
    Some(lane.min(NUM_LANES - 1))
}
