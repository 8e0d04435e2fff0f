//! Player and opponent vehicles and their per-tick kinematics

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use crate::consts::*;
use crate::tuning::{OpponentTuning, PerKind, PlayerTuning};
use crate::{lane_at, lane_x};

/// Opponent color, which also fixes its lateral behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpponentKind {
    /// Drives straight down its lane
    Green,
    /// Zig-zags between its spawn lane and one neighbor
    Yellow,
    /// Bounces across the full road width
    Red,
}

impl OpponentKind {
    pub const ALL: [OpponentKind; 3] = [OpponentKind::Green, OpponentKind::Yellow, OpponentKind::Red];

    /// Weighted pick from a uniform roll in [0, 1); the caller draws the roll
    pub fn from_roll(roll: f32, weights: &PerKind<f32>) -> Self {
        let total = weights.green + weights.yellow + weights.red;
        let scaled = roll * total;
        if scaled < weights.green {
            OpponentKind::Green
        } else if scaled < weights.green + weights.yellow {
            OpponentKind::Yellow
        } else {
            OpponentKind::Red
        }
    }

    /// Value used in the observation vector
    pub fn obs_code(self) -> f32 {
        match self {
            OpponentKind::Green => 0.0,
            OpponentKind::Yellow => 0.5,
            OpponentKind::Red => 1.0,
        }
    }

    /// Body color for renderers
    pub fn color(self) -> [u8; 3] {
        match self {
            OpponentKind::Green => [0, 255, 0],
            OpponentKind::Yellow => [255, 255, 0],
            OpponentKind::Red => [255, 100, 100],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OpponentKind::Green => "green",
            OpponentKind::Yellow => "yellow",
            OpponentKind::Red => "red",
        }
    }
}

/// Player body color for renderers
pub const PLAYER_COLOR: [u8; 3] = [255, 0, 0];

/// Lane change progress
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum LaneChange {
    #[default]
    Idle,
    /// Linear slide from `start_x` to `target_x`, `progress` in [0, 1)
    Shifting {
        start_x: f32,
        target_x: f32,
        progress: f32,
    },
}

/// The player's car
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerCar {
    /// Top-left corner; only x changes
    pub pos: Vec2,
    pub size: Vec2,
    /// Longitudinal speed (km/h)
    pub speed: f32,
    /// Lane under the car's horizontal center
    pub lane: usize,
    pub lane_change: LaneChange,
    /// Steer state from the previous tick (lane changes fire on press)
    left_held: bool,
    right_held: bool,
}

impl PlayerCar {
    pub fn new(base_speed: f32) -> Self {
        Self {
            pos: Vec2::new(lane_x(PLAYER_START_LANE, PLAYER_WIDTH), PLAYER_Y),
            size: Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
            speed: base_speed,
            lane: PLAYER_START_LANE,
            lane_change: LaneChange::Idle,
            left_held: false,
            right_held: false,
        }
    }

    pub fn is_changing_lane(&self) -> bool {
        matches!(self.lane_change, LaneChange::Shifting { .. })
    }

    pub fn rect(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }

    pub fn center_x(&self) -> f32 {
        self.pos.x + self.size.x / 2.0
    }

    /// Advance steering and speed by one tick
    ///
    /// Pressing both steer directions at once cancels out.
    pub fn update(&mut self, dt: f32, steer_left: bool, steer_right: bool, brake: bool, tuning: &PlayerTuning) {
        let left = steer_left && !steer_right;
        let right = steer_right && !steer_left;
        let left_pressed = left && !self.left_held;
        let right_pressed = right && !self.right_held;

        match self.lane_change {
            LaneChange::Shifting {
                start_x,
                target_x,
                progress,
            } => {
                let progress = progress + tuning.lane_change_speed * dt;
                if progress >= 1.0 {
                    self.pos.x = target_x;
                    self.lane_change = LaneChange::Idle;
                } else {
                    self.pos.x = start_x + (target_x - start_x) * progress;
                    self.lane_change = LaneChange::Shifting {
                        start_x,
                        target_x,
                        progress,
                    };
                }
            }
            LaneChange::Idle => {
                let half_lane = LANE_WIDTH / 2.0;
                if left_pressed {
                    self.try_start_lane_change(self.pos.x - half_lane);
                } else if right_pressed {
                    self.try_start_lane_change(self.pos.x + half_lane);
                }
            }
        }
        self.left_held = left;
        self.right_held = right;

        if brake {
            self.speed -= tuning.brake_rate * dt;
        } else {
            self.speed += tuning.acceleration * dt;
        }
        self.speed = self.speed.clamp(tuning.min_speed, tuning.max_speed);

        if let Some(lane) = lane_at(self.center_x()) {
            self.lane = lane;
        }
    }

    /// Start sliding toward `target_x` if the whole car stays on the road
    fn try_start_lane_change(&mut self, target_x: f32) -> bool {
        if target_x < ROAD_LEFT_EDGE || target_x + self.size.x > ROAD_RIGHT_EDGE {
            return false;
        }
        self.lane_change = LaneChange::Shifting {
            start_x: self.pos.x,
            target_x,
            progress: 0.0,
        };
        true
    }
}

/// Lateral motion state, one variant per opponent kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Lateral {
    Straight,
    /// Shuttle between the centers of `home` and `alt`
    Weave {
        home: usize,
        alt: usize,
        toward_alt: bool,
    },
    /// Constant lateral speed, reversed at the road edges (±1.0)
    Bounce { direction: f32 },
}

impl Lateral {
    /// Weave partner for `lane`: the preferred side, or the other side at the road edge
    pub fn weave(lane: usize, prefer_right: bool) -> Self {
        let alt = match (prefer_right, lane) {
            (true, l) if l + 1 < NUM_LANES => l + 1,
            (true, l) => l - 1,
            (false, 0) => 1,
            (false, l) => l - 1,
        };
        Lateral::Weave {
            home: lane,
            alt,
            toward_alt: true,
        }
    }
}

/// An opponent car
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpponentCar {
    pub id: u32,
    pub kind: OpponentKind,
    /// Top-left corner; y grows toward the player
    pub pos: Vec2,
    pub size: Vec2,
    /// Lane under the car's horizontal center
    pub lane: usize,
    pub lateral: Lateral,
    /// Set the tick this car crosses the player's row
    pub passed: bool,
    /// Cleared once the car leaves the screen; pruned after the tick's update
    pub active: bool,
}

impl OpponentCar {
    pub fn new(id: u32, kind: OpponentKind, lane: usize, y: f32, lateral: Lateral) -> Self {
        Self {
            id,
            kind,
            pos: Vec2::new(lane_x(lane, OPPONENT_WIDTH), y),
            size: Vec2::new(OPPONENT_WIDTH, OPPONENT_HEIGHT),
            lane,
            lateral,
            passed: false,
            active: true,
        }
    }

    pub fn rect(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }

    pub fn center_x(&self) -> f32 {
        self.pos.x + self.size.x / 2.0
    }

    /// Current sideways heading: -1 left, 1 right, 0 none
    pub fn lateral_direction(&self) -> f32 {
        match self.lateral {
            Lateral::Straight => 0.0,
            Lateral::Weave {
                home,
                alt,
                toward_alt,
            } => {
                let target = if toward_alt { alt } else { home };
                let dx = lane_x(target, self.size.x) - self.pos.x;
                if dx.abs() < f32::EPSILON { 0.0 } else { dx.signum() }
            }
            Lateral::Bounce { direction } => direction,
        }
    }

    /// Advance one tick; `multiplier` scales both forward and lateral speed
    pub fn update(&mut self, dt: f32, multiplier: f32, tuning: &OpponentTuning) {
        if !self.active {
            return;
        }

        self.pos.y += tuning.forward_rate * multiplier * dt;

        match &mut self.lateral {
            Lateral::Straight => {}
            Lateral::Weave {
                home,
                alt,
                toward_alt,
            } => {
                let target_lane = if *toward_alt { *alt } else { *home };
                let target_x = lane_x(target_lane, self.size.x);
                let max_step = tuning.weave_rate * multiplier * dt;
                self.pos.x += (target_x - self.pos.x).clamp(-max_step, max_step);
                if (target_x - self.pos.x).abs() <= tuning.snap_epsilon {
                    self.pos.x = target_x;
                    *toward_alt = !*toward_alt;
                }
            }
            Lateral::Bounce { direction } => {
                self.pos.x += *direction * tuning.bounce_rate * multiplier * dt;
                let left_bound = ROAD_LEFT_EDGE;
                let right_bound = ROAD_RIGHT_EDGE - self.size.x;
                if self.pos.x <= left_bound {
                    self.pos.x = left_bound;
                    *direction = 1.0;
                } else if self.pos.x >= right_bound {
                    self.pos.x = right_bound;
                    *direction = -1.0;
                }
            }
        }

        if let Some(lane) = lane_at(self.center_x()) {
            self.lane = lane;
        }

        if self.pos.y > SCREEN_HEIGHT + tuning.despawn_margin {
            self.active = false;
        }
    }
}
