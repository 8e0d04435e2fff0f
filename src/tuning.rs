//! Data-driven game balance
//!
//! Every magic number the race depends on lives here so balance passes and
//! training experiments can swap tables without touching simulation code.
//! A `Tuning` is validated once, when a simulation is built.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::{DifficultyCurve, OpponentKind};

/// Configuration rejected at construction time
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must be within [0, 1] (got {value})")]
    NotAProbability { field: &'static str, value: f32 },
    #[error("player speed range is empty: min {min}, base {base}, max {max}")]
    SpeedRange { min: f32, base: f32, max: f32 },
    #[error("difficulty step {index} starts at {after}s, not after the previous step")]
    ThresholdOrder { index: usize, after: f32 },
    #[error("difficulty step {index} lowers the multiplier to {multiplier}")]
    MultiplierDecreases { index: usize, multiplier: f32 },
    #[error("difficulty multiplier {multiplier} outside [{min}, {max}]")]
    MultiplierRange { multiplier: f32, min: f32, max: f32 },
    #[error("blocking stagger {stagger} is below the minimum spawn spacing {spacing}")]
    StaggerBelowSpacing { stagger: f32, spacing: f32 },
    #[error("blocking patterns are enabled but no lane pairs are configured")]
    NoLanePairs,
    #[error("lane pair [{0}, {1}] references a lane outside the road")]
    LaneOutOfRange(usize, usize),
    #[error("lane pair [{0}, {1}] is not separated by at least one open lane")]
    AdjacentLanePair(usize, usize),
    #[error("spawn kind weights must be non-negative and not all zero")]
    KindWeights,
    #[error("red lane gap {0} leaves some lanes without a valid partner")]
    RedLaneGap(usize),
    #[error("frame skip must be at least 1")]
    FrameSkip,
}

/// Player vehicle handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Speed at episode start (km/h)
    pub base_speed: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    /// Speed gained per second while not braking
    pub acceleration: f32,
    /// Speed lost per second while braking
    pub brake_rate: f32,
    /// Lane change progress per second (5.0 = 0.2s per change)
    pub lane_change_speed: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            base_speed: 150.0,
            min_speed: 50.0,
            max_speed: 300.0,
            acceleration: 250.0,
            brake_rate: 400.0,
            lane_change_speed: 5.0,
        }
    }
}

/// Race goal and clock
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceTuning {
    /// Seconds available to reach the target
    pub time_limit: f32,
    /// Distance to win (meters)
    pub target_distance: f32,
    /// Divisor from speed units (km/h) to meters per second
    pub speed_to_mps: f32,
}

impl Default for RaceTuning {
    fn default() -> Self {
        Self {
            time_limit: 120.0,
            target_distance: 9500.0,
            speed_to_mps: 3.6,
        }
    }
}

/// Opponent motion
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpponentTuning {
    /// Screen pixels per second toward the player at multiplier 1.0
    pub forward_rate: f32,
    /// Lateral pixels per second for yellow weavers
    pub weave_rate: f32,
    /// Lateral pixels per second for red bouncers
    pub bounce_rate: f32,
    /// Distance at which a weaver snaps onto its target lane center
    pub snap_epsilon: f32,
    /// Distance below the screen before an opponent is removed
    pub despawn_margin: f32,
}

impl Default for OpponentTuning {
    fn default() -> Self {
        Self {
            forward_rate: 120.0,
            weave_rate: 60.0,
            bounce_rate: 70.0,
            snap_epsilon: 2.0,
            despawn_margin: 100.0,
        }
    }
}

/// A value per opponent kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerKind<T> {
    pub green: T,
    pub yellow: T,
    pub red: T,
}

impl<T: Copy> PerKind<T> {
    pub fn get(&self, kind: OpponentKind) -> T {
        match kind {
            OpponentKind::Green => self.green,
            OpponentKind::Yellow => self.yellow,
            OpponentKind::Red => self.red,
        }
    }
}

/// Spawn scheduler and fairness rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTuning {
    /// Scheduler on/off (off is used by scripted scenarios)
    pub enabled: bool,
    /// Seconds between spawns at multiplier 1.0
    pub base_interval: f32,
    /// Row new opponents appear on (above the screen)
    pub spawn_y: f32,
    /// Minimum vertical gap between a new opponent and any existing one
    pub min_spacing: f32,
    /// Chance a spawn attempt tries a blocking pattern
    pub blocking_chance: f32,
    /// Blocking patterns are only tried below this many active opponents
    pub blocking_max_active: usize,
    /// Vertical stagger between the two cars of a blocking pattern
    pub blocking_stagger: f32,
    /// Lane pairs a blocking pattern may occupy
    pub lane_pairs: Vec<[usize; 2]>,
    /// Relative spawn weights
    pub kind_weights: PerKind<f32>,
    /// Longest allowed run of one kind
    pub max_same_kind_run: u32,
    /// Longest allowed run of one lane
    pub max_same_lane_run: u32,
    /// Passes in one lane before the camping counter-measure fires
    pub camping_passes: u32,
    /// Minimum lane distance between consecutive red spawns
    pub min_red_lane_gap: usize,
}

impl Default for SpawnTuning {
    fn default() -> Self {
        Self {
            enabled: true,
            base_interval: 2.33,
            spawn_y: -OPPONENT_HEIGHT,
            min_spacing: 250.0,
            blocking_chance: 0.15,
            blocking_max_active: 3,
            blocking_stagger: 280.0,
            lane_pairs: vec![[0, 2], [0, 3], [1, 3]],
            kind_weights: PerKind {
                green: 0.5,
                yellow: 0.3,
                red: 0.2,
            },
            max_same_kind_run: 2,
            max_same_lane_run: 2,
            camping_passes: 2,
            min_red_lane_gap: 2,
        }
    }
}

/// Hard ceiling for any difficulty table
pub const DIFFICULTY_CAP: f32 = 2.0;

/// One plateau of the difficulty curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyStep {
    /// Elapsed seconds at which the plateau begins
    pub after: f32,
    pub multiplier: f32,
}

/// Time-driven difficulty table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyTuning {
    /// Multiplier before the first step
    pub base: f32,
    /// Upper bound every step must respect
    pub max: f32,
    pub steps: Vec<DifficultyStep>,
}

impl Default for DifficultyTuning {
    fn default() -> Self {
        let step = |after, multiplier| DifficultyStep { after, multiplier };
        Self {
            base: 1.0,
            max: DIFFICULTY_CAP,
            steps: vec![
                step(30.0, 1.2),
                step(46.0, 1.4),
                step(60.0, 1.6),
                step(80.0, 1.8),
                step(100.0, 2.0),
            ],
        }
    }
}

/// HUD score
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTuning {
    /// Points per meter at multiplier 1.0
    pub distance_weight: f32,
    /// Points per opponent passed
    pub pass_bonus: PerKind<u32>,
}

impl Default for ScoreTuning {
    fn default() -> Self {
        Self {
            distance_weight: 10.0,
            pass_bonus: PerKind {
                green: 2,
                yellow: 3,
                red: 5,
            },
        }
    }
}

/// Step reward for policy learning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTuning {
    /// Reward per meter covered this tick
    pub progress_weight: f32,
    /// Flat reward per tick
    pub survival_bonus: f32,
    /// Reward per tick while faster than `speed_bonus_threshold`
    pub speed_bonus: f32,
    pub speed_bonus_threshold: f32,
    /// Per tick while the lane camping counter-measure is armed
    pub camping_penalty: f32,
    /// Per tick while a lane change is in progress
    pub lane_change_penalty: f32,
    /// Added once on collision, by the kind that was hit
    pub collision_penalty: PerKind<f32>,
    pub victory_bonus: f32,
    pub timeout_penalty: f32,
    /// Hold per-tick terms at zero until traffic first shows on screen
    pub wait_for_traffic: bool,
}

impl Default for RewardTuning {
    fn default() -> Self {
        Self {
            progress_weight: 0.1,
            survival_bonus: 0.1,
            speed_bonus: 0.5,
            speed_bonus_threshold: 250.0,
            camping_penalty: -0.5,
            lane_change_penalty: -0.05,
            // Easy-to-read cars cost the most to hit
            collision_penalty: PerKind {
                green: -50.0,
                yellow: -30.0,
                red: -10.0,
            },
            victory_bonus: 1000.0,
            timeout_penalty: -500.0,
            wait_for_traffic: true,
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub race: RaceTuning,
    pub opponent: OpponentTuning,
    pub spawn: SpawnTuning,
    pub difficulty: DifficultyTuning,
    pub score: ScoreTuning,
    pub reward: RewardTuning,
    /// Physics ticks per observed step
    pub frame_skip: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player: PlayerTuning::default(),
            race: RaceTuning::default(),
            opponent: OpponentTuning::default(),
            spawn: SpawnTuning::default(),
            difficulty: DifficultyTuning::default(),
            score: ScoreTuning::default(),
            reward: RewardTuning::default(),
            frame_skip: 1,
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::NonPositive { field, value })
    }
}

fn probability(field: &'static str, value: f32) -> Result<(), TuningError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::NotAProbability { field, value })
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning file; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Tuning with the spawn scheduler switched off
    pub fn without_traffic() -> Self {
        let mut tuning = Self::default();
        tuning.spawn.enabled = false;
        tuning
    }

    /// Reject tables the simulation cannot run fairly
    pub fn validate(&self) -> Result<(), TuningError> {
        let p = &self.player;
        positive("player.min_speed", p.min_speed)?;
        if !(p.min_speed <= p.base_speed && p.base_speed <= p.max_speed) {
            return Err(TuningError::SpeedRange {
                min: p.min_speed,
                base: p.base_speed,
                max: p.max_speed,
            });
        }
        positive("player.acceleration", p.acceleration)?;
        positive("player.brake_rate", p.brake_rate)?;
        positive("player.lane_change_speed", p.lane_change_speed)?;

        positive("race.time_limit", self.race.time_limit)?;
        positive("race.target_distance", self.race.target_distance)?;
        positive("race.speed_to_mps", self.race.speed_to_mps)?;

        positive("opponent.forward_rate", self.opponent.forward_rate)?;
        positive("opponent.weave_rate", self.opponent.weave_rate)?;
        positive("opponent.bounce_rate", self.opponent.bounce_rate)?;
        positive("opponent.snap_epsilon", self.opponent.snap_epsilon)?;

        self.validate_spawn()?;
        self.validate_difficulty()?;

        if self.frame_skip == 0 {
            return Err(TuningError::FrameSkip);
        }
        Ok(())
    }

    fn validate_spawn(&self) -> Result<(), TuningError> {
        let s = &self.spawn;
        positive("spawn.base_interval", s.base_interval)?;
        positive("spawn.min_spacing", s.min_spacing)?;
        probability("spawn.blocking_chance", s.blocking_chance)?;
        if s.blocking_stagger < s.min_spacing {
            return Err(TuningError::StaggerBelowSpacing {
                stagger: s.blocking_stagger,
                spacing: s.min_spacing,
            });
        }
        if s.blocking_chance > 0.0 && s.lane_pairs.is_empty() {
            return Err(TuningError::NoLanePairs);
        }
        for &[a, b] in &s.lane_pairs {
            if a >= NUM_LANES || b >= NUM_LANES {
                return Err(TuningError::LaneOutOfRange(a, b));
            }
            if a.abs_diff(b) < 2 {
                return Err(TuningError::AdjacentLanePair(a, b));
            }
        }

        let w = s.kind_weights;
        let weights = [w.green, w.yellow, w.red];
        if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) || weights.iter().sum::<f32>() <= 0.0
        {
            return Err(TuningError::KindWeights);
        }
        if s.max_same_kind_run == 0 {
            return Err(TuningError::NonPositive {
                field: "spawn.max_same_kind_run",
                value: 0.0,
            });
        }
        if s.camping_passes == 0 {
            return Err(TuningError::NonPositive {
                field: "spawn.camping_passes",
                value: 0.0,
            });
        }
        if s.max_same_lane_run == 0 {
            return Err(TuningError::NonPositive {
                field: "spawn.max_same_lane_run",
                value: 0.0,
            });
        }
        // Every lane needs a partner at least this far away
        if s.min_red_lane_gap > NUM_LANES / 2 {
            return Err(TuningError::RedLaneGap(s.min_red_lane_gap));
        }
        Ok(())
    }

    fn validate_difficulty(&self) -> Result<(), TuningError> {
        DifficultyCurve::new(&self.difficulty).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_is_valid() {
        Tuning::default().validate().unwrap();
        Tuning::without_traffic().validate().unwrap();
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let tuning = Tuning::from_json(r#"{ "race": { "time_limit": 60.0 }, "frame_skip": 4 }"#)
            .unwrap();
        assert_eq!(tuning.race.time_limit, 60.0);
        assert_eq!(tuning.race.target_distance, 9500.0);
        assert_eq!(tuning.frame_skip, 4);
        assert_eq!(tuning.spawn.lane_pairs.len(), 3);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(TuningError::Parse(_))
        ));
    }

    #[test]
    fn test_adjacent_lane_pair_rejected() {
        let mut tuning = Tuning::default();
        tuning.spawn.lane_pairs.push([1, 2]);
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::AdjacentLanePair(1, 2))
        ));

        let mut tuning = Tuning::default();
        tuning.spawn.lane_pairs = vec![[0, 7]];
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::LaneOutOfRange(0, 7))
        ));

        let mut tuning = Tuning::default();
        tuning.spawn.lane_pairs.clear();
        assert!(matches!(tuning.validate(), Err(TuningError::NoLanePairs)));
    }

    #[test]
    fn test_malformed_difficulty_rejected() {
        let mut tuning = Tuning::default();
        tuning.difficulty.steps[2].multiplier = 1.1;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::MultiplierDecreases { index: 2, .. })
        ));

        let mut tuning = Tuning::default();
        tuning.difficulty.steps[1].after = 10.0;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::ThresholdOrder { index: 1, .. })
        ));

        let mut tuning = Tuning::default();
        tuning.difficulty.steps[4].multiplier = 2.5;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::MultiplierRange { .. })
        ));
    }

    #[test]
    fn test_bad_weights_and_speeds_rejected() {
        let mut tuning = Tuning::default();
        tuning.spawn.kind_weights = PerKind {
            green: 0.0,
            yellow: 0.0,
            red: 0.0,
        };
        assert!(matches!(tuning.validate(), Err(TuningError::KindWeights)));

        let mut tuning = Tuning::default();
        tuning.player.min_speed = 400.0;
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::SpeedRange { .. })
        ));

        let mut tuning = Tuning::default();
        tuning.frame_skip = 0;
        assert!(matches!(tuning.validate(), Err(TuningError::FrameSkip)));
    }
}
