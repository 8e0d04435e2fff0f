//! Race state and scheduler memory
//!
//! Everything an episode mutates lives in `RaceState`, including the RNG, so
//! two states built from the same seed and fed the same inputs stay identical.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::vehicle::{OpponentCar, OpponentKind, PlayerCar};
use crate::consts::*;
use crate::tuning::Tuning;

/// Why a race ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Hit an opponent of this kind
    Collision(OpponentKind),
    /// Ran out of time before the target distance
    Timeout,
    /// Reached the target distance in time
    Victory,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndReason::Collision(_) => "collision",
            EndReason::Timeout => "timeout",
            EndReason::Victory => "victory",
        }
    }
}

/// Episode lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RacePhase {
    /// Built but not reset yet
    #[default]
    Idle,
    Running,
    /// Terminal until the next reset
    Ended(EndReason),
}

/// Opponents passed, per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PassCounts {
    pub green: u32,
    pub yellow: u32,
    pub red: u32,
}

impl PassCounts {
    pub fn record(&mut self, kind: OpponentKind) {
        match kind {
            OpponentKind::Green => self.green += 1,
            OpponentKind::Yellow => self.yellow += 1,
            OpponentKind::Red => self.red += 1,
        }
    }

    pub fn get(&self, kind: OpponentKind) -> u32 {
        match kind {
            OpponentKind::Green => self.green,
            OpponentKind::Yellow => self.yellow,
            OpponentKind::Red => self.red,
        }
    }

    pub fn total(&self) -> u32 {
        self.green + self.yellow + self.red
    }
}

/// Spawn scheduler memory used by the fairness rules
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpawnMemory {
    /// Seconds since the last successful spawn
    pub since_last_spawn: f32,
    pub last_kind: Option<OpponentKind>,
    /// Length of the current run of `last_kind`
    pub same_kind_run: u32,
    pub last_lane: Option<usize>,
    /// Length of the current run of `last_lane`
    pub same_lane_run: u32,
    /// Lane of the most recent red spawn
    pub last_red_lane: Option<usize>,
    pub total_spawned: u32,
}

impl SpawnMemory {
    /// Update run lengths after placing an opponent
    pub fn record(&mut self, kind: OpponentKind, lane: usize) {
        self.same_kind_run = if self.last_kind == Some(kind) {
            self.same_kind_run + 1
        } else {
            1
        };
        self.same_lane_run = if self.last_lane == Some(lane) {
            self.same_lane_run + 1
        } else {
            1
        };
        self.last_kind = Some(kind);
        self.last_lane = Some(lane);
        if kind == OpponentKind::Red {
            self.last_red_lane = Some(lane);
        }
        self.total_spawned += 1;
    }

    /// Whether spawning in `lane` would exceed `max_run` consecutive spawns there
    pub fn lane_run_capped(&self, lane: usize, max_run: u32) -> bool {
        self.last_lane == Some(lane) && self.same_lane_run >= max_run
    }

    /// The previous red lane, if a red spawn in `lane` would sit too close to it
    pub fn red_too_close(&self, lane: usize, min_gap: usize) -> Option<usize> {
        if self.last_kind != Some(OpponentKind::Red) {
            return None;
        }
        self.last_red_lane.filter(|red_lane| red_lane.abs_diff(lane) < min_gap)
    }
}

/// Tracks how long the player has sat in one lane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampingTracker {
    pub lane: usize,
    /// Passes made without leaving `lane`
    pub passes_in_lane: u32,
    /// Counter-measure armed: the next single spawn targets `lane`
    pub active: bool,
}

impl CampingTracker {
    pub fn new(lane: usize) -> Self {
        Self {
            lane,
            passes_in_lane: 0,
            active: false,
        }
    }

    /// Changing lanes starts a fresh count
    pub fn observe_lane(&mut self, lane: usize) {
        if lane != self.lane {
            *self = Self::new(lane);
        }
    }

    pub fn record_pass(&mut self, threshold: u32) {
        self.passes_in_lane += 1;
        if self.passes_in_lane >= threshold {
            self.active = true;
        }
    }

    /// Counter-measure fired
    pub fn clear(&mut self) {
        self.passes_in_lane = 0;
        self.active = false;
    }
}

/// Complete race state (deterministic for a given seed and input sequence)
#[derive(Debug, Clone)]
pub struct RaceState {
    /// Seed the RNG was last reset with
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: RacePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub elapsed: f32,
    pub time_remaining: f32,
    /// Meters covered
    pub distance: f32,
    /// Σ distance · weight · multiplier
    pub weighted_distance: f64,
    pub pass_bonus: u64,
    pub score: u64,
    pub passes: PassCounts,
    pub player: PlayerCar,
    /// Active opponents (insertion order = spawn order)
    pub opponents: Vec<OpponentCar>,
    pub spawn: SpawnMemory,
    pub camping: CampingTracker,
    /// An opponent has been on screen this episode
    pub traffic_seen: bool,
    next_id: u32,
}

impl RaceState {
    /// Idle state; call `reset` to start racing
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        let player = PlayerCar::new(tuning.player.base_speed);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: RacePhase::Idle,
            time_ticks: 0,
            elapsed: 0.0,
            time_remaining: tuning.race.time_limit,
            distance: 0.0,
            weighted_distance: 0.0,
            pass_bonus: 0,
            score: 0,
            passes: PassCounts::default(),
            camping: CampingTracker::new(player.lane),
            player,
            opponents: Vec::new(),
            spawn: SpawnMemory::default(),
            traffic_seen: false,
            next_id: 1,
        }
    }

    /// Re-initialize every field for a new episode, continuing the RNG stream
    pub fn reset(&mut self, tuning: &Tuning) {
        let rng = self.rng.clone();
        *self = Self::new(self.seed, tuning);
        self.rng = rng;
        self.phase = RacePhase::Running;
    }

    /// Re-initialize and restart the RNG from `seed`
    pub fn reset_with_seed(&mut self, seed: u64, tuning: &Tuning) {
        *self = Self::new(seed, tuning);
        self.phase = RacePhase::Running;
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn is_running(&self) -> bool {
        self.phase == RacePhase::Running
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        match self.phase {
            RacePhase::Ended(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn victory(&self) -> bool {
        self.end_reason() == Some(EndReason::Victory)
    }

    /// Whether any opponent overlaps the visible screen
    pub fn traffic_on_screen(&self) -> bool {
        self.opponents
            .iter()
            .any(|opp| opp.active && opp.pos.y + opp.size.y > 0.0 && opp.pos.y < SCREEN_HEIGHT)
    }
}
