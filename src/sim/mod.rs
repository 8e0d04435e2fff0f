//! Deterministic simulation module
//!
//! All race logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only, drawn in a fixed order
//! - Stable iteration order (spawn order, ties broken by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod difficulty;
pub mod observation;
pub mod scoring;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod vehicle;

pub use collision::{Aabb, crossed_row, first_collision};
pub use difficulty::DifficultyCurve;
pub use observation::{EMPTY_SLOT, Observation, observe};
pub use scoring::tick_reward;
pub use spawn::update_spawning;
pub use state::{CampingTracker, EndReason, PassCounts, RacePhase, RaceState, SpawnMemory};
pub use tick::{TickInput, TickOutcome, tick};
pub use vehicle::{LaneChange, Lateral, OpponentCar, OpponentKind, PLAYER_COLOR, PlayerCar};
