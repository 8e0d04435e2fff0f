//! Collision and pass detection
//!
//! Cars are axis-aligned rectangles. Any overlap with the player ends the
//! race; there is no damage model.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::vehicle::{OpponentCar, PlayerCar};

/// Axis-aligned bounding box in screen space (y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Top-left corner
    pub min: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// Strict overlap: rectangles that only share an edge do not collide
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let a_max = self.max();
        let b_max = other.max();
        self.min.x < b_max.x && other.min.x < a_max.x && self.min.y < b_max.y && other.min.y < a_max.y
    }
}

/// First active opponent overlapping the player
pub fn first_collision<'a>(player: &PlayerCar, opponents: &'a [OpponentCar]) -> Option<&'a OpponentCar> {
    let player_rect = player.rect();
    opponents
        .iter()
        .filter(|opp| opp.active)
        .find(|opp| player_rect.overlaps(&opp.rect()))
}

/// Whether a car moved from strictly above `row` to at or below it
#[inline]
pub fn crossed_row(old_y: f32, new_y: f32, row: f32) -> bool {
    old_y < row && new_y >= row
}
