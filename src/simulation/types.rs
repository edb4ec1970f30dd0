//! Core types for the lane simulation
//!
//! Road coordinates are discrete: a road is a grid of `length` cells by
//! `lanes` lanes, and every car occupies exactly one cell.

use std::fmt;

/// A unique identifier for a car
/// Ids are handed out in increasing order, so ordering by id is insertion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CarId(pub u64);

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "car#{}", self.0)
    }
}

/// A (position, lane) coordinate on the road grid
///
/// Lane 0 is the rightmost lane, higher indices are further left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cell {
    pub position: i64,
    pub lane: i64,
}

impl Cell {
    pub fn new(position: i64, lane: i64) -> Self {
        Self { position, lane }
    }

    /// The cell `distance` cells ahead and `shift` lanes over
    pub fn offset(&self, distance: i64, shift: LaneShift) -> Cell {
        Cell {
            position: self.position + distance,
            lane: self.lane + shift.offset(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, lane {})", self.position, self.lane)
    }
}

/// Which lane a car inspects relative to its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneShift {
    /// One lane to the right (towards lane 0)
    Right,
    /// The car's current lane
    Same,
    /// One lane to the left (overtaking side)
    Left,
}

impl LaneShift {
    pub fn offset(self) -> i64 {
        match self {
            LaneShift::Right => -1,
            LaneShift::Same => 0,
            LaneShift::Left => 1,
        }
    }
}

/// Forward lookahead is `speed * LOOKAHEAD_NUM / LOOKAHEAD_DEN` cells (1.1x speed)
pub const LOOKAHEAD_NUM: i64 = 11;
pub const LOOKAHEAD_DEN: i64 = 10;

/// Cells checked behind the car in a neighbouring lane when at full speed
/// Scaled down linearly with `speed / max_speed`
pub const MERGE_MARGIN: i64 = 5;

/// Brake cooldown set whenever a car has to brake
pub const BRAKE_COOLDOWN: u32 = 5;

/// Upper bound on how much a car can speed up in one tick
pub const MAX_SPEEDUP: u32 = 10;

/// Speed used for visibility checks when a stationary car pulls away
pub const RESTART_SPEED: u32 = 1;
