//! Admits new cars at the start of the road

use log::debug;
use rand::Rng;

use super::error::SimResult;
use super::occupancy::OccupancyIndex;
use super::road::Road;
use super::types::{CarId, Cell};

/// Per-lane spawn policy, run once per tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spawner {
    spawn_speed: u32,
    spawn_chance: f64,
}

impl Spawner {
    pub fn new(spawn_speed: u32, spawn_chance: f64) -> Self {
        Self {
            spawn_speed,
            spawn_chance,
        }
    }

    pub fn spawn_speed(&self) -> u32 {
        self.spawn_speed
    }

    pub fn spawn_chance(&self) -> f64 {
        self.spawn_chance
    }

    /// No car in the first `spawn_speed` cells of the lane
    pub fn entry_is_free(&self, occupancy: &OccupancyIndex, lane: i64) -> bool {
        (0..i64::from(self.spawn_speed)).all(|position| !occupancy.contains(Cell::new(position, lane)))
    }

    /// Try every lane once, returning the ids of the cars added
    ///
    /// The spawn draw only happens for lanes whose entry zone is free.
    pub fn run(&self, road: &mut Road) -> SimResult<Vec<CarId>> {
        let mut spawned = Vec::new();

        for lane in 0..road.lanes() {
            if !self.entry_is_free(road.occupancy(), lane) {
                continue;
            }
            if !road.clock_mut().rng_mut().random_bool(self.spawn_chance) {
                continue;
            }

            let id = road.add_car(lane)?;
            debug!("Spawned {} in lane {}", id, lane);
            spawned.push(id);
        }

        Ok(spawned)
    }
}
