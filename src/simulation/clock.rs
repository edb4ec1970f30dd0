//! Tick counter and the simulation's single random source

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::types::CarId;

/// Drives time forward and owns the RNG every random draw comes from
///
/// Threading one seeded generator through ordering, spawning and
/// acceleration makes runs reproducible from the seed alone.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    tick: u64,
    rng: StdRng,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self {
            tick: 0,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn new_with_seed(seed: u64) -> Self {
        Self {
            tick: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Number of completed ticks
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn advance(&mut self) {
        self.tick += 1;
    }

    /// Fresh random update order for this tick
    pub fn shuffled(&mut self, ids: impl IntoIterator<Item = CarId>) -> Vec<CarId> {
        let mut order: Vec<CarId> = ids.into_iter().collect();
        order.shuffle(&mut self.rng);
        order
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}
