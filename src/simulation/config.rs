//! Road configuration and unit conversion
//!
//! The road itself works in cells and cells per tick. Real-world inputs
//! (kilometres, km/h) are converted with a grid size in metres per cell.

use super::error::{SimError, SimResult};

pub const DEFAULT_LANES: i64 = 3;
pub const DEFAULT_LENGTH_KM: f64 = 5.0;
pub const DEFAULT_GRID_SIZE_M: f64 = 0.5;
pub const DEFAULT_SPAWN_CHANCE: f64 = 0.8;
pub const DEFAULT_SPEED_KMH: f64 = 130.0;

/// Road dimensions and spawn policy, in cell units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadConfig {
    /// Number of cells along the road
    pub length: i64,
    pub lanes: i64,
    /// Entry speed and free-flow speed of every spawned car, in cells per tick
    pub spawn_speed: u32,
    /// Per-lane, per-tick spawn probability
    pub spawn_chance: f64,
}

impl RoadConfig {
    pub fn new(length: i64, lanes: i64, spawn_speed: u32, spawn_chance: f64) -> Self {
        Self {
            length,
            lanes,
            spawn_speed,
            spawn_chance,
        }
    }

    /// Build a config from real-world units
    ///
    /// `length_km` becomes `length_km * 1000 / grid_size_m` cells and
    /// `speed_kmh` becomes `speed_kmh / 3.6 / grid_size_m` cells per tick,
    /// both rounded down.
    pub fn from_physical(
        lanes: i64,
        length_km: f64,
        grid_size_m: f64,
        spawn_chance: f64,
        speed_kmh: f64,
    ) -> SimResult<Self> {
        if !(grid_size_m.is_finite() && grid_size_m > 0.0) {
            return Err(SimError::InvalidGridSize(grid_size_m));
        }

        let length = (length_km * 1000.0 / grid_size_m).floor() as i64;
        let spawn_speed = (speed_kmh / 3.6 / grid_size_m).floor() as u32;

        let config = Self::new(length, lanes, spawn_speed, spawn_chance);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.length <= 0 {
            return Err(SimError::InvalidLength(self.length));
        }
        if self.lanes <= 0 {
            return Err(SimError::InvalidLaneCount(self.lanes));
        }
        if self.spawn_speed == 0 {
            return Err(SimError::InvalidSpawnSpeed(self.spawn_speed));
        }
        if !(0.0..=1.0).contains(&self.spawn_chance) {
            return Err(SimError::InvalidSpawnChance(self.spawn_chance));
        }
        Ok(())
    }
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            length: (DEFAULT_LENGTH_KM * 1000.0 / DEFAULT_GRID_SIZE_M) as i64,
            lanes: DEFAULT_LANES,
            spawn_speed: (DEFAULT_SPEED_KMH / 3.6 / DEFAULT_GRID_SIZE_M) as u32,
            spawn_chance: DEFAULT_SPAWN_CHANCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_physical_defaults() {
        let physical = RoadConfig::from_physical(
            DEFAULT_LANES,
            DEFAULT_LENGTH_KM,
            DEFAULT_GRID_SIZE_M,
            DEFAULT_SPAWN_CHANCE,
            DEFAULT_SPEED_KMH,
        )
        .unwrap();
        assert_eq!(physical, RoadConfig::default());
        assert_eq!(physical.length, 10_000);
        assert_eq!(physical.spawn_speed, 72);
    }

    #[test]
    fn rejects_bad_dimensions() {
        assert!(matches!(
            RoadConfig::new(0, 2, 5, 0.5).validate(),
            Err(SimError::InvalidLength(0))
        ));
        assert!(matches!(
            RoadConfig::new(10, -1, 5, 0.5).validate(),
            Err(SimError::InvalidLaneCount(-1))
        ));
        assert!(matches!(
            RoadConfig::new(10, 2, 0, 0.5).validate(),
            Err(SimError::InvalidSpawnSpeed(0))
        ));
    }

    #[test]
    fn rejects_bad_spawn_chance() {
        for chance in [-0.1, 1.5, f64::NAN] {
            let err = RoadConfig::new(10, 1, 1, chance).validate().unwrap_err();
            assert!(err.is_config());
        }
        assert!(RoadConfig::new(10, 1, 1, 0.0).validate().is_ok());
        assert!(RoadConfig::new(10, 1, 1, 1.0).validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_grid_size() {
        assert!(matches!(
            RoadConfig::from_physical(3, 1.0, 0.0, 0.5, 100.0),
            Err(SimError::InvalidGridSize(_))
        ));
    }

    #[test]
    fn slow_speed_rounds_down_to_invalid() {
        // 1 km/h on 0.5 m cells is 0.55 cells per tick
        assert!(matches!(
            RoadConfig::from_physical(1, 1.0, 0.5, 0.5, 1.0),
            Err(SimError::InvalidSpawnSpeed(0))
        ));
    }
}
