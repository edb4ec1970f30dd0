use thiserror::Error;

use super::types::{CarId, Cell};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("road length must be positive, got {0}")]
    InvalidLength(i64),

    #[error("lane count must be positive, got {0}")]
    InvalidLaneCount(i64),

    #[error("spawn speed must be positive, got {0}")]
    InvalidSpawnSpeed(u32),

    #[error("spawn chance must lie in [0, 1], got {0}")]
    InvalidSpawnChance(f64),

    #[error("grid size must be positive, got {0}")]
    InvalidGridSize(f64),

    #[error("lane {lane} is outside [0, {lanes})")]
    LaneOutOfRange { lane: i64, lanes: i64 },

    #[error("position {position} is outside [0, {length})")]
    PositionOutOfRange { position: i64, length: i64 },

    #[error("cell {0} is already occupied")]
    CellOccupied(Cell),

    #[error("cell {0} is not occupied")]
    CellVacant(Cell),

    #[error("{0} is not registered on the road")]
    UnregisteredCar(CarId),
}

impl SimError {
    /// True for errors caused by bad construction parameters
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            SimError::InvalidLength(_)
                | SimError::InvalidLaneCount(_)
                | SimError::InvalidSpawnSpeed(_)
                | SimError::InvalidSpawnChance(_)
                | SimError::InvalidGridSize(_)
        )
    }
}

pub type SimResult<T> = Result<T, SimError>;
