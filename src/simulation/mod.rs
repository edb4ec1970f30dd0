//! Cell-based multi-lane traffic simulation
//!
//! A road is a grid of cells, one car per cell. Each tick every car looks
//! ahead (and, before changing lanes, behind) to choose how far to move and
//! which lane to end up in, then the spawner admits new cars at the start
//! of the road.

mod car;
mod clock;
mod config;
mod error;
mod metrics;
mod occupancy;
mod road;
mod spawner;
mod types;

pub use car::{Car, CarDecision, Maneuver, RoadView};
pub use clock::SimulationClock;
pub use config::{
    RoadConfig, DEFAULT_GRID_SIZE_M, DEFAULT_LANES, DEFAULT_LENGTH_KM, DEFAULT_SPAWN_CHANCE,
    DEFAULT_SPEED_KMH,
};
pub use error::{SimError, SimResult};
pub use metrics::{Metric, MetricsRecorder, MetricsRow, NoopObserver, TickObserver, TickReport};
pub use occupancy::OccupancyIndex;
pub use road::{Relocation, Road};
pub use spawner::Spawner;
pub use types::{
    CarId, Cell, LaneShift, BRAKE_COOLDOWN, LOOKAHEAD_DEN, LOOKAHEAD_NUM, MAX_SPEEDUP,
    MERGE_MARGIN, RESTART_SPEED,
};
