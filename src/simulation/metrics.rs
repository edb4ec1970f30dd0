//! On-demand road metrics and per-tick observation hooks
//!
//! Metrics are computed from the active cars whenever they are asked for;
//! the road keeps no aggregate state of its own. Anything that wants a time
//! series (charts, tabular export) hooks in through [`TickObserver`].

use super::car::Car;
use super::road::Road;
use super::types::CarId;

/// A quantity that can be read off the road at any time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Number of cars on the road
    ActiveCars,
    /// Mean speed over all cars, in cells per tick (0 on an empty road)
    AverageSpeed,
    /// Number of cars in the given lane
    CarsInLane(i64),
    /// Mean speed of the cars in the given lane (0 if the lane is empty)
    AverageLaneSpeed(i64),
}

impl Metric {
    pub fn evaluate<'a>(self, cars: impl IntoIterator<Item = &'a Car>) -> f64 {
        let cars = cars.into_iter();
        match self {
            Metric::ActiveCars => cars.count() as f64,
            Metric::AverageSpeed => mean_speed(cars),
            Metric::CarsInLane(lane) => cars.filter(|car| car.lane() == lane).count() as f64,
            Metric::AverageLaneSpeed(lane) => mean_speed(cars.filter(|car| car.lane() == lane)),
        }
    }
}

fn mean_speed<'a>(cars: impl Iterator<Item = &'a Car>) -> f64 {
    let (count, total) = cars.fold((0usize, 0u64), |(count, total), car| {
        (count + 1, total + u64::from(car.speed()))
    });
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    /// Update order the cars moved in, freshly shuffled each tick
    pub order: Vec<CarId>,
    /// Cars that made a decision and are still on the road
    pub updated: usize,
    /// Cars that drove off the end of the road
    pub exited: Vec<CarId>,
    /// Cars admitted at the start of the road
    pub spawned: Vec<CarId>,
}

impl TickReport {
    pub fn new(tick: u64) -> Self {
        Self {
            tick,
            ..Self::default()
        }
    }
}

/// Callbacks invoked by [`Road::tick_with`]
///
/// Both hooks default to doing nothing.
pub trait TickObserver {
    /// Called before any car moves, with the road as it stands
    fn on_tick_start(&mut self, _tick: u64, _road: &Road) {}

    /// Called after cars moved and the spawner ran
    fn on_tick_end(&mut self, _report: &TickReport, _road: &Road) {}
}

/// A [`TickObserver`] that does nothing
pub struct NoopObserver;

impl TickObserver for NoopObserver {}

/// One sample of road metrics
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRow {
    pub tick: u64,
    pub active_cars: usize,
    pub average_speed: f64,
    pub cars_per_lane: Vec<usize>,
    pub lane_speeds: Vec<f64>,
}

impl MetricsRow {
    pub fn sample(tick: u64, road: &Road) -> Self {
        let lanes = 0..road.lanes();
        Self {
            tick,
            active_cars: road.car_count(),
            average_speed: road.metric(Metric::AverageSpeed),
            cars_per_lane: lanes
                .clone()
                .map(|lane| road.metric(Metric::CarsInLane(lane)) as usize)
                .collect(),
            lane_speeds: lanes
                .map(|lane| road.metric(Metric::AverageLaneSpeed(lane)))
                .collect(),
        }
    }
}

/// Records a [`MetricsRow`] at the start of every tick
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder {
    rows: Vec<MetricsRow>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[MetricsRow] {
        &self.rows
    }

    pub fn latest(&self) -> Option<&MetricsRow> {
        self.rows.last()
    }

    /// Mean of the recorded average speeds, skipping ticks with no cars
    pub fn mean_average_speed(&self) -> f64 {
        let occupied: Vec<f64> = self
            .rows
            .iter()
            .filter(|row| row.active_cars > 0)
            .map(|row| row.average_speed)
            .collect();
        if occupied.is_empty() {
            0.0
        } else {
            occupied.iter().sum::<f64>() / occupied.len() as f64
        }
    }
}

impl TickObserver for MetricsRecorder {
    fn on_tick_start(&mut self, tick: u64, road: &Road) {
        self.rows.push(MetricsRow::sample(tick, road));
    }
}
