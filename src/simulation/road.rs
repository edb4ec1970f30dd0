//! The road: owner of all cars and of the occupancy index
//!
//! Cars only ever read the road. Every change of occupancy goes through
//! [`Road::relocate`], [`Road::add_car`] or [`Road::place_car`], which keeps
//! the index equal to the set of active car cells.

use log::debug;
use std::collections::BTreeMap;

use super::car::{Car, RoadView};
use super::clock::SimulationClock;
use super::config::RoadConfig;
use super::error::{SimError, SimResult};
use super::metrics::{Metric, NoopObserver, TickObserver, TickReport};
use super::occupancy::OccupancyIndex;
use super::spawner::Spawner;
use super::types::{CarId, Cell};

/// Result of moving a car
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relocation {
    /// The car is on its new cell
    Moved,
    /// The car reached the end of the road and was removed
    Exited,
}

/// A multi-lane road segment and the cars on it
#[derive(Debug, Clone)]
pub struct Road {
    length: i64,
    lanes: i64,
    occupancy: OccupancyIndex,
    /// Active cars keyed by id, so iteration follows insertion order
    cars: BTreeMap<CarId, Car>,
    next_id: u64,
    spawner: Spawner,
    clock: SimulationClock,
    total_spawned: u64,
    total_exited: u64,
}

impl Road {
    /// Create a road seeded from OS entropy
    pub fn new(length: i64, lanes: i64, spawn_speed: u32, spawn_chance: f64) -> SimResult<Self> {
        Self::with_clock(
            RoadConfig::new(length, lanes, spawn_speed, spawn_chance),
            SimulationClock::new(),
        )
    }

    /// Create a road whose runs are reproducible from `seed`
    pub fn new_with_seed(
        length: i64,
        lanes: i64,
        spawn_speed: u32,
        spawn_chance: f64,
        seed: u64,
    ) -> SimResult<Self> {
        Self::with_clock(
            RoadConfig::new(length, lanes, spawn_speed, spawn_chance),
            SimulationClock::new_with_seed(seed),
        )
    }

    pub fn from_config(config: RoadConfig, seed: Option<u64>) -> SimResult<Self> {
        let clock = match seed {
            Some(seed) => SimulationClock::new_with_seed(seed),
            None => SimulationClock::new(),
        };
        Self::with_clock(config, clock)
    }

    fn with_clock(config: RoadConfig, clock: SimulationClock) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            length: config.length,
            lanes: config.lanes,
            occupancy: OccupancyIndex::new(),
            cars: BTreeMap::new(),
            next_id: 0,
            spawner: Spawner::new(config.spawn_speed, config.spawn_chance),
            clock,
            total_spawned: 0,
            total_exited: 0,
        })
    }

    pub fn length(&self) -> i64 {
        self.length
    }

    pub fn lanes(&self) -> i64 {
        self.lanes
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    /// Number of completed ticks
    pub fn tick_count(&self) -> u64 {
        self.clock.tick()
    }

    /// Cars put on the road so far, by the spawner or directly
    pub fn total_spawned(&self) -> u64 {
        self.total_spawned
    }

    pub fn total_exited(&self) -> u64 {
        self.total_exited
    }

    pub fn occupancy(&self) -> &OccupancyIndex {
        &self.occupancy
    }

    pub fn view(&self) -> RoadView<'_> {
        RoadView::new(&self.occupancy, self.length, self.lanes)
    }

    pub(crate) fn clock_mut(&mut self) -> &mut SimulationClock {
        &mut self.clock
    }

    /// Active cars in insertion order
    pub fn cars(&self) -> impl Iterator<Item = &Car> {
        self.cars.values()
    }

    /// Snapshot of the active cars in insertion order
    pub fn active_cars(&self) -> Vec<Car> {
        self.cars.values().cloned().collect()
    }

    pub fn car(&self, id: CarId) -> Option<&Car> {
        self.cars.get(&id)
    }

    pub fn car_count(&self) -> usize {
        self.cars.len()
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        metric.evaluate(self.cars.values())
    }

    /// Occupancy holds exactly the cells of the active cars
    pub fn is_consistent(&self) -> bool {
        self.occupancy.len() == self.cars.len()
            && self.cars.values().all(|car| self.occupancy.contains(car.cell()))
    }

    fn check_lane(&self, lane: i64) -> SimResult<()> {
        if !(0..self.lanes).contains(&lane) {
            return Err(SimError::LaneOutOfRange {
                lane,
                lanes: self.lanes,
            });
        }
        Ok(())
    }

    fn check_position(&self, position: i64) -> SimResult<()> {
        if !(0..self.length).contains(&position) {
            return Err(SimError::PositionOutOfRange {
                position,
                length: self.length,
            });
        }
        Ok(())
    }

    fn next_car_id(&mut self) -> CarId {
        let id = CarId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a car at the start of `lane`, travelling at the spawn speed
    ///
    /// The entry cell must be free; callers check before adding.
    pub fn add_car(&mut self, lane: i64) -> SimResult<CarId> {
        let speed = self.spawner.spawn_speed();
        self.place_car(Cell::new(0, lane), speed)
    }

    /// Put a car on an arbitrary free cell with the given current speed
    ///
    /// The car's free-flow speed is the road's spawn speed; `speed` is
    /// clamped to it.
    pub fn place_car(&mut self, cell: Cell, speed: u32) -> SimResult<CarId> {
        self.check_lane(cell.lane)?;
        self.check_position(cell.position)?;
        self.occupancy.insert(cell)?;

        let id = self.next_car_id();
        let max_speed = self.spawner.spawn_speed();
        self.cars
            .insert(id, Car::new(id, cell, speed.min(max_speed), max_speed));
        self.total_spawned += 1;
        Ok(id)
    }

    /// Put a car at the entry of each of the first `count` lanes
    ///
    /// Lanes whose entry cell is taken are skipped.
    pub fn seed_cars(&mut self, count: usize) -> SimResult<Vec<CarId>> {
        let mut seeded = Vec::new();
        for lane in (0..self.lanes).take(count) {
            if self.occupancy.contains(Cell::new(0, lane)) {
                continue;
            }
            seeded.push(self.add_car(lane)?);
        }
        Ok(seeded)
    }

    /// Move a car to `cell`, removing it if `cell` is past the end of the road
    ///
    /// This is the only way a car leaves the road.
    pub fn relocate(&mut self, id: CarId, cell: Cell) -> SimResult<Relocation> {
        let from = self
            .cars
            .get(&id)
            .map(Car::cell)
            .ok_or(SimError::UnregisteredCar(id))?;

        self.occupancy.remove(from)?;

        if cell.position >= self.length {
            self.cars.remove(&id);
            self.total_exited += 1;
            return Ok(Relocation::Exited);
        }

        if let Err(err) = self
            .check_lane(cell.lane)
            .and_then(|()| self.check_position(cell.position))
            .and_then(|()| self.occupancy.insert(cell))
        {
            self.occupancy.insert(from)?;
            return Err(err);
        }

        if let Some(car) = self.cars.get_mut(&id) {
            car.move_to(cell);
        }
        Ok(Relocation::Moved)
    }

    /// Advance the simulation by one tick
    pub fn tick(&mut self) -> SimResult<TickReport> {
        self.tick_with(&mut NoopObserver)
    }

    /// Advance one tick, reporting to `observer`
    ///
    /// Cars move one at a time in a freshly shuffled order, and each move is
    /// visible to every car that moves after it. The spawner runs last.
    pub fn tick_with<O: TickObserver>(&mut self, observer: &mut O) -> SimResult<TickReport> {
        let tick = self.clock.tick();
        observer.on_tick_start(tick, self);

        let mut report = TickReport::new(tick);
        let order = self.clock.shuffled(self.cars.keys().copied());
        report.order = order.clone();

        for id in order {
            let car = self.cars.get(&id).ok_or(SimError::UnregisteredCar(id))?;
            let view = RoadView::new(&self.occupancy, self.length, self.lanes);
            let decision = car.decide(&view, self.clock.rng_mut())?;

            match self.relocate(id, decision.cell)? {
                Relocation::Moved => {
                    if let Some(car) = self.cars.get_mut(&id) {
                        car.set_motion(decision.speed, decision.brake_cooldown);
                    }
                    report.updated += 1;
                }
                Relocation::Exited => {
                    debug!("{} left the road at tick {}", id, tick);
                    report.exited.push(id);
                }
            }
        }

        let spawner = self.spawner;
        report.spawned = spawner.run(self)?;

        self.clock.advance();
        observer.on_tick_end(&report, self);
        Ok(report)
    }

    /// Run `ticks` ticks, reporting each to `observer`
    pub fn run<O: TickObserver>(&mut self, ticks: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..ticks {
            self.tick_with(observer)?;
        }
        Ok(())
    }

    /// Print a summary of the road state
    pub fn print_summary(&self) {
        println!("=== Road Summary ===");
        println!("Tick: {}", self.tick_count());
        println!("Length: {} cells, Lanes: {}", self.length, self.lanes);
        println!(
            "Cars: {} active, {} spawned, {} exited",
            self.car_count(),
            self.total_spawned,
            self.total_exited
        );
        println!(
            "Average speed: {:.2} cells/tick",
            self.metric(Metric::AverageSpeed)
        );
        for lane in (0..self.lanes).rev() {
            println!(
                "  Lane {}: cars={}, avg speed={:.2}",
                lane,
                self.metric(Metric::CarsInLane(lane)),
                self.metric(Metric::AverageLaneSpeed(lane))
            );
        }
    }

    /// Render the road squeezed into `width` columns, leftmost lane on top
    ///
    /// Each column covers a stretch of road and shows how many cars are in
    /// it: `.` for none, a digit up to 9, `#` for more.
    pub fn render_map(&self, width: usize) -> String {
        let width = width.max(1);
        let bucket = (self.length as usize).div_ceil(width).max(1);
        let columns = (self.length as usize).div_ceil(bucket);

        let mut counts = vec![vec![0usize; columns]; self.lanes as usize];
        for car in self.cars.values() {
            counts[car.lane() as usize][car.position() as usize / bucket] += 1;
        }

        let mut map = String::new();
        for lane in (0..self.lanes as usize).rev() {
            let line: String = counts[lane]
                .iter()
                .map(|&count| match count {
                    0 => '.',
                    1..=9 => char::from_digit(count as u32, 10).unwrap_or('#'),
                    _ => '#',
                })
                .collect();
            map.push_str(&line);
            map.push('\n');
        }
        map
    }

    /// Draw the road in the terminal
    pub fn draw_map(&self, width: usize) {
        println!("\n=== Road Map ===");
        println!("Legend: .=empty, 1-9=cars in stretch, #=10 or more, top=leftmost lane");
        println!();
        print!("{}", self.render_map(width));
        println!();
    }
}
