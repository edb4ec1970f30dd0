//! Car movement logic for the lane simulation
//!
//! Each tick a car looks at the cells around it, picks one maneuver and
//! then tries to speed back up towards its free-flow speed. Deciding never
//! mutates the road; [`Road`](super::road::Road) applies the result.

use log::trace;
use rand::Rng;

use super::error::{SimError, SimResult};
use super::occupancy::OccupancyIndex;
use super::types::{
    CarId, Cell, LaneShift, BRAKE_COOLDOWN, LOOKAHEAD_DEN, LOOKAHEAD_NUM, MAX_SPEEDUP,
    MERGE_MARGIN, RESTART_SPEED,
};

/// Read-only view of the road used for visibility queries
#[derive(Debug, Clone, Copy)]
pub struct RoadView<'a> {
    occupancy: &'a OccupancyIndex,
    length: i64,
    lanes: i64,
}

impl<'a> RoadView<'a> {
    pub fn new(occupancy: &'a OccupancyIndex, length: i64, lanes: i64) -> Self {
        Self {
            occupancy,
            length,
            lanes,
        }
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.occupancy.contains(cell)
    }

    pub fn length(&self) -> i64 {
        self.length
    }

    pub fn lanes(&self) -> i64 {
        self.lanes
    }

    fn has_lane(&self, lane: i64) -> bool {
        (0..self.lanes).contains(&lane)
    }
}

/// The maneuver a car picked this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Maneuver {
    /// Stationary and boxed in
    Wait,
    /// Stationary car pulling away by one cell, possibly into a side lane
    Restart(LaneShift),
    /// Clear ahead, staying in lane
    Cruise,
    /// Clear ahead and on the right, moving over
    MergeRight,
    /// Blocked ahead, passing on the left
    Overtake,
    /// Blocked everywhere, slowing down
    Brake,
}

/// Outcome of [`Car::decide`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarDecision {
    pub cell: Cell,
    pub speed: u32,
    pub brake_cooldown: u32,
    pub maneuver: Maneuver,
}

/// A car on the road
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Car {
    id: CarId,
    position: i64,
    lane: i64,
    speed: u32,
    max_speed: u32,
    brake_cooldown: u32,
}

impl Car {
    pub(crate) fn new(id: CarId, cell: Cell, speed: u32, max_speed: u32) -> Self {
        debug_assert!(speed <= max_speed);
        Self {
            id,
            position: cell.position,
            lane: cell.lane,
            speed,
            max_speed,
            brake_cooldown: 0,
        }
    }

    pub fn id(&self) -> CarId {
        self.id
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn lane(&self) -> i64 {
        self.lane
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.position, self.lane)
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn max_speed(&self) -> u32 {
        self.max_speed
    }

    pub fn brake_cooldown(&self) -> u32 {
        self.brake_cooldown
    }

    /// Below free-flow speed
    pub fn is_slowed(&self) -> bool {
        self.speed < self.max_speed
    }

    pub(crate) fn move_to(&mut self, cell: Cell) {
        self.position = cell.position;
        self.lane = cell.lane;
    }

    pub(crate) fn set_motion(&mut self, speed: u32, brake_cooldown: u32) {
        debug_assert!(speed <= self.max_speed);
        self.speed = speed;
        self.brake_cooldown = brake_cooldown;
    }

    /// Whether the lane `shift` away is clear at the car's current speed
    pub fn is_free(&self, view: &RoadView, shift: LaneShift) -> bool {
        self.sees_free(view, self.cell(), self.speed, self.speed, shift)
    }

    /// Scan the lookahead window around `from` in the lane `shift` away.
    ///
    /// The window reaches `1.1 * speed` cells ahead (clipped to the road
    /// end). Side lanes are also checked behind, up to
    /// `5 * margin_speed / max_speed` cells, while the own lane is only
    /// checked ahead.
    fn sees_free(
        &self,
        view: &RoadView,
        from: Cell,
        speed: u32,
        margin_speed: u32,
        shift: LaneShift,
    ) -> bool {
        let ahead = (view.length() - from.position - 1)
            .min(i64::from(speed) * LOOKAHEAD_NUM / LOOKAHEAD_DEN);
        let behind = match shift {
            LaneShift::Same => 1,
            _ => -(MERGE_MARGIN * i64::from(margin_speed) / i64::from(self.max_speed)),
        };

        if ahead == 0 && shift == LaneShift::Same {
            return true;
        }

        let lane = from.lane + shift.offset();
        if !view.has_lane(lane) {
            return false;
        }

        (behind..=ahead).all(|distance| !view.is_occupied(Cell::new(from.position + distance, lane)))
    }

    /// Work out where this car goes next tick and how fast
    ///
    /// Fails if the car's cell is not marked occupied, which means the car
    /// is not registered on the road it is looking at.
    pub fn decide<R: Rng + ?Sized>(&self, view: &RoadView, rng: &mut R) -> SimResult<CarDecision> {
        if !view.is_occupied(self.cell()) {
            return Err(SimError::UnregisteredCar(self.id));
        }

        let mut decision = self.plan_motion(view);

        if decision.cell.position < view.length() && decision.speed < self.max_speed {
            self.accelerate(view, &mut decision, rng);
        }

        trace!(
            "{} {:?}: {} -> {}, speed {} -> {}",
            self.id,
            decision.maneuver,
            self.cell(),
            decision.cell,
            self.speed,
            decision.speed
        );

        Ok(decision)
    }

    /// Pick this tick's maneuver, highest priority first
    fn plan_motion(&self, view: &RoadView) -> CarDecision {
        let here = self.cell();
        let outcome = |cell: Cell, speed: u32, brake_cooldown: u32, maneuver: Maneuver| CarDecision {
            cell,
            speed,
            brake_cooldown,
            maneuver,
        };

        if self.speed == 0 {
            // Look one cell ahead for the restart move, but nothing behind
            for shift in [LaneShift::Same, LaneShift::Right, LaneShift::Left] {
                if self.sees_free(view, here, RESTART_SPEED, 0, shift) {
                    return outcome(
                        here.offset(1, shift),
                        0,
                        self.brake_cooldown,
                        Maneuver::Restart(shift),
                    );
                }
            }
            return outcome(here, 0, self.brake_cooldown, Maneuver::Wait);
        }

        let distance = i64::from(self.speed);

        if self.sees_free(view, here, self.speed, self.speed, LaneShift::Same) {
            let ahead = here.offset(distance, LaneShift::Same);
            // Keep right: move over whenever the right lane is clear at the new spot
            if self.sees_free(view, ahead, self.speed, self.speed, LaneShift::Right) {
                return outcome(
                    ahead.offset(0, LaneShift::Right),
                    self.speed,
                    self.brake_cooldown,
                    Maneuver::MergeRight,
                );
            }
            return outcome(ahead, self.speed, self.brake_cooldown, Maneuver::Cruise);
        }

        if self.sees_free(view, here, self.speed, self.speed, LaneShift::Left) {
            return outcome(
                here.offset(distance, LaneShift::Left),
                self.speed,
                self.brake_cooldown,
                Maneuver::Overtake,
            );
        }

        let mut speed = self.speed;
        loop {
            speed -= 1;
            if speed == 0 || self.sees_free(view, here, speed, speed, LaneShift::Same) {
                break;
            }
        }
        outcome(
            here.offset(i64::from(speed), LaneShift::Same),
            speed,
            BRAKE_COOLDOWN,
            Maneuver::Brake,
        )
    }

    /// Speed back up from `decision.cell`, never further than visibility allows
    fn accelerate<R: Rng + ?Sized>(&self, view: &RoadView, decision: &mut CarDecision, rng: &mut R) {
        if decision.brake_cooldown > 0 {
            decision.brake_cooldown -= rng.random_range(0..=decision.brake_cooldown);
        }

        let headroom = self.max_speed - decision.speed;
        let mut speedup = rng.random_range(1..=headroom).min(MAX_SPEEDUP);
        while speedup > 0
            && !self.sees_free(
                view,
                decision.cell,
                decision.speed + speedup,
                decision.speed + speedup,
                LaneShift::Same,
            )
        {
            speedup -= 1;
        }
        decision.speed += speedup;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn occupancy(cells: &[(i64, i64)]) -> OccupancyIndex {
        let mut index = OccupancyIndex::new();
        for &(position, lane) in cells {
            index.insert(Cell::new(position, lane)).unwrap();
        }
        index
    }

    fn car(position: i64, lane: i64, speed: u32, max_speed: u32) -> Car {
        Car::new(CarId(0), Cell::new(position, lane), speed, max_speed)
    }

    #[test]
    fn same_lane_window_reaches_one_point_one_times_speed() {
        let c = car(0, 0, 10, 10);
        let blocked = occupancy(&[(0, 0), (11, 0)]);
        let clear = occupancy(&[(0, 0), (12, 0)]);
        assert!(!c.is_free(&RoadView::new(&blocked, 100, 1), LaneShift::Same));
        assert!(c.is_free(&RoadView::new(&clear, 100, 1), LaneShift::Same));
    }

    #[test]
    fn side_lane_window_looks_behind() {
        let c = car(10, 1, 5, 5);
        let tailgater = occupancy(&[(10, 1), (5, 0)]);
        let far_behind = occupancy(&[(10, 1), (4, 0)]);
        assert!(!c.is_free(&RoadView::new(&tailgater, 100, 2), LaneShift::Right));
        assert!(c.is_free(&RoadView::new(&far_behind, 100, 2), LaneShift::Right));
    }

    #[test]
    fn own_lane_ignores_cars_behind() {
        let c = car(10, 0, 5, 5);
        let index = occupancy(&[(10, 0), (9, 0)]);
        assert!(c.is_free(&RoadView::new(&index, 100, 1), LaneShift::Same));
    }

    #[test]
    fn lanes_off_the_road_are_never_free() {
        let c = car(0, 0, 3, 3);
        let index = occupancy(&[(0, 0)]);
        let view = RoadView::new(&index, 100, 1);
        assert!(!c.is_free(&view, LaneShift::Right));
        assert!(!c.is_free(&view, LaneShift::Left));
    }

    #[test]
    fn last_cell_counts_as_free_ahead() {
        let c = car(49, 0, 5, 5);
        let index = occupancy(&[(49, 0)]);
        assert!(c.is_free(&RoadView::new(&index, 50, 1), LaneShift::Same));
    }

    #[test]
    fn clear_road_merges_right() {
        let c = car(0, 2, 4, 4);
        let index = occupancy(&[(0, 2)]);
        let decision = c.plan_motion(&RoadView::new(&index, 100, 3));
        assert_eq!(decision.maneuver, Maneuver::MergeRight);
        assert_eq!(decision.cell, Cell::new(4, 1));
    }

    #[test]
    fn blocked_right_lane_keeps_lane() {
        let c = car(0, 1, 4, 4);
        let index = occupancy(&[(0, 1), (6, 0)]);
        let decision = c.plan_motion(&RoadView::new(&index, 100, 2));
        assert_eq!(decision.maneuver, Maneuver::Cruise);
        assert_eq!(decision.cell, Cell::new(4, 1));
    }

    #[test]
    fn blocked_ahead_overtakes_on_the_left() {
        let c = car(0, 0, 4, 4);
        let index = occupancy(&[(0, 0), (3, 0)]);
        let decision = c.plan_motion(&RoadView::new(&index, 100, 2));
        assert_eq!(decision.maneuver, Maneuver::Overtake);
        assert_eq!(decision.cell, Cell::new(4, 1));
    }

    #[test]
    fn boxed_in_car_brakes_short_of_the_leader() {
        let c = car(9, 0, 5, 5);
        let index = occupancy(&[(9, 0), (13, 0)]);
        let decision = c.plan_motion(&RoadView::new(&index, 100, 1));
        assert_eq!(decision.maneuver, Maneuver::Brake);
        assert_eq!(decision.brake_cooldown, BRAKE_COOLDOWN);
        assert_eq!(decision.speed, 3);
        assert_eq!(decision.cell, Cell::new(12, 0));
    }

    #[test]
    fn zero_gap_brakes_to_a_stop() {
        let c = car(9, 0, 5, 5);
        let index = occupancy(&[(9, 0), (10, 0)]);
        let decision = c.plan_motion(&RoadView::new(&index, 100, 1));
        assert_eq!(decision.maneuver, Maneuver::Brake);
        assert_eq!(decision.speed, 0);
        assert_eq!(decision.cell, Cell::new(9, 0));
    }

    #[test]
    fn stationary_car_never_restarts_into_a_car() {
        let c = car(9, 0, 0, 5);
        let index = occupancy(&[(9, 0), (10, 0)]);
        let decision = c.plan_motion(&RoadView::new(&index, 100, 1));
        assert_eq!(decision.maneuver, Maneuver::Wait);
        assert_eq!(decision.cell, Cell::new(9, 0));

        let index = occupancy(&[(9, 1), (10, 1)]);
        let c = car(9, 1, 0, 5);
        let decision = c.plan_motion(&RoadView::new(&index, 100, 2));
        assert_eq!(decision.maneuver, Maneuver::Restart(LaneShift::Right));
        assert_eq!(decision.cell, Cell::new(10, 0));
    }

    #[test]
    fn stationary_car_ignores_traffic_behind_when_pulling_out() {
        let c = car(9, 0, 0, 5);
        let index = occupancy(&[(9, 0), (10, 0), (8, 1)]);
        let decision = c.plan_motion(&RoadView::new(&index, 100, 2));
        assert_eq!(decision.maneuver, Maneuver::Restart(LaneShift::Left));
        assert_eq!(decision.cell, Cell::new(10, 1));

        let index = occupancy(&[(9, 0), (10, 0), (10, 1)]);
        let decision = c.plan_motion(&RoadView::new(&index, 100, 2));
        assert_eq!(decision.maneuver, Maneuver::Wait);
    }

    #[test]
    fn acceleration_stays_within_max_speed_and_visibility() {
        let mut rng = StdRng::seed_from_u64(7);
        let c = car(0, 0, 1, 8);
        let index = occupancy(&[(0, 0), (6, 0)]);
        let view = RoadView::new(&index, 100, 1);
        for _ in 0..50 {
            let decision = c.decide(&view, &mut rng).unwrap();
            assert!(decision.speed <= 8);
            // from cell 1 the window for speed s reaches 1 + 1.1 * s, cell 6 is ahead
            assert!(decision.cell.position + i64::from(decision.speed) * 11 / 10 < 6);
        }
    }

    #[test]
    fn brake_cooldown_only_decays() {
        let mut rng = StdRng::seed_from_u64(11);
        let c = car(9, 0, 5, 5);
        let index = occupancy(&[(9, 0), (10, 0)]);
        let view = RoadView::new(&index, 100, 1);
        for _ in 0..20 {
            let decision = c.decide(&view, &mut rng).unwrap();
            assert!(decision.brake_cooldown <= BRAKE_COOLDOWN);
            assert!(decision.speed < 5);
        }
    }

    #[test]
    fn unregistered_car_cannot_decide() {
        let mut rng = StdRng::seed_from_u64(1);
        let c = car(3, 0, 2, 2);
        let index = OccupancyIndex::new();
        let err = c.decide(&RoadView::new(&index, 10, 1), &mut rng).unwrap_err();
        assert!(matches!(err, SimError::UnregisteredCar(CarId(0))));
    }
}
