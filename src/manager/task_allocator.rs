//! ## Task allocator
//!
//! Picks the elevator that should take a new hall call. Greedy and point-in-time:
//! every elevator is scored once from its live position and current target, and
//! the decision is never revisited.
//!
//! Elevators are sorted into three buckets:
//! - **same direction**: its current target wants the same direction as the call, score is the plain distance
//! - **idle**: no current target, score is the plain distance
//! - **detour**: anything else, score is the distance to the far end of its queue plus the way back to the call
//!
//! Resolution order: same direction and not yet past the call floor, then idle, then
//! same direction if it beats the best detour, then detour, then any same direction,
//! then a random running elevator.

use std::sync::Arc;

use rand::seq::IndexedRandom;

use crate::config;
use crate::elevator_logic::floor::offset_along;
use crate::elevator_logic::request::CallKey;
use crate::elevator_logic::{Dirn, Elevator};

/// Result of [`choose_elevator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// Register on the elevator at this index
    Assigned(usize),
    /// An equivalent request is already queued somewhere in the bank
    Duplicate,
    /// Every elevator is stopped
    NoneAvailable,
}

/// Best-in-bucket tracker: index and score of the cheapest elevator seen so far
#[derive(Debug, Clone, Copy, Default)]
struct Best(Option<(usize, f64)>);

impl Best {
    fn offer(&mut self, idx: usize, score: f64) {
        match self.0 {
            Some((_, best)) if best <= score => {}
            _ => self.0 = Some((idx, score)),
        }
    }

    fn idx(self) -> Option<usize> {
        self.0.map(|(idx, _)| idx)
    }

    fn score(self) -> Option<f64> {
        self.0.map(|(_, score)| score)
    }
}

/// Chooses the elevator for a hall call `key`.
pub fn choose_elevator(elevators: &[Arc<Elevator>], key: CallKey) -> Assignment {
    if elevators.iter().any(|e| e.queue().contains_equivalent(&key)) {
        return Assignment::Duplicate;
    }

    let call = key.floor as f64;
    let mut same_ahead = Best::default();
    let mut same_any = Best::default();
    let mut idle = Best::default();
    let mut detour = Best::default();
    let mut running = Vec::with_capacity(elevators.len());

    for (idx, elevator) in elevators.iter().enumerate() {
        if elevator.cabin().is_stopped() {
            continue;
        }
        running.push(idx);

        let position = elevator.cabin().position();
        let distance = (call - position).abs();

        match elevator.queue().current_target() {
            None => {
                if distance < config::IDLE_PICK_RADIUS {
                    return Assignment::Assigned(idx);
                }
                idle.offer(idx, distance);
            }
            Some(target) if target.direction() == key.direction => {
                same_any.offer(idx, distance);
                let heading = elevator.travel_direction();
                if offset_along(key.floor, position, heading) > -config::FLOOR_TOLERANCE_LOW {
                    same_ahead.offer(idx, distance);
                }
            }
            Some(_) => {
                let far_end = match elevator.travel_direction() {
                    Dirn::Up => elevator.queue().top_floor() as f64,
                    Dirn::Down => elevator.queue().bottom_floor() as f64,
                    Dirn::Stop => position,
                };
                detour.offer(idx, (position - far_end).abs() + (far_end - call).abs());
            }
        }
    }

    let beats_detour = match (same_any.score(), detour.score()) {
        (Some(same), Some(around)) => same < around,
        _ => false,
    };

    let pick = same_ahead
        .idx()
        .or(idle.idx())
        .or(if beats_detour { same_any.idx() } else { None })
        .or(detour.idx())
        .or(same_any.idx())
        .or_else(|| running.choose(&mut rand::rng()).copied());

    match pick {
        Some(idx) => Assignment::Assigned(idx),
        None => Assignment::NoneAvailable,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevator_logic::request::Request;
    use crossbeam_channel as cbc;

    fn bank(positions: &[f64]) -> Vec<Arc<Elevator>> {
        positions
            .iter()
            .enumerate()
            .map(|(i, &pos)| {
                let elevator = Arc::new(Elevator::new(i + 1, 6));
                elevator.report_position(pos);
                elevator
            })
            .collect()
    }

    fn hall(floor: i32, direction: Dirn) -> CallKey {
        CallKey { floor, direction, panel: false }
    }

    #[test]
    fn idle_elevator_on_the_floor_is_picked_immediately() {
        let elevators = bank(&[0.0, 3.2, 6.0]);
        assert_eq!(choose_elevator(&elevators, hall(3, Dirn::Up)), Assignment::Assigned(1));
    }

    #[test]
    fn closest_idle_elevator_wins() {
        let elevators = bank(&[0.0, 6.0]);
        assert_eq!(choose_elevator(&elevators, hall(4, Dirn::Down)), Assignment::Assigned(1));
        assert_eq!(choose_elevator(&elevators, hall(1, Dirn::Up)), Assignment::Assigned(0));
    }

    #[test]
    fn same_direction_before_the_call_beats_idle() {
        let (tx, _rx) = cbc::unbounded();
        let elevators = bank(&[1.0, 5.0]);
        elevators[0].register(Request::hall(5, Dirn::Up));
        elevators[0].drive(&tx, Dirn::Up);
        assert_eq!(choose_elevator(&elevators, hall(4, Dirn::Up)), Assignment::Assigned(0));
    }

    #[test]
    fn elevator_past_the_call_is_down_ranked() {
        let (tx, _rx) = cbc::unbounded();
        let elevators = bank(&[4.5, 0.0]);
        elevators[0].register(Request::hall(6, Dirn::Up));
        elevators[0].drive(&tx, Dirn::Up);
        assert_eq!(choose_elevator(&elevators, hall(2, Dirn::Up)), Assignment::Assigned(1));
    }

    #[test]
    fn duplicate_anywhere_in_the_bank_aborts() {
        let elevators = bank(&[0.0, 6.0]);
        elevators[1].register(Request::hall(2, Dirn::Up));
        assert_eq!(choose_elevator(&elevators, hall(2, Dirn::Up)), Assignment::Duplicate);
    }

    #[test]
    fn stopped_elevators_are_skipped() {
        let (tx, _rx) = cbc::unbounded();
        let elevators = bank(&[3.0, 6.0]);
        elevators[0].emergency_stop(&tx);
        assert_eq!(choose_elevator(&elevators, hall(3, Dirn::Up)), Assignment::Assigned(1));

        elevators[1].emergency_stop(&tx);
        assert_eq!(choose_elevator(&elevators, hall(3, Dirn::Up)), Assignment::NoneAvailable);
    }

    #[test]
    fn shorter_detour_wins_over_longer_one() {
        let (tx, _rx) = cbc::unbounded();
        // both busy going up with down-wanted targets above them
        let elevators = bank(&[1.0, 2.0]);
        elevators[0].register(Request::hall(6, Dirn::Down));
        elevators[0].drive(&tx, Dirn::Up);
        elevators[1].register(Request::hall(3, Dirn::Down));
        elevators[1].drive(&tx, Dirn::Up);

        // cost 1: |1-6| + |6-2| = 9, cost 2: |2-3| + |3-2| = 2
        assert_eq!(choose_elevator(&elevators, hall(2, Dirn::Up)), Assignment::Assigned(1));
    }

    #[test]
    fn same_direction_behind_beats_a_longer_detour() {
        let (tx, _rx) = cbc::unbounded();
        let elevators = bank(&[3.0, 0.0]);
        // elevator 1 wants up but is already above the call
        elevators[0].register(Request::hall(5, Dirn::Up));
        elevators[0].drive(&tx, Dirn::Up);
        // elevator 2 heads up to a down call at the top
        elevators[1].register(Request::hall(6, Dirn::Down));
        elevators[1].drive(&tx, Dirn::Up);

        // same-direction distance 1 against detour |0-6| + |6-2| = 10
        assert_eq!(choose_elevator(&elevators, hall(2, Dirn::Up)), Assignment::Assigned(0));
    }
}
