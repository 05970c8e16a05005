use std::collections::HashSet;
use std::time::Duration;

use crossbeam_channel as cbc;
use tokio::time::{sleep, Instant};

use elevatordispatch::config::{self, DispatchConfig};
use elevatordispatch::elevator_logic::Dirn;
use elevatordispatch::elevio::sim::{self, SimRig};
use elevatordispatch::elevio::RigCommand;
use elevatordispatch::manager::task_allocator::Assignment;
use elevatordispatch::Dispatcher;

fn quiet() {
    *config::PRINT_INFO_ON.lock().unwrap() = false;
    *config::PRINT_OK_ON.lock().unwrap() = false;
}

fn simulated_bank(num_elevators: usize) -> (Dispatcher, SimRig) {
    quiet();
    let (tx, rx) = cbc::unbounded();
    let config = DispatchConfig { num_elevators, ..DispatchConfig::default() };
    let dispatcher = Dispatcher::new(config, tx).unwrap();
    let rig = sim::spawn(dispatcher.clone(), rx);
    (dispatcher, rig)
}

/// Waits (in virtual time) until every queue is empty and every worker has parked.
async fn settle(dispatcher: &Dispatcher) {
    let deadline = Instant::now() + Duration::from_secs(600);
    while Instant::now() < deadline {
        let drained = dispatcher.snapshot().iter().all(|s| s.pending.is_empty());
        if drained && dispatcher.active_workers() == 0 {
            return;
        }
        sleep(config::SIM_TICK).await;
    }
    panic!("bank did not drain: {:?}", dispatcher.snapshot());
}

/// Floors where a door cycle started, in order.
fn door_cycles(commands: &[RigCommand]) -> Vec<i32> {
    let mut last_scale = None;
    let mut served = Vec::new();
    for command in commands {
        match *command {
            RigCommand::Scale { floor, .. } => last_scale = Some(floor),
            RigCommand::Door { direction: Dirn::Up, .. } => served.extend(last_scale),
            _ => {}
        }
    }
    served
}

#[tokio::test(start_paused = true)]
async fn single_elevator_serves_both_hall_calls_with_a_door_cycle_each() {
    let (dispatcher, rig) = simulated_bank(1);

    assert_eq!(dispatcher.press_button(5, 1), Ok(Assignment::Assigned(0)));
    assert_eq!(dispatcher.press_button(3, -1), Ok(Assignment::Assigned(0)));
    settle(&dispatcher).await;

    assert_eq!(door_cycles(&rig.commands_for(1)), vec![5, 3]);
    let elevator = dispatcher.elevator(1).unwrap();
    assert_eq!(elevator.cabin().position(), 3.0);
    assert_eq!(elevator.cabin().scale(), 3);
    assert_eq!(elevator.cabin().door_state(), config::DOOR_CLOSED);
}

#[tokio::test]
async fn idle_elevator_beats_one_heading_away() {
    quiet();
    let (tx, _rx) = cbc::unbounded();
    let config = DispatchConfig { num_elevators: 2, ..DispatchConfig::default() };
    let dispatcher = Dispatcher::new(config, tx).unwrap();

    // elevator 2 near the top, heading up to a panel call
    dispatcher.report_position(2, 5.5);
    dispatcher.press_panel(2, 6);

    assert_eq!(dispatcher.press_button(1, 1), Ok(Assignment::Assigned(0)));
    assert_eq!(dispatcher.elevator(1).unwrap().queue().len(), 1);
    assert_eq!(dispatcher.elevator(2).unwrap().queue().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn emergency_stop_halts_and_keeps_requests_until_released() {
    let (dispatcher, rig) = simulated_bank(1);
    let elevator = dispatcher.elevator(1).unwrap().clone();

    dispatcher.press_panel(1, 4);
    dispatcher.press_panel(1, 6);
    sleep(Duration::from_millis(500)).await;
    assert!(elevator.cabin().position() > 0.0);

    let sent_before = rig.commands().len();
    dispatcher.press_panel(1, config::SPECIAL_FOR_STOP);
    assert!(elevator.cabin().is_stopped());
    assert_eq!(elevator.cabin().direction(), Dirn::Stop);
    sleep(config::SIM_TICK * 2).await;
    let stopped_at = elevator.cabin().position();

    sleep(Duration::from_secs(30)).await;
    assert_eq!(elevator.queue().len(), 2);
    assert_eq!(elevator.cabin().position(), stopped_at);
    assert_eq!(elevator.cabin().door_state(), config::DOOR_CLOSED);
    assert!(!dispatcher.is_worker_active(1));

    // halt from the latch, halt from the worker, then one door cycle where it stands
    let halt = RigCommand::Motor { elevator: 1, direction: Dirn::Stop };
    assert_eq!(
        rig.commands()[sent_before..].to_vec(),
        vec![
            halt,
            halt,
            RigCommand::Door { elevator: 1, direction: Dirn::Up },
            RigCommand::Door { elevator: 1, direction: Dirn::Down },
        ]
    );

    // a hall call for the stopped elevator queues but does not move it
    assert_eq!(dispatcher.press_button(5, -1), Ok(Assignment::Assigned(0)));
    sleep(Duration::from_secs(5)).await;
    assert_eq!(elevator.cabin().position(), stopped_at);

    dispatcher.press_panel(1, 2);
    assert!(!elevator.cabin().is_stopped());
    settle(&dispatcher).await;

    let mut served = door_cycles(&rig.commands_for(1));
    served.sort_unstable();
    assert_eq!(served, vec![2, 4, 5, 6]);
}

#[tokio::test(start_paused = true)]
async fn repeated_press_on_the_cabin_floor_is_dropped() {
    let (dispatcher, rig) = simulated_bank(2);

    assert_eq!(dispatcher.press_button(0, 1), Ok(Assignment::Assigned(0)));
    assert_eq!(dispatcher.press_button(0, 1), Ok(Assignment::Duplicate));
    assert_eq!(dispatcher.elevator(1).unwrap().queue().len(), 1);
    assert!(dispatcher.elevator(2).unwrap().queue().is_empty());
    settle(&dispatcher).await;

    assert_eq!(door_cycles(&rig.commands_for(1)), vec![0]);
    assert!(rig.commands_for(2).is_empty());
}

#[tokio::test(start_paused = true)]
async fn panel_calls_are_served_where_they_were_pressed() {
    let (dispatcher, rig) = simulated_bank(3);

    dispatcher.handle_input("p 3 2");
    dispatcher.handle_input("p 1 1");
    settle(&dispatcher).await;

    assert_eq!(door_cycles(&rig.commands_for(3)), vec![2]);
    assert_eq!(door_cycles(&rig.commands_for(1)), vec![1]);
    assert!(rig.commands_for(2).is_empty());
    assert_eq!(dispatcher.elevator(3).unwrap().cabin().position(), 2.0);
}

#[tokio::test(start_paused = true)]
async fn bank_drains_a_burst_of_calls() {
    let (dispatcher, rig) = simulated_bank(3);

    for (floor, dir) in [(6, -1), (2, 1), (4, -1), (1, 1), (5, 1), (3, -1), (0, 1)] {
        dispatcher.press_button(floor, dir).unwrap();
        sleep(Duration::from_millis(700)).await;
    }
    dispatcher.press_panel(2, 6);
    settle(&dispatcher).await;

    let mut served: Vec<i32> = (1..=3).flat_map(|n| door_cycles(&rig.commands_for(n))).collect();
    served.sort_unstable();
    let floors: HashSet<i32> = served.iter().copied().collect();
    assert_eq!(floors, (0..=6).collect::<HashSet<i32>>());
    assert_eq!(dispatcher.active_workers(), 0);
}

#[tokio::test(start_paused = true)]
async fn malformed_lines_leave_the_bank_alone() {
    let (dispatcher, rig) = simulated_bank(2);

    for line in ["b", "b 2", "p x 3", "z 1 1", "b 99 1", "b 2 7", "p 5 1", "position 1"] {
        dispatcher.handle_input(line);
    }
    sleep(Duration::from_secs(1)).await;

    assert!(rig.commands().is_empty());
    assert!(dispatcher.snapshot().iter().all(|s| s.pending.is_empty() && !s.worker_active));
}

#[test]
fn concurrent_presses_never_double_book() {
    quiet();
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let _guard = runtime.enter();
    let (tx, _rx) = cbc::unbounded();
    let config = DispatchConfig { num_elevators: 3, ..DispatchConfig::default() };
    let dispatcher = Dispatcher::new(config, tx).unwrap();

    let calls: Vec<(i32, i32)> = (1..=6).flat_map(|f| [(f, 1), (f, -1)]).collect();
    std::thread::scope(|scope| {
        for offset in 0..8 {
            let dispatcher = dispatcher.clone();
            let calls = &calls;
            scope.spawn(move || {
                for i in 0..calls.len() {
                    let (floor, dir) = calls[(i * 5 + offset) % calls.len()];
                    dispatcher.press_button(floor, dir).unwrap();
                }
            });
        }
    });

    let mut seen = HashSet::new();
    let mut total = 0;
    for snap in dispatcher.snapshot() {
        for key in snap.pending {
            total += 1;
            seen.insert(key);
        }
    }
    assert_eq!(total, seen.len(), "a hall call sits in two queues");
    assert_eq!(total, calls.len());
    assert!(dispatcher.active_workers() <= 3);
}
