use crate::error::InvariantViolation;
use crate::sim::{SimTime, Simulator, World};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Ev {
    Push(u32),
    PushThenScheduleNow { id: u32, next_id: u32 },
    PushThenScheduleLater { id: u32, next_id: u32, dt: f64 },
}

#[derive(Default)]
struct LogWorld {
    log: Vec<(f64, u32)>,
    ticks: usize,
}

impl World<Ev> for LogWorld {
    fn dispatch(&mut self, ev: Ev, sim: &mut Simulator<Ev>) -> Result<(), InvariantViolation> {
        let now = sim.now().as_f64();
        match ev {
            Ev::Push(id) => self.log.push((now, id)),
            Ev::PushThenScheduleNow { id, next_id } => {
                self.log.push((now, id));
                sim.schedule(sim.now(), Ev::Push(next_id));
            }
            Ev::PushThenScheduleLater { id, next_id, dt } => {
                self.log.push((now, id));
                sim.schedule(sim.now().after(dt), Ev::Push(next_id));
            }
        }
        Ok(())
    }

    fn on_tick(&mut self, _sim: &mut Simulator<Ev>) -> Result<(), InvariantViolation> {
        self.ticks += 1;
        Ok(())
    }
}

fn ids(world: &LogWorld) -> Vec<u32> {
    world.log.iter().map(|&(_, id)| id).collect()
}

#[test]
fn scheduled_events_order_by_time_then_seq() {
    let mut sim = Simulator::default();
    sim.schedule(SimTime(10.0), Ev::Push(1));
    sim.schedule(SimTime(5.0), Ev::Push(2));
    sim.schedule(SimTime(5.0), Ev::Push(3));
    sim.schedule(SimTime(7.5), Ev::Push(4));

    let mut world = LogWorld::default();
    let n = sim.run(&mut world).expect("run");

    assert_eq!(n, 4);
    assert_eq!(ids(&world), vec![2, 3, 4, 1]);
    assert_eq!(world.ticks, 4);
    assert_eq!(sim.now(), SimTime(10.0));
}

#[test]
fn same_time_events_run_in_insertion_order_even_when_scheduled_during_dispatch() {
    let mut sim = Simulator::default();
    sim.schedule(SimTime(1.0), Ev::PushThenScheduleNow { id: 1, next_id: 3 });
    sim.schedule(SimTime(1.0), Ev::Push(2));

    let mut world = LogWorld::default();
    sim.run(&mut world).expect("run");

    assert_eq!(ids(&world), vec![1, 2, 3]);
    assert!(world.log.iter().all(|&(t, _)| t == 1.0));
}

#[test]
fn run_until_stops_at_horizon_and_leaves_later_events_queued() {
    let mut sim = Simulator::default();
    sim.schedule(SimTime(1.0), Ev::Push(1));
    sim.schedule(SimTime(2.0), Ev::PushThenScheduleLater { id: 2, next_id: 4, dt: 5.0 });
    sim.schedule(SimTime(3.0), Ev::Push(3));
    sim.schedule(SimTime(9.0), Ev::Push(5));

    let mut world = LogWorld::default();
    let n = sim.run_until(SimTime(3.0), &mut world).expect("run_until");

    // 恰好在上限时刻的事件也会执行
    assert_eq!(n, 3);
    assert_eq!(ids(&world), vec![1, 2, 3]);
    assert_eq!(sim.now(), SimTime(3.0));
    assert_eq!(sim.pending(), 2);
    assert_eq!(sim.peek_time(), Some(SimTime(7.0)));

    sim.run_until(SimTime(100.0), &mut world).expect("run_until");
    assert_eq!(ids(&world), vec![1, 2, 3, 4, 5]);
    assert_eq!(sim.now(), SimTime(100.0));
    assert!(sim.is_empty());
}

#[test]
fn run_until_with_empty_queue_advances_clock() {
    let mut sim: Simulator<Ev> = Simulator::default();
    let mut world = LogWorld::default();
    assert_eq!(sim.run_until(SimTime(4.0), &mut world).expect("run_until"), 0);
    assert_eq!(sim.now(), SimTime(4.0));
}

#[test]
fn pop_next_rejects_events_in_the_past() {
    let mut sim = Simulator::default();
    sim.schedule(SimTime(5.0), Ev::Push(1));
    let first = sim.pop_next().expect("pop").expect("event");
    assert_eq!(first.at(), SimTime(5.0));
    assert_eq!(first.seq(), 0);
    assert_eq!(*first.event(), Ev::Push(1));

    sim.schedule(SimTime(4.0), Ev::Push(2));
    let err = sim.pop_next().expect_err("out of order");
    assert_eq!(err, InvariantViolation::OutOfOrderEvent { at: 4.0, now: 5.0 });
}

#[test]
fn pop_next_on_empty_queue_is_none() {
    let mut sim: Simulator<Ev> = Simulator::default();
    assert!(sim.pop_next().expect("pop").is_none());
    assert_eq!(sim.peek_time(), None);
}
