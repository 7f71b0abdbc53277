use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{ConfigError, InvariantViolation};
use crate::net::{
    ArrivalRecord, ClientType, DepartureRecord, DropReason, DropRecord, Event, EventKind,
    EventLog, Network, Outcome, OutcomeKind, Route, RoutingPolicy, StationId, StatisticsSink,
};
use crate::queue::{ArrivalProcess, Capacity, ServerCount, ServiceDistribution, StationConfig};
use crate::sim::{SimTime, Simulator, World};

fn constant(name: &str, capacity: Option<usize>, rate: f64) -> StationConfig {
    StationConfig {
        capacity: Capacity::from(capacity),
        servers: ServerCount::Finite(1),
        service_rates: vec![rate],
        distribution: ServiceDistribution::Constant,
        ..StationConfig::new(name)
    }
}

fn logged(seed: u64) -> Network {
    let mut net = Network::new(seed);
    net.log = Some(EventLog::default());
    net
}

#[test]
fn overflow_forwards_rejected_client_after_delay() {
    let mut sim = Simulator::default();
    let mut net = logged(1);
    let a = net.add_station(constant("A", Some(1), 0.1)).expect("A");
    let b = net.add_station(constant("B", None, 1.0)).expect("B");
    net.add_route(a, OutcomeKind::Overflow, None, b, 0.2).expect("route");

    sim.schedule(SimTime(0.0), Event::arrival(a, ClientType::A));
    sim.schedule(SimTime(0.05), Event::arrival(a, ClientType::A));
    sim.run_until(SimTime(0.1), &mut net).expect("run");

    let item = sim.pop_next().expect("in order").expect("forwarded arrival");
    assert!((item.at().as_f64() - 0.25).abs() < 1e-12);
    let ev = item.into_event();
    assert_eq!(ev.station, b);
    match ev.kind {
        EventKind::Arrival {
            client_type,
            client: Some(c),
        } => {
            assert_eq!(client_type, ClientType::A);
            assert_eq!(c.client_type, ClientType::A);
            assert_eq!(c.arrival_history.len(), 2);
            assert_eq!(c.arrival_history[1], SimTime(0.05));
        }
        other => panic!("expected a forwarded arrival, got {other:?}"),
    }

    let a_stats = net.station(a).expect("A").stats();
    assert_eq!(a_stats.forwarded.a, 1);
    assert_eq!(a_stats.lost.total(), 0);
    assert_eq!(net.stats.transfers, 1);

    let log = net.log.as_ref().expect("log");
    let drops: Vec<&DropRecord> = log.drops().collect();
    assert_eq!(drops.len(), 1);
    assert_eq!(
        drops[0].reason,
        DropReason::Overflow {
            target: b,
            delay: 0.2
        }
    );
}

#[test]
fn type_b_continues_to_downstream_station() {
    let mut sim = Simulator::default();
    let mut net = logged(1);
    let micro = net.add_station(constant("micro", Some(4), 1.0)).expect("micro");
    let cloud = net.add_station(constant("cloud", None, 1.0)).expect("cloud");
    net.add_route(micro, OutcomeKind::Departure, Some(ClientType::B), cloud, 0.5)
        .expect("route");

    sim.schedule(SimTime(0.0), Event::arrival(micro, ClientType::B));
    sim.schedule(SimTime(0.0), Event::arrival(micro, ClientType::A));
    sim.run(&mut net).expect("run");

    let log = net.log.as_ref().expect("log");
    let deps: Vec<(f64, StationId, ClientType)> = log
        .departures()
        .map(|d| (d.time, d.station, d.client_type))
        .collect();
    assert_eq!(
        deps,
        vec![
            (1.0, micro, ClientType::B),
            (2.0, micro, ClientType::A),
            (2.5, cloud, ClientType::B),
        ]
    );
    // 云端时延从进入云端算起
    let cloud_dep = log.departures().last().expect("cloud departure");
    assert!((cloud_dep.queue_delay - 1.0).abs() < 1e-12);

    assert_eq!(net.stats.created, 2);
    assert_eq!(net.stats.completed, 2);
    assert_eq!(net.stats.transfers, 1);
    // A: 2.0，B: 2.5
    assert!((net.stats.end_to_end_delay_sum - 4.5).abs() < 1e-12);
    assert_eq!(net.station(cloud).expect("cloud").stats().arrivals.b, 1);
}

#[test]
fn losses_are_counted_per_client_type() {
    let mut sim = Simulator::default();
    let mut net = logged(1);
    let s = net.add_station(constant("s", Some(1), 0.1)).expect("s");

    sim.schedule(SimTime(0.0), Event::arrival(s, ClientType::A));
    sim.schedule(SimTime(1.0), Event::arrival(s, ClientType::B));
    sim.schedule(SimTime(2.0), Event::arrival(s, ClientType::A));
    sim.schedule(SimTime(3.0), Event::arrival(s, ClientType::B));
    sim.schedule(SimTime(4.0), Event::arrival(s, ClientType::B));
    sim.run_until(SimTime(5.0), &mut net).expect("run");

    let st = net.station(s).expect("s").stats();
    assert_eq!(st.lost.a, 1);
    assert_eq!(st.lost.b, 3);
    assert_eq!(net.stats.lost, 4);

    let log = net.log.as_ref().expect("log");
    assert!(log.drops().all(|d| d.reason == DropReason::Lost));
    let accepted: Vec<bool> = log.arrivals().map(|a| a.accepted).collect();
    assert_eq!(accepted, vec![true, false, false, false, false]);

    let r = net.report(sim.now());
    assert!((r.stations[0].loss_probability - 0.8).abs() < 1e-12);
}

#[test]
fn littles_law_for_mm1() {
    let lambda = 0.5;
    let mu = 1.0;
    let mut sim = Simulator::default();
    let mut net = Network::new(42);
    let s = net
        .add_station(StationConfig {
            arrival: Some(ArrivalProcess {
                rate: lambda,
                fraction_b: 0.0,
            }),
            service_rates: vec![mu],
            ..StationConfig::new("mm1")
        })
        .expect("station");
    net.prime(&mut sim);
    sim.run_until(SimTime(500_000.0), &mut net).expect("run");

    let r = net.station(s).expect("s").report(sim.now());
    let expected = lambda / (mu - lambda);
    assert!(
        (r.avg_users - expected).abs() <= 0.1 * expected,
        "avg_users={} expected≈{expected}",
        r.avg_users
    );
    assert!((r.arrival_rate - lambda).abs() <= 0.05 * lambda);
    assert_eq!(r.lost.total(), 0);
}

fn edge_cloud_trace(seed: u64) -> Vec<(f64, StationId, crate::net::EventTag)> {
    let mut sim = Simulator::default();
    let mut net = logged(seed);
    let opts = crate::topo::edge_cloud::EdgeCloudOpts {
        arrival_rate: 0.5,
        distribution: ServiceDistribution::Exponential,
        micro_capacity: 2,
        ..Default::default()
    };
    crate::topo::edge_cloud::build_edge_cloud(&mut net, &opts).expect("topology");
    net.prime(&mut sim);
    sim.run_until(SimTime(200.0), &mut net).expect("run");
    net.log.expect("log").trace()
}

#[test]
fn same_seed_produces_identical_trace() {
    let t1 = edge_cloud_trace(7);
    let t2 = edge_cloud_trace(7);
    assert!(!t1.is_empty());
    assert_eq!(t1.len(), t2.len());
    for (x, y) in t1.iter().zip(&t2) {
        assert_eq!(x.0.to_bits(), y.0.to_bits());
        assert_eq!((x.1, x.2), (y.1, y.2));
    }
    assert_ne!(t1, edge_cloud_trace(8));
}

#[test]
fn invariants_hold_after_every_event_with_many_servers() {
    let mut sim = Simulator::default();
    let mut net = Network::new(3);
    for (i, policy) in ["first_idle", "round_robin", "faster_first"].iter().enumerate() {
        net.add_station(StationConfig {
            capacity: Capacity::Finite(6),
            servers: ServerCount::Finite(3),
            service_rates: vec![0.5, 1.0, 1.5],
            policy: policy.parse().expect("policy"),
            distribution: ServiceDistribution::Uniform,
            arrival: Some(ArrivalProcess {
                rate: 2.0 + i as f64,
                fraction_b: 0.5,
            }),
            ..StationConfig::new(format!("s{i}"))
        })
        .expect("station");
    }
    let inf = net
        .add_station(StationConfig {
            servers: ServerCount::Unbounded,
            ..StationConfig::new("inf")
        })
        .expect("inf");
    for i in 0..3 {
        net.add_route(StationId(i), OutcomeKind::Overflow, None, inf, 0.1)
            .expect("route");
    }
    assert!(net.check_invariants);
    net.prime(&mut sim);
    sim.run_until(SimTime(2_000.0), &mut net).expect("invariants hold");

    let r = net.report(sim.now());
    for st in &r.stations[..3] {
        assert!(st.forwarded.total() > 0, "{} never overflowed", st.name);
        assert_eq!(st.double_bookings, 0);
        assert!(st.utilization.iter().all(|&u| (0.0..=1.0).contains(&u)));
    }
    assert_eq!(r.stats.lost, 0);
}

#[test]
fn event_for_unknown_station_is_fatal() {
    let mut sim = Simulator::default();
    let mut net = Network::new(0);
    net.add_station(StationConfig::new("only")).expect("station");
    sim.schedule(SimTime(1.0), Event::arrival(StationId(5), ClientType::A));
    let err = sim.run(&mut net).expect_err("unknown station");
    assert_eq!(err, InvariantViolation::UnknownStation(5));
}

#[test]
fn network_rejects_bad_wiring() {
    let mut net = Network::new(0);
    let a = net.add_station(StationConfig::new("a")).expect("a");
    assert!(matches!(
        net.add_station(StationConfig::new("a")),
        Err(ConfigError::DuplicateStation(_))
    ));
    assert!(matches!(
        net.add_route(a, OutcomeKind::Overflow, None, StationId(3), 0.0),
        Err(ConfigError::UnknownStation(_))
    ));
    assert!(matches!(
        net.add_route(a, OutcomeKind::Overflow, None, a, -1.0),
        Err(ConfigError::InvalidDelay(_))
    ));
    assert_eq!(net.station_id("a"), Some(a));
    assert_eq!(net.station_id("b"), None);
}

#[derive(Default)]
struct Counts {
    arrivals: usize,
    departures: usize,
    drops: usize,
}

struct SharedCounter(Rc<RefCell<Counts>>);

impl StatisticsSink for SharedCounter {
    fn on_arrival(&mut self, _rec: &ArrivalRecord) {
        self.0.borrow_mut().arrivals += 1;
    }

    fn on_departure(&mut self, _rec: &DepartureRecord) {
        self.0.borrow_mut().departures += 1;
    }

    fn on_drop(&mut self, _rec: &DropRecord) {
        self.0.borrow_mut().drops += 1;
    }
}

#[test]
fn attached_sinks_see_every_record() {
    let counts = Rc::new(RefCell::new(Counts::default()));
    let mut sim = Simulator::default();
    let mut net = Network::new(0);
    let s = net.add_station(constant("s", Some(1), 1.0)).expect("s");
    net.add_sink(Box::new(SharedCounter(Rc::clone(&counts))));

    sim.schedule(SimTime(0.0), Event::arrival(s, ClientType::A));
    sim.schedule(SimTime(0.5), Event::arrival(s, ClientType::B));
    sim.run(&mut net).expect("run");

    let c = counts.borrow();
    assert_eq!((c.arrivals, c.departures, c.drops), (2, 1, 1));
}

/// 所有结果都转到固定站点
#[derive(Debug)]
struct Always(Route);

impl RoutingPolicy for Always {
    fn route(&self, from: StationId, _outcome: Outcome) -> Option<Route> {
        (from != self.0.target).then_some(self.0)
    }
}

#[test]
fn custom_routing_policy_replaces_table() {
    let mut sim = Simulator::default();
    let mut net = logged(0);
    let a = net.add_station(constant("a", None, 1.0)).expect("a");
    let b = net.add_station(constant("b", None, 1.0)).expect("b");
    net.set_routing_policy(Box::new(Always(Route { target: b, delay: 0.0 })));

    sim.schedule(SimTime(0.0), Event::arrival(a, ClientType::A));
    sim.run(&mut net).expect("run");

    let stations: Vec<StationId> = net
        .log
        .as_ref()
        .expect("log")
        .departures()
        .map(|d| d.station)
        .collect();
    assert_eq!(stations, vec![a, b]);
    assert_eq!(net.stats.completed, 1);
}

#[test]
fn set_arrival_rate_starts_stream_on_idle_station() {
    let mut sim = Simulator::default();
    let mut net = Network::new(5);
    let s = net.add_station(StationConfig::new("s")).expect("s");
    net.prime(&mut sim);
    assert!(sim.is_empty());

    sim.run_until(SimTime(10.0), &mut net).expect("run");
    net.set_arrival_rate(s, 1.0, &mut sim).expect("rate");
    assert_eq!(sim.peek_time(), Some(SimTime(10.0)));
    sim.run_until(SimTime(1_000.0), &mut net).expect("run");
    assert!(net.stats.created > 500);

    assert!(matches!(
        net.set_arrival_rate(s, -1.0, &mut sim),
        Err(ConfigError::NonPositiveRate { .. })
    ));
}

#[test]
fn network_dispatch_drives_station_world() {
    // Network 可以直接作为 World 使用
    let mut sim = Simulator::default();
    let mut net = Network::new(0);
    let s = net.add_station(constant("s", None, 2.0)).expect("s");
    let world: &mut dyn World<Event> = &mut net;
    world
        .dispatch(Event::arrival(s, ClientType::A), &mut sim)
        .expect("dispatch");
    world.on_tick(&mut sim).expect("invariants");
    assert_eq!(sim.peek_time(), Some(SimTime(0.5)));
}
