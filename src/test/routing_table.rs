use crate::error::ConfigError;
use crate::net::{ClientType, Outcome, OutcomeKind, Route, RoutingPolicy, RoutingTable, StationId};

fn route(target: usize, delay: f64) -> Route {
    Route {
        target: StationId(target),
        delay,
    }
}

#[test]
fn wildcard_entry_applies_to_every_type() {
    let mut t = RoutingTable::new();
    assert!(t.is_empty());
    t.insert(StationId(0), OutcomeKind::Overflow, None, route(1, 0.2));

    for ty in ClientType::ALL {
        assert_eq!(t.route(StationId(0), Outcome::Overflow(ty)), Some(route(1, 0.2)));
        assert_eq!(t.route(StationId(0), Outcome::Departure(ty)), None);
    }
    assert_eq!(t.route(StationId(1), Outcome::Overflow(ClientType::A)), None);
}

#[test]
fn type_specific_entry_takes_precedence() {
    let mut t = RoutingTable::new();
    t.insert(StationId(0), OutcomeKind::Departure, None, route(1, 1.0));
    t.insert(
        StationId(0),
        OutcomeKind::Departure,
        Some(ClientType::B),
        route(2, 0.5),
    );
    assert_eq!(t.len(), 2);

    assert_eq!(
        t.route(StationId(0), Outcome::Departure(ClientType::A)),
        Some(route(1, 1.0))
    );
    assert_eq!(
        t.route(StationId(0), Outcome::Departure(ClientType::B)),
        Some(route(2, 0.5))
    );
}

#[test]
fn insert_replaces_previous_route() {
    let mut t = RoutingTable::new();
    assert_eq!(
        t.insert(StationId(0), OutcomeKind::Overflow, Some(ClientType::A), route(1, 0.1)),
        None
    );
    assert_eq!(
        t.insert(StationId(0), OutcomeKind::Overflow, Some(ClientType::A), route(2, 0.3)),
        Some(route(1, 0.1))
    );
    assert_eq!(t.len(), 1);
    assert_eq!(
        t.route(StationId(0), Outcome::Overflow(ClientType::A)),
        Some(route(2, 0.3))
    );
}

#[test]
fn outcome_and_client_type_names_parse() {
    assert_eq!("overflow".parse::<OutcomeKind>().ok(), Some(OutcomeKind::Overflow));
    assert_eq!("departure".parse::<OutcomeKind>().ok(), Some(OutcomeKind::Departure));
    assert!(matches!(
        "reject".parse::<OutcomeKind>(),
        Err(ConfigError::UnknownOutcome(_))
    ));
    assert_eq!("b".parse::<ClientType>().ok(), Some(ClientType::B));
    assert!(matches!(
        "C".parse::<ClientType>(),
        Err(ConfigError::UnknownClientType(_))
    ));
    assert_eq!(
        OutcomeKind::Overflow.with_type(ClientType::B).client_type(),
        ClientType::B
    );
}
