//! Round-the-world sequencing: generic and specified routing interplay,
//! the mileage short-circuit, and alliance carrier listings.

mod fixtures;

use fare_routing::fare::{Fare, FareMarket};
use fare_routing::graph::{MapNode, RestrictionRow, RouteGraph, RtgKey};
use fare_routing::orchestrator::{RoutingController, ValidationOptions};
use fare_routing::travel::{CityCarrier, TravelPath};
use fare_routing::types::ViaApplication;

use fixtures::{travel_date, trip, MockRepo};

fn rtw_controller(repo: MockRepo) -> RoutingController<MockRepo> {
    RoutingController::with_options(
        repo,
        ValidationOptions {
            round_the_world: true,
            ..Default::default()
        },
    )
}

fn chain_map(vendor: &str, carrier: &str, tariff: i32, number: &str, cities: &[&str]) -> RouteGraph {
    let mut g = RouteGraph::new(vendor, carrier, tariff, number);
    let last = cities.len() as u16;
    for (i, city) in cities.iter().enumerate() {
        let id = i as u16 + 1;
        let tag = if id == 1 { '1' } else if id == last { 'X' } else { ' ' };
        let next = if id == last { 0 } else { id + 1 };
        g.add_node(MapNode::new(id, tag, next, 0, 'C', city));
    }
    g
}

fn generic_pass() -> RouteGraph {
    chain_map("ATP", "BA", 3, "9999", &["LON", "BKK", "SYD"])
}

fn generic_fail() -> RouteGraph {
    chain_map("ATP", "BA", 3, "9999", &["LON", "SIN", "SYD"])
}

fn specified_pass() -> RouteGraph {
    chain_map("ATP", "BA", 3, "0517", &["LON", "BKK", "SYD"])
}

fn specified_fail() -> RouteGraph {
    chain_map("ATP", "BA", 3, "0517", &["LON", "HKG", "SYD"])
}

fn run_one(repo: MockRepo) -> FareMarket {
    let controller = rtw_controller(repo);
    let path = trip(&["LON", "BKK", "SYD"], "BA");
    let mut market = FareMarket::new("BA", path);
    market.fares.push(Fare::new("ATP", "BA", 3, "0517"));
    controller.process_market(&mut market).unwrap();
    market
}

#[test]
fn generic_pass_without_specified_data_is_valid() {
    let market = run_one(MockRepo::default().with_routing(generic_pass()));
    assert!(market.fares[0].routing_valid);
    assert!(market.fares[0].is_routing);
}

#[test]
fn specified_verdict_supersedes_a_generic_pass() {
    let market = run_one(
        MockRepo::default()
            .with_routing(generic_pass())
            .with_routing(specified_pass()),
    );
    assert!(market.fares[0].routing_valid);
    assert_eq!(market.outcomes.len(), 2);

    let market = run_one(
        MockRepo::default()
            .with_routing(generic_pass())
            .with_routing(specified_fail()),
    );
    assert!(!market.fares[0].routing_valid);
}

#[test]
fn generic_failure_is_final() {
    // Even a passing specified routing cannot resurrect the fare.
    let market = run_one(
        MockRepo::default()
            .with_routing(generic_fail())
            .with_routing(specified_pass()),
    );
    assert!(!market.fares[0].routing_valid);
    assert!(!market.fares[0].routing_map_valid);
}

#[test]
fn absent_generic_defers_to_the_specified_routing() {
    let market = run_one(MockRepo::default().with_routing(specified_pass()));
    assert!(market.fares[0].routing_valid);

    let market = run_one(MockRepo::default().with_routing(specified_fail()));
    assert!(!market.fares[0].routing_valid);

    let market = run_one(MockRepo::default());
    assert!(!market.fares[0].routing_valid);
}

#[test]
fn mileage_fares_never_validate_under_round_the_world() {
    // Plenty of mileage data on file, none of it consulted.
    let repo = MockRepo::default()
        .with_mpm("LON", "SYD", 20000)
        .with_tpm("LON", "BKK", 5900)
        .with_tpm("BKK", "SYD", 4700);
    let controller = rtw_controller(repo);

    let path = trip(&["LON", "BKK", "SYD"], "BA");
    let mut market = FareMarket::new("BA", path);
    market.fares.push(Fare::new("ATP", "BA", 3, "0000"));
    controller.process_market(&mut market).unwrap();

    assert!(!market.fares[0].routing_valid);
    let key = RtgKey {
        direction_outbound: Some(true),
        ..RtgKey::new("ATP", "BA", 3, "0000")
    };
    let outcome = market.outcomes.get(&key).unwrap();
    assert!(outcome.mileage.is_none());
    assert!(!outcome.mileage_valid);
    assert!(!outcome.map_valid);
}

#[test]
fn alliance_listing_admits_member_carriers() {
    let mut listing = RouteGraph::new("ATP", "LH", 3, "0771");
    let mut row = RestrictionRow::new("17");
    row.via_carrier = "*A".into();
    row.neg_via_appl = ViaApplication::Required;
    listing.add_restriction(row);

    let repo = MockRepo::default()
        .with_routing(listing)
        .with_alliance("*A", &["UA", "LH", "AC"]);
    let controller = rtw_controller(repo);

    let legs = vec![
        CityCarrier::new("FRA", "ORD", "LH"),
        CityCarrier::new("ORD", "YYZ", "UA"),
        CityCarrier::new("YYZ", "FRA", "AC"),
    ];
    let path = TravelPath::from_legs(legs, "LH", travel_date());
    let mut market = FareMarket::new("LH", path);
    market.fares.push(Fare::new("ATP", "LH", 3, "0771"));
    controller.process_market(&mut market).unwrap();
    assert!(market.fares[0].routing_valid);

    // An off-listing carrier sinks the whole route.
    let legs = vec![
        CityCarrier::new("FRA", "ORD", "LH"),
        CityCarrier::new("ORD", "YYZ", "BA"),
    ];
    let path = TravelPath::from_legs(legs, "LH", travel_date());
    let mut market = FareMarket::new("LH", path);
    market.fares.push(Fare::new("ATP", "LH", 3, "0771"));
    controller.process_market(&mut market).unwrap();
    assert!(!market.fares[0].routing_valid);
}
