//! Shared test fixtures: an in-memory repository plus builders for travel
//! paths and routing maps.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use fare_routing::graph::{MapNode, RouteGraph};
use fare_routing::traits::{Mileage, RoutingRepository, TpdPsr, TpdPsrApplication};
use fare_routing::travel::{CityCarrier, TravelPath};
use fare_routing::types::{GlobalDirection, MileageType};

pub fn travel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, 14).unwrap()
}

/// Table-backed repository. Mileage pairs match either orientation.
#[derive(Default)]
pub struct MockRepo {
    pub routings: Vec<Arc<RouteGraph>>,
    pub mpm: Vec<(String, String, u32)>,
    pub tpm: Vec<(String, String, u32)>,
    pub tpd_psr: Vec<TpdPsr>,
    pub zones: Vec<(String, Vec<String>)>,
    pub alliances: Vec<(String, Vec<String>)>,
}

impl MockRepo {
    pub fn with_routing(mut self, graph: RouteGraph) -> Self {
        self.routings.push(Arc::new(graph));
        self
    }

    pub fn with_mpm(mut self, origin: &str, destination: &str, miles: u32) -> Self {
        self.mpm.push((origin.to_string(), destination.to_string(), miles));
        self
    }

    pub fn with_tpm(mut self, origin: &str, destination: &str, miles: u32) -> Self {
        self.tpm.push((origin.to_string(), destination.to_string(), miles));
        self
    }

    pub fn with_zone(mut self, zone: &str, nations: &[&str]) -> Self {
        self.zones
            .push((zone.to_string(), nations.iter().map(|n| n.to_string()).collect()));
        self
    }

    pub fn with_alliance(mut self, alliance: &str, carriers: &[&str]) -> Self {
        self.alliances.push((
            alliance.to_string(),
            carriers.iter().map(|c| c.to_string()).collect(),
        ));
        self
    }
}

impl RoutingRepository for MockRepo {
    fn routings(
        &self,
        vendor: &str,
        carrier: &str,
        routing_tariff: i32,
        routing_number: &str,
        _date: NaiveDate,
    ) -> Vec<Arc<RouteGraph>> {
        self.routings
            .iter()
            .filter(|g| {
                g.vendor == vendor
                    && g.carrier == carrier
                    && g.routing_tariff == routing_tariff
                    && g.routing_number == routing_number
            })
            .cloned()
            .collect()
    }

    fn mileage(
        &self,
        origin: &str,
        destination: &str,
        kind: MileageType,
        _direction: GlobalDirection,
        _date: NaiveDate,
    ) -> Option<Mileage> {
        let table = match kind {
            MileageType::Mpm => &self.mpm,
            MileageType::Tpm => &self.tpm,
        };
        table
            .iter()
            .find(|(o, d, _)| {
                (o == origin && d == destination) || (o == destination && d == origin)
            })
            .map(|(_, _, miles)| Mileage {
                miles: *miles,
                global_direction: GlobalDirection::ZZ,
            })
    }

    fn tpd_psr(
        &self,
        application: TpdPsrApplication,
        carrier: &str,
        _origin: &str,
        _destination: &str,
        _date: NaiveDate,
    ) -> Vec<TpdPsr> {
        self.tpd_psr
            .iter()
            .filter(|row| row.application == application && row.carrier == carrier)
            .cloned()
            .collect()
    }

    fn zone_nations(&self, _vendor: &str, zone: &str) -> Vec<String> {
        self.zones
            .iter()
            .find(|(z, _)| z == zone)
            .map(|(_, nations)| nations.clone())
            .unwrap_or_default()
    }

    fn alliance_carriers(&self, alliance: &str) -> Vec<String> {
        self.alliances
            .iter()
            .find(|(a, _)| a == alliance)
            .map(|(_, carriers)| carriers.clone())
            .unwrap_or_default()
    }
}

/// Single-carrier path through the listed cities.
pub fn trip(cities: &[&str], carrier: &str) -> TravelPath {
    let legs = cities
        .windows(2)
        .map(|w| CityCarrier::new(w[0], w[1], carrier))
        .collect();
    TravelPath::from_legs(legs, carrier, travel_date())
}

/// Path from explicit (board, off, carrier) legs.
pub fn trip_legs(legs: &[(&str, &str, &str)]) -> TravelPath {
    let legs = legs
        .iter()
        .map(|(b, o, c)| CityCarrier::new(b, o, c))
        .collect::<Vec<_>>();
    let governing = legs.first().map(|l| l.carrier.clone()).unwrap_or_default();
    TravelPath::from_legs(legs, &governing, travel_date())
}

/// Map used across the map-walk tests: SEA may continue to DFW or MIA,
/// both of which reach CUN.
pub fn sea_cun_routing() -> RouteGraph {
    let mut g = RouteGraph::new("ATP", "AA", 5, "0756");
    g.add_node(MapNode::new(1, '1', 2, 0, 'C', "SEA"));
    g.add_node(MapNode::new(2, ' ', 4, 3, 'C', "DFW"));
    g.add_node(MapNode::new(3, ' ', 4, 0, 'C', "MIA"));
    g.add_node(MapNode::new(4, 'X', 0, 0, 'C', "CUN"));
    g
}

/// Origin add-on 0097: ESR-CPO-LSC on LA metal into SCL, continuing to LIM.
pub fn andes_addon_routing() -> RouteGraph {
    let mut g = RouteGraph::new("ATP", "LA", 17, "0097");
    g.add_node(MapNode::new(1, '1', 2, 0, 'C', "ESR"));
    g.add_node(MapNode::new(2, ' ', 3, 0, 'C', "CPO"));
    g.add_node(MapNode::new(3, ' ', 4, 0, 'C', "LSC"));
    g.add_node(MapNode::new(4, ' ', 5, 0, 'A', "LA"));
    g.add_node(MapNode::new(5, ' ', 6, 0, 'C', "SCL"));
    g.add_node(MapNode::new(6, ' ', 7, 0, 'A', "LP"));
    g.add_node(MapNode::new(7, 'X', 0, 0, 'C', "LIM"));
    g
}

/// Specified routing 0193: SCL to MIA on LA or LP, then onward to PUJ on a
/// wider carrier listing.
pub fn andes_spec_routing() -> RouteGraph {
    let mut g = RouteGraph::new("ATP", "LA", 17, "0193");
    g.add_node(MapNode::new(1, '1', 2, 0, 'C', "SCL"));
    g.add_node(MapNode::new(2, ' ', 4, 3, 'A', "LA"));
    g.add_node(MapNode::new(3, ' ', 4, 0, 'A', "LP"));
    g.add_node(MapNode::new(4, ' ', 5, 0, 'C', "MIA"));
    g.add_node(MapNode::new(5, ' ', 9, 6, 'A', "LA"));
    g.add_node(MapNode::new(6, ' ', 9, 7, 'A', "LP"));
    g.add_node(MapNode::new(7, ' ', 9, 8, 'A', "AA"));
    g.add_node(MapNode::new(8, ' ', 9, 0, 'A', "4M"));
    g.add_node(MapNode::new(9, 'X', 0, 0, 'C', "PUJ"));
    g
}
