//! Routing record: map nodes, restriction rows and the RtgKey identity.

use serde::{Deserialize, Serialize};

use crate::types::{
    AirSurface, CarrierCode, LocCode, LocKind, MarketApplication, NonStopDirect,
    RestrictionNumber, RoutingNumber, VendorCode, ViaApplication, MILEAGE_ROUTING,
};

/// Role of a node inside the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocTag {
    /// '1': traversal may enter here.
    Entry,
    /// ' ': interior node.
    Interior,
    /// 'X': traversal may terminate here.
    Exit,
}

impl LocTag {
    pub fn from_code(code: char) -> Self {
        match code {
            '1' => Self::Entry,
            'X' => Self::Exit,
            _ => Self::Interior,
        }
    }
}

/// Adjacency entry of the routing map. `next` advances toward the
/// destination, `alternate` chains sibling nodes at the same position;
/// zero means no link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapNode {
    pub id: u16,
    pub tag: LocTag,
    pub next: u16,
    pub alternate: u16,
    pub kind: LocKind,
    pub loc: LocCode,
    /// Local routing number filed on the node; the interior domestic
    /// portion behind it validates against that routing.
    pub local_routing: RoutingNumber,
}

impl MapNode {
    pub fn new(id: u16, tag: char, next: u16, alternate: u16, kind: char, loc: &str) -> Self {
        Self {
            id,
            tag: LocTag::from_code(tag),
            next,
            alternate,
            kind: LocKind::from_code(kind),
            loc: loc.to_string(),
            local_routing: String::new(),
        }
    }

    pub fn with_local_routing(mut self, routing_number: &str) -> Self {
        self.local_routing = routing_number.to_string();
        self
    }
}

/// Whether unticketed (hidden) points participate in map validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnticketedPointInfo {
    TicketedPointsOnly,
    AnyPoint,
}

/// One numbered restriction clause attached to a routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictionRow {
    pub seq_no: i32,
    pub restriction: RestrictionNumber,
    pub market_appl: MarketApplication,
    pub via_kind: LocKind,
    pub market1_kind: LocKind,
    pub market2_kind: LocKind,
    pub nonstop_direct: NonStopDirect,
    pub air_surface: AirSurface,
    pub market1: LocCode,
    pub market2: LocCode,
    pub via_market: LocCode,
    pub via_carrier: CarrierCode,
    pub neg_via_appl: ViaApplication,
}

impl RestrictionRow {
    pub fn new(restriction: &str) -> Self {
        Self {
            seq_no: 0,
            restriction: restriction.to_string(),
            market_appl: MarketApplication::Blank,
            via_kind: LocKind::City,
            market1_kind: LocKind::City,
            market2_kind: LocKind::City,
            nonstop_direct: NonStopDirect::Blank,
            air_surface: AirSurface::Blank,
            market1: String::new(),
            market2: String::new(),
            via_market: String::new(),
            via_carrier: String::new(),
            neg_via_appl: ViaApplication::Blank,
        }
    }
}

/// One routing record: identity, indicators, restriction rows and map.
/// Read-only once built; shared behind `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteGraph {
    pub vendor: VendorCode,
    pub carrier: CarrierCode,
    pub routing_tariff: i32,
    pub routing_number: RoutingNumber,
    /// Entry/exit-point restricted: traversal must start on an Entry node
    /// and finish on an Exit node.
    pub entry_exit_only: bool,
    pub unticketed_point: UnticketedPointInfo,
    /// Domestic-route-validation explicitly switched off for this routing.
    pub no_domestic_validation: bool,
    pub restrictions: Vec<RestrictionRow>,
    pub nodes: Vec<MapNode>,
}

impl RouteGraph {
    pub fn new(vendor: &str, carrier: &str, routing_tariff: i32, routing_number: &str) -> Self {
        Self {
            vendor: vendor.to_string(),
            carrier: carrier.to_string(),
            routing_tariff,
            routing_number: routing_number.to_string(),
            entry_exit_only: false,
            unticketed_point: UnticketedPointInfo::AnyPoint,
            no_domestic_validation: false,
            restrictions: Vec::new(),
            nodes: Vec::new(),
        }
    }

    pub fn has_map(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub fn is_mileage(&self) -> bool {
        self.routing_number == MILEAGE_ROUTING
    }

    pub fn node(&self, id: u16) -> Option<&MapNode> {
        if id == 0 {
            return None;
        }
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn add_node(&mut self, node: MapNode) {
        self.nodes.push(node);
    }

    pub fn add_restriction(&mut self, row: RestrictionRow) {
        self.restrictions.push(row);
    }

    /// Used by the RTW domestic-route-validation rule.
    pub fn has_nation_or_zone_nodes(&self) -> bool {
        self.nodes
            .iter()
            .any(|n| matches!(n.kind, LocKind::Nation | LocKind::Zone))
    }

    /// Any node filed with a local routing number.
    pub fn has_local_routing_nodes(&self) -> bool {
        self.nodes.iter().any(|n| !n.local_routing.is_empty())
    }
}

/// Routing identity used to deduplicate validation work across fares.
///
/// Ordering is the strict lexicographic tuple (routing number, tariff,
/// add-on 1, add-on 2, vendor, carrier, direction); the derive relies on
/// field order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RtgKey {
    pub routing_number: RoutingNumber,
    pub routing_tariff: i32,
    pub add_on_routing1: RoutingNumber,
    pub add_on_routing2: RoutingNumber,
    pub vendor: VendorCode,
    pub carrier: CarrierCode,
    /// Only meaningful for mileage-sentinel keys.
    pub direction_outbound: Option<bool>,
}

impl RtgKey {
    pub fn new(vendor: &str, carrier: &str, routing_tariff: i32, routing_number: &str) -> Self {
        Self {
            routing_number: routing_number.to_string(),
            routing_tariff,
            add_on_routing1: String::new(),
            add_on_routing2: String::new(),
            vendor: vendor.to_string(),
            carrier: carrier.to_string(),
            direction_outbound: None,
        }
    }

    pub fn with_addons(mut self, add_on1: &str, add_on2: &str) -> Self {
        self.add_on_routing1 = add_on1.to_string();
        self.add_on_routing2 = add_on2.to_string();
        self
    }

    pub fn is_mileage(&self) -> bool {
        self.routing_number == MILEAGE_ROUTING
    }
}
