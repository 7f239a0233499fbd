//! Fare-side inputs and the per-fare flags validation mutates.

use serde::{Deserialize, Serialize};

use crate::outcome::RoutingOutcomes;
use crate::travel::TravelPath;
use crate::types::{
    CarrierCode, LocCode, RoutingNumber, VendorCode, CAT25_DOMESTIC, CAT25_INTERNATIONAL,
    EMPTY_ROUTING, MILEAGE_ROUTING,
};

/// How a constructed (add-on) fare was assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstructionType {
    /// Add-on on the origin side only.
    SingleOrigin,
    /// Add-on on the destination side only.
    SingleDestination,
    /// Add-ons on both sides.
    DoubleEnded,
}

/// Construction data carried by add-on fares: the gateway cities the path
/// splits at and the add-on routing numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionInfo {
    pub construction_type: ConstructionType,
    pub origin_addon_routing: RoutingNumber,
    pub destination_addon_routing: RoutingNumber,
    /// Gateway on the origin side.
    pub gateway1: LocCode,
    /// Gateway on the destination side.
    pub gateway2: LocCode,
}

/// Fare-by-rule (Cat 25) linkage back to the base fare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareByRuleInfo {
    pub base_routing_number: RoutingNumber,
    pub base_routing_valid: bool,
    pub base_is_routing: bool,
}

/// One priced fare of a market, with the routing flags validation updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fare {
    pub vendor: VendorCode,
    pub carrier: CarrierCode,
    pub routing_number: RoutingNumber,
    pub routing_tariff: i32,
    pub nuc_fare_amount: f64,
    /// Fare filed opposite to the travel direction of the market.
    pub reversed: bool,
    pub constructed: Option<ConstructionInfo>,
    pub fare_by_rule: Option<FareByRuleInfo>,

    // Outputs.
    pub routing_processed: bool,
    pub routing_valid: bool,
    /// Validated via routing map (true) or via mileage (false).
    pub is_routing: bool,
    /// Map walk passed even if mileage later failed.
    pub routing_map_valid: bool,
    pub mileage_surcharge_pctg: u16,
    pub mileage_surcharge_amt: f64,
}

impl Fare {
    pub fn new(vendor: &str, carrier: &str, routing_tariff: i32, routing_number: &str) -> Self {
        Self {
            vendor: vendor.to_string(),
            carrier: carrier.to_string(),
            routing_number: routing_number.to_string(),
            routing_tariff,
            nuc_fare_amount: 0.0,
            reversed: false,
            constructed: None,
            fare_by_rule: None,
            routing_processed: false,
            routing_valid: false,
            is_routing: false,
            routing_map_valid: false,
            mileage_surcharge_pctg: 0,
            mileage_surcharge_amt: 0.0,
        }
    }

    pub fn is_constructed(&self) -> bool {
        self.constructed.is_some()
    }

    /// Cat-25 placeholder or empty routing number: no independent routing
    /// data exists for this fare.
    pub fn has_special_routing(&self) -> bool {
        self.routing_number == CAT25_DOMESTIC
            || self.routing_number == CAT25_INTERNATIONAL
            || self.routing_number == EMPTY_ROUTING
    }

    pub fn is_mileage_routing(&self) -> bool {
        self.routing_number == MILEAGE_ROUTING
    }
}

/// All fares priced over one travel path, validated as a batch.
#[derive(Debug, Clone, Default)]
pub struct FareMarket {
    pub governing_carrier: CarrierCode,
    pub travel_path: TravelPath,
    pub fares: Vec<Fare>,
    /// Validation outcomes keyed by RtgKey, shared by fares of this market.
    pub outcomes: RoutingOutcomes,
}

impl FareMarket {
    pub fn new(governing_carrier: &str, travel_path: TravelPath) -> Self {
        Self {
            governing_carrier: governing_carrier.to_string(),
            travel_path,
            fares: Vec::new(),
            outcomes: RoutingOutcomes::default(),
        }
    }
}
