//! Travel path: the flown city/carrier sequence a fare is validated against.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{CarrierCode, GlobalDirection, LocCode, NationCode, SURFACE_CARRIER};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub code: LocCode,
    pub hidden: bool,
}

impl City {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            hidden: false,
        }
    }
}

/// One leg of the travel path at city granularity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityCarrier {
    pub board: City,
    pub off: City,
    pub carrier: CarrierCode,
    pub board_nation: NationCode,
    pub off_nation: NationCode,
    /// Arrival at `off` is a stopover (vs a connection).
    pub stopover: bool,
}

impl CityCarrier {
    pub fn new(board: &str, off: &str, carrier: &str) -> Self {
        Self {
            board: City::new(board),
            off: City::new(off),
            carrier: carrier.to_string(),
            ..Default::default()
        }
    }

    pub fn with_nations(mut self, board_nation: &str, off_nation: &str) -> Self {
        self.board_nation = board_nation.to_string();
        self.off_nation = off_nation.to_string();
        self
    }

    pub fn with_stopover(mut self, stopover: bool) -> Self {
        self.stopover = stopover;
        self
    }

    /// Mark the arrival city as an unticketed (hidden) point.
    pub fn with_hidden_off(mut self) -> Self {
        self.off.hidden = true;
        self
    }

    pub fn is_surface(&self) -> bool {
        self.carrier == SURFACE_CARRIER
    }
}

/// Airport-level flown segment, kept alongside the city legs for mileage
/// lookups and nation/state matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlownSegment {
    pub origin: LocCode,
    pub destination: LocCode,
    pub carrier: CarrierCode,
    pub origin_nation: NationCode,
    pub destination_nation: NationCode,
}

/// Ordered city-pair sequence derived from the itinerary. Built once per
/// fare market and read-only during validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TravelPath {
    pub legs: Vec<CityCarrier>,
    pub origin: LocCode,
    pub destination: LocCode,
    pub origin_nation: NationCode,
    pub destination_nation: NationCode,
    pub governing_carrier: CarrierCode,
    pub global_direction: GlobalDirection,
    pub travel_date: NaiveDate,
    /// Flattened airport-level segments.
    pub mileage_legs: Vec<FlownSegment>,
    /// Ticketed-points-only variant, present when the legs carry hidden
    /// points. Used when the matched routing says unticketed points do not
    /// participate in validation.
    pub ticketed_only: Option<Box<TravelPath>>,
}

impl TravelPath {
    /// Build a path from city legs; endpoints, nations and airport-level
    /// segments are derived from the legs.
    pub fn from_legs(legs: Vec<CityCarrier>, governing_carrier: &str, travel_date: NaiveDate) -> Self {
        let origin = legs.first().map(|l| l.board.code.clone()).unwrap_or_default();
        let destination = legs.last().map(|l| l.off.code.clone()).unwrap_or_default();
        let origin_nation = legs.first().map(|l| l.board_nation.clone()).unwrap_or_default();
        let destination_nation = legs.last().map(|l| l.off_nation.clone()).unwrap_or_default();
        let mileage_legs = legs
            .iter()
            .map(|l| FlownSegment {
                origin: l.board.code.clone(),
                destination: l.off.code.clone(),
                carrier: l.carrier.clone(),
                origin_nation: l.board_nation.clone(),
                destination_nation: l.off_nation.clone(),
            })
            .collect();

        let collapsed = collapse_hidden(&legs);
        let ticketed_only = (collapsed.len() < legs.len())
            .then(|| Box::new(TravelPath::from_legs(collapsed, governing_carrier, travel_date)));

        Self {
            legs,
            origin,
            destination,
            origin_nation,
            destination_nation,
            governing_carrier: governing_carrier.to_string(),
            global_direction: GlobalDirection::ZZ,
            travel_date,
            mileage_legs,
            ticketed_only,
        }
    }

    pub fn with_direction(mut self, direction: GlobalDirection) -> Self {
        self.global_direction = direction;
        self
    }

    /// Ordered ticketed points: origin followed by each off city.
    pub fn points(&self) -> Vec<&str> {
        let mut points = Vec::with_capacity(self.legs.len() + 1);
        if let Some(first) = self.legs.first() {
            points.push(first.board.code.as_str());
        }
        for leg in &self.legs {
            points.push(leg.off.code.as_str());
        }
        points
    }

    /// Points strictly between origin and destination.
    pub fn intermediate_points(&self) -> Vec<&str> {
        let points = self.points();
        if points.len() <= 2 {
            return Vec::new();
        }
        points[1..points.len() - 1].to_vec()
    }

    pub fn visits(&self, city: &str) -> bool {
        self.points().contains(&city)
    }

    /// Nation recorded for a city on this path, if the city is flown.
    pub fn nation_of(&self, city: &str) -> Option<&str> {
        for leg in &self.legs {
            if leg.board.code == city && !leg.board_nation.is_empty() {
                return Some(leg.board_nation.as_str());
            }
            if leg.off.code == city && !leg.off_nation.is_empty() {
                return Some(leg.off_nation.as_str());
            }
        }
        None
    }

    /// Split at a construction gateway: legs up to the one arriving at the
    /// gateway, and the remainder. None when the gateway is not an
    /// intermediate arrival point.
    pub fn split_at_gateway(&self, gateway: &str) -> Option<(TravelPath, TravelPath)> {
        let cut = self.legs.iter().position(|l| l.off.code == gateway)?;
        if cut + 1 == self.legs.len() {
            return None;
        }
        let head = self.subpath(self.legs[..=cut].to_vec());
        let tail = self.subpath(self.legs[cut + 1..].to_vec());
        Some((head, tail))
    }

    /// Mirror of this path: legs reversed with board/off swapped.
    pub fn reversed(&self) -> TravelPath {
        let legs = self
            .legs
            .iter()
            .rev()
            .map(|l| CityCarrier {
                board: l.off.clone(),
                off: l.board.clone(),
                carrier: l.carrier.clone(),
                board_nation: l.off_nation.clone(),
                off_nation: l.board_nation.clone(),
                stopover: l.stopover,
            })
            .collect();
        self.subpath(legs)
    }

    /// Concatenate two travel routes (gateway splits rejoined).
    pub fn append(&self, other: &TravelPath) -> TravelPath {
        let mut legs = self.legs.clone();
        legs.extend(other.legs.iter().cloned());
        self.subpath(legs)
    }

    /// Cache signature: the flown sequence plus governing carrier.
    pub fn signature(&self) -> String {
        let mut sig = String::new();
        for leg in &self.legs {
            sig.push_str(&leg.board.code);
            sig.push('-');
            sig.push_str(&leg.carrier);
            sig.push('-');
        }
        sig.push_str(&self.destination);
        sig.push('|');
        sig.push_str(&self.governing_carrier);
        sig
    }

    fn subpath(&self, legs: Vec<CityCarrier>) -> TravelPath {
        let mut path = TravelPath::from_legs(legs, &self.governing_carrier, self.travel_date);
        path.global_direction = self.global_direction;
        path
    }
}

/// Merge legs across hidden arrival points: an unticketed stop folds into
/// the leg that reached it. A hidden final destination stays as filed.
fn collapse_hidden(legs: &[CityCarrier]) -> Vec<CityCarrier> {
    let mut out: Vec<CityCarrier> = Vec::with_capacity(legs.len());
    for leg in legs {
        match out.last_mut() {
            Some(prev) if prev.off.hidden => {
                prev.off = leg.off.clone();
                prev.off_nation = leg.off_nation.clone();
                prev.stopover = leg.stopover;
            }
            _ => out.push(leg.clone()),
        }
    }
    out
}
