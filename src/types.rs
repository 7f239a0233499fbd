//! Shared code types, sentinels and indicator enums.

use serde::{Deserialize, Serialize};

pub type LocCode = String;
pub type CarrierCode = String;
pub type VendorCode = String;
pub type NationCode = String;
pub type RoutingNumber = String;
pub type RestrictionNumber = String;

/// Routing number meaning "mileage validation applies, no map".
pub const MILEAGE_ROUTING: &str = "0000";
/// Routing number requesting "any valid routing" under round-the-world.
pub const GENERIC_ROUTING: &str = "9999";
pub const EMPTY_ROUTING: &str = "";
/// Placeholder routing numbers carried by Cat-25 fare-by-rule fares.
pub const CAT25_DOMESTIC: &str = "SEVN";
pub const CAT25_INTERNATIONAL: &str = "EIGH";

pub const SURFACE_CARRIER: &str = "XX";
pub const INDUSTRY_CARRIER: &str = "YY";

/// Alliance pseudo-carriers accepted by restriction 17 under RTW.
pub const ONE_WORLD_ALLIANCE: &str = "*O";
pub const STAR_ALLIANCE: &str = "*A";
pub const SKY_TEAM_ALLIANCE: &str = "*S";

pub const VENDOR_ATPCO: &str = "ATP";
pub const VENDOR_SITA: &str = "SITA";

/// Generic city codes seen in RTW restriction data. They match the
/// state-coded points of the corresponding US coast.
pub const WEST_COAST_CODE: &str = "WCC";
pub const EAST_COAST_CODE: &str = "ECC";

const WEST_COAST_STATES: &[&str] = &["USAK", "USCA", "USNV", "USOR", "USWA"];
const EAST_COAST_STATES: &[&str] = &[
    "USCT", "USDE", "USFL", "USGA", "USMA", "USMD", "USME", "USNC", "USNH", "USNJ", "USNY",
    "USRI", "USSC", "USVA",
];

/// True when a generic city code covers the given state-coded point.
pub fn generic_city_matches(code: &str, point: &str) -> bool {
    match code {
        WEST_COAST_CODE => WEST_COAST_STATES.contains(&point),
        EAST_COAST_CODE => EAST_COAST_STATES.contains(&point),
        _ => false,
    }
}

/// Nation-pair normalization used by restriction 12 grouping: East-Ural
/// Russia counts as Russia, Canada counts as the United States.
pub fn grouped_nation(nation: &str) -> &str {
    match nation {
        "XU" => "RU",
        "CA" => "US",
        other => other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GlobalDirection {
    /// Atlantic.
    AT,
    /// Atlantic and Pacific.
    AP,
    /// Circle trip.
    CT,
    /// Eastern hemisphere.
    EH,
    /// Pacific.
    PA,
    /// Round the world.
    RW,
    /// Trans-Siberia.
    TS,
    /// Western hemisphere.
    WH,
    /// Any direction.
    ZZ,
}

impl Default for GlobalDirection {
    fn default() -> Self {
        GlobalDirection::ZZ
    }
}

/// Negative-via application on a restriction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViaApplication {
    Required,
    Permitted,
    NotPermitted,
    Blank,
}

impl ViaApplication {
    pub fn from_code(code: char) -> Self {
        match code {
            'R' => Self::Required,
            'P' => Self::Permitted,
            'N' => Self::NotPermitted,
            _ => Self::Blank,
        }
    }

    /// Positive rows ('R'/'P') join OR groups; anything else forces AND.
    pub fn is_positive(self) -> bool {
        matches!(self, Self::Required | Self::Permitted)
    }
}

/// Location type on map nodes and restriction markets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocKind {
    City,
    Airline,
    Nation,
    Zone,
    StateProvince,
    GenericCity,
    Blank,
}

impl LocKind {
    pub fn from_code(code: char) -> Self {
        match code {
            'C' => Self::City,
            'A' => Self::Airline,
            'N' => Self::Nation,
            'Z' => Self::Zone,
            'S' => Self::StateProvince,
            'G' => Self::GenericCity,
            _ => Self::Blank,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketApplication {
    /// Between market1 and market2.
    Between,
    /// To/from market1.
    ToFrom,
    Blank,
}

impl MarketApplication {
    pub fn from_code(code: char) -> Self {
        match code {
            'B' => Self::Between,
            'T' => Self::ToFrom,
            _ => Self::Blank,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NonStopDirect {
    Nonstop,
    Direct,
    Either,
    Blank,
}

impl NonStopDirect {
    pub fn from_code(code: char) -> Self {
        match code {
            'N' => Self::Nonstop,
            'D' => Self::Direct,
            'E' => Self::Either,
            _ => Self::Blank,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AirSurface {
    Air,
    Surface,
    Either,
    Blank,
}

impl AirSurface {
    pub fn from_code(code: char) -> Self {
        match code {
            'A' => Self::Air,
            'S' => Self::Surface,
            'E' => Self::Either,
            _ => Self::Blank,
        }
    }
}

/// Mileage record type: maximum permitted vs ticketed point mileage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MileageType {
    Mpm,
    Tpm,
}
