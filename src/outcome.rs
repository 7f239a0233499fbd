//! Validation outcomes recorded per RtgKey.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::graph::{RouteGraph, RtgKey};
use crate::types::{LocCode, RestrictionNumber};

/// Audit entry for one restriction row, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestrictionStatus {
    pub seq_no: i32,
    pub restriction: RestrictionNumber,
    pub processed: bool,
    pub valid: bool,
}

/// Route-map walk result. `route_strings` stays `None` until a walk
/// succeeds in extracting a path through the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MapOutcome {
    pub route_strings: Option<Vec<String>>,
    /// Domestic-route-validation applies to the interior domestic portion.
    pub drv_applies: bool,
}

/// Mileage validation result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MileageOutcome {
    /// TPM after deductions fits under MPM, or a PSR row exempts it.
    pub valid: bool,
    pub mpm: u32,
    pub tpm: u32,
    /// Excess-mileage surcharge percent (0 when none applies).
    pub surcharge_pct: u16,
    /// Ticketed-point deduction credited against TPM.
    pub tpd: u32,
    /// South-Atlantic exception variants, when the carrier's TPM exclusion
    /// table matched a flown span.
    pub south_atlantic_tpm: Option<u32>,
    pub south_atlantic_surcharge_pct: u16,
    pub psr_applies: bool,
    pub psr_hip_exempt: bool,
    pub equalization_applied: bool,
    /// Surface sectors exempted from the TPM sum.
    pub surface_exempt_pairs: Vec<(LocCode, LocCode)>,
}

impl MileageOutcome {
    /// Whether mileage lets the fare through at all: either valid outright
    /// or valid with an excess-mileage surcharge.
    pub fn acceptable(&self) -> bool {
        self.valid || self.surcharge_pct > 0
    }
}

/// Everything recorded for one distinct RtgKey. Published to the cache
/// only once fully built, then read-only.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoutingOutcome {
    /// Overall: restrictions && mileage && map.
    pub routing_status: bool,
    pub map_valid: bool,
    pub restrictions_valid: bool,
    pub mileage_valid: bool,
    pub mileage: Option<MileageOutcome>,
    pub map: Option<MapOutcome>,
    pub restriction_audit: Vec<RestrictionStatus>,
    pub routing_tariff: i32,
    #[serde(skip)]
    pub base: Option<Arc<RouteGraph>>,
    #[serde(skip)]
    pub origin_addon: Option<Arc<RouteGraph>>,
    #[serde(skip)]
    pub destination_addon: Option<Arc<RouteGraph>>,
}

/// Outcomes of one fare market keyed by routing identity.
pub type RoutingOutcomes = FxHashMap<RtgKey, Arc<RoutingOutcome>>;
