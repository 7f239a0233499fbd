//! Repository seam.
//!
//! The engine consumes routing graphs, mileage tables, TPD/PSR rows and
//! location reference data through this trait; concrete apps back it with
//! their own data layer. Lookups are synchronous and treated as read-only
//! for the lifetime of a transaction.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::graph::RouteGraph;
use crate::types::{CarrierCode, GlobalDirection, LocCode, LocKind, MileageType, NationCode};

/// Published mileage for a city pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mileage {
    pub miles: u32,
    pub global_direction: GlobalDirection,
}

/// Which table a TpdPsr row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TpdPsrApplication {
    /// 'T': ticketed-point deduction.
    TicketedPointDeduction,
    /// 'P': permissible specified routing.
    PermissibleSpecifiedRouting,
}

/// Via-point condition on a TPD/PSR row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViaGeoLoc {
    pub loc: LocCode,
    pub kind: LocKind,
}

/// One ticketed-point-deduction or permissible-specified-routing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TpdPsr {
    pub application: TpdPsrApplication,
    pub carrier: CarrierCode,
    pub loc1: LocCode,
    pub loc2: LocCode,
    /// Mileage credit (TPD rows).
    pub tpd_amount: u32,
    /// Via points that must all be flown for the row to apply.
    pub via_locs: Vec<ViaGeoLoc>,
    /// PSR rows only: the higher-intermediate-point check is also waived.
    pub hip_exempt: bool,
}

/// South-Atlantic TPM exclusion: the flown span loc1..loc2 is replaced by
/// the published through mileage for surcharge purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TpmExclusion {
    pub carrier: CarrierCode,
    pub loc1: LocCode,
    pub loc2: LocCode,
}

/// Read-only lookup of routing and mileage reference data.
///
/// Empty results mean "no data filed", which is a normal outcome, not an
/// error; callers decide what absence implies.
pub trait RoutingRepository {
    /// Routing records matching (vendor, carrier, tariff, number) effective
    /// on the travel date.
    fn routings(
        &self,
        vendor: &str,
        carrier: &str,
        routing_tariff: i32,
        routing_number: &str,
        date: NaiveDate,
    ) -> Vec<Arc<RouteGraph>>;

    /// Published MPM or TPM for a city pair.
    fn mileage(
        &self,
        origin: &str,
        destination: &str,
        kind: MileageType,
        direction: GlobalDirection,
        date: NaiveDate,
    ) -> Option<Mileage>;

    /// TPD/PSR rows filed by a carrier for the market endpoints.
    fn tpd_psr(
        &self,
        application: TpdPsrApplication,
        carrier: &str,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> Vec<TpdPsr>;

    /// South-Atlantic TPM exclusion rows for a carrier.
    fn tpm_exclusions(&self, carrier: &str) -> Vec<TpmExclusion> {
        let _ = carrier;
        Vec::new()
    }

    /// Multi-transport city for an airport (JFK -> NYC); None when the
    /// location already is a city code.
    fn multi_transport_city(&self, loc: &str, carrier: &str, date: NaiveDate) -> Option<LocCode> {
        let _ = (loc, carrier, date);
        None
    }

    /// Nations contained in a vendor zone, for zone-typed map nodes and
    /// restriction markets.
    fn zone_nations(&self, vendor: &str, zone: &str) -> Vec<NationCode> {
        let _ = (vendor, zone);
        Vec::new()
    }

    /// Member carriers of an alliance pseudo-code.
    fn alliance_carriers(&self, alliance: &str) -> Vec<CarrierCode> {
        let _ = alliance;
        Vec::new()
    }

    /// Surface sector exempt from the TPM sum.
    fn surface_sector_exempt(&self, origin: &str, destination: &str, date: NaiveDate) -> bool {
        let _ = (origin, destination, date);
        false
    }
}
