//! Numbered routing-restriction evaluation.
//!
//! A routing record carries zero or more restriction rows. Rows are grouped
//! into AND or OR logic per sequence, evaluated against the travel path, and
//! the per-row results are kept as an audit trail. Restrictions 12 and 17
//! are route-level rules handled by [`validate_group_nonstops`] and
//! [`validate_carrier_listing`]; the per-row dispatcher skips them.

use std::collections::hash_map::Entry;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::warn;

use crate::graph::RestrictionRow;
use crate::outcome::RestrictionStatus;
use crate::traits::RoutingRepository;
use crate::travel::TravelPath;
use crate::types::{
    generic_city_matches, grouped_nation, AirSurface, LocCode, LocKind, MarketApplication,
    NonStopDirect, RestrictionNumber, ViaApplication, ONE_WORLD_ALLIANCE, SKY_TEAM_ALLIANCE,
    STAR_ALLIANCE,
};

/// Restrictions whose positive (Required/Permitted) rows may share an OR
/// group when the whole sequence is positive.
const OR_GROUP_RESTRICTIONS: &[&str] = &["1", "2", "4", "5", "7", "8", "9", "10", "18", "19", "21"];

/// Shared lookups for one evaluation run.
pub struct RestrictionContext<'a> {
    pub repo: &'a dyn RoutingRepository,
    pub vendor: &'a str,
    pub governing_carrier: &'a str,
    pub rtw: bool,
}

/// Result of evaluating the restriction rows of one routing.
#[derive(Debug, Clone, Default)]
pub struct RestrictionReport {
    pub valid: bool,
    pub audit: Vec<RestrictionStatus>,
    /// A restriction 12 or 16 was attached, which forces mileage validation.
    pub needs_mileage: bool,
}

/// Grouping key for OR evaluation. Between-application rows compare their
/// markets symmetrically, so the pair is normalized at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RestrictionKey {
    restriction: RestrictionNumber,
    market1: LocCode,
    market2: LocCode,
}

impl RestrictionKey {
    pub fn new(row: &RestrictionRow) -> Self {
        let flip = row.market_appl == MarketApplication::Between && row.market2 < row.market1;
        let (market1, market2) = if flip {
            (row.market2.clone(), row.market1.clone())
        } else {
            (row.market1.clone(), row.market2.clone())
        };
        Self {
            restriction: row.restriction.clone(),
            market1,
            market2,
        }
    }
}

/// A sequence uses AND logic unless every row carries a positive
/// (Required/Permitted) application.
pub fn uses_and_logic(rows: &[&RestrictionRow]) -> bool {
    rows.iter().any(|r| !r.neg_via_appl.is_positive())
}

/// Evaluate the inline restriction rows of one routing record.
///
/// Route-level restrictions (12 and 17) are excluded here and handled once
/// per component; constructed fares additionally skip restriction 3, which
/// is re-applied to their add-on components.
pub fn process_rows(
    ctx: &RestrictionContext<'_>,
    rows: &[RestrictionRow],
    path: &TravelPath,
    constructed: bool,
) -> RestrictionReport {
    let mut report = RestrictionReport {
        valid: true,
        ..Default::default()
    };
    report.needs_mileage = rows
        .iter()
        .any(|r| r.restriction == "12" || r.restriction == "16");

    let inline: Vec<&RestrictionRow> = rows
        .iter()
        .filter(|r| {
            if r.restriction == "12" || r.restriction == "17" {
                return false;
            }
            !(constructed && r.restriction == "3")
        })
        .collect();
    if inline.is_empty() {
        return report;
    }

    if uses_and_logic(&inline) {
        for row in &inline {
            let valid = validate_restriction(ctx, row, path);
            report.audit.push(status(row, valid));
            report.valid &= valid;
        }
        return report;
    }

    // OR logic: rows of the same restriction and market pair form a group
    // that passes when any member passes. Restrictions outside the OR set
    // still stand alone.
    let mut groups: FxHashMap<RestrictionKey, bool> = FxHashMap::default();
    let mut order: Vec<RestrictionKey> = Vec::new();
    for row in &inline {
        let valid = validate_restriction(ctx, row, path);
        report.audit.push(status(row, valid));
        if OR_GROUP_RESTRICTIONS.contains(&row.restriction.as_str()) {
            let key = RestrictionKey::new(row);
            match groups.entry(key.clone()) {
                Entry::Occupied(mut e) => {
                    *e.get_mut() |= valid;
                }
                Entry::Vacant(e) => {
                    e.insert(valid);
                    order.push(key);
                }
            }
        } else {
            report.valid &= valid;
        }
    }
    for key in order {
        report.valid &= groups[&key];
    }
    report
}

fn status(row: &RestrictionRow, valid: bool) -> RestrictionStatus {
    RestrictionStatus {
        seq_no: row.seq_no,
        restriction: row.restriction.clone(),
        processed: true,
        valid,
    }
}

/// Dispatch one restriction row against the path.
pub fn validate_restriction(
    ctx: &RestrictionContext<'_>,
    row: &RestrictionRow,
    path: &TravelPath,
) -> bool {
    match row.restriction.as_str() {
        "1" => validate_via_between(ctx, row, path),
        "2" => validate_via_anywhere(ctx, row, path),
        "5" => validate_via_to_from(row, path),
        "3" => validate_nonstop_between(row, path),
        "4" => validate_via_nonstop_between(row, path),
        "6" => validate_nonstop_to_from(row, path),
        "7" => validate_via_nonstop_to_from(row, path),
        "8" => validate_stopover_at_via(row, path),
        "9" => validate_stopover_anywhere(row, path),
        "10" => validate_aircraft_change(row, path),
        "11" => validate_sector_between(row, path),
        "13" => validate_sector_anywhere(row, path),
        "16" => true,
        "18" => validate_carrier_between(row, path),
        "19" => validate_carrier_to_from(row, path),
        "21" => validate_carrier_anywhere(row, path),
        other => {
            warn!(restriction = other, seq_no = row.seq_no, "unknown restriction number");
            false
        }
    }
}

// ====================================================================
// Via-city family (1, 2, 5)
// ====================================================================

/// Restriction 1: travel between market1 and market2 must / must not be
/// via the via city. Inapplicable when the markets are not both flown.
fn validate_via_between(ctx: &RestrictionContext<'_>, row: &RestrictionRow, path: &TravelPath) -> bool {
    let Some((from, to)) = market_span(row, path) else {
        return true;
    };
    let points = path.points();
    let via_flown = points[from + 1..to]
        .iter()
        .any(|p| point_matches(ctx, row.via_kind, &row.via_market, p, path.nation_of(p)));
    apply_presence(row.neg_via_appl, via_flown)
}

/// Restriction 2: travel must / must not be via a location, which may be a
/// city, nation, zone, state or generic-city code.
fn validate_via_anywhere(ctx: &RestrictionContext<'_>, row: &RestrictionRow, path: &TravelPath) -> bool {
    let via_flown = path
        .intermediate_points()
        .iter()
        .any(|p| point_matches(ctx, row.via_kind, &row.via_market, p, path.nation_of(p)));
    apply_presence(row.neg_via_appl, via_flown)
}

/// Restriction 5: travel to/from market1 must / must not be via the via
/// city. The via city only counts as an intermediate point.
fn validate_via_to_from(row: &RestrictionRow, path: &TravelPath) -> bool {
    if !is_endpoint(&row.market1, path) {
        return true;
    }
    let via_flown = path.intermediate_points().contains(&row.via_market.as_str());
    apply_presence(row.neg_via_appl, via_flown)
}

fn apply_presence(appl: ViaApplication, present: bool) -> bool {
    match appl {
        ViaApplication::Permitted => true,
        ViaApplication::Required => present,
        ViaApplication::NotPermitted => !present,
        ViaApplication::Blank => true,
    }
}

// ====================================================================
// Nonstop / direct family (3, 4, 6, 7)
// ====================================================================

/// Restriction 3: travel between market1 and market2 must be
/// nonstop and/or direct.
fn validate_nonstop_between(row: &RestrictionRow, path: &TravelPath) -> bool {
    let Some((from, to)) = market_span(row, path) else {
        return true;
    };
    let ok = span_is_nonstop_direct(row.nonstop_direct, path, from, to);
    apply_presence(row.neg_via_appl, ok)
}

/// Restriction 4: travel between market1 and market2 must be via the via
/// city and each half nonstop/direct.
fn validate_via_nonstop_between(row: &RestrictionRow, path: &TravelPath) -> bool {
    let Some((from, to)) = market_span(row, path) else {
        return true;
    };
    let points = path.points();
    let via = points[from + 1..to]
        .iter()
        .position(|p| *p == row.via_market)
        .map(|i| from + 1 + i);
    let ok = match via {
        Some(mid) => {
            span_is_nonstop_direct(row.nonstop_direct, path, from, mid)
                && span_is_nonstop_direct(row.nonstop_direct, path, mid, to)
        }
        None => false,
    };
    apply_presence(row.neg_via_appl, ok)
}

/// Restriction 6: travel to/from market1 must be nonstop/direct.
fn validate_nonstop_to_from(row: &RestrictionRow, path: &TravelPath) -> bool {
    if !is_endpoint(&row.market1, path) {
        return true;
    }
    let ok = span_is_nonstop_direct(row.nonstop_direct, path, 0, path.legs.len());
    apply_presence(row.neg_via_appl, ok)
}

/// Restriction 7: travel to/from market1 must be via the via city,
/// nonstop/direct on either side.
fn validate_via_nonstop_to_from(row: &RestrictionRow, path: &TravelPath) -> bool {
    if !is_endpoint(&row.market1, path) {
        return true;
    }
    let via = path
        .points()
        .iter()
        .position(|p| *p == row.via_market)
        .filter(|i| *i > 0 && *i < path.legs.len());
    let ok = match via {
        Some(mid) => {
            span_is_nonstop_direct(row.nonstop_direct, path, 0, mid)
                && span_is_nonstop_direct(row.nonstop_direct, path, mid, path.legs.len())
        }
        None => false,
    };
    apply_presence(row.neg_via_appl, ok)
}

/// Nonstop means a single flown leg; direct means no carrier change and no
/// stopover across the span. Span bounds are point indices.
fn span_is_nonstop_direct(kind: NonStopDirect, path: &TravelPath, from: usize, to: usize) -> bool {
    let legs = &path.legs[from..to];
    let nonstop = legs.len() == 1;
    let direct = legs
        .windows(2)
        .all(|w| w[0].carrier == w[1].carrier && !w[0].stopover);
    match kind {
        NonStopDirect::Nonstop => nonstop,
        NonStopDirect::Direct => direct,
        NonStopDirect::Either => nonstop || direct,
        NonStopDirect::Blank => true,
    }
}

// ====================================================================
// Stopover / change-of-aircraft family (8, 9, 10)
// ====================================================================

/// Restriction 8: stopover at the via city required / permitted / not
/// permitted. Rows without a via city pass.
fn validate_stopover_at_via(row: &RestrictionRow, path: &TravelPath) -> bool {
    if row.via_market.is_empty() {
        return true;
    }
    let stopped = path
        .legs
        .iter()
        .enumerate()
        .any(|(i, l)| l.off.code == row.via_market && l.stopover && i + 1 < path.legs.len());
    apply_presence(row.neg_via_appl, stopped)
}

/// Restriction 9: stopovers anywhere on the path required / not permitted.
fn validate_stopover_anywhere(row: &RestrictionRow, path: &TravelPath) -> bool {
    let any_stop = path
        .legs
        .iter()
        .enumerate()
        .any(|(i, l)| l.stopover && i + 1 < path.legs.len());
    apply_presence(row.neg_via_appl, any_stop)
}

/// Restriction 10: change of aircraft at the via city. Without recorded
/// flight equipment a connection at the via city counts as a change.
fn validate_aircraft_change(row: &RestrictionRow, path: &TravelPath) -> bool {
    if row.via_market.is_empty() {
        return true;
    }
    let changed = path
        .legs
        .iter()
        .enumerate()
        .any(|(i, l)| l.off.code == row.via_market && !l.stopover && i + 1 < path.legs.len());
    apply_presence(row.neg_via_appl, changed)
}

// ====================================================================
// Air / surface sector family (11, 13)
// ====================================================================

/// Restriction 11: the sector between market1 and market2 must / must not
/// be an air (or surface) sector. Inapplicable without a direct leg
/// between the two markets.
fn validate_sector_between(row: &RestrictionRow, path: &TravelPath) -> bool {
    let leg = path.legs.iter().find(|l| {
        (l.board.code == row.market1 && l.off.code == row.market2)
            || (l.board.code == row.market2 && l.off.code == row.market1)
    });
    let Some(leg) = leg else {
        return true;
    };
    let matches = sector_matches(row.air_surface, leg.is_surface());
    apply_presence(row.neg_via_appl, matches)
}

/// Restriction 13: air / surface sectors anywhere on the path.
fn validate_sector_anywhere(row: &RestrictionRow, path: &TravelPath) -> bool {
    let any = path
        .legs
        .iter()
        .any(|l| sector_matches(row.air_surface, l.is_surface()));
    apply_presence(row.neg_via_appl, any)
}

fn sector_matches(kind: AirSurface, surface: bool) -> bool {
    match kind {
        AirSurface::Air => !surface,
        AirSurface::Surface => surface,
        AirSurface::Either | AirSurface::Blank => true,
    }
}

// ====================================================================
// Via-carrier family (18, 19, 21)
// ====================================================================

/// Restriction 18: travel between market1 and market2 must / must not be
/// via the via carrier.
fn validate_carrier_between(row: &RestrictionRow, path: &TravelPath) -> bool {
    let Some((from, to)) = market_span(row, path) else {
        return true;
    };
    let on_carrier = path.legs[from..to]
        .iter()
        .all(|l| l.carrier == row.via_carrier);
    apply_presence(row.neg_via_appl, on_carrier)
}

/// Restriction 19: travel to/from market1 must / must not be via the via
/// carrier. Checked on the legs touching market1.
fn validate_carrier_to_from(row: &RestrictionRow, path: &TravelPath) -> bool {
    let touching: Vec<_> = path
        .legs
        .iter()
        .filter(|l| l.board.code == row.market1 || l.off.code == row.market1)
        .collect();
    if touching.is_empty() {
        return true;
    }
    let on_carrier = touching.iter().all(|l| l.carrier == row.via_carrier);
    apply_presence(row.neg_via_appl, on_carrier)
}

/// Restriction 21: travel anywhere must / must not be via the via carrier.
fn validate_carrier_anywhere(row: &RestrictionRow, path: &TravelPath) -> bool {
    let on_carrier = path.legs.iter().any(|l| l.carrier == row.via_carrier);
    apply_presence(row.neg_via_appl, on_carrier)
}

// ====================================================================
// Route-level restrictions (12, 17)
// ====================================================================

/// Restriction 12: round-the-world city-group nonstop rule.
///
/// Rows are grouped per normalized nation pair of their markets (with
/// East-Ural Russia folded into Russia and Canada into the United States;
/// markets absent from the path share a blank key). For each group the
/// market1 cities form one set and the market2 cities the other, and at
/// most one nonstop leg may connect the two sets. Not evaluated outside
/// round-the-world processing.
pub fn validate_group_nonstops(
    ctx: &RestrictionContext<'_>,
    rows: &[&RestrictionRow],
    path: &TravelPath,
) -> bool {
    if !ctx.rtw {
        return true;
    }
    let nation_key = |city: &str| -> String {
        path.nation_of(city)
            .map(|n| grouped_nation(n).to_string())
            .unwrap_or_default()
    };

    let mut groups: FxHashMap<(String, String), (FxHashSet<LocCode>, FxHashSet<LocCode>)> =
        FxHashMap::default();
    for row in rows {
        if row.restriction != "12" {
            continue;
        }
        let key = (nation_key(&row.market1), nation_key(&row.market2));
        let entry = groups.entry(key).or_default();
        entry.0.insert(row.market1.clone());
        entry.1.insert(row.market2.clone());
    }

    for (group1, group2) in groups.values() {
        let nonstops = path
            .legs
            .iter()
            .filter(|l| {
                (group1.contains(&l.board.code) && group2.contains(&l.off.code))
                    || (group2.contains(&l.board.code) && group1.contains(&l.off.code))
            })
            .count();
        if nonstops >= 2 {
            return false;
        }
    }
    true
}

/// Restriction 17: the route must be flown on the carriers listed across
/// all 17-rows, with the governing carrier always admitted. Surface legs
/// are skipped. Under round-the-world an alliance pseudo-carrier in the
/// listing admits its member carriers.
pub fn validate_carrier_listing(
    ctx: &RestrictionContext<'_>,
    rows: &[&RestrictionRow],
    path: &TravelPath,
) -> bool {
    let listed: Vec<&RestrictionRow> = rows.iter().filter(|r| r.restriction == "17").copied().collect();
    if listed.is_empty() {
        return true;
    }

    let negative = listed
        .iter()
        .all(|r| r.neg_via_appl == ViaApplication::NotPermitted);
    let mut carriers: FxHashSet<String> = listed
        .iter()
        .filter(|r| !r.via_carrier.is_empty())
        .map(|r| r.via_carrier.clone())
        .collect();

    if negative {
        return path
            .legs
            .iter()
            .filter(|l| !l.is_surface())
            .all(|l| !carriers.contains(&l.carrier));
    }

    carriers.insert(ctx.governing_carrier.to_string());
    if ctx.rtw {
        for alliance in [ONE_WORLD_ALLIANCE, STAR_ALLIANCE, SKY_TEAM_ALLIANCE] {
            if carriers.contains(alliance) {
                carriers.extend(ctx.repo.alliance_carriers(alliance));
            }
        }
    }
    path.legs
        .iter()
        .filter(|l| !l.is_surface())
        .all(|l| carriers.contains(&l.carrier))
}

/// Component-level restriction 3 for add-on components of constructed
/// fares: only negative and required rows are enforced there.
pub fn validate_component_nonstops(
    rows: &[RestrictionRow],
    component: &TravelPath,
) -> bool {
    rows.iter()
        .filter(|r| {
            r.restriction == "3"
                && matches!(
                    r.neg_via_appl,
                    ViaApplication::NotPermitted | ViaApplication::Required
                )
        })
        .all(|r| validate_nonstop_between(r, component))
}

// ====================================================================
// Shared helpers
// ====================================================================

/// Point indices spanning market1..market2 (either orientation) when both
/// are flown.
fn market_span(row: &RestrictionRow, path: &TravelPath) -> Option<(usize, usize)> {
    let points = path.points();
    let a = points.iter().position(|p| *p == row.market1)?;
    let b = points.iter().position(|p| *p == row.market2)?;
    if a == b {
        return None;
    }
    Some((a.min(b), a.max(b)))
}

fn is_endpoint(market: &str, path: &TravelPath) -> bool {
    market == path.origin || market == path.destination
}

/// Match one flown point against a typed restriction location.
fn point_matches(
    ctx: &RestrictionContext<'_>,
    kind: LocKind,
    code: &str,
    city: &str,
    nation: Option<&str>,
) -> bool {
    match kind {
        LocKind::City | LocKind::Blank => city == code,
        LocKind::Nation | LocKind::StateProvince => nation == Some(code),
        LocKind::Zone => nation
            .map(|n| ctx.repo.zone_nations(ctx.vendor, code).iter().any(|z| z == n))
            .unwrap_or(false),
        LocKind::GenericCity => nation.map(|n| generic_city_matches(code, n)).unwrap_or(false),
        LocKind::Airline => false,
    }
}
