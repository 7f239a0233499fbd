//! Mileage validation: MPM versus the flown TPM sum.
//!
//! The flown total is built leg by leg (airports folded to their
//! multi-transport city), reduced by surface-sector exemptions and the best
//! ticketed-point deduction, then compared against the published maximum.
//! Overruns map onto the excess-mileage surcharge ladder; a matching
//! permissible-specified-routing row waives the comparison outright.

use tracing::{debug, trace};

use crate::fare::Fare;
use crate::outcome::MileageOutcome;
use crate::traits::{RoutingRepository, TpdPsr, TpdPsrApplication};
use crate::travel::TravelPath;
use crate::types::{GlobalDirection, MileageType, INDUSTRY_CARRIER};

/// Surcharge ladder: 5 percent steps up to 25 percent over MPM.
const SURCHARGE_STEPS: &[u16] = &[5, 10, 15, 20, 25];

pub struct MileageEngine<'a> {
    repo: &'a dyn RoutingRepository,
}

impl<'a> MileageEngine<'a> {
    pub fn new(repo: &'a dyn RoutingRepository) -> Self {
        Self { repo }
    }

    /// Validate the path against its published maximum permitted mileage.
    pub fn validate(&self, path: &TravelPath) -> MileageOutcome {
        let mut outcome = MileageOutcome::default();
        let origin = self.fold_city(&path.origin, &path.governing_carrier, path);
        let destination = self.fold_city(&path.destination, &path.governing_carrier, path);

        match self.repo.mileage(
            &origin,
            &destination,
            MileageType::Mpm,
            path.global_direction,
            path.travel_date,
        ) {
            Some(mpm) => outcome.mpm = mpm.miles,
            None => {
                // Retry without a direction before giving up; a hit here is
                // recorded as mileage equalization.
                if let Some(mpm) = self.repo.mileage(
                    &origin,
                    &destination,
                    MileageType::Mpm,
                    GlobalDirection::ZZ,
                    path.travel_date,
                ) {
                    outcome.mpm = mpm.miles;
                    outcome.equalization_applied = true;
                }
            }
        }

        outcome.tpm = self.flown_total(path, &mut outcome);
        outcome.tpd = self.best_deduction(path);

        let psr = self.matching_psr(path);
        if let Some(row) = &psr {
            outcome.psr_applies = true;
            outcome.psr_hip_exempt = row.hip_exempt;
        }

        let after_deduction = outcome.tpm.saturating_sub(outcome.tpd);
        outcome.valid = outcome.psr_applies || (outcome.mpm > 0 && after_deduction <= outcome.mpm);
        if !outcome.valid {
            outcome.surcharge_pct = surcharge_band(after_deduction, outcome.mpm);
        }

        if let Some((sa_tpm, sa_pct)) = self.south_atlantic_variant(path, &outcome) {
            outcome.south_atlantic_tpm = Some(sa_tpm);
            outcome.south_atlantic_surcharge_pct = sa_pct;
        }

        debug!(
            mpm = outcome.mpm,
            tpm = outcome.tpm,
            tpd = outcome.tpd,
            surcharge = outcome.surcharge_pct,
            valid = outcome.valid,
            "mileage validation"
        );
        outcome
    }

    /// Per-leg TPM sum. A missing TPM falls back to the pair's MPM; exempt
    /// surface sectors contribute nothing and are recorded on the outcome.
    fn flown_total(&self, path: &TravelPath, outcome: &mut MileageOutcome) -> u32 {
        let mut total = 0;
        for leg in &path.mileage_legs {
            let board = self.fold_city(&leg.origin, &leg.carrier, path);
            let off = self.fold_city(&leg.destination, &leg.carrier, path);
            if leg.carrier == crate::types::SURFACE_CARRIER
                && self.repo.surface_sector_exempt(&board, &off, path.travel_date)
            {
                outcome.surface_exempt_pairs.push((board, off));
                continue;
            }
            total += self.pair_mileage(&board, &off, path);
        }
        total
    }

    fn pair_mileage(&self, board: &str, off: &str, path: &TravelPath) -> u32 {
        let tpm = self.repo.mileage(
            board,
            off,
            MileageType::Tpm,
            GlobalDirection::ZZ,
            path.travel_date,
        );
        match tpm {
            Some(m) => m.miles,
            None => {
                trace!(board, off, "no TPM published, falling back to MPM");
                self.repo
                    .mileage(
                        board,
                        off,
                        MileageType::Mpm,
                        GlobalDirection::ZZ,
                        path.travel_date,
                    )
                    .map(|m| m.miles)
                    .unwrap_or(0)
            }
        }
    }

    /// Best applicable ticketed-point deduction for the market.
    fn best_deduction(&self, path: &TravelPath) -> u32 {
        self.repo
            .tpd_psr(
                TpdPsrApplication::TicketedPointDeduction,
                &path.governing_carrier,
                &path.origin,
                &path.destination,
                path.travel_date,
            )
            .iter()
            .filter(|row| row_applies(row, path))
            .map(|row| row.tpd_amount)
            .max()
            .unwrap_or(0)
    }

    fn matching_psr(&self, path: &TravelPath) -> Option<TpdPsr> {
        self.repo
            .tpd_psr(
                TpdPsrApplication::PermissibleSpecifiedRouting,
                &path.governing_carrier,
                &path.origin,
                &path.destination,
                path.travel_date,
            )
            .into_iter()
            .find(|row| row_applies(row, path))
    }

    /// South-Atlantic exception: when a TPM-exclusion row of the governing
    /// carrier covers a flown span, the span's legs are replaced by the
    /// published through mileage and the surcharge recomputed.
    fn south_atlantic_variant(
        &self,
        path: &TravelPath,
        outcome: &MileageOutcome,
    ) -> Option<(u32, u16)> {
        let points = path.points();
        for row in self.repo.tpm_exclusions(&path.governing_carrier) {
            let Some(a) = points.iter().position(|p| *p == row.loc1) else {
                continue;
            };
            let Some(b) = points.iter().position(|p| *p == row.loc2) else {
                continue;
            };
            if a >= b {
                continue;
            }
            let through = self.pair_mileage(&row.loc1, &row.loc2, path);
            if through == 0 {
                continue;
            }
            // The span recomputes the same contributions flown_total
            // recorded: folded cities, exempt surface sectors at zero.
            let span: u32 = path.mileage_legs[a..b]
                .iter()
                .map(|leg| {
                    let board = self.fold_city(&leg.origin, &leg.carrier, path);
                    let off = self.fold_city(&leg.destination, &leg.carrier, path);
                    if leg.carrier == crate::types::SURFACE_CARRIER
                        && self.repo.surface_sector_exempt(&board, &off, path.travel_date)
                    {
                        0
                    } else {
                        self.pair_mileage(&board, &off, path)
                    }
                })
                .sum();
            let Some(rest) = outcome.tpm.checked_sub(span) else {
                continue;
            };
            let sa_tpm = rest + through;
            let after = sa_tpm.saturating_sub(outcome.tpd);
            let pct = if outcome.mpm > 0 && after <= outcome.mpm {
                0
            } else {
                surcharge_band(after, outcome.mpm)
            };
            return Some((sa_tpm, pct));
        }
        None
    }

    fn fold_city(&self, loc: &str, carrier: &str, path: &TravelPath) -> String {
        self.repo
            .multi_transport_city(loc, carrier, path.travel_date)
            .unwrap_or_else(|| loc.to_string())
    }
}

/// Smallest ladder step that covers the overrun; zero when even 25 percent
/// does not.
fn surcharge_band(tpm: u32, mpm: u32) -> u16 {
    if mpm == 0 {
        return 0;
    }
    for pct in SURCHARGE_STEPS {
        if u64::from(tpm) * 100 <= u64::from(mpm) * (100 + u64::from(*pct)) {
            return *pct;
        }
    }
    0
}

fn row_applies(row: &TpdPsr, path: &TravelPath) -> bool {
    row.via_locs.iter().all(|via| path.visits(&via.loc))
}

/// Push the surcharge of a validated outcome onto a fare. The
/// South-Atlantic exception percentage replaces the plain one only for
/// routing-validated fares of the industry carrier.
pub fn update_fare_surcharge(fare: &mut Fare, outcome: &MileageOutcome) {
    let pctg = if outcome.south_atlantic_tpm.is_some()
        && fare.is_routing
        && fare.carrier == INDUSTRY_CARRIER
    {
        outcome.south_atlantic_surcharge_pct
    } else {
        outcome.surcharge_pct
    };
    fare.mileage_surcharge_pctg = pctg;
    fare.mileage_surcharge_amt = fare.nuc_fare_amount * f64::from(pctg) / 100.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{Mileage, TpmExclusion, ViaGeoLoc};
    use crate::travel::CityCarrier;
    use crate::types::LocKind;
    use chrono::NaiveDate;

    #[derive(Default)]
    struct TableRepo {
        mpm: Vec<(&'static str, &'static str, u32)>,
        tpm: Vec<(&'static str, &'static str, u32)>,
        tpd: Vec<TpdPsr>,
        psr: Vec<TpdPsr>,
        exclusions: Vec<TpmExclusion>,
        exempt_surface: Vec<(&'static str, &'static str)>,
    }

    impl RoutingRepository for TableRepo {
        fn routings(
            &self,
            _: &str,
            _: &str,
            _: i32,
            _: &str,
            _: NaiveDate,
        ) -> Vec<std::sync::Arc<crate::graph::RouteGraph>> {
            Vec::new()
        }
        fn mileage(
            &self,
            origin: &str,
            destination: &str,
            kind: MileageType,
            _: GlobalDirection,
            _: NaiveDate,
        ) -> Option<Mileage> {
            let table = match kind {
                MileageType::Mpm => &self.mpm,
                MileageType::Tpm => &self.tpm,
            };
            table
                .iter()
                .find(|(o, d, _)| {
                    (*o == origin && *d == destination) || (*o == destination && *d == origin)
                })
                .map(|(_, _, miles)| Mileage {
                    miles: *miles,
                    global_direction: GlobalDirection::ZZ,
                })
        }
        fn tpd_psr(
            &self,
            application: TpdPsrApplication,
            _: &str,
            _: &str,
            _: &str,
            _: NaiveDate,
        ) -> Vec<TpdPsr> {
            match application {
                TpdPsrApplication::TicketedPointDeduction => self.tpd.clone(),
                TpdPsrApplication::PermissibleSpecifiedRouting => self.psr.clone(),
            }
        }
        fn tpm_exclusions(&self, _: &str) -> Vec<TpmExclusion> {
            self.exclusions.clone()
        }
        fn surface_sector_exempt(&self, origin: &str, destination: &str, _: NaiveDate) -> bool {
            self.exempt_surface
                .iter()
                .any(|(o, d)| *o == origin && *d == destination)
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
    }

    fn rio_lon() -> TravelPath {
        TravelPath::from_legs(
            vec![
                CityCarrier::new("RIO", "NYC", "YY"),
                CityCarrier::new("NYC", "LON", "YY"),
            ],
            "YY",
            date(),
        )
    }

    fn rio_lon_repo() -> TableRepo {
        TableRepo {
            mpm: vec![("RIO", "LON", 6920)],
            tpm: vec![("RIO", "NYC", 4816), ("NYC", "LON", 3458), ("RIO", "LON", 6300)],
            ..Default::default()
        }
    }

    #[test]
    fn overrun_lands_in_twenty_percent_band() {
        let repo = rio_lon_repo();
        let outcome = MileageEngine::new(&repo).validate(&rio_lon());
        assert_eq!(outcome.mpm, 6920);
        assert_eq!(outcome.tpm, 8274);
        assert!(!outcome.valid);
        assert_eq!(outcome.surcharge_pct, 20);
        assert!(outcome.acceptable());
    }

    #[test]
    fn within_mpm_is_valid_without_surcharge() {
        let repo = TableRepo {
            mpm: vec![("CHI", "MIA", 1500)],
            tpm: vec![("CHI", "DFW", 800), ("DFW", "MIA", 650)],
            ..Default::default()
        };
        let path = TravelPath::from_legs(
            vec![
                CityCarrier::new("CHI", "DFW", "AA"),
                CityCarrier::new("DFW", "MIA", "AA"),
            ],
            "AA",
            date(),
        );
        let outcome = MileageEngine::new(&repo).validate(&path);
        assert!(outcome.valid);
        assert_eq!(outcome.surcharge_pct, 0);
    }

    #[test]
    fn overrun_beyond_ladder_is_unacceptable() {
        let repo = TableRepo {
            mpm: vec![("AAA", "CCC", 1000)],
            tpm: vec![("AAA", "BBB", 900), ("BBB", "CCC", 900)],
            ..Default::default()
        };
        let path = TravelPath::from_legs(
            vec![
                CityCarrier::new("AAA", "BBB", "AA"),
                CityCarrier::new("BBB", "CCC", "AA"),
            ],
            "AA",
            date(),
        );
        let outcome = MileageEngine::new(&repo).validate(&path);
        assert!(!outcome.valid);
        assert_eq!(outcome.surcharge_pct, 0);
        assert!(!outcome.acceptable());
    }

    #[test]
    fn ticketed_point_deduction_rescues_the_total() {
        let mut repo = rio_lon_repo();
        repo.tpd.push(TpdPsr {
            application: TpdPsrApplication::TicketedPointDeduction,
            carrier: "YY".into(),
            loc1: "RIO".into(),
            loc2: "LON".into(),
            tpd_amount: 1400,
            via_locs: vec![ViaGeoLoc {
                loc: "NYC".into(),
                kind: LocKind::City,
            }],
            hip_exempt: false,
        });
        let outcome = MileageEngine::new(&repo).validate(&rio_lon());
        assert_eq!(outcome.tpd, 1400);
        assert!(outcome.valid);
        assert_eq!(outcome.surcharge_pct, 0);
    }

    #[test]
    fn deduction_requires_its_via_points() {
        let mut repo = rio_lon_repo();
        repo.tpd.push(TpdPsr {
            application: TpdPsrApplication::TicketedPointDeduction,
            carrier: "YY".into(),
            loc1: "RIO".into(),
            loc2: "LON".into(),
            tpd_amount: 1400,
            via_locs: vec![ViaGeoLoc {
                loc: "MAD".into(),
                kind: LocKind::City,
            }],
            hip_exempt: false,
        });
        let outcome = MileageEngine::new(&repo).validate(&rio_lon());
        assert_eq!(outcome.tpd, 0);
        assert!(!outcome.valid);
    }

    #[test]
    fn psr_waives_the_comparison() {
        let mut repo = rio_lon_repo();
        repo.psr.push(TpdPsr {
            application: TpdPsrApplication::PermissibleSpecifiedRouting,
            carrier: "YY".into(),
            loc1: "RIO".into(),
            loc2: "LON".into(),
            tpd_amount: 0,
            via_locs: vec![ViaGeoLoc {
                loc: "NYC".into(),
                kind: LocKind::City,
            }],
            hip_exempt: true,
        });
        let outcome = MileageEngine::new(&repo).validate(&rio_lon());
        assert!(outcome.valid);
        assert!(outcome.psr_applies);
        assert!(outcome.psr_hip_exempt);
        assert_eq!(outcome.surcharge_pct, 0);
    }

    #[test]
    fn exempt_surface_sector_skips_its_mileage() {
        let repo = TableRepo {
            mpm: vec![("CHI", "MIA", 1500)],
            tpm: vec![("CHI", "DFW", 800), ("DFW", "MIA", 650)],
            exempt_surface: vec![("CHI", "DFW")],
            ..Default::default()
        };
        let path = TravelPath::from_legs(
            vec![
                CityCarrier::new("CHI", "DFW", "XX"),
                CityCarrier::new("DFW", "MIA", "AA"),
            ],
            "AA",
            date(),
        );
        let outcome = MileageEngine::new(&repo).validate(&path);
        assert_eq!(outcome.tpm, 650);
        assert_eq!(
            outcome.surface_exempt_pairs,
            vec![("CHI".to_string(), "DFW".to_string())]
        );
    }

    #[test]
    fn south_atlantic_exception_recomputes_the_band() {
        let mut repo = rio_lon_repo();
        repo.exclusions.push(TpmExclusion {
            carrier: "YY".into(),
            loc1: "RIO".into(),
            loc2: "LON".into(),
        });
        // Through mileage RIO-LON (6300) replaces the two flown legs and
        // lands back under the MPM.
        let outcome = MileageEngine::new(&repo).validate(&rio_lon());
        assert_eq!(outcome.surcharge_pct, 20);
        assert_eq!(outcome.south_atlantic_tpm, Some(6300));
        assert_eq!(outcome.south_atlantic_surcharge_pct, 0);
    }

    #[test]
    fn exception_span_counts_exempt_surface_sectors_at_zero() {
        let repo = TableRepo {
            mpm: vec![("AAA", "CCC", 1000)],
            tpm: vec![("AAA", "BBB", 300), ("BBB", "CCC", 500), ("AAA", "CCC", 450)],
            exclusions: vec![TpmExclusion {
                carrier: "AA".into(),
                loc1: "AAA".into(),
                loc2: "CCC".into(),
            }],
            exempt_surface: vec![("AAA", "BBB")],
            ..Default::default()
        };
        let path = TravelPath::from_legs(
            vec![
                CityCarrier::new("AAA", "BBB", "XX"),
                CityCarrier::new("BBB", "CCC", "AA"),
            ],
            "AA",
            date(),
        );
        // The exempt sector contributes nothing to the flown total, so the
        // replaced span must not count it back either.
        let outcome = MileageEngine::new(&repo).validate(&path);
        assert_eq!(outcome.tpm, 500);
        assert_eq!(outcome.south_atlantic_tpm, Some(450));
        assert_eq!(outcome.south_atlantic_surcharge_pct, 0);
    }

    #[test]
    fn fare_surcharge_amount_follows_the_percent() {
        let mut fare = Fare::new("ATP", "AA", 3, "0519");
        fare.nuc_fare_amount = 5050.0;
        let outcome = MileageOutcome {
            surcharge_pct: 10,
            ..Default::default()
        };
        update_fare_surcharge(&mut fare, &outcome);
        assert_eq!(fare.mileage_surcharge_pctg, 10);
        assert!((fare.mileage_surcharge_amt - 505.0).abs() < f64::EPSILON);
    }

    #[test]
    fn industry_carrier_routing_fares_take_the_exception_percent() {
        let mut fare = Fare::new("ATP", "YY", 3, "0519");
        fare.nuc_fare_amount = 5050.0;
        fare.is_routing = true;
        let outcome = MileageOutcome {
            surcharge_pct: 10,
            south_atlantic_tpm: Some(6300),
            south_atlantic_surcharge_pct: 15,
            ..Default::default()
        };
        update_fare_surcharge(&mut fare, &outcome);
        assert_eq!(fare.mileage_surcharge_pctg, 15);
        assert!((fare.mileage_surcharge_amt - 757.5).abs() < 1e-9);

        // A mileage-validated fare keeps the plain percentage.
        fare.is_routing = false;
        update_fare_surcharge(&mut fare, &outcome);
        assert_eq!(fare.mileage_surcharge_pctg, 10);
    }
}
