//! Validation orchestration: per-fare routing keys, data retrieval,
//! restriction / mileage / map sequencing and fare flag updates.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, debug_span, trace};

use crate::cache::ValidationCaches;
use crate::error::RoutingError;
use crate::fare::{ConstructionType, Fare, FareMarket};
use crate::graph::{RestrictionRow, RouteGraph, RtgKey, UnticketedPointInfo};
use crate::mileage::{update_fare_surcharge, MileageEngine};
use crate::outcome::{MapOutcome, RoutingOutcome, RoutingOutcomes};
use crate::restriction::{
    process_rows, validate_carrier_listing, validate_component_nonstops, validate_group_nonstops,
    RestrictionContext,
};
use crate::traits::RoutingRepository;
use crate::travel::TravelPath;
use crate::types::{GENERIC_ROUTING, INDUSTRY_CARRIER, MILEAGE_ROUTING, VENDOR_SITA};
use crate::walker::{reverse_route_string, MapWalker, DEFAULT_ROUTE_STRING_CAP};

/// Knobs for one validation run.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Round-the-world processing: generic/specified sequencing, alliance
    /// carrier listings, no mileage validation.
    pub round_the_world: bool,
    /// Diagnostic mode: drop the directional qualifier from mileage keys.
    pub ignore_direction: bool,
    /// Cap on route strings collected per map walk.
    pub route_string_cap: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            round_the_world: false,
            ignore_direction: false,
            route_string_cap: DEFAULT_ROUTE_STRING_CAP,
        }
    }
}

/// The graphs retrieved for one fare.
#[derive(Default, Clone)]
struct FareGraphs {
    base: Option<Arc<RouteGraph>>,
    origin_addon: Option<Arc<RouteGraph>>,
    destination_addon: Option<Arc<RouteGraph>>,
}

impl FareGraphs {
    fn all(&self) -> impl Iterator<Item = &Arc<RouteGraph>> {
        self.base
            .iter()
            .chain(self.origin_addon.iter())
            .chain(self.destination_addon.iter())
    }

    fn any_present(&self) -> bool {
        self.all().next().is_some()
    }

    fn any_map(&self) -> bool {
        self.all().any(|g| g.has_map())
    }
}

/// The travel path broken at construction gateways.
struct Components {
    origin: Option<TravelPath>,
    spec: TravelPath,
    destination: Option<TravelPath>,
}

/// Entry point for routing validation of fare markets.
pub struct RoutingController<R> {
    repo: R,
    options: ValidationOptions,
    caches: ValidationCaches,
}

impl<R: RoutingRepository> RoutingController<R> {
    pub fn new(repo: R) -> Self {
        Self::with_options(repo, ValidationOptions::default())
    }

    pub fn with_options(repo: R, options: ValidationOptions) -> Self {
        Self {
            repo,
            options,
            caches: ValidationCaches::new(),
        }
    }

    /// Validate several fare markets of one transaction in parallel.
    pub fn process_markets(&self, markets: &mut [FareMarket]) -> Result<(), RoutingError>
    where
        R: Sync,
    {
        markets.par_iter_mut().try_for_each(|m| self.process_market(m))
    }

    /// Validate every fare of one market, then push mileage surcharges
    /// onto the fares.
    pub fn process_market(&self, market: &mut FareMarket) -> Result<(), RoutingError> {
        if market.travel_path.legs.is_empty() {
            return Err(RoutingError::MissingPrecondition(
                "fare market has no travel path".into(),
            ));
        }
        let path = self.caches.find_or_insert_route(market.travel_path.clone());
        let span = debug_span!(
            "fare_market",
            origin = %path.origin,
            destination = %path.destination,
            carrier = %market.governing_carrier,
        );
        let _guard = span.enter();

        let governing = market.governing_carrier.clone();
        let FareMarket { fares, outcomes, .. } = market;
        for fare in fares.iter_mut() {
            self.process_fare(&path, &governing, outcomes, fare)?;
        }

        if !self.options.round_the_world {
            // Each fare takes the surcharge of its own key's outcome; fares
            // validated without a mileage component keep none.
            for fare in fares.iter_mut() {
                let Some(outcome) = outcomes.get(&self.build_key(fare)) else {
                    continue;
                };
                if let Some(m) = &outcome.mileage {
                    if m.surcharge_pct > 0 || m.south_atlantic_surcharge_pct > 0 {
                        update_fare_surcharge(fare, m);
                    }
                }
            }
        }
        Ok(())
    }

    /// Validate one fare. Returns the combined restriction-and-map verdict
    /// and records the outcome under the fare's routing key.
    pub fn process_fare(
        &self,
        path: &TravelPath,
        governing: &str,
        outcomes: &mut RoutingOutcomes,
        fare: &mut Fare,
    ) -> Result<bool, RoutingError> {
        fare.routing_processed = true;

        // Cat-25 placeholder routings inherit the base fare's verdict.
        if fare.has_special_routing() {
            if let Some(fbr) = &fare.fare_by_rule {
                fare.routing_valid = fbr.base_routing_valid;
                fare.is_routing = fbr.base_is_routing;
                fare.routing_map_valid = fbr.base_routing_valid && fbr.base_is_routing;
                return Ok(fare.routing_valid);
            }
        }

        if self.options.round_the_world && !fare.is_mileage_routing() {
            return self.process_fare_rtw(path, governing, outcomes, fare);
        }

        let key = self.build_key(fare);
        let signature = path.signature();
        if let Some(hit) = outcomes
            .get(&key)
            .cloned()
            .or_else(|| self.caches.find_outcome(&signature, &key))
        {
            outcomes.entry(key).or_insert_with(|| hit.clone());
            apply_outcome(fare, &hit);
            return Ok(hit.restrictions_valid && hit.map_valid);
        }

        let graphs = self.collect_graphs(fare, governing, path);
        let outcome = self.validate_routing(&key, &graphs, path, governing, fare);
        let published = self.caches.publish_outcome(&signature, &key, outcome);
        apply_outcome(fare, &published);
        let verdict = published.restrictions_valid && published.map_valid;
        outcomes.insert(key, published);
        Ok(verdict)
    }

    /// Round-the-world sequencing: the carrier's generic routing is tried
    /// first; a failed generic attempt is final, an absent one defers to
    /// the specified routing, and a passing one is superseded by the
    /// specified routing's own verdict when one is filed.
    fn process_fare_rtw(
        &self,
        path: &TravelPath,
        governing: &str,
        outcomes: &mut RoutingOutcomes,
        fare: &mut Fare,
    ) -> Result<bool, RoutingError> {
        let signature = path.signature();
        let generic_key = RtgKey::new(
            &fare.vendor,
            &fare.carrier,
            fare.routing_tariff,
            GENERIC_ROUTING,
        );
        let generic_graphs = FareGraphs {
            base: self
                .repo
                .routings(
                    &fare.vendor,
                    &fare.carrier,
                    fare.routing_tariff,
                    GENERIC_ROUTING,
                    path.travel_date,
                )
                .into_iter()
                .next(),
            ..Default::default()
        };

        let generic_verdict = if generic_graphs.any_present() {
            let outcome =
                self.validate_routing(&generic_key, &generic_graphs, path, governing, fare);
            let published = self.caches.publish_outcome(&signature, &generic_key, outcome);
            let verdict = published.routing_status;
            outcomes.insert(generic_key, published);
            Some(verdict)
        } else {
            None
        };

        if generic_verdict == Some(false) {
            debug!("generic routing failed, fare invalid");
            fare.routing_valid = false;
            fare.is_routing = true;
            fare.routing_map_valid = false;
            return Ok(false);
        }

        let specified = !fare.routing_number.is_empty()
            && fare.routing_number != GENERIC_ROUTING
            && !fare.has_special_routing();
        if specified {
            let key = self.build_key(fare);
            let graphs = self.collect_graphs(fare, governing, path);
            if graphs.any_present() {
                // Reset and revalidate: the specified verdict wins.
                let outcome = self.validate_routing(&key, &graphs, path, governing, fare);
                let published = self.caches.publish_outcome(&signature, &key, outcome);
                apply_outcome(fare, &published);
                let verdict = published.restrictions_valid && published.map_valid;
                outcomes.insert(key, published);
                return Ok(verdict);
            }
        }

        match generic_verdict {
            Some(true) => {
                fare.routing_valid = true;
                fare.is_routing = true;
                fare.routing_map_valid = true;
                Ok(true)
            }
            _ => {
                fare.routing_valid = false;
                fare.is_routing = true;
                fare.routing_map_valid = false;
                Ok(false)
            }
        }
    }

    /// Routing identity for one fare; constructed fares carry their add-on
    /// numbers, swapped when the fare is filed against the travel
    /// direction. Only mileage keys are directional.
    fn build_key(&self, fare: &Fare) -> RtgKey {
        let mut key = RtgKey::new(
            &fare.vendor,
            &fare.carrier,
            fare.routing_tariff,
            &fare.routing_number,
        );
        if let Some(c) = &fare.constructed {
            let (a1, a2) = if fare.reversed {
                (&c.destination_addon_routing, &c.origin_addon_routing)
            } else {
                (&c.origin_addon_routing, &c.destination_addon_routing)
            };
            key = key.with_addons(a1, a2);
        }
        if key.is_mileage() && !self.options.ignore_direction {
            key.direction_outbound = Some(!fare.reversed);
        }
        key
    }

    fn collect_graphs(&self, fare: &Fare, governing: &str, path: &TravelPath) -> FareGraphs {
        let mut graphs = FareGraphs::default();
        if !fare.is_mileage_routing() && !fare.has_special_routing() {
            graphs.base = self
                .repo
                .routings(
                    &fare.vendor,
                    &fare.carrier,
                    fare.routing_tariff,
                    &fare.routing_number,
                    path.travel_date,
                )
                .into_iter()
                .next();
        }
        if let Some(c) = &fare.constructed {
            if c.construction_type != ConstructionType::SingleDestination {
                graphs.origin_addon =
                    self.addon_graph(fare, governing, path, &c.origin_addon_routing);
            }
            if c.construction_type != ConstructionType::SingleOrigin {
                graphs.destination_addon =
                    self.addon_graph(fare, governing, path, &c.destination_addon_routing);
            }
        }
        graphs
    }

    /// Add-on routing data. SITA files no record for mileage add-ons, so
    /// one is synthesized on the governing carrier; ATPCO mileage add-ons
    /// stay absent and fall to mileage validation.
    fn addon_graph(
        &self,
        fare: &Fare,
        governing: &str,
        path: &TravelPath,
        routing_number: &str,
    ) -> Option<Arc<RouteGraph>> {
        if routing_number.is_empty() {
            return None;
        }
        if routing_number == MILEAGE_ROUTING {
            if fare.vendor == VENDOR_SITA {
                return Some(Arc::new(RouteGraph::new(
                    &fare.vendor,
                    governing,
                    fare.routing_tariff,
                    MILEAGE_ROUTING,
                )));
            }
            return None;
        }
        self.repo
            .routings(
                &fare.vendor,
                &fare.carrier,
                fare.routing_tariff,
                routing_number,
                path.travel_date,
            )
            .into_iter()
            .next()
    }

    /// Full validation of one routing key: restrictions, mileage and the
    /// map walk, folded into one outcome.
    fn validate_routing(
        &self,
        key: &RtgKey,
        graphs: &FareGraphs,
        path: &TravelPath,
        governing: &str,
        fare: &Fare,
    ) -> RoutingOutcome {
        let mut outcome = RoutingOutcome {
            routing_tariff: key.routing_tariff,
            base: graphs.base.clone(),
            origin_addon: graphs.origin_addon.clone(),
            destination_addon: graphs.destination_addon.clone(),
            ..Default::default()
        };

        if !graphs.any_present() && !key.is_mileage() {
            debug!(routing = %key.routing_number, "no routing data found");
            return outcome;
        }

        // Routings restricted to ticketed points validate against the
        // ticketed-only variant of the path.
        let ticket_only = graphs
            .base
            .as_ref()
            .is_some_and(|b| b.unticketed_point == UnticketedPointInfo::TicketedPointsOnly);
        let path: &TravelPath = if ticket_only {
            path.ticketed_only.as_deref().unwrap_or(path)
        } else {
            path
        };

        let components = break_travel(path, fare);
        let ctx = RestrictionContext {
            repo: &self.repo,
            vendor: &fare.vendor,
            governing_carrier: governing,
            rtw: self.options.round_the_world,
        };

        let mut restrictions_valid = true;
        let mut needs_mileage = false;
        if let Some(base) = &graphs.base {
            let report = process_rows(&ctx, &base.restrictions, &components.spec, fare.is_constructed());
            restrictions_valid &= report.valid;
            needs_mileage |= report.needs_mileage;
            outcome.restriction_audit.extend(report.audit);
        }
        for (graph, component) in [
            (&graphs.origin_addon, &components.origin),
            (&graphs.destination_addon, &components.destination),
        ] {
            let (Some(graph), Some(component)) = (graph, component) else {
                continue;
            };
            let report = process_rows(&ctx, &graph.restrictions, component, fare.is_constructed());
            restrictions_valid &= report.valid;
            needs_mileage |= report.needs_mileage;
            outcome.restriction_audit.extend(report.audit);
            restrictions_valid &= validate_component_nonstops(&graph.restrictions, component);
        }

        let all_rows: Vec<&RestrictionRow> = graphs
            .all()
            .flat_map(|g| g.restrictions.iter())
            .collect();
        restrictions_valid &= validate_group_nonstops(&ctx, &all_rows, path);
        let carrier_listing_applies =
            fare.is_constructed() || (!graphs.any_map() && fare.carrier != INDUSTRY_CARRIER);
        if carrier_listing_applies {
            restrictions_valid &= validate_carrier_listing(&ctx, &all_rows, path);
        }
        outcome.restrictions_valid = restrictions_valid;

        let key_mileage = key.is_mileage()
            || key.add_on_routing1 == MILEAGE_ROUTING
            || key.add_on_routing2 == MILEAGE_ROUTING;
        let mileage_linked = key_mileage || needs_mileage;
        if self.options.round_the_world {
            // Mileage validation does not run under round-the-world; keys
            // that depend on it stay invalid.
            outcome.mileage_valid = !key_mileage;
        } else if mileage_linked {
            let m = MileageEngine::new(&self.repo).validate(path);
            outcome.mileage_valid = m.acceptable();
            outcome.mileage = Some(m);
        } else {
            outcome.mileage_valid = true;
        }

        let (mut map_valid, mut routes) = self.walk_components(graphs, &components);
        if self.options.round_the_world && key.is_mileage() {
            map_valid = false;
        }
        if fare.reversed {
            for route in &mut routes {
                *route = reverse_route_string(route);
            }
        }
        outcome.map_valid = map_valid;
        outcome.map = Some(MapOutcome {
            route_strings: if routes.is_empty() { None } else { Some(routes) },
            drv_applies: graphs
                .base
                .as_ref()
                .is_some_and(|b| {
                    !b.no_domestic_validation
                        && (b.has_nation_or_zone_nodes() || b.has_local_routing_nodes())
                }),
        });

        outcome.routing_status =
            outcome.restrictions_valid && outcome.mileage_valid && outcome.map_valid;
        outcome
    }

    /// Walk each component against its graph. Components without a mapped
    /// graph pass vacuously (they belong to mileage validation). When the
    /// base has no map but both add-ons do and nothing matched, the walk is
    /// retried once with the add-on pair swapped.
    fn walk_components(&self, graphs: &FareGraphs, components: &Components) -> (bool, Vec<String>) {
        let walker = MapWalker::new(&self.repo).with_cap(self.options.route_string_cap);
        let attempt = |origin_addon: &Option<Arc<RouteGraph>>,
                       destination_addon: &Option<Arc<RouteGraph>>|
         -> (bool, Vec<String>) {
            let mut ok = true;
            let mut routes = Vec::new();
            let mut walk_one = |graph: Option<&Arc<RouteGraph>>, component: Option<&TravelPath>| {
                let (Some(graph), Some(component)) = (graph, component) else {
                    return;
                };
                if !graph.has_map() {
                    return;
                }
                let matched = walker.walk_map(graph, component);
                if matched.is_empty() {
                    ok = false;
                } else {
                    routes.extend(matched);
                }
            };
            walk_one(origin_addon.as_ref(), components.origin.as_ref());
            walk_one(graphs.base.as_ref(), Some(&components.spec));
            walk_one(destination_addon.as_ref(), components.destination.as_ref());
            (ok, routes)
        };

        let (ok, routes) = attempt(&graphs.origin_addon, &graphs.destination_addon);
        if ok {
            return (ok, routes);
        }
        let base_mapped = graphs.base.as_ref().is_some_and(|b| b.has_map());
        let both_addons_mapped = graphs.origin_addon.as_ref().is_some_and(|g| g.has_map())
            && graphs.destination_addon.as_ref().is_some_and(|g| g.has_map());
        if !base_mapped && both_addons_mapped {
            trace!("retrying add-on walk with the pair swapped");
            let (swapped_ok, swapped_routes) =
                attempt(&graphs.destination_addon, &graphs.origin_addon);
            if swapped_ok {
                return (swapped_ok, swapped_routes);
            }
        }
        (ok, routes)
    }
}

/// Copy a finished outcome onto the fare's flags.
fn apply_outcome(fare: &mut Fare, outcome: &RoutingOutcome) {
    let mapped = outcome.base.as_ref().is_some_and(|g| g.has_map())
        || outcome.origin_addon.as_ref().is_some_and(|g| g.has_map())
        || outcome.destination_addon.as_ref().is_some_and(|g| g.has_map());
    fare.routing_valid = outcome.routing_status;
    fare.is_routing = mapped;
    fare.routing_map_valid = mapped && outcome.map_valid;
}

/// Break the path at the construction gateways. A gateway that is not an
/// intermediate arrival point leaves the path whole.
fn break_travel(path: &TravelPath, fare: &Fare) -> Components {
    let whole = || Components {
        origin: None,
        spec: path.clone(),
        destination: None,
    };
    let Some(c) = &fare.constructed else {
        return whole();
    };
    match c.construction_type {
        ConstructionType::SingleOrigin => match path.split_at_gateway(&c.gateway1) {
            Some((head, tail)) => Components {
                origin: Some(head),
                spec: tail,
                destination: None,
            },
            None => whole(),
        },
        ConstructionType::SingleDestination => match path.split_at_gateway(&c.gateway2) {
            Some((head, tail)) => Components {
                origin: None,
                spec: head,
                destination: Some(tail),
            },
            None => whole(),
        },
        ConstructionType::DoubleEnded => {
            let Some((head, rest)) = path.split_at_gateway(&c.gateway1) else {
                return whole();
            };
            match rest.split_at_gateway(&c.gateway2) {
                Some((middle, tail)) => Components {
                    origin: Some(head),
                    spec: middle,
                    destination: Some(tail),
                },
                None => Components {
                    origin: Some(head),
                    spec: rest,
                    destination: None,
                },
            }
        }
    }
}
